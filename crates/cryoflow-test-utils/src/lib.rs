//! Test utilities for cryoflow crates.

use cryoflow_common_config::{CryoflowConfig, WRAPPER_SCRIPTS};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Creates a temporary directory that is cleaned up on drop.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Name of the raw gain reference written by [`SessionFixture`].
pub const GAIN_REF: &str = "20210205_gain.x1.m1.dm4";

/// Name of the raw defect map written by [`SessionFixture`].
pub const DEFECTS_MAP: &str = "20210205_Defects_map.dm4";

/// A fake microscope session laid out like a real acquisition:
///
/// ```text
/// <root>/inputs/<gain>.dm4
/// <root>/inputs/<defects>.dm4
/// <root>/inputs/Images-Disc1/GridSquare_<g>/Data/FoilHole_<n>_Data_<g>_<n>_20210205_fractions.tiff
/// <root>/inputs/Images-Disc1/GridSquare_<g>/Data/FoilHole_<n>_Data_<g>_<n>_20210205.jpg
/// ```
pub struct SessionFixture {
    dir: TempDir,
    movies: Vec<PathBuf>,
}

impl SessionFixture {
    /// Session with `movies` tiff movies spread over two grid squares.
    pub fn new(movies: usize) -> Self {
        Self::with_extension(movies, "tiff")
    }

    /// Session whose movies use the given extension.
    pub fn with_extension(movies: usize, extension: &str) -> Self {
        let dir = temp_dir();
        let inputs = dir.path().join("inputs");
        std::fs::create_dir_all(&inputs).expect("Failed to create inputs dir");
        touch(&inputs.join(GAIN_REF));
        touch(&inputs.join(DEFECTS_MAP));

        let mut paths = Vec::with_capacity(movies);
        for n in 0..movies {
            let square = 1000 + n % 2;
            let data = inputs
                .join("Images-Disc1")
                .join(format!("GridSquare_{square}"))
                .join("Data");
            std::fs::create_dir_all(&data).expect("Failed to create data dir");

            let base = format!("FoilHole_{}_Data_{square}_{n}_20210205", 2000 + n);
            let movie = data.join(format!("{base}_fractions.{extension}"));
            touch(&movie);
            touch(&data.join(format!("{base}.jpg")));
            paths.push(movie);
        }
        paths.sort();

        Self { dir, movies: paths }
    }

    /// Install empty wrapper scripts under `<root>/workflow/scripts`.
    pub fn with_scripts(self) -> Self {
        let scripts = self.root().join("workflow").join("scripts");
        std::fs::create_dir_all(&scripts).expect("Failed to create scripts dir");
        for script in WRAPPER_SCRIPTS {
            std::fs::write(scripts.join(script), "#!/bin/sh\n").expect("Failed to write script");
        }
        self
    }

    /// Fixture root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Session inputs directory.
    pub fn inputs_dir(&self) -> PathBuf {
        self.root().join("inputs")
    }

    /// Movie paths, sorted.
    pub fn movies(&self) -> &[PathBuf] {
        &self.movies
    }

    /// A config pointing every path into the fixture.
    pub fn config(&self) -> CryoflowConfig {
        let mut config = CryoflowConfig::default();
        config.session.raw_gain_ref = "*.x1.m1.dm4".to_string();
        config.paths.base_dir = self.root().to_path_buf();
        config.paths.inputs_dir = self.inputs_dir();
        config.paths.outputs_dir = self.root().join("outputs");
        config.paths.workflow_dir = self.root().join("runs");
        config
    }

    /// Remove a file under the inputs directory.
    pub fn remove_input(&self, name: &str) {
        std::fs::remove_file(self.inputs_dir().join(name)).expect("Failed to remove input");
    }
}

fn touch(path: &Path) {
    std::fs::write(path, b"").expect("Failed to create fixture file");
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_session_layout() {
        let session = SessionFixture::new(3);
        let inputs = session.inputs_dir();

        assert!(inputs.join(GAIN_REF).is_file());
        assert!(inputs.join(DEFECTS_MAP).is_file());
        assert_eq!(session.movies().len(), 3);
        for movie in session.movies() {
            assert!(movie.is_file());
            let name = movie.file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with("FoilHole_"));
            assert!(name.ends_with("_fractions.tiff"));
            let jpeg = movie.with_file_name(name.replace("_fractions.tiff", ".jpg"));
            assert!(jpeg.is_file());
        }
    }

    #[test]
    fn test_scripts_installed() {
        let session = SessionFixture::new(1).with_scripts();
        let scripts = session.root().join("workflow/scripts");
        for script in WRAPPER_SCRIPTS {
            assert!(scripts.join(script).is_file());
        }
    }

    #[test]
    fn test_config_points_into_fixture() {
        let session = SessionFixture::new(1);
        let config = session.config();
        assert_eq!(config.paths.inputs_dir, session.inputs_dir());
        assert!(config.paths.workflow_dir.starts_with(session.root()));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn test_movie_count_matches(count in 0usize..12) {
            let session = SessionFixture::new(count);
            prop_assert_eq!(session.movies().len(), count);
        }
    }
}
