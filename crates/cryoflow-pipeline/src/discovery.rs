//! Locating the raw inputs of a session.

use cryoflow_common_config::SessionConfig;
use glob::Pattern;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{PipelineError, Result};

/// Directory the microscope writes grid squares under.
pub const IMAGES_DIR: &str = "Images-Disc1";

/// Raw files a workflow is generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInputs {
    pub gain_ref: PathBuf,
    pub defects_map: PathBuf,
    /// Every movie found, sorted.
    pub movies: Vec<PathBuf>,
}

/// Glob `pattern` under `root`, like `ls root/pattern`. Results are sorted.
///
/// `root` is matched literally even if it contains glob metacharacters. An
/// absolute `pattern` is used as is.
pub fn find_files_glob(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let search = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        format!("{}/{}", Pattern::escape(&root.to_string_lossy()), pattern)
    };
    info!(" ... searching for {search}");

    let entries = glob::glob(&search).map_err(|e| PipelineError::Pattern {
        pattern: search.clone(),
        message: e.to_string(),
    })?;

    let mut found = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => found.push(path),
            Err(e) => warn!(path = %e.path().display(), error = %e.error(), "skipping unreadable path"),
        }
    }
    found.sort();

    info!(" ... found {} files matching {pattern}", found.len());
    Ok(found)
}

/// Walk `root` recursively and keep files whose name matches `regex`.
pub fn find_files_regex(root: &Path, regex: &Regex) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| regex.is_match(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.into_path())
        .collect();
    found.sort();

    info!(" ... found {} files matching {}", found.len(), regex.as_str());
    found
}

/// Glob, relative to the inputs dir, that selects the session's movies.
pub fn movie_pattern(session: &SessionConfig) -> String {
    format!(
        "{IMAGES_DIR}/*/Data/{}*{}.{}",
        Pattern::escape(&session.basename_prefix),
        Pattern::escape(&session.basename_suffix),
        session.basename_extension.extension()
    )
}

/// Regex matching movie file names anywhere in the session tree.
pub fn movie_regex(session: &SessionConfig) -> Result<Regex> {
    let source = format!(
        "^{}.*{}\\.{}$",
        regex::escape(&session.basename_prefix),
        regex::escape(&session.basename_suffix),
        session.basename_extension.extension()
    );
    Regex::new(&source).map_err(|e| PipelineError::Pattern {
        pattern: source,
        message: e.to_string(),
    })
}

/// Find the gain reference, defect map and movies of a session.
pub fn discover_session(session: &SessionConfig, inputs_dir: &Path) -> Result<SessionInputs> {
    let gain_ref = first_match(inputs_dir, &session.raw_gain_ref, "gain reference")?;
    let defects_map = first_match(inputs_dir, &session.raw_defects_map, "defect map")?;

    let pattern = movie_pattern(session);
    let movies = find_files_glob(inputs_dir, &pattern)?;
    if movies.is_empty() {
        return Err(PipelineError::NoMovies {
            pattern: format!("{}/{pattern}", inputs_dir.display()),
        });
    }

    Ok(SessionInputs {
        gain_ref,
        defects_map,
        movies,
    })
}

fn first_match(dir: &Path, pattern: &str, kind: &'static str) -> Result<PathBuf> {
    let mut found = find_files_glob(dir, pattern)?;
    if found.len() > 1 {
        warn!(kind, count = found.len(), using = %found[0].display(), "multiple candidates found");
    }
    if found.is_empty() {
        return Err(PipelineError::MissingInput {
            kind,
            pattern: pattern.to_string(),
            dir: dir.to_path_buf(),
        });
    }
    Ok(found.swap_remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryoflow_test_utils::{SessionFixture, DEFECTS_MAP, GAIN_REF};

    #[test]
    fn test_find_files_glob_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.dm4", "a.dm4", "b.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let found = find_files_glob(dir.path(), "*.dm4").unwrap();
        assert_eq!(found, vec![dir.path().join("a.dm4"), dir.path().join("c.dm4")]);
    }

    #[test]
    fn test_find_files_glob_escapes_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("run[1]");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("x.dm4"), "").unwrap();

        assert_eq!(find_files_glob(&root, "*.dm4").unwrap().len(), 1);
    }

    #[test]
    fn test_find_files_glob_absolute_pattern() {
        let inputs = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        std::fs::write(elsewhere.path().join("shared_gain.x1.m1.dm4"), "").unwrap();

        let pattern = format!("{}/*.x1.m1.dm4", elsewhere.path().display());
        let found = find_files_glob(inputs.path(), &pattern).unwrap();
        assert_eq!(found, vec![elsewhere.path().join("shared_gain.x1.m1.dm4")]);
    }

    #[test]
    fn test_discover_absolute_gain_reference() {
        let session = SessionFixture::new(2);
        session.remove_input(GAIN_REF);
        let shared = tempfile::tempdir().unwrap();
        std::fs::write(shared.path().join(GAIN_REF), "").unwrap();

        let mut config = session.config();
        config.session.raw_gain_ref = shared.path().join("*.x1.m1.dm4").display().to_string();

        let inputs = discover_session(&config.session, &session.inputs_dir()).unwrap();
        assert_eq!(inputs.gain_ref, shared.path().join(GAIN_REF));
        assert_eq!(inputs.defects_map, session.inputs_dir().join(DEFECTS_MAP));
    }

    #[test]
    fn test_find_files_glob_bad_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_files_glob(dir.path(), "[").unwrap_err();
        assert!(matches!(err, PipelineError::Pattern { .. }));
    }

    #[test]
    fn test_find_files_regex_recurses() {
        let session = SessionFixture::new(4);
        let regex = movie_regex(&SessionConfig::default()).unwrap();

        let found = find_files_regex(&session.inputs_dir(), &regex);
        assert_eq!(found, session.movies());
    }

    #[test]
    fn test_movie_pattern() {
        assert_eq!(
            movie_pattern(&SessionConfig::default()),
            "Images-Disc1/*/Data/FoilHole*fractions.tiff"
        );
    }

    #[test]
    fn test_discover_session() {
        let session = SessionFixture::new(3);
        let config = session.config();

        let inputs = discover_session(&config.session, &session.inputs_dir()).unwrap();
        assert_eq!(inputs.gain_ref, session.inputs_dir().join(GAIN_REF));
        assert_eq!(inputs.defects_map, session.inputs_dir().join(DEFECTS_MAP));
        assert_eq!(inputs.movies, session.movies());
    }

    #[test]
    fn test_discover_ignores_other_formats() {
        let session = SessionFixture::with_extension(2, "mrc");
        let config = session.config();

        let err = discover_session(&config.session, &session.inputs_dir()).unwrap_err();
        assert!(matches!(err, PipelineError::NoMovies { .. }));
    }

    #[test]
    fn test_missing_gain_reference() {
        let session = SessionFixture::new(1);
        session.remove_input(GAIN_REF);

        let err = discover_session(&session.config().session, &session.inputs_dir()).unwrap_err();
        match err {
            PipelineError::MissingInput { kind, .. } => assert_eq!(kind, "gain reference"),
            other => panic!("Expected MissingInput, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_defect_map() {
        let session = SessionFixture::new(1);
        session.remove_input(DEFECTS_MAP);

        let err = discover_session(&session.config().session, &session.inputs_dir()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { kind: "defect map", .. }));
    }
}
