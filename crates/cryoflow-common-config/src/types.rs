//! Configuration types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CryoflowConfig {
    /// Microscope and dataset parameters for one session.
    pub session: SessionConfig,
    /// Filesystem locations.
    pub paths: PathsConfig,
    /// Execution site settings.
    pub cluster: ClusterConfig,
    /// Per-run behaviour.
    pub run: RunConfig,
}

/// Acquisition parameters of a microscope session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Pixel size in Å/px.
    pub apix: f64,
    /// Dose per frame in e⁻/Å².
    pub fmdose: f64,
    /// Accelerating voltage in kV.
    pub kev: u32,
    /// Glob locating the raw gain reference, relative to the inputs dir unless absolute.
    pub raw_gain_ref: String,
    /// Glob locating the raw defect map, relative to the inputs dir unless absolute.
    pub raw_defects_map: String,
    /// Leading part of movie file names.
    pub basename_prefix: String,
    /// Trailing part of movie file names, before the extension.
    pub basename_suffix: String,
    /// Movie container format.
    pub basename_extension: MovieFormat,
    /// Frames dropped from the start of each movie.
    pub throw: u32,
    /// Frames dropped from the end of each movie.
    pub trunc: u32,
    /// Movies were recorded in super-resolution mode.
    pub superresolution: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            apix: 1.0,
            fmdose: 1.0,
            kev: 300,
            raw_gain_ref: "*.gain.dm4".to_string(),
            raw_defects_map: "*Defects*.dm4".to_string(),
            basename_prefix: "FoilHole".to_string(),
            basename_suffix: "fractions".to_string(),
            basename_extension: MovieFormat::default(),
            throw: 0,
            trunc: 0,
            superresolution: false,
        }
    }
}

/// Movie container formats understood by MotionCor2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovieFormat {
    #[default]
    Tiff,
    Mrc,
    Eer,
}

impl MovieFormat {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Tiff => "tiff",
            Self::Mrc => "mrc",
            Self::Eer => "eer",
        }
    }

    /// MotionCor2 input flag for this format.
    pub fn motioncor_flag(&self) -> &'static str {
        match self {
            Self::Tiff => "-InTiff",
            Self::Mrc => "-InMrc",
            Self::Eer => "-InEer",
        }
    }
}

impl fmt::Display for MovieFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Install root; wrapper scripts live under `workflow/scripts/`.
    pub base_dir: PathBuf,
    /// Session directory holding the gain reference, defect map and `Images-Disc1/`.
    pub inputs_dir: PathBuf,
    /// Where staged-out products land.
    pub outputs_dir: PathBuf,
    /// Where catalogs are written and the workflow is planned.
    pub workflow_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            inputs_dir: PathBuf::from("inputs"),
            outputs_dir: PathBuf::from("outputs"),
            workflow_dir: PathBuf::from("runs"),
        }
    }
}

impl PathsConfig {
    /// Directory holding the job wrapper scripts.
    pub fn scripts_dir(&self) -> PathBuf {
        self.base_dir.join("workflow").join("scripts")
    }
}

/// Execution site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Name of the execution site.
    pub site_name: String,
    /// HTCondor `grid_resource` for the site.
    pub grid_resource: String,
    /// Allocation charged for jobs.
    pub project: Option<String>,
    /// Batch queue (partition).
    pub queue: String,
    /// Extra scheduler arguments for GPU jobs.
    pub gpu_resources: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            site_name: "slurm".to_string(),
            grid_resource: "batch slurm".to_string(),
            project: None,
            queue: "main".to_string(),
            gpu_resources: "--gres=gpu:p100:2".to_string(),
        }
    }
}

/// Per-run behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Debug mode: small sample, small queue footprint.
    pub debug: bool,
    /// Override for the number of movies to process.
    pub max_movies: Option<usize>,
    /// Seed for movie sampling.
    pub seed: Option<u64>,
    /// Workflow name, also used as the planner's relative dir.
    pub workflow_name: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            debug: false,
            max_movies: None,
            seed: None,
            workflow_name: "motioncor2".to_string(),
        }
    }
}

impl RunConfig {
    /// Maximum number of jobs DAGMan keeps in the queue.
    pub fn max_jobs(&self) -> u32 {
        if self.debug {
            5
        } else {
            50
        }
    }

    /// Horizontal clustering factor for short per-movie jobs.
    pub fn cluster_size(&self) -> u32 {
        if self.debug {
            5
        } else {
            100
        }
    }

    /// Number of movies to sample.
    pub fn sample_size(&self) -> usize {
        match self.max_movies {
            Some(n) => n,
            None if self.debug => 10,
            None => 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_mode_shrinks_footprint() {
        let run = RunConfig {
            debug: true,
            ..Default::default()
        };
        assert_eq!(run.max_jobs(), 5);
        assert_eq!(run.cluster_size(), 5);
        assert_eq!(run.sample_size(), 10);
    }

    #[test]
    fn test_max_movies_overrides_mode() {
        let run = RunConfig {
            debug: true,
            max_movies: Some(3),
            ..Default::default()
        };
        assert_eq!(run.sample_size(), 3);
    }

    #[test]
    fn test_movie_format_flags() {
        assert_eq!(MovieFormat::Tiff.motioncor_flag(), "-InTiff");
        assert_eq!(MovieFormat::Mrc.motioncor_flag(), "-InMrc");
        assert_eq!(MovieFormat::Eer.motioncor_flag(), "-InEer");
    }

    #[test]
    fn test_unknown_extension_rejected_by_serde() {
        let result = serde_yaml::from_str::<SessionConfig>("basename_extension: png");
        assert!(result.is_err());
    }

    #[test]
    fn test_scripts_dir() {
        let paths = PathsConfig {
            base_dir: PathBuf::from("/opt/cryoem"),
            ..Default::default()
        };
        assert_eq!(paths.scripts_dir(), PathBuf::from("/opt/cryoem/workflow/scripts"));
    }
}
