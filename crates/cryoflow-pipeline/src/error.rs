//! Pipeline errors.

use cryoflow_common_config::{ConfigError, EnvError};
use cryoflow_pegasus::PegasusError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while discovering inputs or generating the workflow.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no {kind} matching '{pattern}' in {dir}")]
    MissingInput {
        kind: &'static str,
        pattern: String,
        dir: PathBuf,
    },

    #[error("no movies matching '{pattern}'")]
    NoMovies { pattern: String },

    #[error("invalid search pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("{path} has no file name")]
    NoFileName { path: PathBuf },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Pegasus(#[from] PegasusError),
}

// Core validation errors only come from `Lfn::new` here.
impl From<cryoflow_common_core::Error> for PipelineError {
    fn from(err: cryoflow_common_core::Error) -> Self {
        Self::Pegasus(PegasusError::InvalidLfn(err))
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, PipelineError>;
