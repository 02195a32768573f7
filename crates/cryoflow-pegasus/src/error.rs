//! Pegasus model errors.

use cryoflow_common_core::{JobId, Lfn};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, writing or planning a workflow.
#[derive(Debug, Error)]
pub enum PegasusError {
    #[error("duplicate {kind}: {name}")]
    Duplicate { kind: &'static str, name: String },

    #[error("job {job} uses '{lfn}' more than once")]
    DuplicateUse { job: String, lfn: Lfn },

    #[error("'{lfn}' is produced by both {first} and {second}")]
    MultipleProducers { lfn: Lfn, first: JobId, second: JobId },

    #[error("unknown job id: {0}")]
    UnknownJob(JobId),

    #[error("workflow contains a dependency cycle through {0}")]
    Cycle(JobId),

    #[error("invalid logical file name: {0}")]
    InvalidLfn(#[from] cryoflow_common_core::Error),

    #[error("failed to serialize {file}: {message}")]
    Serialize { file: &'static str, message: String },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("pegasus-plan exited with status {code}: {stderr}")]
    PlanFailed { code: i32, stderr: String },
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, PegasusError>;
