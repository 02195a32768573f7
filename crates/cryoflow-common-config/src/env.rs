//! Environment variable handling.

use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("required environment variable not set: {var}")]
    NotSet { var: String },
}

/// Environment variable names.
pub mod vars {
    // Pegasus
    pub const PEGASUS_HOME: &str = "PEGASUS_HOME";

    // Configuration
    pub const CRYOFLOW_CONFIG: &str = "CRYOFLOW_CONFIG";
    pub const CRYOFLOW_LOG_LEVEL: &str = "CRYOFLOW_LOG_LEVEL";
    pub const CRYOFLOW_LOG_FORMAT: &str = "CRYOFLOW_LOG_FORMAT";
    pub const CRYOFLOW_LOG_FILE: &str = "CRYOFLOW_LOG_FILE";

    // Development
    pub const RUST_LOG: &str = "RUST_LOG";
}

/// Environment access.
pub struct Environment {
    _guard: (),
}

impl Environment {
    /// Initialize environment from .env files.
    pub fn init() -> Self {
        // Later files override earlier ones
        let _ = dotenvy::from_filename(".env");
        let _ = dotenvy::from_filename(".env.local");

        Self { _guard: () }
    }

    /// Get a required string variable.
    pub fn require(var: &str) -> Result<String, EnvError> {
        match env::var(var) {
            Ok(v) if !v.is_empty() => Ok(v),
            _ => Err(EnvError::NotSet {
                var: var.to_string(),
            }),
        }
    }

    /// Get an optional string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok()
    }

    /// Pegasus installation root, required on the execution site.
    pub fn pegasus_home() -> Result<PathBuf, EnvError> {
        Self::require(vars::PEGASUS_HOME).map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_missing() {
        let err = Environment::require("CRYOFLOW_DEFINITELY_UNSET").unwrap_err();
        assert!(matches!(err, EnvError::NotSet { .. }));
    }
}
