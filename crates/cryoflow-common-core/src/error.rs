//! Error types for cryoflow.

use thiserror::Error;

/// The main error type for cryoflow operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A value failed validation.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Create a new validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type alias using cryoflow's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::validation("bad lfn").to_string(),
            "Validation error: bad lfn"
        );
    }
}
