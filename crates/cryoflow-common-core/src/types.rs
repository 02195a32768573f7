//! Common types shared across cryoflow crates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// A logical file name: the name a file is known by inside a workflow,
/// independent of where its physical replicas live.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Lfn(String);

impl Lfn {
    /// Create a logical file name. Must be non-empty and contain no `/`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::validation("logical file name cannot be empty"));
        }
        if name.contains('/') {
            return Err(Error::validation(format!(
                "logical file name must not contain '/': {name}"
            )));
        }
        Ok(Self(name))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Lfn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Lfn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Lfn {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Lfn> for String {
    fn from(lfn: Lfn) -> Self {
        lfn.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_lfn() {
        let lfn = Lfn::new("movie_0001.mrc").unwrap();
        assert_eq!(lfn.as_str(), "movie_0001.mrc");
        assert_eq!(lfn.to_string(), "movie_0001.mrc");
    }

    #[test]
    fn test_invalid_lfn() {
        assert!(Lfn::new("").is_err());
        assert!(Lfn::new("Data/movie.tiff").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<Lfn>("\"a.mrc\"").is_ok());
        assert!(serde_json::from_str::<Lfn>("\"a/b.mrc\"").is_err());
    }
}
