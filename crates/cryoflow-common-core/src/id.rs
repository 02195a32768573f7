//! Job identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width of the numeric part of a job id.
const ID_WIDTH: usize = 7;

/// Sequential job identifier in the `ID0000001` form used by Pegasus.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u32);

impl JobId {
    /// Build the id of the `index`-th job (1-based).
    pub fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// The numeric part of the id.
    pub fn index(&self) -> u32 {
        self.0
    }

    /// The id following this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID{:0width$}", self.0, width = ID_WIDTH)
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({})", self)
    }
}

/// Error parsing a job id.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdParseError {
    /// The id format is invalid.
    #[error("invalid job id format: {0}")]
    InvalidFormat(String),
}

impl FromStr for JobId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("ID")
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse().ok())
            .map(Self)
            .ok_or_else(|| IdParseError::InvalidFormat(s.to_string()))
    }
}

impl Serialize for JobId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
