//! cryoflow common core types and utilities.

pub mod error;
pub mod id;
pub mod types;

pub use error::{Error, Result};
pub use id::JobId;
pub use types::Lfn;
