//! Configuration types for cryoflow.
//!
//! This crate provides the session, cluster and run settings read from
//! `.cryoflow/config.yaml`, plus environment and tool detection helpers.

pub mod detection;
pub mod env;
pub mod loader;
pub mod types;

pub use detection::*;
pub use env::*;
pub use loader::*;
pub use types::*;
