//! Cryo-EM pre-processing workflow generation.
//!
//! Given a microscope session on a shared filesystem, this crate finds the
//! gain reference, defect map and movies, samples the movies, and builds a
//! Pegasus workflow that prepares the gain, motion-corrects each movie with
//! MotionCor2, estimates its CTF with gctf and renders a CTF preview.
//!
//! ```no_run
//! use cryoflow_common_config::CryoflowConfig;
//! use cryoflow_pipeline::PipelineWorkflow;
//!
//! # fn main() -> cryoflow_pipeline::Result<()> {
//! let pipeline = PipelineWorkflow::new(CryoflowConfig::default())?;
//! let (generated, _files) = pipeline.write()?;
//! println!("{} jobs", generated.summary.total_jobs);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod catalogs;
pub mod discovery;
pub mod error;
pub mod naming;
pub mod sampling;
pub mod stages;

pub use builder::{GeneratedWorkflow, PipelineWorkflow, Submission, WorkflowSummary};
pub use discovery::{discover_session, find_files_glob, find_files_regex, SessionInputs};
pub use error::{PipelineError, Result};
pub use naming::{GainNames, MovieNames};
pub use sampling::sample_movies;
