//! Typed model of the Pegasus WMS 5.0 catalogs.
//!
//! A Pegasus workflow is described by five files written side by side:
//!
//! - `pegasus.properties` ([`Properties`])
//! - `sites.yml` ([`SiteCatalog`])
//! - `transformations.yml` ([`TransformationCatalog`])
//! - `replicas.yml` ([`ReplicaCatalog`])
//! - `workflow.yml` ([`Workflow`])
//!
//! Each implements [`CatalogFile`]. [`Planner`] hands the result to
//! `pegasus-plan`.

pub mod catalog;
pub mod error;
pub mod planner;
pub mod profiles;
pub mod properties;
pub mod replicas;
pub mod sites;
pub mod transformations;
pub mod workflow;

pub use catalog::{CatalogFile, PEGASUS_API_VERSION};
pub use error::{PegasusError, Result};
pub use planner::{write_all, PlanOptions, PlanOutput, Planner};
pub use profiles::{Namespace, PegasusProfile, ProfileValue, Profiles};
pub use properties::Properties;
pub use replicas::ReplicaCatalog;
pub use sites::{Directory, DirectoryType, FileServer, Operation, Site, SiteCatalog};
pub use transformations::{Transformation, TransformationCatalog, TransformationType};
pub use workflow::{Arg, File, Job, OutputOptions, Workflow};
