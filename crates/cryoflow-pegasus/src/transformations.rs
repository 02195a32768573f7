//! `transformations.yml`: the executables jobs refer to by name.

use serde::Serialize;
use std::path::PathBuf;

use crate::catalog::{to_versioned_yaml, CatalogFile};
use crate::error::{PegasusError, Result};
use crate::profiles::{Namespace, PegasusProfile, ProfileValue, Profiles};

/// Whether the executable is already installed on the site or must be staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformationType {
    Installed,
    Stageable,
}

/// Where a transformation lives on one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformationSite {
    pub name: String,
    pub pfn: PathBuf,
    #[serde(rename = "type")]
    pub kind: TransformationType,
}

/// A named executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transformation {
    pub name: String,
    pub sites: Vec<TransformationSite>,
    #[serde(skip_serializing_if = "Profiles::is_empty")]
    pub profiles: Profiles,
}

impl Transformation {
    /// Create a transformation available on one site.
    pub fn new(
        name: impl Into<String>,
        site: impl Into<String>,
        pfn: impl Into<PathBuf>,
        is_stageable: bool,
    ) -> Self {
        let kind = if is_stageable {
            TransformationType::Stageable
        } else {
            TransformationType::Installed
        };
        Self {
            name: name.into(),
            sites: vec![TransformationSite {
                name: site.into(),
                pfn: pfn.into(),
                kind,
            }],
            profiles: Profiles::new(),
        }
    }

    /// Add resource requests.
    pub fn add_pegasus_profile(mut self, profile: PegasusProfile) -> Self {
        self.profiles.add_pegasus_profile(profile);
        self
    }

    /// Add a single profile.
    pub fn add_profile(
        mut self,
        namespace: Namespace,
        key: impl Into<String>,
        value: impl Into<ProfileValue>,
    ) -> Self {
        self.profiles.add(namespace, key, value);
        self
    }
}

/// The transformation catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformationCatalog {
    transformations: Vec<Transformation>,
}

impl TransformationCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transformation. Names must be unique.
    pub fn add_transformation(&mut self, transformation: Transformation) -> Result<&mut Self> {
        if self.get(&transformation.name).is_some() {
            return Err(PegasusError::Duplicate {
                kind: "transformation",
                name: transformation.name,
            });
        }
        self.transformations.push(transformation);
        Ok(self)
    }

    /// Look up by name.
    pub fn get(&self, name: &str) -> Option<&Transformation> {
        self.transformations.iter().find(|t| t.name == name)
    }

    /// All transformations in insertion order.
    pub fn transformations(&self) -> &[Transformation] {
        &self.transformations
    }

    /// Number of transformations.
    pub fn len(&self) -> usize {
        self.transformations.len()
    }

    /// Catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.transformations.is_empty()
    }
}

impl CatalogFile for TransformationCatalog {
    fn file_name(&self) -> &'static str {
        "transformations.yml"
    }

    fn render(&self) -> Result<String> {
        to_versioned_yaml(self.file_name(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_by_default() {
        let tr = Transformation::new("gctf", "slurm", "/opt/scripts/gctf_wrapper.sh", false);
        assert_eq!(tr.sites[0].kind, TransformationType::Installed);
        let tr = Transformation::new("gctf", "slurm", "/opt/scripts/gctf_wrapper.sh", true);
        assert_eq!(tr.sites[0].kind, TransformationType::Stageable);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut tc = TransformationCatalog::new();
        tc.add_transformation(Transformation::new("a", "slurm", "/a", false))
            .unwrap();
        let err = tc
            .add_transformation(Transformation::new("a", "slurm", "/b", false))
            .unwrap_err();
        assert!(matches!(err, PegasusError::Duplicate { kind: "transformation", .. }));
        assert_eq!(tc.len(), 1);
    }

    #[test]
    fn test_render_shape() {
        let mut tc = TransformationCatalog::new();
        tc.add_transformation(
            Transformation::new("e2proc2d", "slurm", "/opt/e2proc2d_wrapper.sh", false)
                .add_pegasus_profile(PegasusProfile {
                    cores: Some(1),
                    runtime: Some(600),
                    memory: Some(2048),
                    glite_arguments: None,
                })
                .add_profile(Namespace::Pegasus, "clusters.size", 100u32),
        )
        .unwrap();

        let value: serde_yaml::Value = serde_yaml::from_str(&tc.render().unwrap()).unwrap();
        let tr = &value["transformations"][0];
        assert_eq!(tr["name"].as_str(), Some("e2proc2d"));
        assert_eq!(tr["sites"][0]["type"].as_str(), Some("installed"));
        assert_eq!(tr["sites"][0]["pfn"].as_str(), Some("/opt/e2proc2d_wrapper.sh"));
        assert_eq!(tr["profiles"]["pegasus"]["memory"].as_i64(), Some(2048));
        assert_eq!(tr["profiles"]["pegasus"]["clusters.size"].as_i64(), Some(100));
    }
}
