//! `replicas.yml`: physical locations of the workflow's raw inputs.

use cryoflow_common_core::Lfn;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::{to_versioned_yaml, CatalogFile};
use crate::error::{PegasusError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Pfn {
    site: String,
    pfn: String,
}

#[derive(Serialize)]
struct Replica<'a> {
    lfn: &'a Lfn,
    pfns: &'a [Pfn],
}

#[derive(Serialize)]
struct ReplicaDocument<'a> {
    replicas: Vec<Replica<'a>>,
}

/// The replica catalog, ordered by logical file name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicaCatalog {
    entries: BTreeMap<Lfn, Vec<Pfn>>,
}

impl ReplicaCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `pfn` as a replica of `lfn` on `site`. One entry per (site, lfn).
    pub fn add_replica(
        &mut self,
        site: impl Into<String>,
        lfn: Lfn,
        pfn: impl Into<String>,
    ) -> Result<&mut Self> {
        let site = site.into();
        let pfns = self.entries.entry(lfn.clone()).or_default();
        if pfns.iter().any(|p| p.site == site) {
            return Err(PegasusError::Duplicate {
                kind: "replica",
                name: format!("{lfn}@{site}"),
            });
        }
        pfns.push(Pfn {
            site,
            pfn: pfn.into(),
        });
        Ok(self)
    }

    /// Physical names registered for `lfn`.
    pub fn pfns(&self, lfn: &Lfn) -> Vec<&str> {
        self.entries
            .get(lfn)
            .map(|pfns| pfns.iter().map(|p| p.pfn.as_str()).collect())
            .unwrap_or_default()
    }

    /// Whether `lfn` has any replica.
    pub fn contains(&self, lfn: &Lfn) -> bool {
        self.entries.contains_key(lfn)
    }

    /// Registered logical names.
    pub fn lfns(&self) -> impl Iterator<Item = &Lfn> {
        self.entries.keys()
    }

    /// Number of logical names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CatalogFile for ReplicaCatalog {
    fn file_name(&self) -> &'static str {
        "replicas.yml"
    }

    fn render(&self) -> Result<String> {
        let doc = ReplicaDocument {
            replicas: self
                .entries
                .iter()
                .map(|(lfn, pfns)| Replica { lfn, pfns })
                .collect(),
        };
        to_versioned_yaml(self.file_name(), &doc)
    }
}
