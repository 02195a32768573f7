//! `sites.yml`: where jobs run and where data lives.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::catalog::{to_versioned_yaml, CatalogFile};
use crate::error::{PegasusError, Result};
use crate::profiles::{Namespace, ProfileValue, Profiles};

/// Directory roles on a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DirectoryType {
    SharedScratch,
    SharedStorage,
    LocalScratch,
    LocalStorage,
}

/// Operations a file server supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    All,
    Get,
    Put,
}

/// Access point for a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileServer {
    pub url: String,
    pub operation: Operation,
}

impl FileServer {
    /// A `file://` server for a local path.
    pub fn local(path: &Path, operation: Operation) -> Self {
        Self {
            url: format!("file://{}", path.display()),
            operation,
        }
    }
}

/// A directory on a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Directory {
    #[serde(rename = "type")]
    pub kind: DirectoryType,
    pub path: PathBuf,
    pub shared_file_system: bool,
    pub file_servers: Vec<FileServer>,
}

impl Directory {
    /// Create a directory with no file servers.
    pub fn new(kind: DirectoryType, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            shared_file_system: false,
            file_servers: Vec::new(),
        }
    }

    /// Create a directory served over `file://` for all operations.
    pub fn local(kind: DirectoryType, path: impl Into<PathBuf>) -> Self {
        let mut dir = Self::new(kind, path);
        let server = FileServer::local(&dir.path, Operation::All);
        dir.file_servers.push(server);
        dir
    }

    /// Add a file server.
    pub fn add_file_server(mut self, server: FileServer) -> Self {
        self.file_servers.push(server);
        self
    }
}

/// An execution or storage site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Site {
    pub name: String,
    pub directories: Vec<Directory>,
    #[serde(skip_serializing_if = "Profiles::is_empty")]
    pub profiles: Profiles,
}

impl Site {
    /// Create an empty site.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directories: Vec::new(),
            profiles: Profiles::new(),
        }
    }

    /// Add a directory.
    pub fn add_directory(mut self, directory: Directory) -> Self {
        self.directories.push(directory);
        self
    }

    /// Add a profile.
    pub fn add_profile(
        mut self,
        namespace: Namespace,
        key: impl Into<String>,
        value: impl Into<ProfileValue>,
    ) -> Self {
        self.profiles.add(namespace, key, value);
        self
    }

    /// First directory of the given type.
    pub fn directory(&self, kind: DirectoryType) -> Option<&Directory> {
        self.directories.iter().find(|d| d.kind == kind)
    }
}

/// The site catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteCatalog {
    sites: Vec<Site>,
}

impl SiteCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a site. Names must be unique.
    pub fn add_site(&mut self, site: Site) -> Result<&mut Self> {
        if self.site(&site.name).is_some() {
            return Err(PegasusError::Duplicate {
                kind: "site",
                name: site.name,
            });
        }
        self.sites.push(site);
        Ok(self)
    }

    /// Look up a site by name.
    pub fn site(&self, name: &str) -> Option<&Site> {
        self.sites.iter().find(|s| s.name == name)
    }

    /// All sites in insertion order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }
}

impl CatalogFile for SiteCatalog {
    fn file_name(&self) -> &'static str {
        "sites.yml"
    }

    fn render(&self) -> Result<String> {
        to_versioned_yaml(self.file_name(), self)
    }
}
