//! Shared behaviour of the files handed to the planner.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{PegasusError, Result};

/// Schema version stamped into every YAML catalog.
pub const PEGASUS_API_VERSION: &str = "5.0";

/// A file consumed by `pegasus-plan`.
pub trait CatalogFile {
    /// Conventional file name inside the workflow directory.
    fn file_name(&self) -> &'static str;

    /// Render the file contents.
    fn render(&self) -> Result<String>;

    /// Render and write into `dir`, returning the written path.
    fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        let contents = self.render()?;
        std::fs::write(&path, contents).map_err(|source| PegasusError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "wrote catalog");
        Ok(path)
    }
}

#[derive(Serialize)]
struct Versioned<'a, T: Serialize> {
    pegasus: &'static str,
    #[serde(flatten)]
    body: &'a T,
}

/// Serialize `body` as a versioned Pegasus YAML document.
pub(crate) fn to_versioned_yaml<T: Serialize>(file: &'static str, body: &T) -> Result<String> {
    serde_yaml::to_string(&Versioned {
        pegasus: PEGASUS_API_VERSION,
        body,
    })
    .map_err(|e| PegasusError::Serialize {
        file,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Body {
        name: &'static str,
    }

    #[test]
    fn test_versioned_yaml_leads_with_version() {
        let yaml = to_versioned_yaml("test.yml", &Body { name: "wf" }).unwrap();
        assert!(yaml.starts_with("pegasus:"));

        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(value["pegasus"].as_str(), Some("5.0"));
        assert_eq!(value["name"].as_str(), Some("wf"));
    }
}
