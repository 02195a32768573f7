//! `pegasus.properties`.

use crate::catalog::CatalogFile;
use crate::error::Result;

/// Ordered planner properties, written as a Java properties file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, keeping its original position if already present.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        let key = key.into();
        let value = value.to_string();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Look up a property.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No properties set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CatalogFile for Properties {
    fn file_name(&self) -> &'static str {
        "pegasus.properties"
    }

    fn render(&self) -> Result<String> {
        let mut out = String::from("# This file was generated by cryoflow\n");
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push_str(" = ");
            out.push_str(value);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_in_insertion_order() {
        let mut props = Properties::new();
        props
            .set("pegasus.metrics.app", "motioncor2")
            .set("pegasus.data.configuration", "sharedfs")
            .set("dagman.maxjobs", 50);

        assert_eq!(
            props.render().unwrap(),
            "# This file was generated by cryoflow\n\
             pegasus.metrics.app = motioncor2\n\
             pegasus.data.configuration = sharedfs\n\
             dagman.maxjobs = 50\n"
        );
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let mut props = Properties::new();
        props.set("a", 1).set("b", 2).set("a", 3);
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("a"), Some("3"));
        assert_eq!(props.iter().next(), Some(("a", "3")));
    }
}
