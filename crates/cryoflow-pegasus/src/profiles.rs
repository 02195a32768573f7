//! Namespaced profiles attached to sites and transformations.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Profile namespaces understood by Pegasus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Namespace {
    Pegasus,
    Condor,
    Dagman,
    Env,
    Globus,
    Selector,
}

impl Namespace {
    /// Key used in YAML documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pegasus => "pegasus",
            Self::Condor => "condor",
            Self::Dagman => "dagman",
            Self::Env => "env",
            Self::Globus => "globus",
            Self::Selector => "selector",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A profile value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProfileValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<&str> for ProfileValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ProfileValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for ProfileValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ProfileValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ProfileValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl fmt::Display for ProfileValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// Resource requests in the `pegasus` namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PegasusProfile {
    /// Cores per job.
    pub cores: Option<u32>,
    /// Expected runtime in seconds.
    pub runtime: Option<u32>,
    /// Memory in MB.
    pub memory: Option<u32>,
    /// Raw arguments passed through to the batch scheduler.
    pub glite_arguments: Option<String>,
}

/// Profiles keyed by namespace, then key. Keys serialize sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Profiles(BTreeMap<&'static str, BTreeMap<String, ProfileValue>>);

impl Profiles {
    /// Create an empty profile set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` in `namespace`, replacing any previous value.
    pub fn add(
        &mut self,
        namespace: Namespace,
        key: impl Into<String>,
        value: impl Into<ProfileValue>,
    ) -> &mut Self {
        self.0
            .entry(namespace.as_str())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Add the resource requests that are set.
    pub fn add_pegasus_profile(&mut self, profile: PegasusProfile) -> &mut Self {
        if let Some(cores) = profile.cores {
            self.add(Namespace::Pegasus, "cores", cores);
        }
        if let Some(runtime) = profile.runtime {
            self.add(Namespace::Pegasus, "runtime", runtime);
        }
        if let Some(memory) = profile.memory {
            self.add(Namespace::Pegasus, "memory", memory);
        }
        if let Some(args) = profile.glite_arguments {
            self.add(Namespace::Pegasus, "glite.arguments", args);
        }
        self
    }

    /// Look up a value.
    pub fn get(&self, namespace: Namespace, key: &str) -> Option<&ProfileValue> {
        self.0.get(namespace.as_str()).and_then(|keys| keys.get(key))
    }

    /// No profiles set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pegasus_profile_keys() {
        let mut profiles = Profiles::new();
        profiles.add_pegasus_profile(PegasusProfile {
            cores: Some(4),
            runtime: Some(600),
            memory: Some(4192),
            glite_arguments: Some("--gres=gpu:p100:2".to_string()),
        });

        assert_eq!(profiles.get(Namespace::Pegasus, "cores"), Some(&ProfileValue::Int(4)));
        assert_eq!(profiles.get(Namespace::Pegasus, "memory"), Some(&ProfileValue::Int(4192)));
        assert_eq!(
            profiles.get(Namespace::Pegasus, "glite.arguments"),
            Some(&ProfileValue::Str("--gres=gpu:p100:2".to_string()))
        );
        assert_eq!(profiles.get(Namespace::Condor, "cores"), None);
    }

    #[test]
    fn test_unset_fields_are_skipped() {
        let mut profiles = Profiles::new();
        profiles.add_pegasus_profile(PegasusProfile {
            cores: Some(1),
            ..Default::default()
        });
        assert!(profiles.get(Namespace::Pegasus, "memory").is_none());
    }

    #[test]
    fn test_add_replaces_value() {
        let mut profiles = Profiles::new();
        profiles.add(Namespace::Pegasus, "queue", "debug");
        profiles.add(Namespace::Pegasus, "queue", "main");
        assert_eq!(profiles.get(Namespace::Pegasus, "queue").map(ToString::to_string), Some("main".into()));
    }

    #[test]
    fn test_serializes_nested_and_sorted() {
        let mut profiles = Profiles::new();
        profiles
            .add(Namespace::Pegasus, "style", "glite")
            .add(Namespace::Condor, "grid_resource", "batch slurm")
            .add(Namespace::Pegasus, "auxillary.local", true);

        let yaml = serde_yaml::to_string(&profiles).unwrap();
        assert_eq!(
            yaml,
            "condor:\n  grid_resource: batch slurm\npegasus:\n  auxillary.local: true\n  style: glite\n"
        );
    }
}
