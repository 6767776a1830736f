use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::validation::validate_registry;

/// Server address of the cluster the controller itself runs in.
pub const LOCAL_CLUSTER_SERVER: &str = "https://kubernetes.default.svc";

/// Name given to the implicit local cluster record.
pub const LOCAL_CLUSTER_NAME: &str = "in-cluster";

/// A deployment target known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub name: String,
    pub server: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl ClusterRecord {
    pub fn new(name: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server: server.into(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Record describing the cluster the controller runs in.
    pub fn local() -> Self {
        Self::new(LOCAL_CLUSTER_NAME, LOCAL_CLUSTER_SERVER)
    }

    /// Name reduced to characters valid in a DNS subdomain.
    pub fn normalized_name(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|ch| {
                if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '.' {
                    ch
                } else {
                    '-'
                }
            })
            .collect()
    }
}

/// Source of cluster records for the cluster generator.
pub trait TargetRegistry {
    /// All records visible to the registry, in registry order.
    fn clusters(&self) -> Result<Vec<ClusterRecord>>;
}

/// Registry backed by a snapshot loaded before generation starts.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    clusters: Vec<ClusterRecord>,
}

impl StaticRegistry {
    /// Build a snapshot, validating the records first.
    pub fn new(clusters: Vec<ClusterRecord>) -> Result<Self> {
        validate_registry(&clusters)?;
        Ok(Self { clusters })
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

impl TargetRegistry for StaticRegistry {
    fn clusters(&self) -> Result<Vec<ClusterRecord>> {
        Ok(self.clusters.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_cluster_names() {
        let record = ClusterRecord::new("Prod_EU/West 1", "https://eu.example.com");
        assert_eq!(record.normalized_name(), "prod-eu-west-1");
    }

    #[test]
    fn static_registry_keeps_record_order() {
        let registry = StaticRegistry::new(vec![
            ClusterRecord::new("c2", "https://c2.example.com"),
            ClusterRecord::new("c1", "https://c1.example.com"),
        ])
        .expect("valid registry");
        let names: Vec<String> = registry
            .clusters()
            .expect("static registry")
            .into_iter()
            .map(|record| record.name)
            .collect();
        assert_eq!(names, vec!["c2", "c1"]);
    }
}
