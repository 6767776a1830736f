use crate::cluster::ClusterRecord;
use crate::error::{Error, Result};

/// Validate internal consistency of a registry snapshot.
///
/// Every record needs a name and a server address. Two records may share a
/// server; each one is still a separate entry.
pub fn validate_registry(clusters: &[ClusterRecord]) -> Result<()> {
    for cluster in clusters {
        if cluster.name.trim().is_empty() {
            return Err(Error::InvalidRegistry(format!(
                "cluster with server '{}' has an empty name",
                cluster.server
            )));
        }
        if cluster.server.trim().is_empty() {
            return Err(Error::InvalidRegistry(format!(
                "cluster '{}' has an empty server address",
                cluster.name
            )));
        }
    }

    Ok(())
}
