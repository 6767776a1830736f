use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use fanout_core::ClusterRecord;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SpecError};

/// Label marking a Secret as a cluster registry entry.
pub const SECRET_TYPE_LABEL: &str = "argocd.argoproj.io/secret-type";

/// Value of [`SECRET_TYPE_LABEL`] on cluster secrets.
pub const CLUSTER_SECRET_TYPE: &str = "cluster";

/// Registry manifest (`kind: Secret`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    #[serde(default)]
    pub metadata: SecretMetadata,
    /// Base64 encoded entries.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    /// Plain entries; they take precedence over `data`.
    #[serde(default)]
    pub string_data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl Secret {
    pub fn is_cluster(&self) -> bool {
        self.metadata
            .labels
            .get(SECRET_TYPE_LABEL)
            .is_some_and(|value| value == CLUSTER_SECRET_TYPE)
    }

    /// Decoded entries, with `stringData` overriding `data`.
    pub fn entries(&self) -> Result<BTreeMap<String, String>> {
        let mut entries = BTreeMap::new();
        for (key, encoded) in &self.data {
            let bytes = STANDARD
                .decode(encoded.trim())
                .map_err(|err| self.invalid(format!("data.{key} is not base64: {err}")))?;
            let text = String::from_utf8(bytes)
                .map_err(|_| self.invalid(format!("data.{key} is not valid UTF-8")))?;
            entries.insert(key.clone(), text);
        }
        for (key, value) in &self.string_data {
            entries.insert(key.clone(), value.clone());
        }
        Ok(entries)
    }

    /// Convert a cluster secret into a registry record.
    ///
    /// `name` falls back to `server`; `config` is never exposed.
    pub fn to_cluster_record(&self) -> Result<ClusterRecord> {
        let mut entries = self.entries()?;
        let server = entries
            .remove("server")
            .filter(|server| !server.trim().is_empty())
            .ok_or_else(|| self.invalid("missing server".to_string()))?;
        let name = entries
            .remove("name")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| server.clone());

        let mut record = ClusterRecord::new(name, server);
        record.labels = self.metadata.labels.clone();
        record.annotations = self.metadata.annotations.clone();
        Ok(record)
    }

    fn invalid(&self, message: String) -> SpecError {
        SpecError::InvalidSecret {
            name: self.metadata.name.clone(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(yaml: &str) -> Secret {
        serde_yaml::from_str(yaml).expect("parse secret")
    }

    #[test]
    fn decodes_cluster_secret() {
        // name: staging, server: https://10.0.0.1
        let secret = secret(
            r#"
metadata:
  name: staging-secret
  labels:
    argocd.argoproj.io/secret-type: cluster
    env: staging
  annotations:
    team: payments
data:
  name: c3RhZ2luZw==
  server: aHR0cHM6Ly8xMC4wLjAuMQ==
  config: e30=
"#,
        );
        assert!(secret.is_cluster());

        let record = secret.to_cluster_record().expect("record");
        assert_eq!(record.name, "staging");
        assert_eq!(record.server, "https://10.0.0.1");
        assert_eq!(record.labels.get("env").map(String::as_str), Some("staging"));
        assert_eq!(
            record.annotations.get("team").map(String::as_str),
            Some("payments")
        );
    }

    #[test]
    fn string_data_overrides_data_and_name_defaults_to_server() {
        let secret = secret(
            r#"
metadata:
  name: bare
  labels: { argocd.argoproj.io/secret-type: cluster }
data:
  server: aHR0cHM6Ly8xMC4wLjAuMQ==
stringData:
  server: https://10.0.0.2
"#,
        );
        let record = secret.to_cluster_record().expect("record");
        assert_eq!(record.server, "https://10.0.0.2");
        assert_eq!(record.name, "https://10.0.0.2");
    }

    #[test]
    fn rejects_missing_server_and_bad_base64() {
        let missing = secret("metadata: { name: empty }\nstringData: { name: x }\n");
        assert!(matches!(
            missing.to_cluster_record(),
            Err(SpecError::InvalidSecret { .. })
        ));

        let garbled = secret("metadata: { name: garbled }\ndata: { server: '%%%' }\n");
        let err = garbled.to_cluster_record().expect_err("bad base64");
        assert!(err.to_string().contains("garbled"));
    }

    #[test]
    fn unlabelled_secret_is_not_a_cluster() {
        let plain = secret("metadata: { name: tls, labels: { app: web } }\n");
        assert!(!plain.is_cluster());
    }
}
