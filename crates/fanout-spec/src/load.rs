use fanout_core::{APPLICATION_SET_KIND, ClusterRecord, StaticRegistry};
use serde_json::Value;
use tracing::{debug, warn};

use crate::document::{DuplicateKey, decode_document};
use crate::errors::{Result, SpecError, ValidationReport};
use crate::secret::Secret;
use crate::tree::ValidatedSpec;
use crate::validate::{SpecOptions, validate_spec};

const SECRET_KIND: &str = "Secret";

/// A specification document and where it came from.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    pub origin: String,
    /// Zero-based position of the document inside its source.
    pub index: usize,
    pub document: Value,
    /// Keys repeated inside one mapping; only their first entry is kept.
    pub duplicate_keys: Vec<DuplicateKey>,
}

/// Documents collected from one or more sources, dispatched by kind.
#[derive(Debug, Clone, Default)]
pub struct ManifestSet {
    pub specs: Vec<SpecDocument>,
    pub secrets: Vec<Secret>,
    /// Documents of a kind that is neither a specification nor a Secret.
    pub skipped: usize,
}

impl SpecDocument {
    /// Run structural and semantic validation on this document.
    pub fn validate(
        &self,
        schema: &Value,
        options: &SpecOptions,
    ) -> std::result::Result<ValidatedSpec, ValidationReport> {
        let validated = validate_spec(&self.document, schema, options);
        if self.duplicate_keys.is_empty() {
            return validated;
        }

        let mut report = ValidationReport::default();
        for duplicate in &self.duplicate_keys {
            report.push_error(duplicate.to_issue());
        }
        match validated {
            Ok(spec) => report.warnings.extend(spec.warnings),
            Err(other) => {
                report.errors.extend(other.errors);
                report.warnings.extend(other.warnings);
            }
        }
        Err(report)
    }

    /// `origin#index` label used in messages.
    pub fn label(&self) -> String {
        format!("{}#{}", self.origin, self.index)
    }
}

impl ManifestSet {
    pub fn extend(&mut self, other: ManifestSet) {
        self.specs.extend(other.specs);
        self.secrets.extend(other.secrets);
        self.skipped += other.skipped;
    }

    /// Secrets that do not carry the cluster label.
    pub fn non_cluster_secrets(&self) -> usize {
        self.secrets.iter().filter(|secret| !secret.is_cluster()).count()
    }

    /// Cluster records of every cluster Secret, in input order.
    pub fn cluster_records(&self) -> Result<Vec<ClusterRecord>> {
        self.secrets
            .iter()
            .filter(|secret| secret.is_cluster())
            .map(Secret::to_cluster_record)
            .collect()
    }

    /// Registry snapshot built from the cluster Secrets.
    pub fn registry(&self) -> Result<StaticRegistry> {
        Ok(StaticRegistry::new(self.cluster_records()?)?)
    }
}

/// Split a multi-document YAML source and dispatch each document by kind.
///
/// Empty documents are ignored. Any document that fails to parse aborts
/// the whole source.
pub fn parse_manifests(text: &str, origin: &str) -> Result<ManifestSet> {
    let mut set = ManifestSet::default();

    for (index, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let (document, duplicate_keys) =
            decode_document(document).map_err(|err| SpecError::Document {
                origin: origin.to_string(),
                index,
                message: err.to_string(),
            })?;

        if document.is_null() {
            continue;
        }

        let kind = document
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match kind.as_str() {
            APPLICATION_SET_KIND => {
                debug!(origin, index, "specification document");
                set.specs.push(SpecDocument {
                    origin: origin.to_string(),
                    index,
                    document,
                    duplicate_keys,
                });
            }
            SECRET_KIND => {
                if let Some(duplicate) = duplicate_keys.first() {
                    return Err(SpecError::Document {
                        origin: origin.to_string(),
                        index,
                        message: duplicate.to_string(),
                    });
                }
                let secret: Secret =
                    serde_json::from_value(document).map_err(|err| SpecError::Document {
                        origin: origin.to_string(),
                        index,
                        message: err.to_string(),
                    })?;
                set.secrets.push(secret);
            }
            _ => {
                warn!(origin, index, kind = %kind, "skipping document of unsupported kind");
                set.skipped += 1;
            }
        }
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: &str = r#"
apiVersion: argoproj.io/v1alpha1
kind: ApplicationSet
metadata: { name: one }
spec:
  generators: [{ list: { elements: [{ a: "1" }] } }]
  template: { metadata: { name: "{{a}}" } }
---
---
apiVersion: v1
kind: Secret
metadata:
  name: prod
  labels: { argocd.argoproj.io/secret-type: cluster }
stringData: { name: prod, server: "https://prod.example" }
---
apiVersion: v1
kind: Secret
metadata: { name: tls }
---
apiVersion: v1
kind: ConfigMap
metadata: { name: settings }
"#;

    #[test]
    fn dispatches_documents_by_kind() {
        let set = parse_manifests(MIXED, "mixed.yaml").expect("parse");
        assert_eq!(set.specs.len(), 1);
        assert_eq!(set.specs[0].index, 0);
        assert_eq!(set.secrets.len(), 2);
        assert_eq!(set.non_cluster_secrets(), 1);
        assert_eq!(set.skipped, 1);

        let records = set.cluster_records().expect("records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].server, "https://prod.example");
    }

    #[test]
    fn malformed_document_names_source_and_index() {
        let text = "kind: ApplicationSet\n---\nkind: [unclosed\n";
        let err = parse_manifests(text, "broken.yaml").expect_err("malformed yaml");
        match err {
            SpecError::Document { origin, index, .. } => {
                assert_eq!(origin, "broken.yaml");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_servers_stay_separate_records() {
        let text = r#"
kind: Secret
metadata: { name: a, labels: { argocd.argoproj.io/secret-type: cluster } }
stringData: { server: "https://same" }
---
kind: Secret
metadata: { name: b, labels: { argocd.argoproj.io/secret-type: cluster } }
stringData: { server: "https://same" }
"#;
        let set = parse_manifests(text, "dupes.yaml").expect("parse");
        let registry = set.registry().expect("registry");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn repeated_key_in_secret_is_rejected() {
        let text = r#"
kind: Secret
metadata: { name: a, labels: { argocd.argoproj.io/secret-type: cluster } }
stringData: { server: "https://one", server: "https://two" }
"#;
        let err = parse_manifests(text, "secret.yaml").expect_err("repeated key");
        match err {
            SpecError::Document { index, message, .. } => {
                assert_eq!(index, 0);
                assert!(message.contains("'server'"));
                assert!(message.contains("/stringData"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn repeated_keys_are_kept_on_spec_documents() {
        let text = "kind: ApplicationSet
metadata: { name: a, name: b }
";
        let set = parse_manifests(text, "spec.yaml").expect("parse");
        assert_eq!(set.specs[0].document["metadata"]["name"], "a");
        assert_eq!(set.specs[0].duplicate_keys.len(), 1);
        assert_eq!(set.specs[0].duplicate_keys[0].path, "/metadata");
    }

    #[test]
    fn extend_accumulates_sources() {
        let mut set = parse_manifests(MIXED, "a.yaml").expect("parse");
        set.extend(parse_manifests(MIXED, "b.yaml").expect("parse"));
        assert_eq!(set.specs.len(), 2);
        assert_eq!(set.specs[1].label(), "b.yaml#0");
        assert_eq!(set.skipped, 2);
    }
}
