use std::collections::BTreeMap;

use fanout_core::LabelSelector;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Top-level specification manifest (`kind: ApplicationSet`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSet {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    pub metadata: SpecMetadata,
    pub spec: ApplicationSetSpec,
}

/// Identity of a specification.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SpecMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Generators and the template they feed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSetSpec {
    /// Top-level generators; their outputs are concatenated in order.
    pub generators: Vec<RawGenerator>,
    pub template: ApplicationTemplate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_policy: Option<SyncPolicy>,
}

/// Deletion behaviour of rendered targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncPolicy {
    /// Skip the resources finalizer on rendered targets.
    #[serde(default)]
    pub preserve_resources_on_deletion: bool,
}

/// Template rendered once per parameter set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ApplicationTemplate {
    #[serde(default)]
    pub metadata: TemplateMetadata,
    /// Body of the rendered target; every string leaf may hold placeholders.
    #[serde(default)]
    pub spec: serde_json::Value,
}

/// Metadata portion of a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TemplateMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finalizers: Vec<String>,
}

/// Generator entry as written in a manifest: exactly one of the kind fields
/// must be set. Validation turns it into a [`crate::GeneratorSpec`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawGenerator {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListGenerator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clusters: Option<ClusterGenerator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<MatrixGenerator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeGenerator>,
    /// Partial template merged over the specification template for the
    /// entries of this generator (top-level generators only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<serde_json::Value>,
}

/// Static parameter sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListGenerator {
    /// Flat objects of scalars; a nested `values` object is flattened to
    /// `values.<key>`.
    #[serde(default)]
    pub elements: Vec<serde_json::Value>,
}

/// One parameter set per registry record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ClusterGenerator {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,
    /// Extra `values.<key>` parameters, rendered against each record.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, String>,
}

/// Cartesian product of nested generators.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct MatrixGenerator {
    #[serde(default)]
    pub generators: Vec<RawGenerator>,
}

/// Key-based union of nested generators.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergeGenerator {
    #[serde(default)]
    pub merge_keys: Vec<String>,
    #[serde(default)]
    pub generators: Vec<RawGenerator>,
}

impl ApplicationSet {
    /// `namespace/name` identity used in logs and errors.
    pub fn identity(&self) -> String {
        match &self.metadata.namespace {
            Some(namespace) => format!("{namespace}/{}", self.metadata.name),
            None => self.metadata.name.clone(),
        }
    }
}

impl ApplicationTemplate {
    /// Deep-merge a partial template over this one.
    ///
    /// Objects merge key by key; any other value in `overlay` replaces ours.
    pub fn with_override(
        &self,
        overlay: &serde_json::Value,
    ) -> Result<ApplicationTemplate, serde_json::Error> {
        let mut merged = serde_json::to_value(self)?;
        merge_json(&mut merged, overlay);
        serde_json::from_value(merged)
    }
}

fn merge_json(base: &mut serde_json::Value, overlay: &serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge_json(
                    base.entry(key.clone()).or_insert(serde_json::Value::Null),
                    value,
                );
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

impl RawGenerator {
    /// Names of the kind fields that are set.
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        if self.list.is_some() {
            kinds.push("list");
        }
        if self.clusters.is_some() {
            kinds.push("clusters");
        }
        if self.matrix.is_some() {
            kinds.push("matrix");
        }
        if self.merge.is_some() {
            kinds.push("merge");
        }
        kinds
    }
}
