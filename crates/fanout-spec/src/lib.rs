//! ApplicationSet manifests: serde model, JSON Schema, loading and
//! validation into the closed generator tree consumed by `fanout-generate`.

pub mod document;
pub mod errors;
pub mod load;
pub mod model;
pub mod schema;
pub mod secret;
pub mod tree;
pub mod validate;

pub use document::{DuplicateKey, decode_document};
pub use errors::{IssueSeverity, Result, SpecError, ValidationIssue, ValidationReport};
pub use load::{ManifestSet, SpecDocument, parse_manifests};
pub use model::{
    ApplicationSet, ApplicationSetSpec, ApplicationTemplate, ClusterGenerator, ListGenerator,
    MatrixGenerator, MergeGenerator, RawGenerator, SpecMetadata, SyncPolicy, TemplateMetadata,
};
pub use schema::application_set_json_schema;
pub use secret::{CLUSTER_SECRET_TYPE, SECRET_TYPE_LABEL, Secret};
pub use tree::{GeneratorNode, GeneratorSpec, TopLevelGenerator, ValidatedSpec};
pub use validate::{
    DEFAULT_MAX_NESTING_DEPTH, SpecOptions, validate_application_set,
    validate_application_set_json, validate_spec,
};
