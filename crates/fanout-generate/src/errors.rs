use thiserror::Error;

use crate::render::RenderError;

/// Errors emitted by the generation engine.
///
/// Every variant raised while evaluating a specification names the
/// specification (`namespace/name`) and the generator path it failed at.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{spec}: {path}: registry unavailable")]
    RegistryUnavailable { spec: String, path: String },
    #[error("{spec}: {path}: registry lookup failed: {source}")]
    Registry {
        spec: String,
        path: String,
        source: fanout_core::Error,
    },
    #[error("{spec}: {path}: merge input lacks key: {key}")]
    MissingMergeKey {
        spec: String,
        path: String,
        key: String,
    },
    #[error("{spec}: {path}: merge key tuple ({tuple}) repeated within one generator")]
    DuplicateMergeKey {
        spec: String,
        path: String,
        tuple: String,
    },
    #[error("{spec}: {path}: entry {entry}: {source}")]
    Render {
        spec: String,
        path: String,
        entry: usize,
        source: RenderError,
    },
    #[error("{spec}: {path}: entry {entry}: rendered target name is empty")]
    EmptyName {
        spec: String,
        path: String,
        entry: usize,
    },
    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerationError {
    /// Short machine-readable code used in reports.
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::RegistryUnavailable { .. } => "registry_unavailable",
            GenerationError::Registry { .. } => "registry_error",
            GenerationError::MissingMergeKey { .. } => "merge_key_missing",
            GenerationError::DuplicateMergeKey { .. } => "merge_key_duplicate",
            GenerationError::Render { .. } => "render_error",
            GenerationError::EmptyName { .. } => "target_name_empty",
            GenerationError::Pattern(_) => "pattern_error",
            GenerationError::Yaml(_) => "yaml_error",
            GenerationError::Io(_) => "io_error",
        }
    }
}
