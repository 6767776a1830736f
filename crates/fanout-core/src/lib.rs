//! Core contracts shared by the fanout crates.
//!
//! This crate defines the parameter sets exchanged between generators and
//! the renderer, the cluster records exposed by a target registry, label
//! selectors, and the shape of the rendered target definitions.

pub mod cluster;
pub mod error;
pub mod params;
pub mod selector;
pub mod target;
pub mod validation;

pub use cluster::{ClusterRecord, StaticRegistry, TargetRegistry};
pub use error::{Error, Result};
pub use params::ParameterSet;
pub use selector::{LabelSelector, LabelSelectorRequirement, SelectorOperator};
pub use target::{ObjectMeta, OwnerReference, TargetDefinition};
pub use validation::validate_registry;

/// API group/version stamped on every rendered target and owner reference.
pub const API_VERSION: &str = "argoproj.io/v1alpha1";

/// Kind of the rendered target definitions.
pub const APPLICATION_KIND: &str = "Application";

/// Kind of the specification manifests that own rendered targets.
pub const APPLICATION_SET_KIND: &str = "ApplicationSet";

/// Namespace used when neither the template nor the specification sets one.
pub const DEFAULT_NAMESPACE: &str = "argocd";

/// Finalizer added to targets whose resources are not preserved on deletion.
pub const RESOURCES_FINALIZER: &str = "resources-finalizer.argocd.argoproj.io";

/// Pattern of a template placeholder: `{{key}}`, inner whitespace allowed.
/// The first capture group is the parameter key.
pub const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([A-Za-z0-9_./-]+)\s*\}\}";
