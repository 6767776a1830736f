//! Validated, closed form of a specification's generator tree.
//!
//! Manifests allow any combination of kind fields on a generator entry; the
//! types here only admit the four supported variants, so evaluation can match
//! exhaustively.

use std::collections::BTreeMap;

use fanout_core::{LabelSelector, ParameterSet};

use crate::errors::ValidationIssue;
use crate::model::ApplicationTemplate;

/// A generator with its nested generators resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorSpec {
    /// Pre-declared parameter sets, returned in declaration order.
    List(Vec<ParameterSet>),
    /// One parameter set per registry record matching `selector`.
    ClusterRegistry {
        selector: LabelSelector,
        values: BTreeMap<String, String>,
    },
    /// Left fold of pairwise cartesian combination.
    Matrix(Vec<GeneratorNode>),
    /// Union of nested outputs grouped by `merge_keys`.
    Merge {
        merge_keys: Vec<String>,
        generators: Vec<GeneratorNode>,
    },
}

/// A generator and its location inside the manifest (JSON pointer).
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorNode {
    pub path: String,
    pub spec: GeneratorSpec,
}

/// A top-level generator with the template its entries are rendered with.
#[derive(Debug, Clone, PartialEq)]
pub struct TopLevelGenerator {
    pub node: GeneratorNode,
    pub template: ApplicationTemplate,
}

/// A specification ready for generation.
#[derive(Debug, Clone)]
pub struct ValidatedSpec {
    pub name: String,
    pub namespace: Option<String>,
    pub generators: Vec<TopLevelGenerator>,
    pub preserve_resources_on_deletion: bool,
    pub warnings: Vec<ValidationIssue>,
}

impl GeneratorSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            GeneratorSpec::List(_) => "list",
            GeneratorSpec::ClusterRegistry { .. } => "clusters",
            GeneratorSpec::Matrix(_) => "matrix",
            GeneratorSpec::Merge { .. } => "merge",
        }
    }
}

impl ValidatedSpec {
    /// `namespace/name` identity used in logs and errors.
    pub fn identity(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}/{}", self.name),
            None => self.name.clone(),
        }
    }
}
