//! Evaluation of the generator tree into parameter sets.

pub mod clusters;
pub mod list;
pub mod matrix;
pub mod merge;

use fanout_core::{ParameterSet, TargetRegistry};
use fanout_spec::{GeneratorNode, GeneratorSpec};

use crate::errors::GenerationError;
use crate::model::GenerateOptions;
use crate::render::Renderer;

/// Per-specification state shared by every generator of one tree.
pub struct GeneratorContext<'a> {
    /// `namespace/name` of the specification being evaluated.
    pub spec: &'a str,
    pub registry: Option<&'a dyn TargetRegistry>,
    pub options: &'a GenerateOptions,
    pub renderer: &'a Renderer,
    /// Matrix pairs dropped for conflicting values.
    pub conflicts_dropped: u64,
}

impl<'a> GeneratorContext<'a> {
    pub fn new(
        spec: &'a str,
        registry: Option<&'a dyn TargetRegistry>,
        options: &'a GenerateOptions,
        renderer: &'a Renderer,
    ) -> Self {
        Self {
            spec,
            registry,
            options,
            renderer,
            conflicts_dropped: 0,
        }
    }
}

/// Evaluate a generator, recursing through matrix and merge nodes.
pub fn evaluate(
    node: &GeneratorNode,
    ctx: &mut GeneratorContext<'_>,
) -> Result<Vec<ParameterSet>, GenerationError> {
    match &node.spec {
        GeneratorSpec::List(sets) => Ok(list::generate(sets)),
        GeneratorSpec::ClusterRegistry { selector, values } => {
            clusters::generate(selector, values, &node.path, ctx)
        }
        GeneratorSpec::Matrix(generators) => matrix::generate(generators, &node.path, ctx),
        GeneratorSpec::Merge {
            merge_keys,
            generators,
        } => merge::generate(merge_keys, generators, &node.path, ctx),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use fanout_core::ParameterSet;
    use fanout_spec::{GeneratorNode, GeneratorSpec};

    pub fn params(pairs: &[(&str, &str)]) -> ParameterSet {
        ParameterSet::from_pairs(pairs.iter().copied()).expect("unique keys")
    }

    pub fn list(path: &str, sets: Vec<ParameterSet>) -> GeneratorNode {
        GeneratorNode {
            path: path.to_string(),
            spec: GeneratorSpec::List(sets),
        }
    }
}
