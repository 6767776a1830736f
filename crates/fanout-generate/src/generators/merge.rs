use std::collections::{HashMap, HashSet};

use fanout_core::{Error as CoreError, ParameterSet};
use fanout_spec::GeneratorNode;
use tracing::debug;

use crate::errors::GenerationError;
use crate::generators::{GeneratorContext, evaluate};

/// Union of the nested outputs, grouped by the values at `merge_keys`.
///
/// Groups keep first-seen order. A set whose tuple is already known
/// overrides that group's non-key fields and leaves the rest in place.
pub fn generate(
    merge_keys: &[String],
    generators: &[GeneratorNode],
    path: &str,
    ctx: &mut GeneratorContext<'_>,
) -> Result<Vec<ParameterSet>, GenerationError> {
    debug!(spec = %ctx.spec, path, keys = ?merge_keys, "evaluating merge generator");
    let mut groups: Vec<ParameterSet> = Vec::new();
    let mut index: HashMap<Vec<String>, usize> = HashMap::new();

    for node in generators {
        let sets = evaluate(node, ctx)?;
        let mut seen = HashSet::new();

        for set in sets {
            let tuple = set
                .key_tuple(merge_keys)
                .map_err(|err| GenerationError::MissingMergeKey {
                    spec: ctx.spec.to_string(),
                    path: node.path.clone(),
                    key: match err {
                        CoreError::MissingParam(key) => key,
                        other => other.to_string(),
                    },
                })?;

            if !seen.insert(tuple.clone()) {
                return Err(GenerationError::DuplicateMergeKey {
                    spec: ctx.spec.to_string(),
                    path: node.path.clone(),
                    tuple: tuple.join(", "),
                });
            }

            match index.get(&tuple) {
                Some(&position) => groups[position].overlay(&set, merge_keys),
                None => {
                    index.insert(tuple, groups.len());
                    groups.push(set);
                }
            }
        }
    }

    Ok(groups)
}
