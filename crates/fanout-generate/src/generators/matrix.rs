use fanout_core::ParameterSet;
use fanout_spec::GeneratorNode;
use tracing::debug;

use crate::errors::GenerationError;
use crate::generators::{GeneratorContext, evaluate};

/// Cartesian product of the nested outputs, folded left to right.
///
/// Pairs that assign different values to a shared key are dropped.
pub fn generate(
    generators: &[GeneratorNode],
    path: &str,
    ctx: &mut GeneratorContext<'_>,
) -> Result<Vec<ParameterSet>, GenerationError> {
    let mut accumulated: Option<Vec<ParameterSet>> = None;

    for node in generators {
        let sets = evaluate(node, ctx)?;
        accumulated = Some(match accumulated {
            None => sets,
            Some(left) => combine(&left, &sets, path, ctx),
        });
    }

    Ok(accumulated.unwrap_or_default())
}

fn combine(
    left: &[ParameterSet],
    right: &[ParameterSet],
    path: &str,
    ctx: &mut GeneratorContext<'_>,
) -> Vec<ParameterSet> {
    let mut combined = Vec::with_capacity(left.len() * right.len());
    for a in left {
        for b in right {
            match a.combine(b) {
                Some(set) => combined.push(set),
                None => {
                    ctx.conflicts_dropped += 1;
                    debug!(spec = %ctx.spec, path, "dropping matrix pair with conflicting values");
                }
            }
        }
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::testing::{list, params};
    use crate::model::GenerateOptions;
    use crate::render::Renderer;

    fn run(generators: &[GeneratorNode]) -> (Vec<ParameterSet>, u64) {
        let renderer = Renderer::new().expect("pattern");
        let options = GenerateOptions::default();
        let mut ctx = GeneratorContext::new("fleet", None, &options, &renderer);
        let sets = generate(generators, "/spec/generators/0/matrix", &mut ctx).expect("matrix");
        (sets, ctx.conflicts_dropped)
    }

    #[test]
    fn product_of_disjoint_outputs() {
        let (sets, dropped) = run(&[
            list("/a", vec![params(&[("cluster", "c1")]), params(&[("cluster", "c2")])]),
            list(
                "/b",
                vec![
                    params(&[("env", "dev")]),
                    params(&[("env", "prod")]),
                    params(&[("env", "qa")]),
                ],
            ),
        ]);
        assert_eq!(sets.len(), 6);
        assert_eq!(dropped, 0);
        assert_eq!(sets[0], params(&[("cluster", "c1"), ("env", "dev")]));
        assert_eq!(sets[5], params(&[("cluster", "c2"), ("env", "qa")]));
    }

    #[test]
    fn conflicting_pairs_are_dropped() {
        let (sets, dropped) = run(&[
            list(
                "/a",
                vec![
                    params(&[("app", "web"), ("tier", "front")]),
                    params(&[("app", "api")]),
                ],
            ),
            list("/b", vec![params(&[("app", "web"), ("port", "80")])]),
        ]);
        assert_eq!(sets, vec![params(&[("app", "web"), ("port", "80"), ("tier", "front")])]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn folds_three_generators() {
        let (sets, _) = run(&[
            list("/a", vec![params(&[("a", "1")]), params(&[("a", "2")])]),
            list("/b", vec![params(&[("b", "1")]), params(&[("b", "2")])]),
            list("/c", vec![params(&[("c", "1")]), params(&[("c", "2")])]),
        ]);
        assert_eq!(sets.len(), 8);
        assert_eq!(sets[7], params(&[("a", "2"), ("b", "2"), ("c", "2")]));
    }

    #[test]
    fn empty_side_yields_nothing() {
        let (sets, _) = run(&[list("/a", vec![params(&[("a", "1")])]), list("/b", Vec::new())]);
        assert!(sets.is_empty());
    }
}
