use std::time::Instant;

use fanout_core::{TargetDefinition, TargetRegistry};
use fanout_spec::ValidatedSpec;
use tracing::{debug, info, warn};

use crate::errors::GenerationError;
use crate::generators::{GeneratorContext, evaluate};
use crate::model::{GenerateOptions, GenerationReport, SpecFailure, SpecReport};
use crate::normalize::normalize_target;
use crate::render::Renderer;

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Targets of every specification, ordered by namespace then name.
    pub targets: Vec<TargetDefinition>,
    pub report: GenerationReport,
}

/// Entry point for expanding specifications into target definitions.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    /// Expand `specs` against a registry snapshot.
    ///
    /// `None` means no registry is available; any cluster generator then
    /// fails its specification.
    pub fn run(
        &self,
        specs: &[ValidatedSpec],
        registry: Option<&dyn TargetRegistry>,
    ) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();
        let renderer = Renderer::new()?;
        let records = match registry.map(|registry| registry.clusters()) {
            Some(Ok(records)) => records.len() as u64,
            Some(Err(err)) => {
                warn!(error = %err, "registry lookup failed");
                0
            }
            None => 0,
        };

        let mut report = GenerationReport::new(records);
        let mut targets = Vec::new();

        info!(
            specs = specs.len(),
            records,
            continue_on_error = self.options.continue_on_error,
            "generation started"
        );

        for spec in specs {
            let identity = spec.identity();
            match self.generate_spec(spec, &identity, registry, &renderer) {
                Ok((spec_targets, spec_report)) => {
                    info!(
                        spec = %identity,
                        targets = spec_report.targets,
                        conflicts_dropped = spec_report.conflicts_dropped,
                        "specification generated"
                    );
                    targets.extend(spec_targets);
                    report.record_spec(spec_report);
                }
                Err(err) if self.options.continue_on_error => {
                    warn!(spec = %identity, error = %err, "skipping failed specification");
                    report.record_failure(SpecFailure {
                        spec: identity,
                        code: err.code().to_string(),
                        message: err.to_string(),
                    });
                }
                Err(err) => {
                    warn!(spec = %identity, error = %err, "generation failed");
                    return Err(err);
                }
            }
        }

        targets.sort_by(|left, right| left.sort_key().cmp(&right.sort_key()));

        info!(
            specs = report.specs_processed,
            records = report.records_processed,
            targets = targets.len(),
            failures = report.failures.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "generation completed"
        );

        Ok(GenerationResult { targets, report })
    }

    fn generate_spec(
        &self,
        spec: &ValidatedSpec,
        identity: &str,
        registry: Option<&dyn TargetRegistry>,
        renderer: &Renderer,
    ) -> Result<(Vec<TargetDefinition>, SpecReport), GenerationError> {
        let mut ctx = GeneratorContext::new(identity, registry, &self.options, renderer);
        let mut targets = Vec::new();
        let mut parameter_sets = 0_u64;

        for top in &spec.generators {
            let sets = evaluate(&top.node, &mut ctx)?;
            debug!(
                spec = %identity,
                path = %top.node.path,
                kind = top.node.spec.kind(),
                parameter_sets = sets.len(),
                "generator evaluated"
            );
            parameter_sets += sets.len() as u64;

            for (entry, params) in sets.iter().enumerate() {
                let rendered = renderer.render_template(&top.template, params).map_err(|source| {
                    GenerationError::Render {
                        spec: identity.to_string(),
                        path: top.node.path.clone(),
                        entry,
                        source,
                    }
                })?;
                let target = normalize_target(rendered, spec, &self.options.default_namespace)
                    .ok_or_else(|| GenerationError::EmptyName {
                        spec: identity.to_string(),
                        path: top.node.path.clone(),
                        entry,
                    })?;
                targets.push(target);
            }
        }

        let report = SpecReport {
            spec: identity.to_string(),
            parameter_sets,
            targets: targets.len() as u64,
            conflicts_dropped: ctx.conflicts_dropped,
        };
        Ok((targets, report))
    }
}
