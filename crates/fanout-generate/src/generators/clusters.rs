use std::collections::BTreeMap;

use fanout_core::cluster::LOCAL_CLUSTER_SERVER;
use fanout_core::{ClusterRecord, LabelSelector, ParameterSet};
use tracing::debug;

use crate::errors::GenerationError;
use crate::generators::GeneratorContext;

/// One parameter set per registry record matching `selector`.
pub fn generate(
    selector: &LabelSelector,
    values: &BTreeMap<String, String>,
    path: &str,
    ctx: &mut GeneratorContext<'_>,
) -> Result<Vec<ParameterSet>, GenerationError> {
    let registry = ctx
        .registry
        .ok_or_else(|| GenerationError::RegistryUnavailable {
            spec: ctx.spec.to_string(),
            path: path.to_string(),
        })?;

    let mut records = registry
        .clusters()
        .map_err(|source| GenerationError::Registry {
            spec: ctx.spec.to_string(),
            path: path.to_string(),
            source,
        })?;

    if ctx.options.include_local_cluster
        && selector.is_empty()
        && !records
            .iter()
            .any(|record| record.server == LOCAL_CLUSTER_SERVER)
    {
        records.push(ClusterRecord::local());
    }

    let total = records.len();
    let mut sets = Vec::new();
    for (entry, record) in records
        .iter()
        .filter(|record| selector.matches(&record.labels))
        .enumerate()
    {
        sets.push(record_params(record, values, path, entry, ctx)?);
    }

    debug!(
        spec = %ctx.spec,
        path,
        records = total,
        matched = sets.len(),
        "cluster generator evaluated"
    );
    Ok(sets)
}

fn record_params(
    record: &ClusterRecord,
    values: &BTreeMap<String, String>,
    path: &str,
    entry: usize,
    ctx: &GeneratorContext<'_>,
) -> Result<ParameterSet, GenerationError> {
    let mut params = ParameterSet::new();
    params.set("name", record.name.as_str());
    params.set("nameNormalized", record.normalized_name());
    params.set("server", record.server.as_str());
    for (key, value) in &record.labels {
        params.set(format!("metadata.labels.{key}"), value.as_str());
    }
    for (key, value) in &record.annotations {
        params.set(format!("metadata.annotations.{key}"), value.as_str());
    }

    let mut rendered = Vec::with_capacity(values.len());
    for (key, template) in values {
        let value = ctx
            .renderer
            .render_str(template, &params, &format!("{path}/values/{key}"))
            .map_err(|source| GenerationError::Render {
                spec: ctx.spec.to_string(),
                path: path.to_string(),
                entry,
                source,
            })?;
        rendered.push((format!("values.{key}"), value));
    }
    for (key, value) in rendered {
        params.set(key, value);
    }

    Ok(params)
}
