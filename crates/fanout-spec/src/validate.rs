use std::collections::BTreeSet;

use fanout_core::{PLACEHOLDER_PATTERN, ParameterSet};
use jsonschema::JSONSchema;
use regex::Regex;
use serde_json::Value;

use crate::errors::{IssueSeverity, SpecError, ValidationIssue, ValidationReport};
use crate::model::{
    ApplicationSet, ApplicationTemplate, ClusterGenerator, ListGenerator, MatrixGenerator,
    MergeGenerator, RawGenerator,
};
use crate::tree::{GeneratorNode, GeneratorSpec, TopLevelGenerator, ValidatedSpec};

/// Default deepest generator level (top-level generators are level 1).
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 3;

/// Options applied while validating specifications.
#[derive(Debug, Clone)]
pub struct SpecOptions {
    /// Deepest allowed generator level; top-level generators are level 1.
    pub max_nesting_depth: usize,
}

impl Default for SpecOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Validate a manifest document against the ApplicationSet JSON Schema.
pub fn validate_application_set_json(
    document: &Value,
    schema: &Value,
) -> Result<ValidationReport, SpecError> {
    let compiled = JSONSchema::compile(schema).map_err(|err| SpecError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(document) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Validate a parsed specification and resolve its generator tree.
pub fn validate_application_set(
    set: &ApplicationSet,
    options: &SpecOptions,
) -> Result<ValidatedSpec, ValidationReport> {
    let mut report = ValidationReport::default();

    if set.metadata.name.trim().is_empty() {
        report.push_error(
            ValidationIssue::error("name_empty", "/metadata/name", "specification name is empty")
                .with_hint("set metadata.name; it becomes the owner of every generated target"),
        );
    }

    if set.spec.generators.is_empty() {
        report.push_error(
            ValidationIssue::error(
                "generators_empty",
                "/spec/generators",
                "specification declares no generators",
            )
            .with_hint("add at least one list, clusters, matrix or merge generator"),
        );
    }

    let placeholder = placeholder_regex();
    let mut generators = Vec::with_capacity(set.spec.generators.len());

    for (idx, raw) in set.spec.generators.iter().enumerate() {
        let path = format!("/spec/generators/{idx}");
        let node = build_node(raw, &path, 1, options, &mut report);
        let template = effective_template(&set.spec.template, raw, &path, &mut report);

        if let Some(template) = &template {
            let name_path = if raw.template.is_some() {
                format!("{path}/template/metadata/name")
            } else {
                "/spec/template/metadata/name".to_string()
            };
            check_template_name(template, &name_path, placeholder.as_ref(), &mut report);
        }

        if let (Some(node), Some(template)) = (node, template) {
            generators.push(TopLevelGenerator { node, template });
        }
    }

    if !report.is_ok() {
        return Err(report);
    }

    Ok(ValidatedSpec {
        name: set.metadata.name.clone(),
        namespace: set.metadata.namespace.clone(),
        generators,
        preserve_resources_on_deletion: set
            .spec
            .sync_policy
            .as_ref()
            .is_some_and(|policy| policy.preserve_resources_on_deletion),
        warnings: report.warnings,
    })
}

/// Validate a manifest end-to-end, returning structured issues on failure.
pub fn validate_spec(
    document: &Value,
    schema: &Value,
    options: &SpecOptions,
) -> Result<ValidatedSpec, ValidationReport> {
    let structural = match validate_application_set_json(document, schema) {
        Ok(report) => report,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::error(
                "schema_validation_error",
                "/",
                err.to_string(),
            ));
            return Err(report);
        }
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let set: ApplicationSet = match serde_json::from_value(document.clone()) {
        Ok(set) => set,
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push_error(ValidationIssue::error(
                "invalid_spec_json",
                "/",
                err.to_string(),
            ));
            return Err(report);
        }
    };

    validate_application_set(&set, options)
}

fn build_node(
    raw: &RawGenerator,
    path: &str,
    depth: usize,
    options: &SpecOptions,
    report: &mut ValidationReport,
) -> Option<GeneratorNode> {
    if depth > options.max_nesting_depth {
        report.push_error(
            ValidationIssue::error(
                "nesting_too_deep",
                path,
                format!(
                    "generator is nested {depth} levels deep; the limit is {}",
                    options.max_nesting_depth
                ),
            )
            .with_hint("flatten the matrix/merge tree or raise max_nesting_depth"),
        );
        return None;
    }

    if depth > 1 && raw.template.is_some() {
        report.push_warning(ValidationIssue::warning(
            "nested_template_ignored",
            format!("{path}/template"),
            "template overrides only apply to top-level generators",
        ));
    }

    let kinds = raw.kinds();
    match kinds.as_slice() {
        [] => {
            report.push_error(
                ValidationIssue::error(
                    "generator_kind_missing",
                    path,
                    "generator sets none of list, clusters, matrix, merge",
                )
                .with_hint("set exactly one generator kind"),
            );
            return None;
        }
        [_] => {}
        _ => {
            report.push_error(
                ValidationIssue::error(
                    "generator_kind_ambiguous",
                    path,
                    format!("generator sets several kinds: {}", kinds.join(", ")),
                )
                .with_hint("split the entry into one generator per kind"),
            );
            return None;
        }
    }

    let errors_before = report.errors.len();
    let (kind_path, spec) = if let Some(list) = &raw.list {
        let kind_path = format!("{path}/list");
        let spec = build_list(list, &kind_path, report);
        (kind_path, spec)
    } else if let Some(clusters) = &raw.clusters {
        let kind_path = format!("{path}/clusters");
        let spec = build_clusters(clusters, &kind_path, report);
        (kind_path, spec)
    } else if let Some(matrix) = &raw.matrix {
        let kind_path = format!("{path}/matrix");
        let spec = build_matrix(matrix, &kind_path, depth, options, report);
        (kind_path, spec)
    } else if let Some(merge) = &raw.merge {
        let kind_path = format!("{path}/merge");
        let spec = build_merge(merge, &kind_path, depth, options, report);
        (kind_path, spec)
    } else {
        return None;
    };

    if report.errors.len() > errors_before {
        return None;
    }

    spec.map(|spec| GeneratorNode {
        path: kind_path,
        spec,
    })
}

fn build_list(
    list: &ListGenerator,
    path: &str,
    report: &mut ValidationReport,
) -> Option<GeneratorSpec> {
    if list.elements.is_empty() {
        report.push_warning(ValidationIssue::warning(
            "list_empty",
            format!("{path}/elements"),
            "list generator has no elements and yields nothing",
        ));
    }

    let mut sets = Vec::with_capacity(list.elements.len());
    let mut valid = true;
    for (idx, element) in list.elements.iter().enumerate() {
        match flatten_element(element) {
            Ok(params) => sets.push(params),
            Err((code, message)) => {
                report.push_error(ValidationIssue::error(
                    code,
                    format!("{path}/elements/{idx}"),
                    message,
                ));
                valid = false;
            }
        }
    }

    valid.then_some(GeneratorSpec::List(sets))
}

/// Flatten one list element into a parameter set.
///
/// Scalars become strings (`null` becomes empty); a `values` object is
/// flattened to `values.<key>`.
fn flatten_element(element: &Value) -> Result<ParameterSet, (&'static str, String)> {
    let Value::Object(map) = element else {
        return Err((
            "list_element_not_object",
            "list elements must be objects of scalar values".to_string(),
        ));
    };

    let mut params = ParameterSet::new();
    for (key, value) in map {
        if key.trim().is_empty() {
            return Err(("param_key_empty", "parameter keys must not be empty".to_string()));
        }

        if key == "values"
            && let Value::Object(values) = value
        {
            for (sub_key, sub_value) in values {
                let text = scalar_to_string(sub_value).ok_or_else(|| {
                    (
                        "list_element_nested_value",
                        format!("values.{sub_key} must be a scalar"),
                    )
                })?;
                params
                    .insert(format!("values.{sub_key}"), text)
                    .map_err(|err| ("duplicate_param", err.to_string()))?;
            }
            continue;
        }

        let text = scalar_to_string(value).ok_or_else(|| {
            (
                "list_element_nested_value",
                format!("element key '{key}' holds a nested value"),
            )
        })?;
        params
            .insert(key.clone(), text)
            .map_err(|err| ("duplicate_param", err.to_string()))?;
    }

    Ok(params)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn build_clusters(
    clusters: &ClusterGenerator,
    path: &str,
    report: &mut ValidationReport,
) -> Option<GeneratorSpec> {
    let selector = clusters.selector.clone().unwrap_or_default();
    if let Err(err) = selector.validate() {
        report.push_error(ValidationIssue::error(
            "invalid_selector",
            format!("{path}/selector"),
            err.to_string(),
        ));
        return None;
    }

    if clusters.values.keys().any(|key| key.trim().is_empty()) {
        report.push_error(ValidationIssue::error(
            "param_key_empty",
            format!("{path}/values"),
            "values keys must not be empty",
        ));
        return None;
    }

    Some(GeneratorSpec::ClusterRegistry {
        selector,
        values: clusters.values.clone(),
    })
}

fn build_matrix(
    matrix: &MatrixGenerator,
    path: &str,
    depth: usize,
    options: &SpecOptions,
    report: &mut ValidationReport,
) -> Option<GeneratorSpec> {
    if matrix.generators.len() < 2 {
        report.push_error(
            ValidationIssue::error(
                "matrix_too_few_generators",
                format!("{path}/generators"),
                format!(
                    "matrix declares {} generator(s); at least two are required",
                    matrix.generators.len()
                ),
            )
            .with_hint("use the nested generator directly instead of a matrix"),
        );
    }

    let children = build_children(&matrix.generators, path, depth, options, report)?;
    Some(GeneratorSpec::Matrix(children))
}

fn build_merge(
    merge: &MergeGenerator,
    path: &str,
    depth: usize,
    options: &SpecOptions,
    report: &mut ValidationReport,
) -> Option<GeneratorSpec> {
    if merge.merge_keys.is_empty() {
        report.push_error(
            ValidationIssue::error(
                "merge_keys_empty",
                format!("{path}/mergeKeys"),
                "merge generator declares no mergeKeys",
            )
            .with_hint("name the parameter(s) that identify the same entry across generators"),
        );
    }

    let mut seen = BTreeSet::new();
    for (idx, key) in merge.merge_keys.iter().enumerate() {
        if !seen.insert(key.as_str()) {
            report.push_error(ValidationIssue::error(
                "merge_keys_duplicate",
                format!("{path}/mergeKeys/{idx}"),
                format!("merge key '{key}' is declared twice"),
            ));
        }
    }

    if merge.generators.len() < 2 {
        report.push_error(ValidationIssue::error(
            "merge_too_few_generators",
            format!("{path}/generators"),
            format!(
                "merge declares {} generator(s); at least two are required",
                merge.generators.len()
            ),
        ));
    }

    let children = build_children(&merge.generators, path, depth, options, report)?;
    Some(GeneratorSpec::Merge {
        merge_keys: merge.merge_keys.clone(),
        generators: children,
    })
}

fn build_children(
    generators: &[RawGenerator],
    path: &str,
    depth: usize,
    options: &SpecOptions,
    report: &mut ValidationReport,
) -> Option<Vec<GeneratorNode>> {
    let mut children = Vec::with_capacity(generators.len());
    let mut valid = true;
    for (idx, child) in generators.iter().enumerate() {
        let child_path = format!("{path}/generators/{idx}");
        match build_node(child, &child_path, depth + 1, options, report) {
            Some(node) => children.push(node),
            None => valid = false,
        }
    }
    valid.then_some(children)
}

fn effective_template(
    base: &ApplicationTemplate,
    raw: &RawGenerator,
    path: &str,
    report: &mut ValidationReport,
) -> Option<ApplicationTemplate> {
    let Some(overlay) = &raw.template else {
        return Some(base.clone());
    };

    match base.with_override(overlay) {
        Ok(template) => Some(template),
        Err(err) => {
            report.push_error(ValidationIssue::error(
                "invalid_template_override",
                format!("{path}/template"),
                err.to_string(),
            ));
            None
        }
    }
}

fn check_template_name(
    template: &ApplicationTemplate,
    path: &str,
    placeholder: Option<&Regex>,
    report: &mut ValidationReport,
) {
    let name = template.metadata.name.trim();
    if name.is_empty() {
        report.push_error(
            ValidationIssue::error("template_name_empty", path, "template metadata.name is empty")
                .with_hint("use a parameter such as '{{name}}' in the target name"),
        );
        return;
    }

    if let Some(placeholder) = placeholder
        && !placeholder.is_match(name)
    {
        report.push_warning(
            ValidationIssue::warning(
                "template_name_static",
                path,
                format!("every generated target will be named '{name}'"),
            )
            .with_hint("include a parameter so generated targets get distinct names"),
        );
    }
}

fn placeholder_regex() -> Option<Regex> {
    Regex::new(PLACEHOLDER_PATTERN).ok()
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
