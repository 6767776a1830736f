use fanout_core::{
    API_VERSION, APPLICATION_KIND, APPLICATION_SET_KIND, ObjectMeta, OwnerReference,
    RESOURCES_FINALIZER, TargetDefinition,
};
use fanout_spec::{ApplicationTemplate, ValidatedSpec};
use serde_json::Value;

/// Turn a rendered template into a target owned by `spec`.
///
/// Kind, API version and owner linkage are always overwritten. Returns
/// `None` when the rendered name is empty.
pub fn normalize_target(
    rendered: ApplicationTemplate,
    spec: &ValidatedSpec,
    default_namespace: &str,
) -> Option<TargetDefinition> {
    let name = rendered.metadata.name.trim().to_string();
    if name.is_empty() {
        return None;
    }

    let namespace = rendered
        .metadata
        .namespace
        .filter(|namespace| !namespace.trim().is_empty())
        .or_else(|| spec.namespace.clone())
        .unwrap_or_else(|| default_namespace.to_string());

    let mut finalizers: Vec<String> = Vec::new();
    for finalizer in rendered.metadata.finalizers {
        if !finalizers.contains(&finalizer) {
            finalizers.push(finalizer);
        }
    }
    if !spec.preserve_resources_on_deletion
        && !finalizers.iter().any(|finalizer| finalizer == RESOURCES_FINALIZER)
    {
        finalizers.push(RESOURCES_FINALIZER.to_string());
    }

    let spec_body = match rendered.spec {
        Value::Null => Value::Object(serde_json::Map::new()),
        body => body,
    };

    Some(TargetDefinition {
        api_version: API_VERSION.to_string(),
        kind: APPLICATION_KIND.to_string(),
        metadata: ObjectMeta {
            name,
            namespace,
            labels: rendered.metadata.labels,
            annotations: rendered.metadata.annotations,
            finalizers,
            owner_references: vec![OwnerReference {
                api_version: API_VERSION.to_string(),
                kind: APPLICATION_SET_KIND.to_string(),
                name: spec.name.clone(),
                controller: true,
                block_owner_deletion: true,
            }],
        },
        spec: spec_body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fanout_spec::TemplateMetadata;

    fn spec(namespace: Option<&str>, preserve: bool) -> ValidatedSpec {
        ValidatedSpec {
            name: "fleet".to_string(),
            namespace: namespace.map(str::to_string),
            generators: Vec::new(),
            preserve_resources_on_deletion: preserve,
            warnings: Vec::new(),
        }
    }

    fn rendered(name: &str, namespace: Option<&str>, finalizers: &[&str]) -> ApplicationTemplate {
        ApplicationTemplate {
            metadata: TemplateMetadata {
                name: name.to_string(),
                namespace: namespace.map(str::to_string),
                finalizers: finalizers.iter().map(|f| f.to_string()).collect(),
                ..TemplateMetadata::default()
            },
            spec: Value::Null,
        }
    }

    #[test]
    fn stamps_identity_and_owner() {
        let target = normalize_target(rendered("a", None, &[]), &spec(None, false), "argocd")
            .expect("target");
        assert_eq!(target.api_version, API_VERSION);
        assert_eq!(target.kind, APPLICATION_KIND);
        assert_eq!(target.metadata.namespace, "argocd");
        assert_eq!(target.metadata.finalizers, vec![RESOURCES_FINALIZER.to_string()]);
        let owner = target.controller().expect("controller reference");
        assert_eq!(owner.name, "fleet");
        assert_eq!(owner.kind, APPLICATION_SET_KIND);
        assert_eq!(target.spec, serde_json::json!({}));
    }

    #[test]
    fn namespace_precedence() {
        let from_template =
            normalize_target(rendered("a", Some("apps"), &[]), &spec(Some("ops"), false), "argocd")
                .expect("target");
        assert_eq!(from_template.metadata.namespace, "apps");

        let from_spec = normalize_target(rendered("a", Some(""), &[]), &spec(Some("ops"), false), "argocd")
            .expect("target");
        assert_eq!(from_spec.metadata.namespace, "ops");
    }

    #[test]
    fn preserve_skips_finalizer_and_duplicates_collapse() {
        let target = normalize_target(
            rendered("a", None, &["custom", "custom"]),
            &spec(None, true),
            "argocd",
        )
        .expect("target");
        assert_eq!(target.metadata.finalizers, vec!["custom".to_string()]);
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(normalize_target(rendered("  ", None, &[]), &spec(None, false), "argocd").is_none());
    }
}
