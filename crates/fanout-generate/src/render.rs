use fanout_core::{PLACEHOLDER_PATTERN, ParameterSet};
use fanout_spec::ApplicationTemplate;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Failure to substitute a parameter set into a template.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{field}: parameter '{key}' is not defined")]
    MissingKey { key: String, field: String },
    #[error("rendered template is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Placeholder substitution over strings and documents.
///
/// Only string values are rendered; mapping keys and non-string scalars are
/// copied unchanged. The input is never mutated.
#[derive(Debug, Clone)]
pub struct Renderer {
    pattern: Regex,
}

impl Renderer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(PLACEHOLDER_PATTERN)?,
        })
    }

    /// Substitute every placeholder of `input`. `field` locates the string in
    /// error messages.
    pub fn render_str(
        &self,
        input: &str,
        params: &ParameterSet,
        field: &str,
    ) -> Result<String, RenderError> {
        let mut rendered = String::with_capacity(input.len());
        let mut last = 0;

        for captures in self.pattern.captures_iter(input) {
            let (Some(whole), Some(key)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let value = params
                .get(key.as_str())
                .ok_or_else(|| RenderError::MissingKey {
                    key: key.as_str().to_string(),
                    field: field.to_string(),
                })?;
            rendered.push_str(&input[last..whole.start()]);
            rendered.push_str(value);
            last = whole.end();
        }

        rendered.push_str(&input[last..]);
        Ok(rendered)
    }

    /// Render every string leaf of a document.
    pub fn render_value(
        &self,
        value: &Value,
        params: &ParameterSet,
        field: &str,
    ) -> Result<Value, RenderError> {
        match value {
            Value::String(text) => Ok(Value::String(self.render_str(text, params, field)?)),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| self.render_value(item, params, &format!("{field}/{idx}")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut rendered = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    let child = self.render_value(item, params, &format!("{field}/{key}"))?;
                    rendered.insert(key.clone(), child);
                }
                Ok(Value::Object(rendered))
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => Ok(value.clone()),
        }
    }

    /// Render a whole template: metadata fields and every string of `spec`.
    pub fn render_template(
        &self,
        template: &ApplicationTemplate,
        params: &ParameterSet,
    ) -> Result<ApplicationTemplate, RenderError> {
        let document = serde_json::to_value(template)?;
        let rendered = self.render_value(&document, params, "")?;
        Ok(serde_json::from_value(rendered)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ParameterSet {
        ParameterSet::from_pairs(pairs.iter().copied()).expect("unique keys")
    }

    #[test]
    fn substitutes_with_and_without_spaces() {
        let renderer = Renderer::new().expect("pattern");
        let rendered = renderer
            .render_str(
                "{{name}}-{{ values.env }}-x",
                &params(&[("name", "c1"), ("values.env", "dev")]),
                "/metadata/name",
            )
            .expect("render");
        assert_eq!(rendered, "c1-dev-x");
    }

    #[test]
    fn missing_key_is_an_error() {
        let renderer = Renderer::new().expect("pattern");
        let err = renderer
            .render_str("{{region}}", &params(&[("name", "a")]), "/spec/region")
            .expect_err("missing key");
        match err {
            RenderError::MissingKey { key, field } => {
                assert_eq!(key, "region");
                assert_eq!(field, "/spec/region");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn renders_nested_leaves_but_not_keys() {
        let renderer = Renderer::new().expect("pattern");
        let document = serde_json::json!({
            "{{name}}": "{{name}}",
            "list": ["{{server}}", 3, true, null],
        });
        let rendered = renderer
            .render_value(
                &document,
                &params(&[("name", "a"), ("server", "https://a")]),
                "",
            )
            .expect("render");
        assert_eq!(
            rendered,
            serde_json::json!({
                "{{name}}": "a",
                "list": ["https://a", 3, true, null],
            })
        );
    }

    #[test]
    fn template_is_left_untouched() {
        let renderer = Renderer::new().expect("pattern");
        let template: ApplicationTemplate = serde_json::from_value(serde_json::json!({
            "metadata": { "name": "{{name}}", "labels": { "env": "{{env}}" } },
            "spec": { "project": "default" }
        }))
        .expect("template");
        let rendered = renderer
            .render_template(&template, &params(&[("name", "a"), ("env", "dev")]))
            .expect("render");
        assert_eq!(rendered.metadata.name, "a");
        assert_eq!(rendered.metadata.labels.get("env").map(String::as_str), Some("dev"));
        assert_eq!(template.metadata.name, "{{name}}");
    }
}
