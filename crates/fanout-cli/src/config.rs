use std::path::Path;

use fanout_generate::GenerateOptions;
use fanout_spec::SpecOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("{path}: {message}")]
    Invalid { path: String, message: String },
}

/// Settings read from the optional TOML file. Unset fields keep the
/// built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub default_namespace: Option<String>,
    pub continue_on_error: Option<bool>,
    pub include_local_cluster: Option<bool>,
    pub max_nesting_depth: Option<usize>,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub default_namespace: Option<String>,
    pub continue_on_error: bool,
}

pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    parse_settings(&content, &display)
}

pub fn parse_settings(content: &str, origin: &str) -> Result<Settings, ConfigError> {
    let settings: Settings = toml::from_str(content).map_err(|source| ConfigError::Toml {
        path: origin.to_string(),
        source,
    })?;

    if settings.max_nesting_depth == Some(0) {
        return Err(ConfigError::Invalid {
            path: origin.to_string(),
            message: "max_nesting_depth must be at least 1".to_string(),
        });
    }
    if settings
        .default_namespace
        .as_deref()
        .is_some_and(|namespace| namespace.trim().is_empty())
    {
        return Err(ConfigError::Invalid {
            path: origin.to_string(),
            message: "default_namespace must not be empty".to_string(),
        });
    }

    Ok(settings)
}

impl Settings {
    pub fn spec_options(&self) -> SpecOptions {
        let mut options = SpecOptions::default();
        if let Some(depth) = self.max_nesting_depth {
            options.max_nesting_depth = depth;
        }
        options
    }

    pub fn generate_options(&self, overrides: &Overrides) -> GenerateOptions {
        let defaults = GenerateOptions::default();
        GenerateOptions {
            default_namespace: overrides
                .default_namespace
                .clone()
                .or_else(|| self.default_namespace.clone())
                .unwrap_or(defaults.default_namespace),
            continue_on_error: overrides.continue_on_error
                || self.continue_on_error.unwrap_or(defaults.continue_on_error),
            include_local_cluster: self
                .include_local_cluster
                .unwrap_or(defaults.include_local_cluster),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_keeps_defaults() {
        let settings = parse_settings("", "fanout.toml").expect("parse");
        assert_eq!(settings, Settings::default());

        let options = settings.generate_options(&Overrides::default());
        assert_eq!(options.default_namespace, "argocd");
        assert!(!options.continue_on_error);
        assert!(!options.include_local_cluster);
        assert_eq!(settings.spec_options().max_nesting_depth, 3);
    }

    #[test]
    fn flags_override_file_values() {
        let settings = parse_settings(
            "default_namespace = \"apps\"\ninclude_local_cluster = true\nmax_nesting_depth = 2\n",
            "fanout.toml",
        )
        .expect("parse");

        let options = settings.generate_options(&Overrides {
            default_namespace: Some("ops".to_string()),
            continue_on_error: true,
        });
        assert_eq!(options.default_namespace, "ops");
        assert!(options.continue_on_error);
        assert!(options.include_local_cluster);
        assert_eq!(settings.spec_options().max_nesting_depth, 2);

        let from_file = settings.generate_options(&Overrides::default());
        assert_eq!(from_file.default_namespace, "apps");
    }

    #[test]
    fn rejects_unknown_and_invalid_fields() {
        assert!(matches!(
            parse_settings("namespace = \"x\"\n", "fanout.toml"),
            Err(ConfigError::Toml { .. })
        ));
        assert!(matches!(
            parse_settings("max_nesting_depth = 0\n", "fanout.toml"),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
