use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Label query over cluster records.
///
/// An empty selector matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Labels that must all be present with exactly these values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
    /// Set-based requirements; all must hold.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<LabelSelectorRequirement>,
}

/// A single set-based selector requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LabelSelectorRequirement {
    pub key: String,
    pub operator: SelectorOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// Operators supported in `matchExpressions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl LabelSelector {
    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty() && self.match_expressions.is_empty()
    }

    /// Check that every requirement carries values exactly when its
    /// operator needs them.
    pub fn validate(&self) -> Result<()> {
        for requirement in &self.match_expressions {
            if requirement.key.trim().is_empty() {
                return Err(Error::InvalidSelector(
                    "matchExpressions key must not be empty".to_string(),
                ));
            }
            match requirement.operator {
                SelectorOperator::In | SelectorOperator::NotIn => {
                    if requirement.values.is_empty() {
                        return Err(Error::InvalidSelector(format!(
                            "operator {:?} on '{}' requires values",
                            requirement.operator, requirement.key
                        )));
                    }
                }
                SelectorOperator::Exists | SelectorOperator::DoesNotExist => {
                    if !requirement.values.is_empty() {
                        return Err(Error::InvalidSelector(format!(
                            "operator {:?} on '{}' takes no values",
                            requirement.operator, requirement.key
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let labels_match = self
            .match_labels
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value));

        labels_match
            && self
                .match_expressions
                .iter()
                .all(|requirement| requirement.matches(labels))
    }
}

impl LabelSelectorRequirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let value = labels.get(&self.key);
        match self.operator {
            SelectorOperator::In => value.is_some_and(|value| self.values.contains(value)),
            SelectorOperator::NotIn => value.is_none_or(|value| !self.values.contains(value)),
            SelectorOperator::Exists => value.is_some(),
            SelectorOperator::DoesNotExist => value.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn requirement(key: &str, operator: SelectorOperator, values: &[&str]) -> LabelSelectorRequirement {
        LabelSelectorRequirement {
            key: key.to_string(),
            operator,
            values: values.iter().map(|value| value.to_string()).collect(),
        }
    }

    #[test]
    fn empty_selector_matches_everything() {
        let selector = LabelSelector::default();
        assert!(selector.matches(&labels(&[])));
        assert!(selector.matches(&labels(&[("env", "prod")])));
    }

    #[test]
    fn match_labels_require_exact_values() {
        let selector = LabelSelector {
            match_labels: labels(&[("env", "prod")]),
            match_expressions: Vec::new(),
        };
        assert!(selector.matches(&labels(&[("env", "prod"), ("region", "eu")])));
        assert!(!selector.matches(&labels(&[("env", "dev")])));
        assert!(!selector.matches(&labels(&[])));
    }

    #[test]
    fn match_expressions_cover_all_operators() {
        let cluster = labels(&[("env", "prod"), ("region", "eu")]);
        let check = |requirement| {
            LabelSelector {
                match_labels: BTreeMap::new(),
                match_expressions: vec![requirement],
            }
            .matches(&cluster)
        };

        assert!(check(requirement("env", SelectorOperator::In, &["prod", "staging"])));
        assert!(!check(requirement("env", SelectorOperator::In, &["dev"])));
        assert!(check(requirement("env", SelectorOperator::NotIn, &["dev"])));
        assert!(check(requirement("tier", SelectorOperator::NotIn, &["web"])));
        assert!(check(requirement("region", SelectorOperator::Exists, &[])));
        assert!(!check(requirement("tier", SelectorOperator::Exists, &[])));
        assert!(check(requirement("tier", SelectorOperator::DoesNotExist, &[])));
    }

    #[test]
    fn validate_rejects_in_without_values() {
        let selector = LabelSelector {
            match_labels: BTreeMap::new(),
            match_expressions: vec![requirement("env", SelectorOperator::In, &[])],
        };
        assert!(matches!(selector.validate(), Err(Error::InvalidSelector(_))));
    }

    #[test]
    fn parses_from_yaml() {
        let selector: LabelSelector = serde_yaml::from_str(
            "matchLabels:\n  env: prod\nmatchExpressions:\n  - key: region\n    operator: NotIn\n    values: [us]\n",
        )
        .expect("parse selector");
        assert_eq!(selector.match_labels.get("env").map(String::as_str), Some("prod"));
        assert_eq!(selector.match_expressions[0].operator, SelectorOperator::NotIn);
    }
}
