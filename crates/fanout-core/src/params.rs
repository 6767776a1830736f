use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// String-keyed parameters produced by a generator and consumed by the
/// template renderer.
///
/// Keys are kept in lexicographic order so that iteration, serialization and
/// anything derived from them is reproducible across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<String, String>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from key/value pairs, rejecting repeated keys.
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.insert(key, value)?;
        }
        Ok(params)
    }

    /// Insert a new key. A key that is already present is an error; use
    /// [`ParameterSet::set`] when overriding is intended.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        match self.0.entry(key.into()) {
            btree_map::Entry::Occupied(entry) => Err(Error::DuplicateParam(entry.key().clone())),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(value.into());
                Ok(())
            }
        }
    }

    /// Insert or override a key, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Combine two sets for a matrix cell.
    ///
    /// Returns `None` when both sets assign different values to a shared key;
    /// shared keys with equal values appear once in the result.
    pub fn combine(&self, other: &ParameterSet) -> Option<ParameterSet> {
        let mut combined = self.clone();
        for (key, value) in &other.0 {
            match combined.0.get(key) {
                Some(existing) if existing != value => return None,
                Some(_) => {}
                None => {
                    combined.0.insert(key.clone(), value.clone());
                }
            }
        }
        Some(combined)
    }

    /// Apply `other` on top of this set, leaving `keys` untouched.
    ///
    /// Fields present in `other` override ours; fields `other` does not
    /// mention are kept.
    pub fn overlay(&mut self, other: &ParameterSet, keys: &[String]) {
        for (key, value) in &other.0 {
            if keys.iter().any(|merge_key| merge_key == key) {
                continue;
            }
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Values of `keys`, in the order given.
    pub fn key_tuple(&self, keys: &[String]) -> Result<Vec<String>> {
        keys.iter()
            .map(|key| {
                self.0
                    .get(key)
                    .cloned()
                    .ok_or_else(|| Error::MissingParam(key.clone()))
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ParameterSet {
        ParameterSet::from_pairs(pairs.iter().copied()).expect("unique keys")
    }

    #[test]
    fn rejects_repeated_keys() {
        let err = ParameterSet::from_pairs([("env", "dev"), ("env", "prod")]).unwrap_err();
        assert!(matches!(err, Error::DuplicateParam(key) if key == "env"));
    }

    #[test]
    fn combine_unions_disjoint_sets() {
        let combined = params(&[("cluster", "c1")])
            .combine(&params(&[("env", "dev")]))
            .expect("no conflict");
        assert_eq!(combined, params(&[("cluster", "c1"), ("env", "dev")]));
    }

    #[test]
    fn combine_deduplicates_equal_shared_keys() {
        let combined = params(&[("cluster", "c1"), ("env", "dev")])
            .combine(&params(&[("env", "dev"), ("tier", "web")]))
            .expect("no conflict");
        assert_eq!(combined.len(), 3);
        assert_eq!(combined.get("env"), Some("dev"));
    }

    #[test]
    fn combine_drops_conflicting_values() {
        let left = params(&[("env", "dev")]);
        let right = params(&[("env", "prod")]);
        assert!(left.combine(&right).is_none());
    }

    #[test]
    fn overlay_overrides_and_keeps_untouched_fields() {
        let mut base = params(&[("k", "x"), ("a", "1"), ("c", "keep")]);
        base.overlay(&params(&[("k", "x"), ("a", "2"), ("b", "3")]), &["k".to_string()]);
        assert_eq!(
            base,
            params(&[("k", "x"), ("a", "2"), ("b", "3"), ("c", "keep")])
        );
    }

    #[test]
    fn key_tuple_reports_missing_key() {
        let set = params(&[("k", "x")]);
        assert_eq!(
            set.key_tuple(&["k".to_string()]).expect("present"),
            vec!["x".to_string()]
        );
        let err = set
            .key_tuple(&["k".to_string(), "region".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::MissingParam(key) if key == "region"));
    }
}
