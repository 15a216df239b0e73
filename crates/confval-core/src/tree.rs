//! # Result Tree
//!
//! The immutable nested mapping handed back to the caller after a
//! successful resolution run: section → option → [`Value`].
//!
//! ## Access Styles
//!
//! All of the following return the same value, and nested trees (JSON
//! objects, sub-configurations) support them recursively:
//!
//! - `tree["section"]["option"]`: key access, panics on a missing key.
//! - `tree.path("section.option")?`: dotted, attribute-style access.
//! - `tree.section("section")?.entry("option")?`: stepwise access.
//! - `tree.get("section", "option")?`: two-level convenience accessor.
//!
//! Keys are kept sorted, so equality and iteration do not depend on the
//! order in which values were resolved.

use std::collections::btree_map::{self, BTreeMap};
use std::ops::Index;

use serde::Serialize;
use thiserror::Error;

use crate::value::Value;

/// Failed lookup in a [`ResultTree`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No entry under this key.
    #[error("missing key '{0}'")]
    Missing(String),

    /// The entry exists but is a leaf, so it cannot be descended into.
    #[error("entry '{0}' is not a nested tree")]
    NotATree(String),
}

/// Nested mapping of validated values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultTree {
    entries: BTreeMap<String, Value>,
}

impl ResultTree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Top-level keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    /// The value stored under `key`.
    pub fn entry(&self, key: &str) -> Result<&Value, LookupError> {
        self.entries
            .get(key)
            .ok_or_else(|| LookupError::Missing(key.to_string()))
    }

    /// The nested tree stored under `key`.
    pub fn section(&self, key: &str) -> Result<&ResultTree, LookupError> {
        self.entry(key)?
            .as_tree()
            .ok_or_else(|| LookupError::NotATree(key.to_string()))
    }

    /// Two-level lookup: `tree[section][option]`.
    pub fn get(&self, section: &str, option: &str) -> Result<&Value, LookupError> {
        self.section(section)?.entry(option)
    }

    /// Dotted lookup: `"a.b.c"` descends through nested trees.
    ///
    /// Keys that themselves contain `.` are only reachable through
    /// [`ResultTree::section`] and [`ResultTree::entry`].
    pub fn path(&self, dotted: &str) -> Result<&Value, LookupError> {
        let mut segments = dotted.split('.');
        let first = segments.next().unwrap_or_default();
        let mut current = self.entry(first)?;
        let mut walked = first.to_string();
        for segment in segments {
            let tree = current
                .as_tree()
                .ok_or_else(|| LookupError::NotATree(walked.clone()))?;
            current = tree.entry(segment)?;
            walked.push('.');
            walked.push_str(segment);
        }
        Ok(current)
    }

    /// Convert into a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        Value::Tree(self.clone()).to_json()
    }
}

/// # Panics
///
/// Panics if `key` is absent, like indexing a `HashMap`.
impl Index<&str> for ResultTree {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        match self.entries.get(key) {
            Some(value) => value,
            None => panic!("missing key '{key}'"),
        }
    }
}

impl FromIterator<(String, Value)> for ResultTree {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ResultTree {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Float-free JSON values, nested up to a few levels.
    fn json_value_no_floats() -> impl Strategy<Value = serde_json::Value> {
        let leaf = prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-zA-Z0-9_ ]{0,20}".prop_map(serde_json::Value::String),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(serde_json::Value::Array),
                prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                    .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        /// The JSON bridge preserves float-free values exactly.
        #[test]
        fn json_bridge_is_lossless(json in json_value_no_floats()) {
            prop_assert_eq!(Value::from_json(json.clone()).to_json(), json);
        }

        /// Index, dotted path, and stepwise access return the same value.
        #[test]
        fn access_styles_agree(
            sections in prop::collection::btree_map(
                "[a-z]{1,6}",
                prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 1..5),
                1..5,
            )
        ) {
            let tree: ResultTree = sections
                .iter()
                .map(|(s, opts)| {
                    let inner: ResultTree = opts
                        .iter()
                        .map(|(o, v)| (o.clone(), Value::Int(*v)))
                        .collect();
                    (s.clone(), Value::Tree(inner))
                })
                .collect();
            for (s, opts) in &sections {
                for (o, v) in opts {
                    let dotted = format!("{s}.{o}");
                    prop_assert_eq!(&tree[s.as_str()][o.as_str()], &Value::Int(*v));
                    prop_assert_eq!(tree.path(&dotted).unwrap(), &Value::Int(*v));
                    prop_assert_eq!(tree.get(s, o).unwrap(), &Value::Int(*v));
                }
            }
            prop_assert_eq!(tree.len(), sections.len());
        }
    }
}
