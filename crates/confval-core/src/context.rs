//! # Context Data
//!
//! Caller-supplied metadata made available to validators and features
//! while they are constructed (e.g. a deployment name a validator compares
//! against).
//!
//! `ContextData` is a plain value. The owner mutates it between runs; each
//! run receives a copy and every constructor receives a reference to that
//! copy, cloning whatever it keeps. Removing a key therefore only affects
//! validators built afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// String-keyed JSON metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextData {
    entries: BTreeMap<String, serde_json::Value>,
}

impl ContextData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Option<serde_json::Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
