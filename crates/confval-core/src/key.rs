//! # Identity Keys
//!
//! An [`IniKey`] names one resolvable unit: a `(section, option)` pair.
//! It is the node identity in the dependency graph and the key of every
//! engine-side map, so it compares and hashes by value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `(section, option)` pair.
///
/// Displays as `[section]option`, the location format used in every
/// recorded error message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IniKey {
    section: String,
    option: String,
}

impl IniKey {
    /// Create a key from a section and an option name.
    pub fn new(section: impl Into<String>, option: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            option: option.into(),
        }
    }

    /// The section name.
    pub fn section(&self) -> &str {
        &self.section
    }

    /// The option name.
    pub fn option(&self) -> &str {
        &self.option
    }

    /// Interpret a JSON value as a key reference.
    ///
    /// Dependency parameters reference their target as a two-element
    /// array of non-empty strings: `["section", "option"]`. Anything else
    /// returns `None`.
    pub fn from_reference(value: &serde_json::Value) -> Option<Self> {
        match value.as_array().map(Vec::as_slice) {
            Some([section, option]) => {
                let section = section.as_str().filter(|s| !s.is_empty())?;
                let option = option.as_str().filter(|s| !s.is_empty())?;
                Some(Self::new(section, option))
            }
            _ => None,
        }
    }
}

impl fmt::Display for IniKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}", self.section, self.option)
    }
}

impl<S: Into<String>, O: Into<String>> From<(S, O)> for IniKey {
    fn from((section, option): (S, O)) -> Self {
        Self::new(section, option)
    }
}
