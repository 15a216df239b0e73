//! # Config Sources
//!
//! The narrow capability surface the engine consumes from the embedding
//! program's configuration parser, plus [`IniSource`], a small in-memory
//! reference implementation.
//!
//! ## Contract
//!
//! A source answers four questions: does `section/option` exist, what is
//! its raw text, which options does a section hold, and "load yourself from
//! this path". [`ConfigSource::fork`] creates a fresh, empty source of the
//! same kind and settings; the sub-configuration feature forks the outer
//! source and reads the referenced file into the fork.
//!
//! Adapters over parsers that cannot do everything report the gaps through
//! [`ConfigSource::supports`]; the engine refuses such sources at
//! construction time.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::{SourceError, SourceOperation};

/// Capability surface of a configuration parser.
pub trait ConfigSource: fmt::Debug {
    /// Whether `section` holds `option`.
    fn has_option(&self, section: &str, option: &str) -> bool;

    /// Raw text of `section/option`, if present.
    fn get(&self, section: &str, option: &str) -> Option<String>;

    /// Option names of `section` in source order; empty if the section is
    /// absent.
    fn options(&self, section: &str) -> Vec<String>;

    /// Load (and merge) the file at `path`.
    fn read(&mut self, path: &Path) -> Result<(), SourceError>;

    /// A fresh, empty source configured like this one.
    fn fork(&self) -> Box<dyn ConfigSource>;

    /// Whether this source implements `operation`.
    fn supports(&self, operation: SourceOperation) -> bool {
        let _ = operation;
        true
    }
}

impl<T: ConfigSource + ?Sized> ConfigSource for Box<T> {
    fn has_option(&self, section: &str, option: &str) -> bool {
        (**self).has_option(section, option)
    }

    fn get(&self, section: &str, option: &str) -> Option<String> {
        (**self).get(section, option)
    }

    fn options(&self, section: &str) -> Vec<String> {
        (**self).options(section)
    }

    fn read(&mut self, path: &Path) -> Result<(), SourceError> {
        (**self).read(path)
    }

    fn fork(&self) -> Box<dyn ConfigSource> {
        (**self).fork()
    }

    fn supports(&self, operation: SourceOperation) -> bool {
        (**self).supports(operation)
    }
}

/// In-memory ini-style source.
///
/// Understands `[section]` headers, `key = value` and `key: value` pairs,
/// `#`/`;` comment lines, and indented continuation lines (joined with a
/// newline). Later assignments to the same key win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniSource {
    sections: IndexMap<String, IndexMap<String, String>>,
    lowercase_options: bool,
}

impl IniSource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold option names to lowercase on insert and lookup.
    pub fn lowercase_options(mut self, enabled: bool) -> Self {
        self.lowercase_options = enabled;
        self
    }

    /// Set `section/option` to `value`, creating the section if needed.
    pub fn set(
        &mut self,
        section: impl Into<String>,
        option: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        let option = self.fold(option.into());
        self.sections
            .entry(section.into())
            .or_default()
            .insert(option, value.into());
        self
    }

    /// Remove `section/option`, returning its value.
    pub fn remove(&mut self, section: &str, option: &str) -> Option<String> {
        let option = self.fold(option.to_string());
        self.sections.get_mut(section)?.shift_remove(&option)
    }

    /// Section names in source order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Parse ini text and merge it into this source.
    ///
    /// `origin` names the input in syntax errors.
    pub fn read_str(&mut self, text: &str, origin: &str) -> Result<(), SourceError> {
        let mut section: Option<String> = None;
        let mut last_option: Option<String> = None;

        for (index, raw_line) in text.lines().enumerate() {
            let line_no = index + 1;
            let syntax = |reason: &str| SourceError::Syntax {
                origin: origin.to_string(),
                line: line_no,
                reason: reason.to_string(),
            };
            let trimmed = raw_line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            let indented = raw_line.starts_with(' ') || raw_line.starts_with('\t');
            if indented {
                if let (Some(s), Some(o)) = (&section, &last_option) {
                    if let Some(value) = self.sections.get_mut(s).and_then(|m| m.get_mut(o)) {
                        value.push('\n');
                        value.push_str(trimmed);
                        continue;
                    }
                }
            }

            if let Some(rest) = trimmed.strip_prefix('[') {
                let name = rest
                    .strip_suffix(']')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| syntax("malformed section header"))?;
                self.sections.entry(name.to_string()).or_default();
                section = Some(name.to_string());
                last_option = None;
                continue;
            }

            let current = section
                .clone()
                .ok_or_else(|| syntax("option outside of a section"))?;
            let split_at = trimmed
                .find(['=', ':'])
                .ok_or_else(|| syntax("expected 'key = value'"))?;
            let key = trimmed[..split_at].trim();
            if key.is_empty() {
                return Err(syntax("empty option name"));
            }
            let value = trimmed[split_at + 1..].trim();
            let key = self.fold(key.to_string());
            self.set(current, key.clone(), value);
            last_option = Some(key);
        }
        Ok(())
    }

    fn fold(&self, option: String) -> String {
        if self.lowercase_options {
            option.to_lowercase()
        } else {
            option
        }
    }
}

impl FromStr for IniSource {
    type Err = SourceError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut source = IniSource::new();
        source.read_str(text, "<string>")?;
        Ok(source)
    }
}

impl ConfigSource for IniSource {
    fn has_option(&self, section: &str, option: &str) -> bool {
        let option = self.fold(option.to_string());
        self.sections
            .get(section)
            .is_some_and(|s| s.contains_key(&option))
    }

    fn get(&self, section: &str, option: &str) -> Option<String> {
        let option = self.fold(option.to_string());
        self.sections.get(section)?.get(&option).cloned()
    }

    fn options(&self, section: &str) -> Vec<String> {
        self.sections
            .get(section)
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn read(&mut self, path: &Path) -> Result<(), SourceError> {
        let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.read_str(&text, &path.display().to_string())
    }

    fn fork(&self) -> Box<dyn ConfigSource> {
        Box::new(IniSource::new().lowercase_options(self.lowercase_options))
    }
}
