//! # Schema Model
//!
//! The typed form of the caller's declarative schema:
//! section → option → [`OptionSchema`].
//!
//! ## Authoring
//!
//! Schemas are either built in code:
//!
//! ```
//! use confval_engine::{OptionSchema, Schema, SectionSchema};
//!
//! let schema = Schema::new().section(
//!     "server",
//!     SectionSchema::new()
//!         .option("port", OptionSchema::new().with_validator("port"))
//!         .option("name", OptionSchema::new().with_default("localhost")),
//! );
//! assert_eq!(schema.len(), 1);
//! ```
//!
//! or normalized once from JSON/YAML:
//!
//! ```json
//! {
//!   "server": {
//!     "port": "port",
//!     "name": {"validator": "str", "default": "localhost"},
//!     "limit": {"validator": {"type": "int", "min": ["server", "floor"]},
//!               "depends": ["min"]}
//!   },
//!   "extra": {"__feature__": "raw_section_input", "validator": "int"}
//! }
//! ```
//!
//! ## Sections
//!
//! Each section names a section feature under the feature key (default
//! `__feature__`). For the `default` feature the remaining entries are
//! option descriptors; any other feature receives them verbatim as its
//! parameters.
//!
//! ## Options
//!
//! A descriptor is either a validator name (shorthand for
//! `{"validator": name}`) or a mapping with the reserved keys `feature`,
//! `validator`, `default` and `depends`. Every other key is passed to the
//! option feature as a parameter. Defaults are text, like every raw value.
//!
//! Declaration order is preserved so a run walks sections in the order they
//! were written.

use indexmap::IndexMap;

use crate::error::SchemaError;
use crate::validator::{Params, ValidatorRef};

/// Name of the section and option feature used when none is given.
pub const DEFAULT_FEATURE: &str = "default";

/// Default section-level key naming the section feature.
pub const DEFAULT_FEATURE_KEY: &str = "__feature__";

/// Option-level key naming the option feature.
pub const OPTION_FEATURE_KEY: &str = "feature";

// ─── Schema ──────────────────────────────────────────────────────────

/// A complete schema: sections in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    sections: IndexMap<String, SectionSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a section.
    pub fn section(mut self, name: impl Into<String>, section: SectionSchema) -> Self {
        self.insert(name, section);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, section: SectionSchema) {
        self.sections.insert(name.into(), section);
    }

    pub fn get(&self, name: &str) -> Option<&SectionSchema> {
        self.sections.get(name)
    }

    /// Sections in declaration order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &SectionSchema)> {
        self.sections.iter().map(|(name, s)| (name.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Normalize a JSON schema using the default feature key.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, SchemaError> {
        Self::from_json_with_key(json, DEFAULT_FEATURE_KEY)
    }

    /// Normalize a JSON schema, reading section features from
    /// `feature_key`.
    pub fn from_json_with_key(
        json: &serde_json::Value,
        feature_key: &str,
    ) -> Result<Self, SchemaError> {
        let map = json
            .as_object()
            .ok_or_else(|| SchemaError::invalid("<root>", "expected a mapping of sections"))?;
        let mut schema = Schema::new();
        for (name, section) in map {
            if name.is_empty() {
                return Err(SchemaError::invalid("<root>", "section names must not be empty"));
            }
            schema.insert(name, SectionSchema::from_json(section, name, feature_key)?);
        }
        Ok(schema)
    }

    /// Normalize a YAML schema using the default feature key.
    pub fn from_yaml(text: &str) -> Result<Self, SchemaError> {
        Self::from_yaml_with_key(text, DEFAULT_FEATURE_KEY)
    }

    pub fn from_yaml_with_key(text: &str, feature_key: &str) -> Result<Self, SchemaError> {
        let json: serde_json::Value = serde_yaml::from_str(text)?;
        Self::from_json_with_key(&json, feature_key)
    }
}

// ─── Sections ────────────────────────────────────────────────────────

/// One section: its feature and either option descriptors or raw feature
/// parameters.
#[derive(Debug, Clone)]
pub struct SectionSchema {
    feature: String,
    options: IndexMap<String, OptionSchema>,
    params: Params,
}

impl Default for SectionSchema {
    fn default() -> Self {
        Self {
            feature: DEFAULT_FEATURE.to_string(),
            options: IndexMap::new(),
            params: Params::new(),
        }
    }
}

impl SectionSchema {
    /// A section handled by the default feature.
    pub fn new() -> Self {
        Self::default()
    }

    /// A section handled by the named feature.
    pub fn with_feature(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            ..Self::default()
        }
    }

    /// Add (or replace) an option descriptor.
    pub fn option(mut self, name: impl Into<String>, option: OptionSchema) -> Self {
        self.options.insert(name.into(), option);
        self
    }

    /// Add (or replace) a feature parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Option descriptors in declaration order.
    pub fn options(&self) -> impl Iterator<Item = (&str, &OptionSchema)> {
        self.options.iter().map(|(name, o)| (name.as_str(), o))
    }

    pub fn get_option(&self, name: &str) -> Option<&OptionSchema> {
        self.options.get(name)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    fn from_json(
        json: &serde_json::Value,
        section: &str,
        feature_key: &str,
    ) -> Result<Self, SchemaError> {
        let map = json
            .as_object()
            .ok_or_else(|| SchemaError::invalid(section, "expected a mapping of options"))?;
        let mut entries = map.clone();
        let feature = match entries.remove(feature_key) {
            None | Some(serde_json::Value::Null) => DEFAULT_FEATURE.to_string(),
            Some(serde_json::Value::String(name)) if !name.is_empty() => name,
            Some(other) => {
                return Err(SchemaError::invalid(
                    format!("{section}.{feature_key}"),
                    format!("expected a section feature name, found {other}"),
                ))
            }
        };

        if feature != DEFAULT_FEATURE {
            return Ok(Self {
                feature,
                options: IndexMap::new(),
                params: entries,
            });
        }

        let mut options = IndexMap::new();
        for (name, descriptor) in &entries {
            if name.is_empty() {
                return Err(SchemaError::invalid(section, "option names must not be empty"));
            }
            let path = format!("{section}.{name}");
            options.insert(name.clone(), OptionSchema::from_json(descriptor, &path)?);
        }
        Ok(Self {
            feature,
            options,
            params: Params::new(),
        })
    }
}

// ─── Options ─────────────────────────────────────────────────────────

/// One option descriptor.
#[derive(Debug, Clone)]
pub struct OptionSchema {
    feature: String,
    validator: ValidatorRef,
    default: Option<String>,
    depends: Vec<String>,
    params: Params,
}

impl Default for OptionSchema {
    fn default() -> Self {
        Self {
            feature: DEFAULT_FEATURE.to_string(),
            validator: ValidatorRef::default(),
            default: None,
            depends: Vec::new(),
            params: Params::new(),
        }
    }
}

impl OptionSchema {
    /// A required option checked by the identity validator.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validator(mut self, validator: impl Into<ValidatorRef>) -> Self {
        self.validator = validator.into();
        self
    }

    /// Raw text used when the source has no value.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Validator parameters that hold `[section, option]` references.
    pub fn with_depends<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = feature.into();
        self
    }

    /// Add an option-feature parameter.
    pub fn with_param(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }

    pub fn validator(&self) -> &ValidatorRef {
        &self.validator
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn depends(&self) -> &[String] {
        &self.depends
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Normalize one JSON descriptor. `path` locates it in messages.
    pub fn from_json(json: &serde_json::Value, path: &str) -> Result<Self, SchemaError> {
        let map = match json {
            serde_json::Value::String(_) => {
                return Ok(Self::new().with_validator(ValidatorRef::from_json(json, path)?))
            }
            serde_json::Value::Object(map) => map,
            other => {
                return Err(SchemaError::invalid(
                    path,
                    format!("expected a validator name or option mapping, found {other}"),
                ))
            }
        };

        let mut option = Self::new();
        for (key, value) in map {
            match key.as_str() {
                OPTION_FEATURE_KEY => match value {
                    serde_json::Value::String(name) if !name.is_empty() => {
                        option.feature = name.clone();
                    }
                    serde_json::Value::Null => {}
                    other => {
                        return Err(SchemaError::invalid(
                            format!("{path}.{key}"),
                            format!("expected an option feature name, found {other}"),
                        ))
                    }
                },
                "validator" => {
                    option.validator =
                        ValidatorRef::from_json(value, &format!("{path}.validator"))?;
                }
                "default" => match value {
                    serde_json::Value::String(text) => option.default = Some(text.clone()),
                    serde_json::Value::Null => {}
                    other => {
                        return Err(SchemaError::invalid(
                            format!("{path}.default"),
                            format!("defaults are raw text, found {other}"),
                        ))
                    }
                },
                "depends" => option.depends = depends_from_json(value, path)?,
                _ => {
                    option.params.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(option)
    }
}

/// Parse a `depends` list of parameter names.
pub(crate) fn depends_from_json(
    value: &serde_json::Value,
    path: &str,
) -> Result<Vec<String>, SchemaError> {
    let invalid = || {
        SchemaError::invalid(
            format!("{path}.depends"),
            "expected a list of parameter names",
        )
    };
    match value {
        serde_json::Value::Null => Ok(Vec::new()),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}
