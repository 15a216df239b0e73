//! # Validators
//!
//! A validator is a predicate over one raw string that either produces a
//! [`Value`] or rejects the input with a [`ValidationError`].
//!
//! ## Construction
//!
//! Validators are registered by name and built on demand from a JSON
//! parameter map ([`Params`]) plus an [`InitContext`]. Implementations
//! declare their name and constructor through [`Plugin`]; most constructors
//! deserialize the parameters into a typed config struct with
//! [`from_params`], so unknown or mistyped parameters become
//! initialization errors without any hand-written checks.
//!
//! ## References
//!
//! A schema refers to a validator through a [`ValidatorRef`]: either a
//! registered name or an inline [`Transform`] closure, plus the parameters
//! to build it with. Shorthands accepted in JSON schemas:
//!
//! | JSON | canonical form |
//! |---|---|
//! | `"int"` | `Named("int")`, no params |
//! | `{"type": "int", "min": 3}` | `Named("int")`, `{min: 3}` |
//! | `{"min": 3}` | `Named("default")`, `{min: 3}` |
//! | `null` / absent | `Named("default")`, no params |

use std::fmt;
use std::sync::Arc;

use confval_core::{BoxError, ContextData, ValidationError, Value};
use serde::de::DeserializeOwned;

use crate::error::SchemaError;
use crate::registry::Registry;

/// Validator and feature parameters.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Name of the identity validator used when a reference names none.
pub const DEFAULT_VALIDATOR: &str = "default";

/// A predicate over one raw configuration value.
pub trait Validator: fmt::Debug + Send + Sync {
    /// Check `raw` and produce its validated value.
    fn validate(&self, raw: &str) -> Result<Value, ValidationError>;
}

/// A capability that can be registered by name and built from parameters.
///
/// Implemented by validators and by section and option features.
pub trait Plugin: Sized + 'static {
    /// Registry name.
    const NAME: &'static str;

    /// Build an instance from its parameters.
    fn build(params: Params, ctx: &InitContext<'_>) -> Result<Self, BoxError>;
}

/// What a constructor gets besides its parameters.
#[derive(Debug, Clone, Copy)]
pub struct InitContext<'a> {
    registry: &'a Registry,
    data: &'a ContextData,
}

impl<'a> InitContext<'a> {
    pub fn new(registry: &'a Registry, data: &'a ContextData) -> Self {
        Self { registry, data }
    }

    /// The registry the instance is being built from. Composite validators
    /// build their children through it.
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// The context-data snapshot of the current run.
    pub fn data(&self) -> &'a ContextData {
        self.data
    }
}

/// Deserialize a parameter map into a typed config struct.
pub fn from_params<T: DeserializeOwned>(params: Params) -> Result<T, BoxError> {
    serde_json::from_value(serde_json::Value::Object(params)).map_err(Into::into)
}

/// Accept an empty parameter map only.
pub fn no_params(params: Params) -> Result<(), BoxError> {
    #[derive(serde::Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Empty {}

    from_params::<Empty>(params).map(|_| ())
}

type TransformFn = dyn Fn(&str, &Params) -> Result<Value, ValidationError> + Send + Sync;

/// An inline, unregistered validator.
///
/// Receives the raw value and the parameter map, with dependency values
/// already filled in.
#[derive(Clone)]
pub struct Transform(Arc<TransformFn>);

impl Transform {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &Params) -> Result<Value, ValidationError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn apply(&self, raw: &str, params: &Params) -> Result<Value, ValidationError> {
        (self.0)(raw, params)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(..)")
    }
}

/// What a [`ValidatorRef`] points at.
#[derive(Debug, Clone)]
pub enum Target {
    /// A registered validator.
    Named(String),
    /// An inline closure.
    Transform(Transform),
}

/// Canonical validator reference: a target plus its parameters.
#[derive(Debug, Clone)]
pub struct ValidatorRef {
    target: Target,
    params: Params,
}

impl ValidatorRef {
    /// Reference a registered validator.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            target: Target::Named(name.into()),
            params: Params::new(),
        }
    }

    /// Reference an inline transform.
    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(&str, &Params) -> Result<Value, ValidationError> + Send + Sync + 'static,
    {
        Self {
            target: Target::Transform(Transform::new(f)),
            params: Params::new(),
        }
    }

    /// Add or replace one parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Reference `["section", "option"]` from parameter `key`.
    pub fn reference(self, key: impl Into<String>, section: &str, option: &str) -> Self {
        self.param(key, serde_json::json!([section, option]))
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Name for messages: the registered name, or `transform`.
    pub fn label(&self) -> &str {
        match &self.target {
            Target::Named(name) => name,
            Target::Transform(_) => "transform",
        }
    }

    /// Split into target and parameters.
    pub fn into_parts(self) -> (Target, Params) {
        (self.target, self.params)
    }

    /// Normalize the JSON shorthand forms.
    ///
    /// `path` locates the node in error messages.
    pub fn from_json(json: &serde_json::Value, path: &str) -> Result<Self, SchemaError> {
        match json {
            serde_json::Value::Null => Ok(Self::default()),
            serde_json::Value::String(name) if name.is_empty() => {
                Err(SchemaError::invalid(path, "validator name must not be empty"))
            }
            serde_json::Value::String(name) => Ok(Self::named(name.as_str())),
            serde_json::Value::Object(map) => {
                let mut params = map.clone();
                let name = match params.remove("type") {
                    None | Some(serde_json::Value::Null) => DEFAULT_VALIDATOR.to_string(),
                    Some(serde_json::Value::String(name)) if !name.is_empty() => name,
                    Some(other) => {
                        return Err(SchemaError::invalid(
                            format!("{path}.type"),
                            format!("expected a validator name, found {other}"),
                        ))
                    }
                };
                Ok(Self {
                    target: Target::Named(name),
                    params,
                })
            }
            other => Err(SchemaError::invalid(
                path,
                format!("expected a validator name or mapping, found {other}"),
            )),
        }
    }
}

impl Default for ValidatorRef {
    fn default() -> Self {
        Self::named(DEFAULT_VALIDATOR)
    }
}

impl From<&str> for ValidatorRef {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<Transform> for ValidatorRef {
    fn from(transform: Transform) -> Self {
        Self {
            target: Target::Transform(transform),
            params: Params::new(),
        }
    }
}

/// A [`Transform`] bound to its parameters.
#[derive(Debug)]
pub(crate) struct TransformValidator {
    transform: Transform,
    params: Params,
}

impl TransformValidator {
    pub(crate) fn new(transform: Transform, params: Params) -> Self {
        Self { transform, params }
    }
}

impl Validator for TransformValidator {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        self.transform.apply(raw, &self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn name_of(r: &ValidatorRef) -> &str {
        match r.target() {
            Target::Named(name) => name,
            Target::Transform(_) => panic!("expected a named target"),
        }
    }

    #[test]
    fn test_string_shorthand() {
        let r = ValidatorRef::from_json(&json!("int"), "S.o").unwrap();
        assert_eq!(name_of(&r), "int");
        assert!(r.params().is_empty());
    }

    #[test]
    fn test_mapping_with_type() {
        let r = ValidatorRef::from_json(&json!({"type": "int", "min": 3}), "S.o").unwrap();
        assert_eq!(name_of(&r), "int");
        assert_eq!(r.params().get("min"), Some(&json!(3)));
        assert!(!r.params().contains_key("type"));
    }

    #[test]
    fn test_mapping_without_type_uses_default() {
        let r = ValidatorRef::from_json(&json!({"min": 3}), "S.o").unwrap();
        assert_eq!(name_of(&r), DEFAULT_VALIDATOR);
        assert_eq!(r.params().len(), 1);
    }

    #[test]
    fn test_null_uses_default() {
        let r = ValidatorRef::from_json(&serde_json::Value::Null, "S.o").unwrap();
        assert_eq!(name_of(&r), DEFAULT_VALIDATOR);
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(ValidatorRef::from_json(&json!(5), "S.o").is_err());
        assert!(ValidatorRef::from_json(&json!(""), "S.o").is_err());
        assert!(ValidatorRef::from_json(&json!({"type": 1}), "S.o").is_err());
    }

    #[test]
    fn test_transform_receives_params() {
        let r = ValidatorRef::transform(|raw, params| {
            let suffix = params.get("suffix").and_then(|v| v.as_str()).unwrap_or("");
            Ok(Value::from(format!("{raw}{suffix}")))
        })
        .param("suffix", "!");
        let (target, params) = r.into_parts();
        let Target::Transform(t) = target else {
            panic!("expected a transform");
        };
        let v = TransformValidator::new(t, params);
        assert_eq!(v.validate("hi").unwrap(), "hi!");
    }

    #[test]
    fn test_from_params_rejects_unknown_fields() {
        #[derive(serde::Deserialize, Debug)]
        #[serde(deny_unknown_fields)]
        #[allow(dead_code)]
        struct Config {
            min: Option<i64>,
        }
        let mut params = Params::new();
        params.insert("max".into(), json!(3));
        assert!(from_params::<Config>(params).is_err());
    }
}
