//! Option features: `default` and `sub_ini`.

use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use confval_core::{BoxError, IniKey, ValidationError, Value};
use serde::Deserialize;

use crate::error::{FeatureError, ParseError};
use crate::feature::OptionFeature;
use crate::resolve::{Completion, Resolver, ValueRequest};
use crate::schema::{OptionSchema, Schema, DEFAULT_FEATURE_KEY};
use crate::validator::{
    from_params, no_params, InitContext, Params, Plugin, Validator, ValidatorRef,
};
use crate::walk::ConfigValidator;

// ─── default ─────────────────────────────────────────────────────────

/// One `add_value` call with the descriptor's validator, dependencies and
/// default.
#[derive(Debug, Default)]
pub struct DefaultOption;

impl Plugin for DefaultOption {
    const NAME: &'static str = "default";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        no_params(params)?;
        Ok(DefaultOption)
    }
}

impl OptionFeature for DefaultOption {
    fn parse_option(
        &self,
        resolver: &mut Resolver<'_>,
        key: &IniKey,
        schema: &OptionSchema,
    ) -> Result<(), FeatureError> {
        let request = ValueRequest::new(schema.validator().clone())
            .with_depends(schema.depends().to_vec())
            .with_default(schema.default_value().map(str::to_string));
        resolver.add_value(key.clone(), request)?;
        Ok(())
    }
}

// ─── sub_ini ─────────────────────────────────────────────────────────

fn default_feature_key() -> String {
    DEFAULT_FEATURE_KEY.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SubIniConfig {
    config: serde_json::Value,
    #[serde(default = "default_feature_key")]
    feature_key: String,
}

/// Treats the option's value as the path of another configuration file and
/// validates that file against a nested schema.
///
/// The path must name an existing file. The file is read into a fork of the
/// outer source and checked by a nested [`ConfigValidator`] sharing the
/// outer registry and context data; its result tree becomes the option's
/// value. Messages from the nested run are reported under the option's
/// location.
///
/// Parameters: `config` (the nested schema, required) and `feature_key`
/// (default `__feature__`).
#[derive(Debug)]
pub struct SubIni {
    schema: Rc<Schema>,
}

impl Plugin for SubIni {
    const NAME: &'static str = "sub_ini";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: SubIniConfig = from_params(params)?;
        let schema = Schema::from_json_with_key(&config.config, &config.feature_key)?;
        Ok(SubIni {
            schema: Rc::new(schema),
        })
    }
}

impl OptionFeature for SubIni {
    fn parse_option(
        &self,
        resolver: &mut Resolver<'_>,
        key: &IniKey,
        schema: &OptionSchema,
    ) -> Result<(), FeatureError> {
        let loader = NestedLoader {
            schema: Rc::clone(&self.schema),
        };
        let request = ValueRequest::new(ValidatorRef::named("file"))
            .with_default(schema.default_value().map(str::to_string))
            .with_hooks(Rc::new(loader));
        resolver.add_value(key.clone(), request)?;
        Ok(())
    }
}

#[derive(Debug)]
struct NestedLoader {
    schema: Rc<Schema>,
}

impl Completion for NestedLoader {
    fn on_validated(
        &self,
        resolver: &mut Resolver<'_>,
        key: &IniKey,
        validator: &dyn Validator,
        raw: &str,
    ) -> Result<(), ValidationError> {
        validator.validate(raw)?;

        let mut source = resolver.source().fork();
        source
            .read(Path::new(raw))
            .map_err(|err| ValidationError::new(err.to_string()))?;
        let nested = ConfigValidator::with_registry(source, Arc::clone(resolver.registry()))
            .map_err(|err| ValidationError::new(err.to_string()))?
            .with_data(resolver.context().clone());

        tracing::debug!(
            section = key.section(),
            option = key.option(),
            path = raw,
            "validating nested configuration"
        );
        match nested.parse(&self.schema) {
            Ok(tree) => {
                resolver.store(key.clone(), Value::Tree(tree));
                Ok(())
            }
            Err(ParseError::Resolution(err)) => {
                Err(ValidationError::from_messages(err.messages().to_vec()))
            }
            Err(other) => Err(ValidationError::new(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confval_core::{ContextData, IniSource};
    use serde_json::json;

    use crate::registry::Registry;

    fn ctx_parts() -> (Registry, ContextData) {
        (Registry::new(), ContextData::new())
    }

    #[test]
    fn test_default_option_issues_one_request() {
        let source = IniSource::new();
        let mut resolver =
            Resolver::new(&source, Arc::new(Registry::builtin()), ContextData::new());
        let schema = OptionSchema::new().with_validator("int").with_default("3");
        DefaultOption
            .parse_option(&mut resolver, &IniKey::new("S", "o"), &schema)
            .unwrap();
        assert_eq!(resolver.result().unwrap()["S"]["o"], 3);
    }

    #[test]
    fn test_default_option_rejects_stray_parameters() {
        let (registry, data) = ctx_parts();
        let ctx = InitContext::new(&registry, &data);
        let mut params = Params::new();
        params.insert("defualt".into(), json!("3"));
        assert!(DefaultOption::build(params, &ctx).is_err());
    }

    #[test]
    fn test_sub_ini_requires_a_schema() {
        let (registry, data) = ctx_parts();
        let ctx = InitContext::new(&registry, &data);
        assert!(SubIni::build(Params::new(), &ctx).is_err());

        let mut params = Params::new();
        params.insert("config".into(), json!({"inner": {"x": "int"}}));
        let feature = SubIni::build(params, &ctx).unwrap();
        assert_eq!(feature.schema.len(), 1);
    }

    #[test]
    fn test_sub_ini_missing_file() {
        let mut source = IniSource::new();
        source.set("S", "sub", "/definitely/not/here.ini");
        let registry = Arc::new(Registry::builtin());
        let mut resolver = Resolver::new(&source, Arc::clone(&registry), ContextData::new());
        let feature = SubIni {
            schema: Rc::new(Schema::new()),
        };
        feature
            .parse_option(&mut resolver, &IniKey::new("S", "sub"), &OptionSchema::new())
            .unwrap();
        let err = resolver.result().unwrap_err();
        assert_eq!(
            err.messages(),
            ["error validating [S]sub: path \"/definitely/not/here.ini\" doesn't exist"]
        );
    }
}
