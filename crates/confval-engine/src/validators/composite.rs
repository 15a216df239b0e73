//! Composite validators: `or`, `and`, `one-off`.
//!
//! All three take the same parameters:
//!
//! - `validators`: child references (names or `{"type": ..}` mappings)
//! - `kwargs`: parameters applied to every child
//! - any other key `<child>_<param>` is routed to `param` of every child
//!   named `<child>`; keys that match no child are treated like `kwargs`.
//!
//! Routing makes dependencies work through composites: declaring
//! `depends: ["int_min"]` with `int_min: ["S", "floor"]` fills the `min`
//! parameter of the `int` child once `[S]floor` resolves.

use confval_core::{BoxError, ValidationError, Value};
use serde::Deserialize;

use crate::invoke;
use crate::validator::{
    from_params, InitContext, Params, Plugin, Target, Validator, ValidatorRef,
};

#[derive(Deserialize)]
struct CompositeConfig {
    validators: Vec<serde_json::Value>,
    #[serde(default)]
    kwargs: Option<Params>,
    #[serde(flatten)]
    routed: Params,
}

/// The built children of a composite validator.
#[derive(Debug)]
struct Children {
    validators: Vec<Box<dyn Validator>>,
}

impl Children {
    fn build(params: Params, ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: CompositeConfig = from_params(params)?;
        let mut children: Vec<(Target, Params)> = config
            .validators
            .iter()
            .enumerate()
            .map(|(index, json)| {
                ValidatorRef::from_json(json, &format!("validators[{index}]"))
                    .map(ValidatorRef::into_parts)
            })
            .collect::<Result<_, _>>()?;

        let mut shared = config.kwargs.unwrap_or_default();
        for (key, value) in config.routed {
            let mut routed = false;
            if let Some((child_name, param)) = key.split_once('_') {
                for (target, params) in &mut children {
                    if matches!(target, Target::Named(name) if name.as_str() == child_name) {
                        params.insert(param.to_string(), value.clone());
                        routed = true;
                    }
                }
            }
            if !routed {
                shared.insert(key, value);
            }
        }

        let validators = children
            .into_iter()
            .map(|(target, mut params)| {
                for (key, value) in &shared {
                    params.insert(key.clone(), value.clone());
                }
                invoke::instantiate(&target, params, ctx)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Children { validators })
    }

    /// Run every child, splitting successes from failures.
    fn run_all(&self, raw: &str) -> (usize, Option<ValidationError>) {
        let mut passed = 0;
        let mut failure: Option<ValidationError> = None;
        for child in &self.validators {
            match child.validate(raw) {
                Ok(_) => passed += 1,
                Err(err) => match &mut failure {
                    Some(all) => all.merge(err),
                    None => failure = Some(err),
                },
            }
        }
        (passed, failure)
    }
}

/// `or`: at least one child accepts the input. The raw text is returned.
#[derive(Debug)]
pub struct Or(Children);

impl Plugin for Or {
    const NAME: &'static str = "or";

    fn build(params: Params, ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        Children::build(params, ctx).map(Or)
    }
}

impl Validator for Or {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        match self.0.run_all(raw) {
            (0, Some(failure)) => Err(failure),
            (0, None) => Err(ValidationError::new("no validators configured")),
            _ => Ok(Value::from(raw)),
        }
    }
}

/// `and`: every child accepts the input. The raw text is returned.
#[derive(Debug)]
pub struct And(Children);

impl Plugin for And {
    const NAME: &'static str = "and";

    fn build(params: Params, ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        Children::build(params, ctx).map(And)
    }
}

impl Validator for And {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        match self.0.run_all(raw) {
            (_, Some(failure)) => Err(failure),
            (_, None) => Ok(Value::from(raw)),
        }
    }
}

/// `one-off`: the value produced by the first child that accepts the input.
#[derive(Debug)]
pub struct OneOff(Children);

impl Plugin for OneOff {
    const NAME: &'static str = "one-off";

    fn build(params: Params, ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        Children::build(params, ctx).map(OneOff)
    }
}

impl Validator for OneOff {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        let mut failure: Option<ValidationError> = None;
        for child in &self.0.validators {
            match child.validate(raw) {
                Ok(value) => return Ok(value),
                Err(err) => match &mut failure {
                    Some(all) => all.merge(err),
                    None => failure = Some(err),
                },
            }
        }
        Err(failure.unwrap_or_else(|| ValidationError::new("no validators configured")))
    }
}
