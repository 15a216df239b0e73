//! # Validator Invocation
//!
//! Turns a [`ValidatorRef`] into a live [`Validator`] and runs it, mapping
//! every way this can go wrong onto [`ResolveFailure`]:
//!
//! - the name is not registered → [`ResolveFailure::Unknown`]
//! - the constructor rejects the parameters → [`ResolveFailure::Initialization`]
//! - the raw value is rejected → [`ResolveFailure::Validation`]
//!
//! Inline transforms skip the registry and are bound to their parameters
//! directly.

use confval_core::Value;

use crate::error::ResolveFailure;
use crate::validator::{InitContext, Params, Target, TransformValidator, Validator, ValidatorRef};

/// Build a validator for `target` with `params`.
pub fn instantiate(
    target: &Target,
    params: Params,
    ctx: &InitContext<'_>,
) -> Result<Box<dyn Validator>, ResolveFailure> {
    match target {
        Target::Named(name) => {
            let def = ctx.registry().validator(name)?;
            Ok(def.build(params, ctx)?)
        }
        Target::Transform(transform) => {
            Ok(Box::new(TransformValidator::new(transform.clone(), params)))
        }
    }
}

/// Build the validator a reference points at.
pub fn build(
    reference: &ValidatorRef,
    ctx: &InitContext<'_>,
) -> Result<Box<dyn Validator>, ResolveFailure> {
    instantiate(reference.target(), reference.params().clone(), ctx)
}

/// Build and run in one step.
pub fn check(
    reference: &ValidatorRef,
    raw: &str,
    ctx: &InitContext<'_>,
) -> Result<Value, ResolveFailure> {
    let validator = build(reference, ctx)?;
    Ok(validator.validate(raw)?)
}
