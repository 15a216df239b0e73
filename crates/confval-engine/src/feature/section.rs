//! Section features: `default` and `raw_section_input`.

use std::cell::Cell;
use std::rc::Rc;

use confval_core::{BoxError, IniKey, ValidationError};
use serde::Deserialize;

use crate::error::{FeatureError, ResolveFailure};
use crate::feature::SectionFeature;
use crate::resolve::{Completion, Resolver, ValueRequest};
use crate::schema::SectionSchema;
use crate::validator::{
    from_params, no_params, InitContext, Params, Plugin, Validator, ValidatorRef,
};

// ─── default ─────────────────────────────────────────────────────────

/// Hands every declared option to its option feature.
///
/// A failing option feature is recorded under the option's location and
/// the walk continues with the next option.
#[derive(Debug, Default)]
pub struct DefaultSection;

impl Plugin for DefaultSection {
    const NAME: &'static str = "default";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        no_params(params)?;
        Ok(DefaultSection)
    }
}

impl SectionFeature for DefaultSection {
    fn parse_section(
        &self,
        resolver: &mut Resolver<'_>,
        section: &str,
        schema: &SectionSchema,
    ) -> Result<(), FeatureError> {
        for (option, option_schema) in schema.options() {
            let key = IniKey::new(section, option);
            let feature = {
                let ctx = resolver.init_context();
                resolver
                    .registry()
                    .option_feature(option_schema.feature())
                    .map_err(FeatureError::from)
                    .and_then(|def| {
                        def.build(option_schema.params().clone(), &ctx)
                            .map_err(FeatureError::from)
                    })
            };
            let outcome =
                feature.and_then(|feature| feature.parse_option(resolver, &key, option_schema));
            match outcome {
                Ok(()) => {}
                Err(FeatureError::Contract(err)) => return Err(err.into()),
                Err(err) => resolver.record_error(format!("error validating {key}: {err}")),
            }
        }
        Ok(())
    }
}

// ─── raw_section_input ───────────────────────────────────────────────

fn enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSectionConfig {
    #[serde(default)]
    validator: serde_json::Value,
    #[serde(default = "enabled")]
    raise_error: bool,
    #[serde(default)]
    min: Option<usize>,
    #[serde(default)]
    max: Option<usize>,
    #[serde(default)]
    depends: Option<Vec<String>>,
}

/// Validates every option the source holds for the section with one
/// validator, whatever the option names are.
///
/// Parameters:
///
/// | key | meaning | default |
/// |---|---|---|
/// | `validator` | validator reference applied to every option | `default` |
/// | `raise_error` | record rejected options as errors | `true` |
/// | `min` / `max` | bounds on the number of accepted options | none |
/// | `depends` | dependency parameters of `validator` | none |
///
/// Rejected options are reported as `error validating [S]: o - <message>`.
/// Once every option has settled, the number of accepted options is checked
/// against `min` and `max`.
#[derive(Debug)]
pub struct RawSectionInput {
    validator: ValidatorRef,
    raise_error: bool,
    min: Option<usize>,
    max: Option<usize>,
    depends: Vec<String>,
}

impl Plugin for RawSectionInput {
    const NAME: &'static str = "raw_section_input";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: RawSectionConfig = from_params(params)?;
        if let (Some(min), Some(max)) = (config.min, config.max) {
            if min > max {
                return Err(format!("min ({min}) is greater than max ({max})").into());
            }
        }
        Ok(RawSectionInput {
            validator: ValidatorRef::from_json(&config.validator, "validator")?,
            raise_error: config.raise_error,
            min: config.min,
            max: config.max,
            depends: config.depends.unwrap_or_default(),
        })
    }
}

impl SectionFeature for RawSectionInput {
    fn parse_section(
        &self,
        resolver: &mut Resolver<'_>,
        section: &str,
        _schema: &SectionSchema,
    ) -> Result<(), FeatureError> {
        let options = resolver.source().options(section);
        let tally = Rc::new(SectionTally {
            section: section.to_string(),
            total: options.len(),
            accepted: Cell::new(0),
            settled: Cell::new(0),
            raise_error: self.raise_error,
            min: self.min,
            max: self.max,
        });
        if options.is_empty() {
            tally.check_bounds(resolver);
            return Ok(());
        }

        for option in options {
            let request = ValueRequest::new(self.validator.clone())
                .with_depends(self.depends.clone())
                .with_hooks(Rc::clone(&tally) as Rc<dyn Completion>);
            resolver.add_value(IniKey::new(section, option), request)?;
        }
        Ok(())
    }
}

/// Per-section bookkeeping shared by the hooks of every option.
#[derive(Debug)]
struct SectionTally {
    section: String,
    total: usize,
    accepted: Cell<usize>,
    settled: Cell<usize>,
    raise_error: bool,
    min: Option<usize>,
    max: Option<usize>,
}

impl SectionTally {
    fn settle_one(&self, resolver: &mut Resolver<'_>, accepted: bool) {
        if accepted {
            self.accepted.set(self.accepted.get() + 1);
        }
        self.settled.set(self.settled.get() + 1);
        if self.settled.get() == self.total {
            self.check_bounds(resolver);
        }
    }

    fn check_bounds(&self, resolver: &mut Resolver<'_>) {
        let accepted = self.accepted.get();
        if self.min.is_some_and(|min| accepted < min) {
            resolver.record_error(format!(
                "error validating [{}]: minimum valid options not reached",
                self.section
            ));
        }
        if self.max.is_some_and(|max| accepted > max) {
            resolver.record_error(format!(
                "error validating [{}]: maximum valid options reached",
                self.section
            ));
        }
    }

    fn report(&self, resolver: &mut Resolver<'_>, option: &str, message: &str) {
        resolver.record_error(format!(
            "error validating [{}]: {option} - {message}",
            self.section
        ));
    }
}

impl Completion for SectionTally {
    fn on_validated(
        &self,
        resolver: &mut Resolver<'_>,
        key: &IniKey,
        validator: &dyn Validator,
        raw: &str,
    ) -> Result<(), ValidationError> {
        match validator.validate(raw) {
            Ok(value) => {
                resolver.store(key.clone(), value);
                self.settle_one(resolver, true);
            }
            Err(err) if self.raise_error => {
                for message in err.messages() {
                    self.report(resolver, key.option(), message);
                }
                self.settle_one(resolver, false);
            }
            Err(err) => {
                tracing::debug!(
                    section = key.section(),
                    option = key.option(),
                    error = %err,
                    "skipping rejected option"
                );
                self.settle_one(resolver, false);
            }
        }
        Ok(())
    }

    /// A validator that cannot be built is a schema problem, reported even
    /// when `raise_error` is off.
    fn on_failed(&self, resolver: &mut Resolver<'_>, key: &IniKey, failure: ResolveFailure) {
        for message in failure.messages() {
            self.report(resolver, key.option(), &message);
        }
        self.settle_one(resolver, false);
    }
}
