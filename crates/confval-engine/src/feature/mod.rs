//! # Features
//!
//! Features decide how a schema node turns into `add_value` calls.
//!
//! - A [`SectionFeature`] handles a whole section. The `default` feature
//!   dispatches every declared option to its option feature;
//!   `raw_section_input` validates whatever options the source holds.
//! - An [`OptionFeature`] handles one option. The `default` feature issues a
//!   single request; `sub_ini` loads the referenced file as a nested
//!   configuration.
//!
//! Features are registered by name like validators and built per use from
//! their schema parameters.

use std::fmt;

use confval_core::IniKey;

use crate::error::{FeatureError, RegistryError};
use crate::registry::{OptionFeatureDef, Registry, SectionFeatureDef};
use crate::resolve::Resolver;
use crate::schema::{OptionSchema, SectionSchema};

pub mod option;
pub mod section;

pub use option::{DefaultOption, SubIni};
pub use section::{DefaultSection, RawSectionInput};

/// Handles one schema section.
pub trait SectionFeature: fmt::Debug {
    fn parse_section(
        &self,
        resolver: &mut Resolver<'_>,
        section: &str,
        schema: &SectionSchema,
    ) -> Result<(), FeatureError>;
}

/// Handles one schema option.
pub trait OptionFeature: fmt::Debug {
    fn parse_option(
        &self,
        resolver: &mut Resolver<'_>,
        key: &IniKey,
        schema: &OptionSchema,
    ) -> Result<(), FeatureError>;
}

/// Register the builtin features.
pub fn register(registry: &Registry) -> Result<(), RegistryError> {
    registry.register(SectionFeatureDef::of::<DefaultSection>())?;
    registry.register(SectionFeatureDef::of::<RawSectionInput>())?;
    registry.register(OptionFeatureDef::of::<DefaultOption>())?;
    registry.register(OptionFeatureDef::of::<SubIni>())?;
    Ok(())
}
