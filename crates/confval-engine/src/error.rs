//! # Engine Error Types
//!
//! Errors raised by the registry, schema normalization, dependency
//! declarations, features, and a resolution run. Shared types
//! (`ValidationError`, `InitializationError`, `ResolutionError`) live in
//! `confval-core` and are re-exported from the crate root.
//!
//! ## Propagation
//!
//! Per-option and per-section failures never escape a run: the engine
//! records them as messages. Only three things cross
//! [`ConfigValidator::parse`](crate::ConfigValidator::parse): the aggregated
//! [`ResolutionError`], a [`ContractError`] (a feature asked for something
//! malformed), and a [`SchemaError`] when the schema itself cannot be
//! normalized.

use confval_core::{IniKey, InitializationError, ResolutionError, ValidationError};
use thiserror::Error;

use crate::registry::CapabilityKind;

/// Registration or lookup failure in a [`Registry`](crate::Registry).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A different implementation is already registered under this name.
    #[error("a different {kind} is already registered with the name {name}")]
    DuplicateDefinition {
        /// Capability table the registration targeted.
        kind: CapabilityKind,
        /// The contested name.
        name: String,
    },

    /// Nothing is registered under this name.
    #[error("no {kind} with the name {name}")]
    UnknownName {
        /// Capability table that was searched.
        kind: CapabilityKind,
        /// The requested name.
        name: String,
    },
}

/// The schema cannot be normalized into its typed form.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A node has the wrong JSON shape.
    #[error("invalid schema at '{path}': {reason}")]
    Invalid {
        /// Dotted location of the offending node.
        path: String,
        /// What was expected.
        reason: String,
    },

    /// The YAML document could not be parsed.
    #[error("invalid YAML schema: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SchemaError {
    pub(crate) fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A dependency declaration is malformed.
///
/// This is a programming error in the schema or in a feature, so it is
/// propagated rather than recorded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// The named dependency parameter is absent from the validator
    /// parameters.
    #[error("error validating {key}: dependency parameter '{param}' is not set")]
    MissingParameter {
        /// The option declaring the dependency.
        key: IniKey,
        /// The dependency parameter name.
        param: String,
    },

    /// The dependency parameter does not hold a `[section, option]` pair.
    #[error("error validating {key}: depends syntax: '{param}' must be [\"section\", \"option\"], found {found}")]
    InvalidReference {
        /// The option declaring the dependency.
        key: IniKey,
        /// The dependency parameter name.
        param: String,
        /// The offending parameter value.
        found: String,
    },
}

/// Failure while building or running a section or option feature.
#[derive(Error, Debug)]
pub enum FeatureError {
    /// The feature (or something it needed) is not registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The feature could not be built from its parameters.
    #[error(transparent)]
    Initialization(#[from] InitializationError),

    /// The feature's parameters contain a schema that cannot be normalized.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A malformed dependency declaration.
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Any other feature-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Why a value could not be produced for an option.
///
/// Handed to completion hooks so they can format their own messages.
#[derive(Error, Debug)]
pub enum ResolveFailure {
    /// The referenced validator is not registered.
    #[error(transparent)]
    Unknown(#[from] RegistryError),

    /// The validator could not be built from its parameters.
    #[error(transparent)]
    Initialization(#[from] InitializationError),

    /// The raw value was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ResolveFailure {
    /// The user-facing messages of this failure, one per line of the
    /// eventual report.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ResolveFailure::Validation(err) => err.messages().to_vec(),
            other => vec![other.to_string()],
        }
    }
}

/// What [`ConfigValidator::parse`](crate::ConfigValidator::parse) returns
/// on failure.
#[derive(Error, Debug)]
pub enum ParseError {
    /// At least one message was recorded during the run.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// A dependency declaration was malformed.
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// The schema could not be normalized.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ParseError {
    /// The aggregated resolution failure, if that is what this is.
    pub fn as_resolution(&self) -> Option<&ResolutionError> {
        match self {
            ParseError::Resolution(err) => Some(err),
            _ => None,
        }
    }
}
