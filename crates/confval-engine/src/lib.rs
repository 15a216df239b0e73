//! # confval-engine — Schema Resolution for confval
//!
//! Validates a configuration read by a [`ConfigSource`] against a declarative
//! [`Schema`] and returns a [`ResultTree`] of typed values, or every problem
//! found in one aggregated [`ResolutionError`].
//!
//! ## Architecture
//!
//! ```text
//! ConfigValidator::parse(schema)
//!   └─ section feature (per section)        feature::section
//!        └─ option feature (per option)     feature::option
//!             └─ Resolver::add_value        resolve
//!                  └─ invoke::instantiate   invoke  ──▶ Registry (validators)
//! ```
//!
//! - [`registry`]: name → implementation tables for the three capability
//!   kinds, with a process-wide [`global()`] instance.
//! - [`validator`]: the [`Validator`] and [`Plugin`] traits and the
//!   [`ValidatorRef`] a schema uses to name one.
//! - [`resolve`]: dependency-aware resolution with cycle detection and
//!   error aggregation.
//! - [`walk`]: the [`ConfigValidator`] entry point.
//! - [`validators`]: the builtin validator library.
//!
//! ## Example
//!
//! ```
//! use confval_engine::{ConfigValidator, IniSource, Value};
//! use serde_json::json;
//!
//! let source: IniSource = "[server]\nport = 8080\n".parse().unwrap();
//! let validator = ConfigValidator::new(source).unwrap();
//! let tree = validator
//!     .parse_json(&json!({"server": {"port": "port", "host": {"default": "localhost"}}}))
//!     .unwrap();
//! assert_eq!(tree.path("server.port").unwrap(), &Value::Int(8080));
//! assert_eq!(tree.path("server.host").unwrap(), "localhost");
//! ```
//!
//! ## Crate Policy
//!
//! - Depends only on `confval-core` within the workspace.
//! - No `unsafe` code.
//! - No `.unwrap()` outside tests.
//! - Per-option failures are recorded, never raised; see [`error`].
//! - Library code emits `tracing` events and never installs a subscriber.

pub mod error;
pub mod feature;
pub mod invoke;
pub mod registry;
pub mod resolve;
pub mod schema;
pub mod validator;
pub mod validators;
pub mod walk;

// Re-export primary types for ergonomic imports.
pub use error::{
    ContractError, FeatureError, ParseError, RegistryError, ResolveFailure, SchemaError,
};
pub use feature::{OptionFeature, SectionFeature};
pub use registry::{
    global, CapabilityDef, CapabilityKind, Definition, OptionFeatureDef, Registration, Registry,
    SectionFeatureDef, ValidatorDef,
};
pub use resolve::{Completion, Resolver, StoreValue, ValueRequest};
pub use schema::{
    OptionSchema, Schema, SectionSchema, DEFAULT_FEATURE, DEFAULT_FEATURE_KEY, OPTION_FEATURE_KEY,
};
pub use validator::{
    from_params, no_params, InitContext, Params, Plugin, Target, Transform, Validator,
    ValidatorRef, DEFAULT_VALIDATOR,
};
pub use walk::ConfigValidator;

pub use confval_core::{
    BoxError, ConfigSource, ContextData, IniKey, IniSource, InitializationError, InterfaceError,
    LookupError, ResolutionError, ResultTree, SourceError, SourceOperation, ValidationError, Value,
};
