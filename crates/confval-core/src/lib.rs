//! # confval-core — Foundational Types for confval
//!
//! Leaf crate of the confval workspace. It defines the vocabulary shared by
//! the resolution engine, the validator library, and embedding programs.
//!
//! ## Contents
//!
//! - [`IniKey`]: the `(section, option)` identity of a configuration value.
//! - [`Value`]: what a validator turns a raw string into.
//! - [`ResultTree`]: the immutable section → option → value mapping
//!   returned by a successful run.
//! - [`ContextData`]: caller metadata handed to validator constructors.
//! - [`ConfigSource`]: the four-operation contract a configuration parser
//!   must satisfy, with [`IniSource`] as the in-memory reference adapter.
//! - Shared errors: [`ValidationError`], [`InitializationError`],
//!   [`ResolutionError`], [`InterfaceError`], [`SourceError`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `confval-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `.unwrap()` outside tests. `Index` impls panic on a missing key,
//!   matching `HashMap` indexing, and say so in their docs.
//! - Library code emits `tracing` events and never installs a subscriber.

pub mod context;
pub mod error;
pub mod key;
pub mod source;
pub mod tree;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use context::ContextData;
pub use error::{
    BoxError, InitializationError, InterfaceError, ResolutionError, SourceError,
    SourceOperation, ValidationError,
};
pub use key::IniKey;
pub use source::{ConfigSource, IniSource};
pub use tree::{LookupError, ResultTree};
pub use value::Value;
