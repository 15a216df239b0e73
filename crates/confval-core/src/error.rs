//! # Error Types — Shared Error Vocabulary
//!
//! Errors that cross the boundary between the engine, the validators, and
//! the embedding program. All errors use `thiserror` for derive-based
//! `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Predicate failures carry a *list* of messages, so composite validators
//!   can report every failed branch at once.
//! - Per-option failures are recorded by the engine as plain messages; only
//!   [`ResolutionError`] reaches the caller of a resolution run.
//! - Construction failures keep the validator name and the underlying cause.

use std::fmt;

use thiserror::Error;

/// Boxed cause used where the concrete error type belongs to a plugin.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One operation of the config source contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceOperation {
    /// `has_option(section, option)`.
    HasOption,
    /// `read(path)`.
    Read,
    /// `get(section, option)`.
    Get,
    /// `options(section)`.
    Options,
}

impl SourceOperation {
    /// Operations every config source must support.
    pub const REQUIRED: [SourceOperation; 4] = [
        SourceOperation::HasOption,
        SourceOperation::Read,
        SourceOperation::Get,
        SourceOperation::Options,
    ];

    /// The operation's method name.
    pub fn name(self) -> &'static str {
        match self {
            SourceOperation::HasOption => "has_option",
            SourceOperation::Read => "read",
            SourceOperation::Get => "get",
            SourceOperation::Options => "options",
        }
    }
}

impl fmt::Display for SourceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The supplied config source lacks a required operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no such method \"{operation}\": the config source must implement has_option, read, get and options")]
pub struct InterfaceError {
    /// The missing operation.
    pub operation: SourceOperation,
}

/// A config source could not load its input.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The file could not be read.
    #[error("cannot read '{path}': {source}")]
    Io {
        /// Path that failed to load.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The input is not valid ini syntax.
    #[error("syntax error in '{origin}' line {line}: {reason}")]
    Syntax {
        /// File path or `<string>`.
        origin: String,
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// The source does not support loading from a path.
    #[error("this config source cannot read files")]
    Unsupported,
}

/// A raw value failed a validator.
///
/// Carries one or more human-readable messages. Messages keep their
/// insertion order; [`ValidationError::merge`] appends another error's
/// messages so composite validators can aggregate their branches.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    messages: Vec<String>,
}

impl ValidationError {
    /// A single-message failure.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    /// A failure with a lower-level cause.
    ///
    /// The cause is logged at debug level; only `message` is user facing.
    pub fn caused_by(message: impl Into<String>, cause: impl fmt::Display) -> Self {
        let message = message.into();
        tracing::debug!(%cause, "{message}");
        Self::new(message)
    }

    /// Build from a list of messages.
    ///
    /// An empty list produces a single generic message so that a failure
    /// is never silent.
    pub fn from_messages<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let messages: Vec<String> = messages.into_iter().map(Into::into).collect();
        if messages.is_empty() {
            return Self::new("validation failed");
        }
        Self { messages }
    }

    /// Append the messages of another failure.
    pub fn merge(&mut self, other: ValidationError) {
        self.messages.extend(other.messages);
    }

    /// The failure messages in order.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Consume and return the messages.
    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages.join("\n"))
    }
}

/// A validator or feature could not be constructed from its parameters.
#[derive(Error, Debug)]
#[error("error init validator '{name}' | {cause}")]
pub struct InitializationError {
    /// Registered name of the validator or feature.
    pub name: String,
    /// Why construction failed.
    #[source]
    pub cause: BoxError,
}

impl InitializationError {
    /// Wrap a construction failure.
    pub fn new(name: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            name: name.into(),
            cause: cause.into(),
        }
    }
}

/// Aggregate failure of a resolution run.
///
/// Holds every recorded message in the order it was recorded. Displays as
/// the newline-joined list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ResolutionError {
    messages: Vec<String>,
}

impl ResolutionError {
    /// Build from the ordered error list of a run.
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    /// All recorded messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Whether any message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.contains(needle))
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages.join("\n"))
    }
}
