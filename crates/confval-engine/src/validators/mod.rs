//! # Builtin Validators
//!
//! | name | module | produces |
//! |---|---|---|
//! | `default`, `error`, `empty`, `not-empty`, `bool`, `json` | [`basic`] | text, bool, JSON value |
//! | `int`, `float`, `port` | [`numeric`] | int / float |
//! | `str`, `netbios`, `regex`, `email`, `items`, `item`, `list`, `dict` | [`text`] | text / list / tree |
//! | `path`, `file`, `dir`, `strip_path`, `strip_file`, `strip_dir` | [`fs`] | text |
//! | `url`, `ipv4`, `ipv6`, `ip` | [`net`] | text |
//! | `or`, `and`, `one-off` | [`composite`] | text / first match |
//! | `generalizedTime` | [`time`] | timestamp |
//! | `base64` | [`encoding`] | text / byte list |
//!
//! Parameters are deserialized into per-validator config structs that
//! reject unknown keys. Numeric bounds accept a JSON number or a numeric
//! string, so a bound may be filled in from another option's value.

use std::fmt;
use std::str::FromStr;

use confval_core::{BoxError, ValidationError};
use serde::Deserialize;

use crate::error::RegistryError;
use crate::registry::{Registry, ValidatorDef};

pub mod basic;
pub mod composite;
pub mod encoding;
pub mod fs;
pub mod net;
pub mod numeric;
pub mod text;
pub mod time;

/// Register the builtin validators.
pub fn register(registry: &Registry) -> Result<(), RegistryError> {
    let builtin = [
        ValidatorDef::of::<basic::Identity>(),
        ValidatorDef::of::<basic::Fail>(),
        ValidatorDef::of::<basic::Empty>(),
        ValidatorDef::of::<basic::NotEmpty>(),
        ValidatorDef::of::<basic::Bool>(),
        ValidatorDef::of::<basic::Json>(),
        ValidatorDef::of::<numeric::Int>(),
        ValidatorDef::of::<numeric::Float>(),
        ValidatorDef::of::<numeric::Port>(),
        ValidatorDef::of::<text::Str>(),
        ValidatorDef::of::<text::NetBios>(),
        ValidatorDef::of::<text::Pattern>(),
        ValidatorDef::of::<text::Email>(),
        ValidatorDef::of::<text::Items>(),
        ValidatorDef::of::<text::Item>(),
        ValidatorDef::of::<text::List>(),
        ValidatorDef::of::<text::Dict>(),
        ValidatorDef::of::<fs::AnyPath>(),
        ValidatorDef::of::<fs::File>(),
        ValidatorDef::of::<fs::Dir>(),
        ValidatorDef::of::<fs::Unquoted<fs::AnyPath>>(),
        ValidatorDef::of::<fs::Unquoted<fs::File>>(),
        ValidatorDef::of::<fs::Unquoted<fs::Dir>>(),
        ValidatorDef::of::<net::Url>(),
        ValidatorDef::of::<net::Ipv4>(),
        ValidatorDef::of::<net::Ipv6>(),
        ValidatorDef::of::<net::Ip>(),
        ValidatorDef::of::<composite::Or>(),
        ValidatorDef::of::<composite::And>(),
        ValidatorDef::of::<composite::OneOff>(),
        ValidatorDef::of::<time::GeneralizedTime>(),
        ValidatorDef::of::<encoding::Base64>(),
    ];
    for def in builtin {
        registry.register(def)?;
    }
    Ok(())
}

// ─── Parameter helpers ───────────────────────────────────────────────

/// Parse an optional numeric bound given as a JSON number or numeric
/// string.
pub(crate) fn parse_bound<T: FromStr>(
    value: Option<serde_json::Value>,
    name: &str,
) -> Result<Option<T>, BoxError> {
    let not_a_number = || BoxError::from(format!("{name} must be a number"));
    let text = match value {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(_) => return Err(not_a_number()),
    };
    if let Ok(bound) = text.parse() {
        return Ok(Some(bound));
    }
    // an integral float such as `5.0` also bounds integers
    match text.parse::<f64>() {
        Ok(whole) if whole.fract() == 0.0 => format!("{whole:.0}")
            .parse()
            .map(Some)
            .map_err(|_| not_a_number()),
        _ => Err(not_a_number()),
    }
}

/// A single string or a list of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub(crate) fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

/// Inclusive lower and upper limits.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Bounds<T> {
    pub(crate) min: Option<T>,
    pub(crate) max: Option<T>,
}

impl<T: PartialOrd + fmt::Debug> Bounds<T> {
    pub(crate) fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    /// Messages read `minimum{what}: N` / `maximum{what}: N`.
    pub(crate) fn check(&self, value: &T, what: &str) -> Result<(), ValidationError> {
        let mut messages = Vec::new();
        if let Some(min) = &self.min {
            if value < min {
                messages.push(format!("minimum{what}: {min:?}"));
            }
        }
        if let Some(max) = &self.max {
            if value > max {
                messages.push(format!("maximum{what}: {max:?}"));
            }
        }
        if messages.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::from_messages(messages))
        }
    }
}
