//! `base64`: standard-alphabet base64, decoded to text or bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use confval_core::{BoxError, ValidationError, Value};
use serde::Deserialize;

use crate::validator::{from_params, InitContext, Params, Plugin, Validator};

/// How decoded bytes are turned into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextEncoding {
    Utf8,
    Ascii,
    Latin1,
}

impl TextEncoding {
    fn from_label(label: &str) -> Result<Self, BoxError> {
        match label.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            _ => Err(format!("unsupported encoding '{label}'").into()),
        }
    }

    fn decode(self, bytes: Vec<u8>) -> Option<String> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes).ok(),
            TextEncoding::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().map(|b| char::from(*b)).collect()),
            TextEncoding::Latin1 => Some(bytes.iter().map(|b| char::from(*b)).collect()),
        }
    }
}

fn utf8() -> Option<String> {
    Some("utf-8".to_string())
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Base64Config {
    #[serde(default = "utf8")]
    encoding: Option<String>,
}

/// `base64`: decodes the input and returns it as text in `encoding`
/// (default `utf-8`), or as a list of byte values when `encoding` is
/// `null`.
#[derive(Debug)]
pub struct Base64 {
    encoding: Option<TextEncoding>,
}

impl Plugin for Base64 {
    const NAME: &'static str = "base64";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: Base64Config = from_params(params)?;
        Ok(Base64 {
            encoding: config
                .encoding
                .as_deref()
                .map(TextEncoding::from_label)
                .transpose()?,
        })
    }
}

impl Validator for Base64 {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        let bytes = STANDARD
            .decode(raw.trim())
            .map_err(|err| ValidationError::caused_by("invalid base64 string", err))?;
        match self.encoding {
            None => Ok(Value::List(
                bytes.into_iter().map(|b| Value::Int(i64::from(b))).collect(),
            )),
            Some(encoding) => encoding
                .decode(bytes)
                .map(Value::from)
                .ok_or_else(|| ValidationError::new("Encoding error")),
        }
    }
}
