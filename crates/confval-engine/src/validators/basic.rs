//! Identity, fixed-outcome, and simple parsing validators.

use confval_core::{BoxError, ValidationError, Value};
use serde::Deserialize;

use crate::validator::{from_params, no_params, InitContext, Params, Plugin, Validator};

/// `default`: accepts any input unchanged.
#[derive(Debug, Default)]
pub struct Identity;

impl Plugin for Identity {
    const NAME: &'static str = "default";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        no_params(params)?;
        Ok(Identity)
    }
}

impl Validator for Identity {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        Ok(Value::from(raw))
    }
}

/// `error`: rejects every input with a fixed message.
///
/// Useful as a placeholder for an option whose real validator could not be
/// configured.
#[derive(Debug)]
pub struct Fail {
    message: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FailConfig {
    error_msg: String,
}

impl Plugin for Fail {
    const NAME: &'static str = "error";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: FailConfig = from_params(params)?;
        Ok(Fail {
            message: config.error_msg,
        })
    }
}

impl Validator for Fail {
    fn validate(&self, _raw: &str) -> Result<Value, ValidationError> {
        Err(ValidationError::new(self.message.clone()))
    }
}

/// `empty`: only the empty string.
#[derive(Debug, Default)]
pub struct Empty;

impl Plugin for Empty {
    const NAME: &'static str = "empty";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        no_params(params)?;
        Ok(Empty)
    }
}

impl Validator for Empty {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        if !raw.is_empty() {
            return Err(ValidationError::new("The input is not Empty."));
        }
        Ok(Value::from(""))
    }
}

/// `not-empty`: any non-empty string.
#[derive(Debug, Default)]
pub struct NotEmpty;

impl Plugin for NotEmpty {
    const NAME: &'static str = "not-empty";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        no_params(params)?;
        Ok(NotEmpty)
    }
}

impl Validator for NotEmpty {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        if raw.is_empty() {
            return Err(ValidationError::new("The input is Empty."));
        }
        Ok(Value::from(raw))
    }
}

const TRUE_WORDS: [&str; 5] = ["yes", "y", "true", "t", "1"];
const FALSE_WORDS: [&str; 5] = ["no", "n", "false", "f", "0"];

/// `bool`: case-insensitive yes/no words.
#[derive(Debug, Default)]
pub struct Bool;

impl Plugin for Bool {
    const NAME: &'static str = "bool";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        no_params(params)?;
        Ok(Bool)
    }
}

impl Validator for Bool {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        let word = raw.to_lowercase();
        if TRUE_WORDS.contains(&word.as_str()) {
            return Ok(Value::Bool(true));
        }
        if FALSE_WORDS.contains(&word.as_str()) {
            return Ok(Value::Bool(false));
        }
        let allowed: Vec<&str> = TRUE_WORDS
            .iter()
            .zip(FALSE_WORDS.iter())
            .flat_map(|(yes, no)| [*yes, *no])
            .collect();
        Err(ValidationError::new(format!(
            "allowed values: {}",
            allowed.join(", ")
        )))
    }
}

/// `json`: any JSON document, converted to a [`Value`].
#[derive(Debug, Default)]
pub struct Json;

impl Plugin for Json {
    const NAME: &'static str = "json";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        no_params(params)?;
        Ok(Json)
    }
}

impl Validator for Json {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        serde_json::from_str::<serde_json::Value>(raw)
            .map(Value::from_json)
            .map_err(|err| ValidationError::caused_by("Invalid json input", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::testing::{plain, rejected, run};
    use serde_json::json;

    #[test]
    fn test_identity() {
        assert_eq!(plain("default", "anything").unwrap(), "anything");
        assert!(run("default", json!({"min": 1}), "x").is_err());
    }

    #[test]
    fn test_error_validator() {
        assert_eq!(
            rejected("error", json!({"error_msg": "not configured"}), "x"),
            ["not configured"]
        );
        assert!(run("error", json!({}), "x").is_err());
    }

    #[test]
    fn test_empty_and_not_empty() {
        assert_eq!(plain("empty", "").unwrap(), "");
        assert_eq!(rejected("empty", json!({}), " "), ["The input is not Empty."]);
        assert_eq!(plain("not-empty", "x").unwrap(), "x");
        assert_eq!(rejected("not-empty", json!({}), ""), ["The input is Empty."]);
    }

    #[test]
    fn test_bool_words() {
        for word in ["yes", "Y", "TRUE", "t", "1"] {
            assert_eq!(plain("bool", word).unwrap(), true, "{word}");
        }
        for word in ["no", "N", "False", "f", "0"] {
            assert_eq!(plain("bool", word).unwrap(), false, "{word}");
        }
        assert_eq!(
            rejected("bool", json!({}), "maybe"),
            ["allowed values: yes, no, y, n, true, false, t, f, 1, 0"]
        );
    }

    #[test]
    fn test_json() {
        let value = plain("json", r#"{"a": [1, 2], "b": null}"#).unwrap();
        assert_eq!(value["a"], Value::List(vec![Value::Int(1), Value::Int(2)]));
        assert!(value["b"].is_null());
        assert_eq!(rejected("json", json!({}), "{"), ["Invalid json input"]);
    }
}
