//! Integer, float, and port validators.

use confval_core::{BoxError, ValidationError, Value};
use serde::Deserialize;

use crate::validator::{from_params, InitContext, Params, Plugin, Validator};
use crate::validators::{parse_bound, Bounds};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RangeConfig {
    #[serde(default)]
    min: Option<serde_json::Value>,
    #[serde(default)]
    max: Option<serde_json::Value>,
}

impl RangeConfig {
    fn bounds<T: std::str::FromStr>(self) -> Result<(Option<T>, Option<T>), BoxError> {
        Ok((parse_bound(self.min, "min")?, parse_bound(self.max, "max")?))
    }
}

/// `int`: a signed integer, optionally within `min`/`max`.
#[derive(Debug)]
pub struct Int {
    bounds: Bounds<i64>,
}

impl Plugin for Int {
    const NAME: &'static str = "int";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let (min, max) = from_params::<RangeConfig>(params)?.bounds()?;
        Ok(Int {
            bounds: Bounds::new(min, max),
        })
    }
}

impl Validator for Int {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|err| ValidationError::caused_by("Input is no int", err))?;
        self.bounds.check(&value, "")?;
        Ok(Value::Int(value))
    }
}

/// `float`: a floating point number, optionally within `min`/`max`.
#[derive(Debug)]
pub struct Float {
    bounds: Bounds<f64>,
}

impl Plugin for Float {
    const NAME: &'static str = "float";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let (min, max) = from_params::<RangeConfig>(params)?.bounds()?;
        Ok(Float {
            bounds: Bounds::new(min, max),
        })
    }
}

impl Validator for Float {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|err| ValidationError::caused_by("Input is no float", err))?;
        self.bounds.check(&value, "")?;
        Ok(Value::Float(value))
    }
}

fn enabled() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PortConfig {
    #[serde(default = "enabled")]
    allow_null: bool,
}

/// `port`: a TCP/UDP port number. Port 0 is accepted unless `allow_null`
/// is false.
#[derive(Debug)]
pub struct Port {
    lowest: i64,
}

impl Plugin for Port {
    const NAME: &'static str = "port";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        let config: PortConfig = from_params(params)?;
        Ok(Port {
            lowest: if config.allow_null { 0 } else { 1 },
        })
    }
}

impl Validator for Port {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        match raw.trim().parse::<i64>() {
            Ok(port) if (self.lowest..=65535).contains(&port) => Ok(Value::Int(port)),
            _ => Err(ValidationError::new(format!(
                "port range [{}-65535]",
                self.lowest
            ))),
        }
    }
}
