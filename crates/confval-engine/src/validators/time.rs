//! `generalizedTime`: ASN.1 GeneralizedTime timestamps.
//!
//! Accepted shape: `YYYYMMDDHH[MM[SS[.f{1,3}]]]` followed by nothing, `Z`, or
//! a `±HHMM` offset. A timestamp without a zone is taken as UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use confval_core::{BoxError, ValidationError, Value};

use crate::validator::{no_params, InitContext, Params, Plugin, Validator};

const FORMAT_HINT: &str = "input: YYYYMMDDHH[MM[SS[.fff]]] | YYYYMMDDHH[MM[SS[.fff]]]Z | YYYYMMDDHH[MM[SS[.fff]]]+-HHMM";

#[derive(Debug, Default)]
pub struct GeneralizedTime;

impl Plugin for GeneralizedTime {
    const NAME: &'static str = "generalizedTime";

    fn build(params: Params, _ctx: &InitContext<'_>) -> Result<Self, BoxError> {
        no_params(params)?;
        Ok(GeneralizedTime)
    }
}

impl Validator for GeneralizedTime {
    fn validate(&self, raw: &str) -> Result<Value, ValidationError> {
        let fields = Fields::scan(raw).ok_or_else(|| ValidationError::new(FORMAT_HINT))?;
        fields.to_datetime().map(Value::Time)
    }
}

/// The numeric fields of one timestamp, before calendar checks.
#[derive(Debug, Default, PartialEq)]
struct Fields {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    millis: u32,
    offset_seconds: i32,
}

impl Fields {
    fn scan(raw: &str) -> Option<Fields> {
        let mut cursor = Cursor { rest: raw };
        let mut fields = Fields {
            year: cursor.digits(4)? as i32,
            month: cursor.digits(2)?,
            day: cursor.digits(2)?,
            hour: cursor.digits(2)?,
            ..Fields::default()
        };

        if cursor.starts_with_digit() {
            fields.minute = cursor.digits(2)?;
            if cursor.starts_with_digit() {
                fields.second = cursor.digits(2)?;
                if cursor.eat('.') {
                    fields.millis = cursor.fraction_millis()?;
                }
            }
        }

        if !cursor.eat('Z') {
            if let Some(sign) = cursor.sign() {
                let hours = cursor.digits(2)? as i32;
                let minutes = cursor.digits(2)? as i32;
                fields.offset_seconds = sign * (hours * 3600 + minutes * 60);
            }
        }
        cursor.rest.is_empty().then_some(fields)
    }

    fn to_datetime(&self) -> Result<DateTime<FixedOffset>, ValidationError> {
        let offset = FixedOffset::east_opt(self.offset_seconds)
            .ok_or_else(|| ValidationError::new(FORMAT_HINT))?;
        let naive = NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .ok_or_else(|| ValidationError::new("date is out of range for the calendar"))?
            .and_hms_milli_opt(self.hour, self.minute, self.second, self.millis)
            .ok_or_else(|| ValidationError::new("time of day is out of range"))?;
        offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| ValidationError::new(FORMAT_HINT))
    }
}

struct Cursor<'a> {
    rest: &'a str,
}

impl Cursor<'_> {
    /// Exactly `n` ASCII digits.
    fn digits(&mut self, n: usize) -> Option<u32> {
        let head = self.rest.get(..n)?;
        if !head.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.rest = &self.rest[n..];
        head.parse().ok()
    }

    /// One to three digits as milliseconds.
    fn fraction_millis(&mut self) -> Option<u32> {
        let len = self
            .rest
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if !(1..=3).contains(&len) {
            return None;
        }
        let value: u32 = self.digits(len)?;
        Some(value * 10u32.pow(3 - len as u32))
    }

    fn starts_with_digit(&self) -> bool {
        self.rest.bytes().next().is_some_and(|b| b.is_ascii_digit())
    }

    fn eat(&mut self, c: char) -> bool {
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn sign(&mut self) -> Option<i32> {
        if self.eat('+') {
            Some(1)
        } else if self.eat('-') {
            Some(-1)
        } else {
            None
        }
    }
}
