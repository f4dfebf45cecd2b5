//! Typed field access over raw form payloads.
//!
//! Payloads arrive as loosely typed JSON objects built from HTML forms, so
//! numbers and booleans may be encoded as strings. `null`, missing keys and
//! blank strings all mean "not provided".

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ValidationError;

type Result<T> = std::result::Result<T, ValidationError>;

pub(crate) struct Payload<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> Payload<'a> {
    pub(crate) fn new(payload: &'static str, value: &'a Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(ValidationError::NotAnObject { payload }),
        }
    }

    fn raw(&self, field: &str) -> Option<&'a Value> {
        match self.fields.get(field)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            other => Some(other),
        }
    }

    /// Trimmed text value.
    pub(crate) fn text(&self, field: &'static str, label: &str) -> Result<Option<String>> {
        match self.raw(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
            Some(_) => Err(ValidationError::field(field, format!("{label} must be text"))),
        }
    }

    /// Exact decimal value, accepting JSON numbers or numeric strings.
    pub(crate) fn decimal(&self, field: &'static str, label: &str) -> Result<Option<Decimal>> {
        let invalid = || ValidationError::field(field, format!("{label} must be a number"));
        let text = match self.raw(field) {
            None => return Ok(None),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(_) => return Err(invalid()),
        };

        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map(Some)
            .map_err(|_| invalid())
    }

    /// Whole number value; fractional input is rejected rather than truncated.
    pub(crate) fn integer(&self, field: &'static str, label: &str) -> Result<Option<i64>> {
        let invalid = || ValidationError::field(field, format!("{label} must be a whole number"));
        match self.raw(field) {
            None => Ok(None),
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return Ok(Some(i));
                }
                n.as_f64().and_then(whole_f64).map(Some).ok_or_else(invalid)
            }
            Some(Value::String(s)) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i64>() {
                    return Ok(Some(i));
                }
                s.parse::<f64>()
                    .ok()
                    .and_then(whole_f64)
                    .map(Some)
                    .ok_or_else(invalid)
            }
            Some(_) => Err(invalid()),
        }
    }

    /// Boolean flag with a default for absent values.
    pub(crate) fn flag(&self, field: &'static str, label: &str, default: bool) -> Result<bool> {
        match self.raw(field) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "1" | "yes" => Ok(true),
                "false" | "off" | "0" | "no" => Ok(false),
                _ => Err(ValidationError::field(
                    field,
                    format!("{label} must be true or false"),
                )),
            },
            Some(_) => Err(ValidationError::field(
                field,
                format!("{label} must be true or false"),
            )),
        }
    }

    pub(crate) fn uuid(&self, field: &'static str, message: &str) -> Result<Option<Uuid>> {
        match self.raw(field) {
            None => Ok(None),
            Some(Value::String(s)) => Uuid::parse_str(s.trim())
                .map(Some)
                .map_err(|_| ValidationError::field(field, message)),
            Some(_) => Err(ValidationError::field(field, message)),
        }
    }
}

fn whole_f64(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        Some(value as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rejects_non_object_payloads() {
        let value = json!([1, 2, 3]);
        assert!(matches!(
            Payload::new("Pricing", &value),
            Err(ValidationError::NotAnObject { payload: "Pricing" })
        ));
    }

    #[test]
    fn blank_and_null_values_are_absent() {
        let value = json!({ "a": "   ", "b": null });
        let payload = Payload::new("Service", &value).unwrap();
        assert_eq!(payload.text("a", "A").unwrap(), None);
        assert_eq!(payload.decimal("b", "B").unwrap(), None);
        assert_eq!(payload.integer("missing", "M").unwrap(), None);
    }

    #[test]
    fn decimals_coerce_from_strings_and_numbers() {
        let value = json!({ "n": 49.99, "s": " 12.50 ", "e": "1e2" });
        let payload = Payload::new("Pricing", &value).unwrap();
        assert_eq!(payload.decimal("n", "N").unwrap(), Some(Decimal::new(4999, 2)));
        assert_eq!(payload.decimal("s", "S").unwrap(), Some(Decimal::new(1250, 2)));
        assert_eq!(payload.decimal("e", "E").unwrap(), Some(Decimal::from(100)));
    }

    #[test]
    fn decimal_rejects_words() {
        let value = json!({ "price": "cheap" });
        let payload = Payload::new("Pricing", &value).unwrap();
        let err = payload.decimal("price", "Base price").unwrap_err();
        assert_eq!(err.to_string(), "Base price must be a number");
    }

    #[test]
    fn integers_reject_fractions() {
        let value = json!({ "whole": "30", "float_whole": 45.0, "frac": 12.5 });
        let payload = Payload::new("Booking rules", &value).unwrap();
        assert_eq!(payload.integer("whole", "W").unwrap(), Some(30));
        assert_eq!(payload.integer("float_whole", "F").unwrap(), Some(45));
        assert!(payload.integer("frac", "Duration").is_err());
    }

    #[test]
    fn flags_accept_form_encodings() {
        let value = json!({ "t": "true", "f": "off", "b": true, "bad": "maybe" });
        let payload = Payload::new("Service", &value).unwrap();
        assert!(payload.flag("t", "T", false).unwrap());
        assert!(!payload.flag("f", "F", true).unwrap());
        assert!(payload.flag("b", "B", false).unwrap());
        assert!(payload.flag("missing", "M", true).unwrap());
        assert!(payload.flag("bad", "Bad", false).is_err());
    }
}
