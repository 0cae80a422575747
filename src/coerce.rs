//! Lenient numeric intake.
//!
//! Wide records arrive from forms that send numbers, numeric strings, empty
//! strings, or nothing at all. These helpers implement the permissive rule
//! used throughout the intake paths: numbers pass through, numeric strings
//! parse, and everything else (null, blank, garbage) coerces to zero.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn coerce_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub(crate) fn coerce_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .unwrap_or_else(|| n.as_f64().map_or(0, |f| f.trunc() as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .unwrap_or_else(|_| trimmed.parse::<f64>().map_or(0, |f| f.trunc() as i64))
        }
        _ => 0,
    }
}

/// Form-style truthiness: zero, the empty string, null, and false all read
/// as "not provided"; anything else counts.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Picks the first provided-and-truthy value out of a preference-ordered list
/// of optional fields (new-style field first, legacy alias after).
pub(crate) fn first_truthy<'a>(candidates: &[&'a Option<Value>]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|c| c.as_ref())
        .find(|v| is_truthy(v))
}

/// Serde adapter for [`coerce_f64`]; combine with `#[serde(default)]` so an
/// absent field also lands on zero.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_f64(&value))
}

/// Serde adapter for [`coerce_i64`].
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_i64(&value))
}
