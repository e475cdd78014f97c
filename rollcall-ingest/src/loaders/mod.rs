//! Source file loaders
//!
//! Each loader decodes one raw export format into normalized in-memory
//! records. Loaders never touch the database; the reconciler decides what
//! to do with what they produce. A malformed row is logged and skipped,
//! never fatal to the rest of the file.

pub mod members;
pub mod notable;
pub mod votes;

/// Spreadsheet exports carry numerics as floats, empty strings, or noise.
/// Anything that does not parse to a finite number coerces to zero.
pub fn coerce_number(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Integer form of [`coerce_number`] for count columns
pub fn coerce_count(raw: &str) -> i64 {
    coerce_number(raw) as i64
}

/// Count columns in the JSON bundles arrive as numbers or strings
pub fn coerce_json_count(value: &serde_json::Value) -> i64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0) as i64,
        serde_json::Value::String(s) => coerce_count(s),
        _ => 0,
    }
}
