//! Lenient coercion of feature property values.
//!
//! Cadastral exports are inconsistent about types: numbers arrive as strings,
//! roll numbers as numbers, and blanks as empty strings. Nothing here fails;
//! unusable values become `None`.

use serde_json::Value;

/// Coerce a property to a finite number
pub fn coerce_f64(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Coerce a property to a non-empty string
pub fn coerce_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
