//! Total accessors for provider payloads.
//!
//! Provider notifications are free-form JSON documents whose shape drifts over time. Every accessor in this module
//! returns `None` when any segment of the path is missing, is `null`, or has an unexpected type. None of them panic.
use serde_json::Value;

use super::value_as_decimal;

/// Follows `path` through nested objects. `null` values are treated as absent.
pub fn lookup<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let value = path.iter().try_fold(doc, |node, key| node.as_object().and_then(|o| o.get(*key)))?;
    (!value.is_null()).then_some(value)
}

/// A non-blank string at `path`, returned verbatim.
pub fn str_at<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a str> {
    lookup(doc, path).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

/// Like [`str_at`], but also accepts numbers, which some providers use for identifiers.
pub fn text_at(doc: &Value, path: &[&str]) -> Option<String> {
    match lookup(doc, path)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A boolean at `path`. Accepts JSON booleans, `"true"`/`"false"` strings and `1`/`0`.
pub fn bool_at(doc: &Value, path: &[&str]) -> Option<bool> {
    match lookup(doc, path)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// A decimal number at `path`. Numeric strings are accepted.
pub fn decimal_at(doc: &Value, path: &[&str]) -> Option<f64> {
    lookup(doc, path).and_then(value_as_decimal)
}

pub fn array_at<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Vec<Value>> {
    lookup(doc, path).and_then(Value::as_array)
}

/// The body of a webhook envelope (`{"event": ..., "data": {...}}`). Documents without an envelope are returned as-is.
pub fn data_section(doc: &Value) -> &Value {
    lookup(doc, &["data"]).filter(|v| v.is_object()).unwrap_or(doc)
}

/// The purchase object of a notification. Older archived payloads store the purchase at the top level, so when there
/// is no `purchase` key, the data section itself is returned.
pub fn purchase_section(doc: &Value) -> &Value {
    let data = data_section(doc);
    lookup(data, &["purchase"]).filter(|v| v.is_object()).unwrap_or(data)
}
