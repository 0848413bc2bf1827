use serde_json::Value;

/// Parses a decimal amount as it appears in provider payloads and accounting exports.
///
/// Accepts plain numbers (`1234.56`), Brazilian-formatted numbers (`1.234,56`, `97,00`) and an optional leading
/// currency symbol (`R$ 97,00`). Returns `None` for anything else, including non-finite values.
pub fn parse_decimal(s: &str) -> Option<f64> {
    let cleaned = s.trim().trim_start_matches("R$").trim();
    if cleaned.is_empty() {
        return None;
    }
    let normalised = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned.to_string()
    };
    normalised.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Reads a JSON value as a decimal amount. Numbers are taken as-is; strings go through [`parse_decimal`].
pub fn value_as_decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}
