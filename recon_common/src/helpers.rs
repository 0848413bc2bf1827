use log::warn;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parses a `key=value,key=value` list, as used for table overrides in environment variables.
///
/// Entries without an `=`, or with an empty key, are skipped with a warning. Keys and values are trimmed.
pub fn parse_key_value_list(value: &str) -> Vec<(String, String)> {
    value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|entry| match entry.split_once('=') {
            Some((k, v)) if !k.trim().is_empty() => Some((k.trim().to_string(), v.trim().to_string())),
            _ => {
                warn!("Ignoring malformed key=value entry: '{entry}'");
                None
            },
        })
        .collect()
}
