//! Query string decoding.

use std::collections::HashMap;

use crate::path::decode_component;

/// Decodes `a=1&b=two` into a key/value map.
///
/// Values stay strings. `+` means space and `%XX` escapes are decoded.
/// A segment without `=` maps its key to the empty string, empty
/// segments and empty keys are skipped, and a repeated key keeps its
/// last value.
pub fn decode_query(raw: &str) -> HashMap<String, String> {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let mut decoded = HashMap::new();

    for segment in raw.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
        let key = decode_value(key);
        if key.is_empty() {
            continue;
        }
        decoded.insert(key, decode_value(value));
    }

    decoded
}

fn decode_value(raw: &str) -> String {
    decode_component(&raw.replace('+', " "))
}
