//! Schemaless records and the equality filters used by `select`.

use serde_json::{Map, Value};

/// A single row: field name to JSON value.
pub type Record = Map<String, Value>;

/// Field name to expected value; every pair must match (logical AND).
pub type Filter = Map<String, Value>;

/// Field holding a record's identifier.
pub const ID_FIELD: &str = "id";

/// Returns the record's string id, if it has one.
pub fn record_id(record: &Record) -> Option<&str> {
    record.get(ID_FIELD).and_then(Value::as_str)
}

/// Checks whether `record` satisfies every pair in `filter`.
///
/// A sequence field tests membership; a sequence filter value against a
/// sequence field requires every element to be present. Anything else
/// is compared for equality, with numbers compared by value so `3` and
/// `3.0` are the same cost.
pub fn matches(record: &Record, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(key, expected)| field_matches(record.get(key), expected))
}

fn field_matches(field: Option<&Value>, expected: &Value) -> bool {
    match (field, expected) {
        (Some(Value::Array(items)), Value::Array(wanted)) => wanted
            .iter()
            .all(|w| items.iter().any(|item| values_equal(item, w))),
        (Some(Value::Array(items)), scalar) => {
            items.iter().any(|item| values_equal(item, scalar))
        }
        (Some(value), expected) => values_equal(value, expected),
        (None, _) => false,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}
