//! JSON fixture helpers.

use serde_json::{Map, Value};

/// Unwrap a `json!({...})` literal into record data.
///
/// Panics if `value` is not an object.
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}
