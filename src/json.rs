//! Writes values as JSON text through serde_json.
//!
//! Doubles that are not finite become `null`, bytes are written as
//! standard base64 strings and timestamps as milliseconds since the
//! Unix epoch.

use base64;
use serde_json::{self, Map, Number, Value as SJValue};
use value::Value;

/// Writes `value` with object keys in insertion order.
pub fn to_json(value: &Value) -> String {
    write(&to_serde_value(value, false))
}

/// Writes `value` with object keys sorted lexicographically.
pub fn to_sorted_json(value: &Value) -> String {
    write(&to_serde_value(value, true))
}

/// Converts `value` into a serde_json value. With `sorted`, object
/// members are inserted in key order instead of their own order.
pub fn to_serde_value(value: &Value, sorted: bool) -> SJValue {
    match *value {
        Value::Null => SJValue::Null,
        Value::Bool(b) => SJValue::Bool(b),
        Value::Int32(i) => SJValue::from(i),
        Value::Int64(i) | Value::Timestamp(i) => SJValue::from(i),
        Value::Double(d) => Number::from_f64(d).map_or(SJValue::Null, SJValue::Number),
        Value::String(ref s) => SJValue::String(s.clone()),
        Value::Bytes(ref b) => SJValue::String(base64::encode(b)),
        Value::Array(ref items) => SJValue::Array(items.iter().map(|item| to_serde_value(item, sorted)).collect()),
        Value::Object(ref members) => {
            let mut members: Vec<&(String, Value)> = members.iter().collect();
            if sorted {
                members.sort_by(|a, b| a.0.cmp(&b.0));
            }
            let map: Map<String, SJValue> = members.into_iter()
                .map(|&(ref key, ref value)| (key.clone(), to_serde_value(value, sorted)))
                .collect();
            SJValue::Object(map)
        }
    }
}

fn write(value: &SJValue) -> String {
    // A tree of serde_json values with string keys always serializes.
    serde_json::ser::to_string(value).unwrap_or_else(|_| "null".to_owned())
}
