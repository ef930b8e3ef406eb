//! Extras codec
//!
//! Caller payloads attached to a task descriptor are arbitrary JSON maps.
//! Only a restricted value set survives the trip through a scheduling
//! back-end: booleans, 64-bit integers, doubles, strings, and homogeneous
//! arrays of these. [`encode_extras`] narrows a payload to that set,
//! dropping (never failing on) anything else and reporting the dropped
//! keys. [`decode_extras`] is the total inverse over codec output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A value representable across the process boundary and in persisted
/// back-end storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraValue {
    Bool(bool),
    Long(i64),
    Double(f64),
    Text(String),
    BoolArray(Vec<bool>),
    LongArray(Vec<i64>),
    DoubleArray(Vec<f64>),
    TextArray(Vec<String>),
}

/// Restricted payload produced by the codec, keyed by the surviving
/// caller keys
pub type TaskExtras = BTreeMap<String, ExtraValue>;

/// Outcome of narrowing a caller payload to the restricted set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertedExtras {
    /// Best-effort payload containing every representable key
    pub extras: TaskExtras,
    /// Keys whose values fell outside the restricted set
    pub failed_keys: Vec<String>,
}

impl ConvertedExtras {
    /// Whether any key was dropped during conversion
    pub fn has_failures(&self) -> bool {
        !self.failed_keys.is_empty()
    }

    /// Dropped keys joined for log output
    pub fn failed_keys_display(&self) -> String {
        self.failed_keys.join(", ")
    }
}

/// Narrow a caller payload to the restricted persistable set.
///
/// Unrepresentable values (null, objects, nested or heterogeneous arrays,
/// arrays containing null, integers outside the i64 range) cost their key
/// only; scheduling proceeds with the partial payload.
pub fn encode_extras(raw: &serde_json::Map<String, Value>) -> ConvertedExtras {
    let mut converted = ConvertedExtras::default();
    for (key, value) in raw {
        match convert_value(value) {
            Some(extra) => {
                converted.extras.insert(key.clone(), extra);
            }
            None => converted.failed_keys.push(key.clone()),
        }
    }
    converted
}

/// Restore the caller-shaped payload from codec output.
///
/// Total: every [`ExtraValue`] has an exact JSON representation, so this
/// never fails on values the codec itself produced.
pub fn decode_extras(extras: &TaskExtras) -> serde_json::Map<String, Value> {
    let mut raw = serde_json::Map::new();
    for (key, value) in extras {
        raw.insert(key.clone(), restore_value(value));
    }
    raw
}

fn convert_value(value: &Value) -> Option<ExtraValue> {
    match value {
        Value::Bool(b) => Some(ExtraValue::Bool(*b)),
        Value::Number(n) => convert_number(n),
        Value::String(s) => Some(ExtraValue::Text(s.clone())),
        Value::Array(items) => convert_array(items),
        // Null and object graphs have no persistable representation
        Value::Null | Value::Object(_) => None,
    }
}

fn convert_number(n: &serde_json::Number) -> Option<ExtraValue> {
    if let Some(i) = n.as_i64() {
        return Some(ExtraValue::Long(i));
    }
    n.as_f64().map(ExtraValue::Double)
}

// Arrays must be homogeneous over the scalar subset. An array mixing
// integers and floats is treated as a double array; anything else mixed,
// nested, or containing null drops the key.
fn convert_array(items: &[Value]) -> Option<ExtraValue> {
    if items.is_empty() {
        return Some(ExtraValue::TextArray(Vec::new()));
    }
    match &items[0] {
        Value::Bool(_) => {
            let bools: Option<Vec<bool>> = items.iter().map(Value::as_bool).collect();
            bools.map(ExtraValue::BoolArray)
        }
        Value::Number(_) => {
            if items.iter().all(|v| v.as_i64().is_some()) {
                let longs: Option<Vec<i64>> = items.iter().map(Value::as_i64).collect();
                return longs.map(ExtraValue::LongArray);
            }
            let doubles: Option<Vec<f64>> = items.iter().map(Value::as_f64).collect();
            doubles.map(ExtraValue::DoubleArray)
        }
        Value::String(_) => {
            let texts: Option<Vec<String>> =
                items.iter().map(|v| v.as_str().map(str::to_owned)).collect();
            texts.map(ExtraValue::TextArray)
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn restore_value(value: &ExtraValue) -> Value {
    match value {
        ExtraValue::Bool(b) => Value::Bool(*b),
        ExtraValue::Long(i) => Value::from(*i),
        ExtraValue::Double(d) => Value::from(*d),
        ExtraValue::Text(s) => Value::String(s.clone()),
        ExtraValue::BoolArray(items) => Value::from(items.clone()),
        ExtraValue::LongArray(items) => Value::from(items.clone()),
        ExtraValue::DoubleArray(items) => Value::from(items.clone()),
        ExtraValue::TextArray(items) => Value::from(items.clone()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(m) => m,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn scalars_survive_conversion() {
        let raw = map(json!({
            "flag": true,
            "count": 42,
            "ratio": 0.5,
            "name": "sync",
        }));
        let converted = encode_extras(&raw);

        assert!(!converted.has_failures());
        assert_eq!(converted.extras["flag"], ExtraValue::Bool(true));
        assert_eq!(converted.extras["count"], ExtraValue::Long(42));
        assert_eq!(converted.extras["ratio"], ExtraValue::Double(0.5));
        assert_eq!(converted.extras["name"], ExtraValue::Text("sync".into()));
    }

    #[test]
    fn homogeneous_arrays_survive_conversion() {
        let raw = map(json!({
            "flags": [true, false],
            "counts": [1, 2, 3],
            "ratios": [0.5, 1.5],
            "names": ["a", "b"],
        }));
        let converted = encode_extras(&raw);

        assert!(!converted.has_failures());
        assert_eq!(converted.extras["flags"], ExtraValue::BoolArray(vec![true, false]));
        assert_eq!(converted.extras["counts"], ExtraValue::LongArray(vec![1, 2, 3]));
        assert_eq!(converted.extras["ratios"], ExtraValue::DoubleArray(vec![0.5, 1.5]));
        assert_eq!(
            converted.extras["names"],
            ExtraValue::TextArray(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn mixed_numeric_array_widens_to_doubles() {
        let raw = map(json!({ "values": [1, 2.5] }));
        let converted = encode_extras(&raw);
        assert_eq!(converted.extras["values"], ExtraValue::DoubleArray(vec![1.0, 2.5]));
    }

    #[test]
    fn unrepresentable_values_drop_their_keys() {
        let raw = map(json!({
            "ok": 1,
            "null_value": null,
            "object": {"a": 1},
            "nested_array": [[1]],
            "mixed_array": [1, "two"],
            "array_with_null": ["a", null],
        }));
        let converted = encode_extras(&raw);

        assert_eq!(converted.extras.len(), 1);
        assert_eq!(converted.extras["ok"], ExtraValue::Long(1));
        let mut failed = converted.failed_keys.clone();
        failed.sort();
        assert_eq!(
            failed,
            vec!["array_with_null", "mixed_array", "nested_array", "null_value", "object"]
        );
    }

    #[test]
    fn failed_keys_display_is_joined() {
        let raw = map(json!({ "a": null, "b": {} }));
        let converted = encode_extras(&raw);
        assert_eq!(converted.failed_keys_display(), "a, b");
    }

    #[test]
    fn empty_array_is_kept() {
        let raw = map(json!({ "empty": [] }));
        let converted = encode_extras(&raw);
        assert!(!converted.has_failures());
        assert_eq!(decode_extras(&converted.extras)["empty"], json!([]));
    }

    #[test]
    fn round_trip_on_the_supported_subset() {
        let raw = map(json!({
            "flag": false,
            "count": -7,
            "ratio": 2.25,
            "name": "task",
            "ids": [10, 20],
            "labels": ["x"],
            "dropped": {"not": "supported"},
        }));
        let converted = encode_extras(&raw);
        let restored = decode_extras(&converted.extras);

        // Every supported key restores exactly; the unsupported key is
        // absent, never corrupted.
        let mut expected = raw.clone();
        expected.remove("dropped");
        assert_eq!(restored, expected);

        // Re-encoding the decoded payload is lossless.
        let second = encode_extras(&restored);
        assert!(!second.has_failures());
        assert_eq!(second.extras, converted.extras);
    }
}
