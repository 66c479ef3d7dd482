//! Structural payload decoder
//!
//! Walks a [`NativeValue`] tree and produces canonical JSON-like data:
//! objects become mappings, arrays become sequences, the native null sentinel
//! becomes `null` and scalars pass through. Decoding is pure; the only
//! failures are structural (non-object root, duplicate keys, non-finite
//! numbers, unparseable JSON text).

use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};
use crate::native::NativeValue;

/// Canonical string-keyed mapping
pub type Mapping = Map<String, Value>;

/// Decode a native object container into a mapping
pub fn decode(container: &NativeValue) -> Result<Mapping> {
    match container {
        NativeValue::Object(entries) => decode_object(entries),
        other => Err(Error::decode(format!(
            "expected an object container, found {}",
            other.kind()
        ))),
    }
}

/// Decode a JSON-encoded payload string into a mapping
pub fn decode_json(text: &str) -> Result<Mapping> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::decode(format!("invalid JSON payload: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::decode(format!(
            "expected a JSON object payload, found {}",
            json_kind(&other)
        ))),
    }
}

/// Re-encode canonical data as a native object container
pub fn encode(mapping: &Mapping) -> NativeValue {
    NativeValue::Object(
        mapping
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

fn decode_object(entries: &[(String, NativeValue)]) -> Result<Mapping> {
    let mut map = Mapping::new();
    for (key, value) in entries {
        if map.contains_key(key) {
            return Err(Error::decode(format!("duplicate key '{}'", key)));
        }
        map.insert(key.clone(), decode_value(value)?);
    }
    Ok(map)
}

fn decode_value(value: &NativeValue) -> Result<Value> {
    Ok(match value {
        NativeValue::Null => Value::Null,
        NativeValue::Bool(b) => Value::Bool(*b),
        NativeValue::Int(i) => Value::from(*i),
        NativeValue::UInt(u) => Value::from(*u),
        NativeValue::Double(d) => Number::from_f64(*d)
            .map(Value::Number)
            .ok_or_else(|| Error::decode(format!("non-finite number {}", d)))?,
        NativeValue::String(s) => Value::String(s.clone()),
        NativeValue::Array(items) => {
            Value::Array(items.iter().map(decode_value).collect::<Result<_>>()?)
        }
        NativeValue::Object(entries) => Value::Object(decode_object(entries)?),
    })
}

fn encode_value(value: &Value) -> NativeValue {
    match value {
        Value::Null => NativeValue::Null,
        Value::Bool(b) => NativeValue::Bool(*b),
        Value::Number(n) => NativeValue::from_number(n),
        Value::String(s) => NativeValue::String(s.clone()),
        Value::Array(items) => NativeValue::Array(items.iter().map(encode_value).collect()),
        Value::Object(map) => encode(map),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
