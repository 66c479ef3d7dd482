//! Native value model
//!
//! Platform containers (JSON objects parsed by the OS, typed extras bundles,
//! dictionaries from the push SDK) are represented as [`NativeValue`] before
//! they are decoded into canonical data.

use serde_json::{Number, Value};

use crate::error::{Error, Result};

/// A value as handed over by the native layer.
///
/// Objects keep the key order the platform enumerated them in, and may
/// contain duplicate keys; the decoder rejects those as malformed.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// Platform null sentinel (`JSONObject.NULL`, `NSNull`)
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`
    UInt(u64),
    Double(f64),
    String(String),
    Array(Vec<NativeValue>),
    Object(Vec<(String, NativeValue)>),
}

impl NativeValue {
    /// Build an object from key/value pairs
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, NativeValue)>,
    {
        NativeValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn string(value: impl Into<String>) -> Self {
        NativeValue::String(value.into())
    }

    /// Parse JSON text into a native value
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::decode(format!("invalid JSON: {}", e)))?;
        Ok(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up the first entry with this key in an object
    pub fn get(&self, key: &str) -> Option<&NativeValue> {
        match self {
            NativeValue::Object(entries) => {
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    /// Convert a JSON number without losing integer precision
    pub fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            NativeValue::Int(i)
        } else if let Some(u) = n.as_u64() {
            NativeValue::UInt(u)
        } else {
            NativeValue::Double(n.as_f64().unwrap_or(f64::NAN))
        }
    }

    /// Short type name used in decode error messages
    pub fn kind(&self) -> &'static str {
        match self {
            NativeValue::Null => "null",
            NativeValue::Bool(_) => "bool",
            NativeValue::Int(_) | NativeValue::UInt(_) => "int",
            NativeValue::Double(_) => "double",
            NativeValue::String(_) => "string",
            NativeValue::Array(_) => "array",
            NativeValue::Object(_) => "object",
        }
    }
}

impl From<Value> for NativeValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => NativeValue::Null,
            Value::Bool(b) => NativeValue::Bool(b),
            Value::Number(n) => NativeValue::from_number(&n),
            Value::String(s) => NativeValue::String(s),
            Value::Array(items) => NativeValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                NativeValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// A notification payload in one of the shapes the native layer produces
#[derive(Debug, Clone, PartialEq)]
pub enum NativePayload {
    /// Flat key/value payload: `{title, body, type, ...custom}`
    Flat(NativeValue),

    /// Push SDK envelope: `{title, body, data: {type, ...custom}}`
    Envelope(NativeValue),
}

impl NativePayload {
    pub fn container(&self) -> &NativeValue {
        match self {
            NativePayload::Flat(v) | NativePayload::Envelope(v) => v,
        }
    }
}
