//! Canonical notification event

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decode::{decode, Mapping};
use crate::error::Result;
use crate::native::NativePayload;

/// Keys lifted out of the payload into dedicated fields
const TITLE_KEY: &str = "title";
const BODY_KEY: &str = "body";
const TYPE_KEY: &str = "type";
const DATA_KEY: &str = "data";

/// Canonical notification record sent to the application layer.
///
/// `title` and `body` are never null on the wire. `kind` (serialized as
/// `type`) is never duplicated inside `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub data: Mapping,
}

impl NotificationEvent {
    /// Build an event from a decoded flat payload.
    ///
    /// `title`, `body` and `type` are removed from the mapping; everything
    /// else becomes `data`.
    pub fn from_payload(mut payload: Mapping) -> Self {
        let title = take_text(&mut payload, TITLE_KEY).unwrap_or_default();
        let body = take_text(&mut payload, BODY_KEY).unwrap_or_default();
        let kind = take_text(&mut payload, TYPE_KEY);

        Self {
            title,
            body,
            kind,
            data: payload,
        }
    }

    /// Decode and normalize a native payload of either shape
    pub fn from_native(payload: &NativePayload) -> Result<Self> {
        let mut map = decode(payload.container())?;
        if let NativePayload::Envelope(_) = payload {
            hoist_envelope_data(&mut map);
        }
        Ok(Self::from_payload(map))
    }

    /// Wire representation: `{title, body, type, data}`
    pub fn to_map(&self) -> Mapping {
        let mut map = Mapping::new();
        map.insert(TITLE_KEY.to_string(), Value::String(self.title.clone()));
        map.insert(BODY_KEY.to_string(), Value::String(self.body.clone()));
        map.insert(
            TYPE_KEY.to_string(),
            self.kind.clone().map(Value::String).unwrap_or(Value::Null),
        );
        map.insert(DATA_KEY.to_string(), Value::Object(self.data.clone()));
        map
    }

    /// Outbound delivery payload with the `isForeground` flag attached
    pub fn to_delivery(&self, is_foreground: bool) -> Value {
        let mut map = self.to_map();
        map.insert("isForeground".to_string(), Value::Bool(is_foreground));
        Value::Object(map)
    }
}

/// Remove a key and render it as text. Null counts as absent.
fn take_text(payload: &mut Mapping, key: &str) -> Option<String> {
    match payload.remove(key)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Flatten an SDK envelope so the custom entries sit next to title/body.
/// Top-level keys win over entries of the same name inside `data`.
fn hoist_envelope_data(map: &mut Mapping) {
    match map.remove(DATA_KEY) {
        Some(Value::Object(inner)) => {
            for (key, value) in inner {
                map.entry(key).or_insert(value);
            }
        }
        Some(Value::Null) | None => {}
        Some(other) => {
            map.insert(DATA_KEY.to_string(), other);
        }
    }
}
