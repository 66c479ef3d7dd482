//! Launch classification
//!
//! Decides whether a process launch was caused by the user tapping a push
//! notification, and if so turns the launch extras into a
//! [`NotificationEvent`]. Each launch context instance is classified once.

use std::sync::atomic::{AtomicU64, Ordering};

use entrig_core::prelude::*;
use entrig_core::{decode_json, Mapping, NativeValue, NotificationEvent};

use crate::settings::LaunchSettings;

/// Launch flag set when the launch is a resume from the recents/history list
pub const FLAG_ACTIVITY_LAUNCHED_FROM_HISTORY: u32 = 0x0010_0000;

static LAUNCH_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of one observed launch context instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaunchId(u64);

impl LaunchId {
    fn next() -> Self {
        Self(LAUNCH_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Native launch attributes (intent extras plus launch flags)
#[derive(Debug, Clone, PartialEq)]
pub struct RawLaunchContext {
    id: LaunchId,
    extras: Vec<(String, NativeValue)>,
    flags: u32,
}

impl RawLaunchContext {
    /// New launch context instance; every call gets a fresh identity
    pub fn new(extras: Vec<(String, NativeValue)>, flags: u32) -> Self {
        Self {
            id: LaunchId::next(),
            extras,
            flags,
        }
    }

    /// A launch without extras (plain app icon tap)
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    pub fn id(&self) -> LaunchId {
        self.id
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn has_extras(&self) -> bool {
        !self.extras.is_empty()
    }

    pub fn is_from_history(&self) -> bool {
        self.flags & FLAG_ACTIVITY_LAUNCHED_FROM_HISTORY != 0
    }

    pub fn extra(&self, key: &str) -> Option<&NativeValue> {
        self.extras.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether the push SDK should see this launch at all
    pub fn is_handoff_candidate(&self) -> bool {
        self.has_extras() && !self.is_from_history()
    }
}

/// Why a launch context did not produce an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NoExtras,
    ResumedFromHistory,
    MissingMessageId,
    MalformedPayload(String),
    AlreadyClassified,
}

/// Outcome of classifying a launch context
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Accepted(NotificationEvent),
    Rejected(RejectReason),
}

impl Classification {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Classification::Accepted(_))
    }
}

/// Classifier state: which launch context, if any, was last classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifierState {
    #[default]
    Unclassified,
    Classified(LaunchId),
}

/// Fire-once launch classifier
#[derive(Debug)]
pub struct LaunchClassifier {
    settings: LaunchSettings,
    state: ClassifierState,
}

impl LaunchClassifier {
    pub fn new(settings: LaunchSettings) -> Self {
        Self {
            settings,
            state: ClassifierState::Unclassified,
        }
    }

    pub fn state(&self) -> ClassifierState {
        self.state
    }

    /// Whether this exact launch context was already classified
    pub fn is_classified(&self, launch: &RawLaunchContext) -> bool {
        self.state == ClassifierState::Classified(launch.id())
    }

    /// Classify a launch context. A second call for the same instance is
    /// rejected with [`RejectReason::AlreadyClassified`].
    pub fn classify(&mut self, launch: &RawLaunchContext) -> Classification {
        if self.is_classified(launch) {
            return Classification::Rejected(RejectReason::AlreadyClassified);
        }
        self.state = ClassifierState::Classified(launch.id());

        let result = self.evaluate(launch);
        match &result {
            Classification::Accepted(event) => {
                info!(
                    "Launch {:?} came from a notification: {:?}",
                    launch.id(),
                    event.title
                )
            }
            Classification::Rejected(reason) => {
                debug!("Launch {:?} rejected: {:?}", launch.id(), reason)
            }
        }
        result
    }

    fn evaluate(&self, launch: &RawLaunchContext) -> Classification {
        if !launch.has_extras() {
            return Classification::Rejected(RejectReason::NoExtras);
        }
        if launch.is_from_history() {
            return Classification::Rejected(RejectReason::ResumedFromHistory);
        }
        if self.message_id(launch).is_none() {
            return Classification::Rejected(RejectReason::MissingMessageId);
        }

        match self.payload(launch) {
            Ok(payload) => Classification::Accepted(NotificationEvent::from_payload(payload)),
            Err(e) => {
                warn!("Dropping notification launch with bad payload: {}", e);
                Classification::Rejected(RejectReason::MalformedPayload(e.to_string()))
            }
        }
    }

    fn message_id<'a>(&self, launch: &'a RawLaunchContext) -> Option<&'a str> {
        self.settings
            .message_id_keys
            .iter()
            .find_map(|key| launch.extra(key).and_then(NativeValue::as_str))
    }

    /// The payload extra is a JSON string; a missing payload is an empty map
    fn payload(&self, launch: &RawLaunchContext) -> Result<Mapping> {
        match launch.extra(&self.settings.payload_key) {
            None | Some(NativeValue::Null) => Ok(Mapping::new()),
            Some(NativeValue::String(text)) => decode_json(text),
            Some(other) => Err(Error::decode(format!(
                "payload extra must be a JSON string, found {}",
                other.kind()
            ))),
        }
    }
}

impl Default for LaunchClassifier {
    fn default() -> Self {
        Self::new(LaunchSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn launch(extras: &[(&str, &str)], flags: u32) -> RawLaunchContext {
        RawLaunchContext::new(
            extras
                .iter()
                .map(|(k, v)| (k.to_string(), NativeValue::string(*v)))
                .collect(),
            flags,
        )
    }

    #[test]
    fn test_rejects_empty_extras() {
        let mut classifier = LaunchClassifier::default();
        assert_eq!(
            classifier.classify(&RawLaunchContext::empty()),
            Classification::Rejected(RejectReason::NoExtras)
        );
    }

    #[test]
    fn test_rejects_history_launch() {
        let mut classifier = LaunchClassifier::default();
        let ctx = launch(
            &[("google.message_id", "1"), ("payload", "{}")],
            FLAG_ACTIVITY_LAUNCHED_FROM_HISTORY | 0x1000_0000,
        );
        assert_eq!(
            classifier.classify(&ctx),
            Classification::Rejected(RejectReason::ResumedFromHistory)
        );
        assert!(!ctx.is_handoff_candidate());
    }

    #[test]
    fn test_rejects_without_message_id() {
        let mut classifier = LaunchClassifier::default();
        let ctx = launch(&[("payload", r#"{"title":"Hi"}"#), ("from", "123")], 0);
        assert_eq!(
            classifier.classify(&ctx),
            Classification::Rejected(RejectReason::MissingMessageId)
        );
        assert!(ctx.is_handoff_candidate());
    }

    #[test]
    fn test_rejects_non_string_message_id() {
        let mut classifier = LaunchClassifier::default();
        let ctx = RawLaunchContext::new(
            vec![("message_id".to_string(), NativeValue::Int(1))],
            0,
        );
        assert_eq!(
            classifier.classify(&ctx),
            Classification::Rejected(RejectReason::MissingMessageId)
        );
    }

    #[test]
    fn test_accepts_google_message_id() {
        let mut classifier = LaunchClassifier::default();
        let ctx = launch(
            &[("google.message_id", "1"), ("payload", r#"{"title":"Hi"}"#)],
            0,
        );

        let Classification::Accepted(event) = classifier.classify(&ctx) else {
            panic!("expected acceptance");
        };
        assert_eq!(event.title, "Hi");
        assert_eq!(event.body, "");
        assert!(event.kind.is_none());
        assert!(event.data.is_empty());
    }

    #[test]
    fn test_accepts_message_id_alias() {
        let mut classifier = LaunchClassifier::default();
        let ctx = launch(
            &[
                ("message_id", "m1"),
                ("payload", r#"{"title":"T","body":"B","type":"order","x":1}"#),
            ],
            0,
        );

        let Classification::Accepted(event) = classifier.classify(&ctx) else {
            panic!("expected acceptance");
        };
        assert_eq!(event.title, "T");
        assert_eq!(event.body, "B");
        assert_eq!(event.kind.as_deref(), Some("order"));
        assert_eq!(Value::Object(event.data), json!({"x": 1}));
    }

    #[test]
    fn test_accepts_without_payload() {
        let mut classifier = LaunchClassifier::default();
        let ctx = launch(&[("google.message_id", "1")], 0);
        let Classification::Accepted(event) = classifier.classify(&ctx) else {
            panic!("expected acceptance");
        };
        assert_eq!(event.title, "");
    }

    #[test]
    fn test_rejects_malformed_payload() {
        let mut classifier = LaunchClassifier::default();
        let ctx = launch(&[("google.message_id", "1"), ("payload", "{\"title\":")], 0);
        assert!(matches!(
            classifier.classify(&ctx),
            Classification::Rejected(RejectReason::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_fire_once_per_context() {
        let mut classifier = LaunchClassifier::default();
        let ctx = launch(&[("google.message_id", "1")], 0);

        assert!(classifier.classify(&ctx).is_accepted());
        assert!(classifier.is_classified(&ctx));
        assert_eq!(
            classifier.classify(&ctx),
            Classification::Rejected(RejectReason::AlreadyClassified)
        );

        // A new instance with identical extras is a new launch
        let next = launch(&[("google.message_id", "1")], 0);
        assert_ne!(next.id(), ctx.id());
        assert!(classifier.classify(&next).is_accepted());
        assert_eq!(classifier.state(), ClassifierState::Classified(next.id()));
    }

    #[test]
    fn test_custom_settings() {
        let mut classifier = LaunchClassifier::new(LaunchSettings {
            message_id_keys: vec!["gcm.message_id".to_string()],
            payload_key: "entrig".to_string(),
        });
        let ctx = launch(&[("gcm.message_id", "9"), ("entrig", r#"{"body":"b"}"#)], 0);
        let Classification::Accepted(event) = classifier.classify(&ctx) else {
            panic!("expected acceptance");
        };
        assert_eq!(event.body, "b");
    }
}
