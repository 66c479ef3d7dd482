//! Outbound method channel to the application layer

use entrig_core::Error;
use serde_json::Value;

/// Identifier pairing an inbound method call with its reply
pub type CallId = u64;

/// Reply to an inbound method call
#[derive(Debug, Clone, PartialEq)]
pub enum MethodReply {
    Success(Value),
    Error { code: String, message: String },
    NotImplemented,
}

impl MethodReply {
    pub fn success(value: impl Into<Value>) -> Self {
        MethodReply::Success(value.into())
    }

    /// Map a bridge error onto the wire. `NotImplemented` gets its own reply.
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::NotImplemented { .. } => MethodReply::NotImplemented,
            other => MethodReply::Error {
                code: other.code().to_string(),
                message: other.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MethodReply::Success(_))
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            MethodReply::Error { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<entrig_core::Result<Value>> for MethodReply {
    fn from(result: entrig_core::Result<Value>) -> Self {
        match result {
            Ok(value) => MethodReply::Success(value),
            Err(err) => MethodReply::from_error(&err),
        }
    }
}

/// Which listener produced an outbound delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryKind {
    /// Notification arrived while the app was in foreground
    Foreground,
    /// User tapped a notification while the app was in background
    Opened,
}

impl DeliveryKind {
    pub fn is_foreground(&self) -> bool {
        matches!(self, DeliveryKind::Foreground)
    }
}

/// The application layer's method channel.
///
/// The channel is only `Send`: the bridge actor owns it and calls it through
/// `&mut self`, so every invocation and reply runs on the actor task.
pub trait PlatformChannel: Send + 'static {
    /// Invoke a method on the application side (outbound event)
    fn invoke_method(&mut self, method: &str, arguments: Value);

    /// Deliver the reply for an inbound call
    fn send_reply(&mut self, call_id: CallId, reply: MethodReply);
}

#[cfg(test)]
mod tests {
    use super::*;
    use entrig_core::CollaboratorOp;
    use serde_json::json;

    #[test]
    fn test_reply_from_error() {
        let reply = MethodReply::from_error(&Error::InvalidApiKey);
        assert_eq!(
            reply,
            MethodReply::Error {
                code: "INVALID_API_KEY".to_string(),
                message: "API key cannot be empty".to_string(),
            }
        );
        assert_eq!(reply.error_code(), Some("INVALID_API_KEY"));
    }

    #[test]
    fn test_reply_not_implemented_is_distinct() {
        let reply = MethodReply::from_error(&Error::not_implemented("foo"));
        assert_eq!(reply, MethodReply::NotImplemented);
        assert!(reply.error_code().is_none());
    }

    #[test]
    fn test_reply_from_result() {
        let ok: MethodReply = Ok(json!(true)).into();
        assert!(ok.is_success());

        let failure = Error::collaborator(CollaboratorOp::Unregister, Some("offline".into()));
        let err: MethodReply = Err(failure).into();
        assert_eq!(err.error_code(), Some("UNREGISTER_FAILED"));
    }

    #[test]
    fn test_delivery_kind() {
        assert!(DeliveryKind::Foreground.is_foreground());
        assert!(!DeliveryKind::Opened.is_foreground());
    }
}
