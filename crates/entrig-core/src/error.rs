//! Bridge error types with wire codes

use std::fmt;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Collaborator operation that reported a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorOp {
    Init,
    Register,
    Unregister,
}

impl CollaboratorOp {
    /// Wire code reported over the method channel
    pub fn code(&self) -> &'static str {
        match self {
            CollaboratorOp::Init => "INIT_FAILED",
            CollaboratorOp::Register => "REGISTER_FAILED",
            CollaboratorOp::Unregister => "UNREGISTER_FAILED",
        }
    }

    /// Message used when the SDK fails without giving a reason
    pub fn default_reason(&self) -> &'static str {
        match self {
            CollaboratorOp::Init => "Initialization failed",
            CollaboratorOp::Register => "Registration failed",
            CollaboratorOp::Unregister => "Unregistration failed",
        }
    }
}

impl fmt::Display for CollaboratorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollaboratorOp::Init => write!(f, "init"),
            CollaboratorOp::Register => write!(f, "register"),
            CollaboratorOp::Unregister => write!(f, "unregister"),
        }
    }
}

/// Bridge error types organized by layer
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Command Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument '{field}': {message}")]
    InvalidArgument { field: String, message: String },

    #[error("API key cannot be empty")]
    InvalidApiKey,

    #[error("Activity not available")]
    NoForegroundContext,

    #[error("Method not implemented: {method}")]
    NotImplemented { method: String },

    // ─────────────────────────────────────────────────────────────
    // Collaborator Errors
    // ─────────────────────────────────────────────────────────────
    #[error("{reason}")]
    Collaborator { op: CollaboratorOp, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Payload Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Payload decode error: {message}")]
    Decode { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Bridge channel closed")]
    ChannelClosed,
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_implemented(method: impl Into<String>) -> Self {
        Self::NotImplemented {
            method: method.into(),
        }
    }

    /// Collaborator failure; falls back to the operation's default reason
    pub fn collaborator(op: CollaboratorOp, reason: Option<String>) -> Self {
        let reason = reason
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| op.default_reason().to_string());
        Self::Collaborator { op, reason }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Error code sent back over the method channel
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidArgument { .. } => "INVALID_ARGUMENTS",
            Error::InvalidApiKey => "INVALID_API_KEY",
            Error::NoForegroundContext => "NO_ACTIVITY",
            Error::NotImplemented { .. } => "NOT_IMPLEMENTED",
            Error::Collaborator { op, .. } => op.code(),
            Error::Decode { .. } => "DECODE_ERROR",
            Error::Config { .. } => "CONFIG_ERROR",
            Error::ChannelClosed => "CHANNEL_CLOSED",
            Error::Io(_) | Error::Json(_) => "INTERNAL",
        }
    }

    /// Check if the caller can retry after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NoForegroundContext | Error::Collaborator { .. } | Error::Decode { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
