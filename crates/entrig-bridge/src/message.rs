//! Bridge mailbox messages
//!
//! Everything that touches bridge state arrives here: method calls from the
//! application layer, collaborator completions, listener deliveries and host
//! lifecycle callbacks. The actor processes them one at a time.

use entrig_core::NativePayload;
use serde_json::Value;

use crate::binder::LifecycleEvent;
use crate::channel::{CallId, DeliveryKind, MethodReply};
use crate::collaborator::PlatformHook;

#[derive(Debug, Clone)]
pub enum Message {
    // ─────────────────────────────────────────────────────────
    // Application Layer
    // ─────────────────────────────────────────────────────────
    /// Inbound method call awaiting a reply
    MethodCall {
        call_id: CallId,
        method: String,
        arguments: Value,
    },

    /// A collaborator call finished; deliver its reply
    CommandCompleted { call_id: CallId, reply: MethodReply },

    // ─────────────────────────────────────────────────────────
    // Collaborator Listeners
    // ─────────────────────────────────────────────────────────
    /// Notification from the foreground or opened listener
    Delivery {
        kind: DeliveryKind,
        payload: NativePayload,
    },

    // ─────────────────────────────────────────────────────────
    // Host
    // ─────────────────────────────────────────────────────────
    Lifecycle(LifecycleEvent),

    Hook(PlatformHook),

    /// Engine detached; stop the actor
    Shutdown,
}
