//! # entrig-bridge - Notification Delivery Bridge
//!
//! Connects the external push SDK (the "collaborator") to the application
//! layer's method channel. Normalizes notification payloads, classifies
//! cold-start launches, holds the initial notification until the application
//! asks for it, and dispatches the inbound commands.
//!
//! Depends on [`entrig_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Bridge
//! - [`Bridge`] - Actor owning all bridge state and the outbound channel
//! - [`BridgeHandle`] - Cloneable handle posting messages to the actor
//!
//! ### Seams
//! - [`Collaborator`] - The push SDK as seen by the bridge
//! - [`PlatformChannel`] - Outbound method channel to the application layer
//!
//! ### Building Blocks
//! - [`Command`] - Typed inbound command decoded from `(method, arguments)`
//! - [`LaunchClassifier`] - Decides whether a launch came from a notification
//! - [`InitialNotificationCache`] - Consume-once cold-start event holder
//! - [`LifecycleBinder`] - Tracks the attached foreground context
//! - [`BridgeSettings`] - TOML-backed configuration

pub mod binder;
pub mod bridge;
pub mod cache;
pub mod channel;
pub mod collaborator;
pub mod command;
pub mod launch;
pub mod message;
pub mod settings;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use binder::{BinderAction, ForegroundContext, LifecycleBinder, LifecycleEvent};
pub use bridge::{Bridge, BridgeHandle};
pub use cache::{InitialNotificationCache, StoreOutcome};
pub use channel::{CallId, DeliveryKind, MethodReply, PlatformChannel};
pub use collaborator::{
    Collaborator, LocalCollaborator, NotificationListener, PlatformHook, SdkResult,
};
pub use command::{Command, InitConfig, RegisterArgs};
pub use launch::{
    Classification, LaunchClassifier, LaunchId, RawLaunchContext, RejectReason,
    FLAG_ACTIVITY_LAUNCHED_FROM_HISTORY,
};
pub use message::Message;
pub use settings::{load_settings, parse_settings, BridgeSettings};
