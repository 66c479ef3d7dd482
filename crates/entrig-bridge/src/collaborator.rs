//! The push SDK as seen by the bridge
//!
//! The collaborator performs the real work (SDK init, device registration,
//! permission prompts, launch handling). The bridge only delegates to it and
//! relays results. Async operations complete on whatever thread the SDK
//! uses; the bridge awaits them off its actor task.

use entrig_core::prelude::*;
use entrig_core::NativePayload;
use tokio::sync::mpsc;

use crate::binder::ForegroundContext;
use crate::channel::DeliveryKind;
use crate::command::InitConfig;
use crate::launch::RawLaunchContext;
use crate::message::Message;

/// Collaborator completion: `Err` carries the SDK's failure reason, if it gave one
pub type SdkResult = std::result::Result<(), Option<String>>;

/// Platform callbacks forwarded verbatim to the SDK
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformHook {
    /// Result of a runtime permission request
    PermissionResult {
        request_code: i32,
        grant_results: Vec<i32>,
    },
    /// APNs/FCM device token was issued
    DeviceToken(Vec<u8>),
    /// Device token registration failed
    DeviceTokenError(String),
}

/// External push SDK operations used by the bridge
#[trait_variant::make(Collaborator: Send)]
pub trait LocalCollaborator {
    /// Initialize the SDK
    async fn initialize(&self, config: InitConfig) -> SdkResult;

    /// Register this device for `user_id`
    async fn register(
        &self,
        user_id: String,
        foreground: ForegroundContext,
        sdk: String,
    ) -> SdkResult;

    /// Unregister this device
    async fn unregister(&self) -> SdkResult;

    /// Ask the user for notification permission; resolves to `granted`
    async fn request_permission(&self, foreground: ForegroundContext) -> bool;

    /// The SDK's own record of the notification that launched the app
    async fn initial_notification(&self) -> Option<NativePayload>;

    /// Install the listener for notifications received in foreground
    fn set_foreground_listener(&self, listener: NotificationListener);

    /// Install the listener for notifications opened from background
    fn set_opened_listener(&self, listener: NotificationListener);

    /// Let the SDK inspect a launch context (it may fire the opened listener)
    fn handle_launch_context(&self, launch: &RawLaunchContext);

    /// Track the current foreground context for foreground detection
    fn set_foreground_context(&self, foreground: Option<&ForegroundContext>);

    /// Forward a platform callback
    fn forward_hook(&self, hook: PlatformHook);
}

/// Listener handed to the collaborator.
///
/// Safe to call from any thread and never blocks: the payload is posted to
/// the bridge mailbox and processed on the actor task.
#[derive(Debug, Clone)]
pub struct NotificationListener {
    kind: DeliveryKind,
    msg_tx: mpsc::UnboundedSender<Message>,
}

impl NotificationListener {
    pub(crate) fn new(kind: DeliveryKind, msg_tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { kind, msg_tx }
    }

    pub fn kind(&self) -> DeliveryKind {
        self.kind
    }

    /// Deliver a notification payload to the bridge
    pub fn notify(&self, payload: NativePayload) {
        let msg = Message::Delivery {
            kind: self.kind,
            payload,
        };
        if self.msg_tx.send(msg).is_err() {
            debug!("Bridge stopped, dropping {:?} notification", self.kind);
        }
    }
}
