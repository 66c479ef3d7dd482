//! Test utilities for the bridge
//!
//! Provides an in-memory collaborator with scripted outcomes and a channel
//! that records every frame it is asked to send.

use std::sync::{Arc, Mutex, MutexGuard};

use entrig_core::NativePayload;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::binder::ForegroundContext;
use crate::channel::{CallId, MethodReply, PlatformChannel};
use crate::collaborator::{Collaborator, NotificationListener, PlatformHook, SdkResult};
use crate::command::InitConfig;
use crate::launch::RawLaunchContext;

/// A frame the bridge sent to the application layer
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelFrame {
    Invoke { method: String, arguments: Value },
    Reply { call_id: CallId, reply: MethodReply },
}

impl ChannelFrame {
    /// Error code if this is an error reply
    pub fn reply_code(&self) -> Option<&str> {
        match self {
            ChannelFrame::Reply { reply, .. } => reply.error_code(),
            ChannelFrame::Invoke { .. } => None,
        }
    }
}

/// Channel that forwards every frame to an mpsc receiver
#[derive(Debug)]
pub struct RecordingChannel {
    frames_tx: mpsc::UnboundedSender<ChannelFrame>,
}

impl RecordingChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChannelFrame>) {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        (Self { frames_tx }, frames_rx)
    }
}

impl PlatformChannel for RecordingChannel {
    fn invoke_method(&mut self, method: &str, arguments: Value) {
        let _ = self.frames_tx.send(ChannelFrame::Invoke {
            method: method.to_string(),
            arguments,
        });
    }

    fn send_reply(&mut self, call_id: CallId, reply: MethodReply) {
        let _ = self.frames_tx.send(ChannelFrame::Reply { call_id, reply });
    }
}

#[derive(Debug, Default)]
struct FakeState {
    init_result: Option<SdkResult>,
    register_result: Option<SdkResult>,
    unregister_result: Option<SdkResult>,
    permission_granted: bool,
    initial_notification: Option<NativePayload>,

    init_configs: Vec<InitConfig>,
    registrations: Vec<(String, ForegroundContext, String)>,
    permission_requests: usize,
    unregister_calls: usize,
    launches: Vec<RawLaunchContext>,
    foreground: Option<ForegroundContext>,
    hooks: Vec<PlatformHook>,
    foreground_listener: Option<NotificationListener>,
    opened_listener: Option<NotificationListener>,
}

/// In-memory collaborator. Every operation succeeds unless scripted otherwise.
#[derive(Debug, Clone, Default)]
pub struct FakeCollaborator {
    state: Arc<Mutex<FakeState>>,
}

impl FakeCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ─────────────────────────────────────────────────────────
    // Scripting
    // ─────────────────────────────────────────────────────────

    pub fn with_init_result(self, result: SdkResult) -> Self {
        self.state().init_result = Some(result);
        self
    }

    pub fn with_register_result(self, result: SdkResult) -> Self {
        self.state().register_result = Some(result);
        self
    }

    pub fn with_unregister_result(self, result: SdkResult) -> Self {
        self.state().unregister_result = Some(result);
        self
    }

    pub fn with_permission(self, granted: bool) -> Self {
        self.state().permission_granted = granted;
        self
    }

    pub fn with_initial_notification(self, payload: NativePayload) -> Self {
        self.state().initial_notification = Some(payload);
        self
    }

    /// Fire the foreground listener as the SDK would
    pub fn emit_foreground(&self, payload: NativePayload) {
        let listener = self.state().foreground_listener.clone();
        if let Some(listener) = listener {
            listener.notify(payload);
        }
    }

    /// Fire the opened listener as the SDK would
    pub fn emit_opened(&self, payload: NativePayload) {
        let listener = self.state().opened_listener.clone();
        if let Some(listener) = listener {
            listener.notify(payload);
        }
    }

    // ─────────────────────────────────────────────────────────
    // Inspection
    // ─────────────────────────────────────────────────────────

    pub fn has_listeners(&self) -> bool {
        let state = self.state();
        state.foreground_listener.is_some() && state.opened_listener.is_some()
    }

    pub fn init_calls(&self) -> usize {
        self.state().init_configs.len()
    }

    pub fn init_configs(&self) -> Vec<InitConfig> {
        self.state().init_configs.clone()
    }

    pub fn registered_users(&self) -> Vec<String> {
        self.state()
            .registrations
            .iter()
            .map(|(user, _, _)| user.clone())
            .collect()
    }

    pub fn registrations(&self) -> Vec<(String, ForegroundContext, String)> {
        self.state().registrations.clone()
    }

    pub fn permission_requests(&self) -> usize {
        self.state().permission_requests
    }

    pub fn unregister_calls(&self) -> usize {
        self.state().unregister_calls
    }

    pub fn handed_off_launches(&self) -> usize {
        self.state().launches.len()
    }

    pub fn current_foreground(&self) -> Option<ForegroundContext> {
        self.state().foreground.clone()
    }

    pub fn hooks(&self) -> Vec<PlatformHook> {
        self.state().hooks.clone()
    }
}

impl Collaborator for FakeCollaborator {
    async fn initialize(&self, config: InitConfig) -> SdkResult {
        let mut state = self.state();
        state.init_configs.push(config);
        state.init_result.clone().unwrap_or(Ok(()))
    }

    async fn register(
        &self,
        user_id: String,
        foreground: ForegroundContext,
        sdk: String,
    ) -> SdkResult {
        let mut state = self.state();
        state.registrations.push((user_id, foreground, sdk));
        state.register_result.clone().unwrap_or(Ok(()))
    }

    async fn unregister(&self) -> SdkResult {
        let mut state = self.state();
        state.unregister_calls += 1;
        state.unregister_result.clone().unwrap_or(Ok(()))
    }

    async fn request_permission(&self, _foreground: ForegroundContext) -> bool {
        let mut state = self.state();
        state.permission_requests += 1;
        state.permission_granted
    }

    async fn initial_notification(&self) -> Option<NativePayload> {
        self.state().initial_notification.clone()
    }

    fn set_foreground_listener(&self, listener: NotificationListener) {
        self.state().foreground_listener = Some(listener);
    }

    fn set_opened_listener(&self, listener: NotificationListener) {
        self.state().opened_listener = Some(listener);
    }

    fn handle_launch_context(&self, launch: &RawLaunchContext) {
        self.state().launches.push(launch.clone());
    }

    fn set_foreground_context(&self, foreground: Option<&ForegroundContext>) {
        self.state().foreground = foreground.cloned();
    }

    fn forward_hook(&self, hook: PlatformHook) {
        self.state().hooks.push(hook);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_defaults_succeed() {
        let fake = FakeCollaborator::new();
        assert_eq!(fake.initialize(InitConfig::new("k")).await, Ok(()));
        assert_eq!(fake.unregister().await, Ok(()));
        let foreground = ForegroundContext::new(1, "a");
        assert!(!fake.request_permission(foreground).await);
        assert!(fake.initial_notification().await.is_none());
        assert_eq!(fake.init_calls(), 1);
        assert_eq!(fake.unregister_calls(), 1);
    }

    #[tokio::test]
    async fn test_fake_scripted_failure() {
        let fake = FakeCollaborator::new().with_register_result(Err(Some("denied".into())));
        let result = fake
            .register("u".into(), ForegroundContext::new(1, "a"), "flutter".into())
            .await;
        assert_eq!(result, Err(Some("denied".to_string())));
        assert_eq!(fake.registered_users(), vec!["u"]);
    }

    #[test]
    fn test_recording_channel() {
        let (mut channel, mut frames) = RecordingChannel::new();
        channel.send_reply(3, MethodReply::NotImplemented);
        assert_eq!(
            frames.try_recv().unwrap(),
            ChannelFrame::Reply {
                call_id: 3,
                reply: MethodReply::NotImplemented
            }
        );
    }
}
