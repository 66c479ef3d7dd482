//! Scripted push SDK used by the simulator

use std::sync::Mutex;

use entrig_bridge::{
    Collaborator, ForegroundContext, InitConfig, NotificationListener, PlatformHook,
    RawLaunchContext, SdkResult,
};
use entrig_core::prelude::*;
use entrig_core::NativePayload;

use super::scenario::CollaboratorScript;

/// Answers every SDK operation from a [`CollaboratorScript`] and logs what
/// the bridge asked of it.
#[derive(Debug)]
pub struct ScriptedCollaborator {
    script: CollaboratorScript,
    foreground_listener: Mutex<Option<NotificationListener>>,
    opened_listener: Mutex<Option<NotificationListener>>,
}

impl ScriptedCollaborator {
    pub fn new(script: CollaboratorScript) -> Self {
        Self {
            script,
            foreground_listener: Mutex::new(None),
            opened_listener: Mutex::new(None),
        }
    }

    /// Simulate the SDK receiving a notification while in foreground
    pub fn receive_foreground(&self, payload: NativePayload) {
        Self::fire(&self.foreground_listener, payload);
    }

    /// Simulate the user opening a notification
    pub fn open(&self, payload: NativePayload) {
        Self::fire(&self.opened_listener, payload);
    }

    fn install(slot: &Mutex<Option<NotificationListener>>, listener: NotificationListener) {
        *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(listener);
    }

    fn fire(slot: &Mutex<Option<NotificationListener>>, payload: NativePayload) {
        let listener = slot.lock().unwrap_or_else(|e| e.into_inner()).clone();
        match listener {
            Some(listener) => listener.notify(payload),
            None => warn!("No listener installed, notification lost"),
        }
    }
}

impl Collaborator for ScriptedCollaborator {
    async fn initialize(&self, config: InitConfig) -> SdkResult {
        info!(
            "SDK init (handlePermission={}, showForegroundNotification={})",
            config.handle_permission, config.show_foreground_notification
        );
        self.script.init.to_result()
    }

    async fn register(
        &self,
        user_id: String,
        foreground: ForegroundContext,
        sdk: String,
    ) -> SdkResult {
        info!(
            "SDK register user '{}' from {} (sdk={})",
            user_id, foreground, sdk
        );
        self.script.register.to_result()
    }

    async fn unregister(&self) -> SdkResult {
        info!("SDK unregister");
        self.script.unregister.to_result()
    }

    async fn request_permission(&self, foreground: ForegroundContext) -> bool {
        info!("SDK permission prompt on {}", foreground);
        self.script.permission_granted
    }

    async fn initial_notification(&self) -> Option<NativePayload> {
        self.script
            .initial_notification
            .clone()
            .map(|value| NativePayload::Flat(value.into()))
    }

    fn set_foreground_listener(&self, listener: NotificationListener) {
        Self::install(&self.foreground_listener, listener);
    }

    fn set_opened_listener(&self, listener: NotificationListener) {
        Self::install(&self.opened_listener, listener);
    }

    fn handle_launch_context(&self, launch: &RawLaunchContext) {
        info!(
            "SDK inspected launch {:?} (flags={:#x})",
            launch.id(),
            launch.flags()
        );
    }

    fn set_foreground_context(&self, foreground: Option<&ForegroundContext>) {
        match foreground {
            Some(foreground) => debug!("SDK foreground context: {}", foreground),
            None => debug!("SDK foreground context cleared"),
        }
    }

    fn forward_hook(&self, hook: PlatformHook) {
        info!("SDK hook: {:?}", hook);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::scenario::ScriptedOutcome;
    use serde_json::json;

    #[tokio::test]
    async fn test_scripted_outcomes() {
        let collaborator = ScriptedCollaborator::new(CollaboratorScript {
            register: ScriptedOutcome::Fail(Some("denied".to_string())),
            permission_granted: true,
            initial_notification: Some(json!({"title": "Fallback"})),
            ..Default::default()
        });
        let foreground = ForegroundContext::new(1, "MainActivity");

        assert_eq!(collaborator.initialize(InitConfig::new("k")).await, Ok(()));
        assert_eq!(
            collaborator
                .register("u".into(), foreground.clone(), "flutter".into())
                .await,
            Err(Some("denied".to_string()))
        );
        assert!(collaborator.request_permission(foreground).await);
        assert!(collaborator.initial_notification().await.is_some());
    }

    #[test]
    fn test_fire_without_listener_is_harmless() {
        let collaborator = ScriptedCollaborator::new(CollaboratorScript::default());
        collaborator.open(NativePayload::Flat(json!({"title": "T"}).into()));
    }
}
