//! Delivery bridge actor
//!
//! The [`Bridge`] owns the initial-notification cache, the lifecycle binder
//! and the outbound [`PlatformChannel`]. It runs as a single tokio task that
//! drains one mailbox, so cache and binding mutations are serialized and
//! every channel invocation and reply happens on that task regardless of
//! which thread produced the underlying event.
//!
//! Collaborator calls never block the actor: each one runs in its own task
//! and posts a [`Message::CommandCompleted`] back to the mailbox.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use entrig_core::prelude::*;
use entrig_core::{CollaboratorOp, NotificationEvent};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::binder::{BinderAction, LifecycleBinder, LifecycleEvent};
use crate::cache::{InitialNotificationCache, StoreOutcome};
use crate::channel::{CallId, DeliveryKind, MethodReply, PlatformChannel};
use crate::collaborator::{Collaborator, NotificationListener, PlatformHook, SdkResult};
use crate::command::Command;
use crate::launch::LaunchClassifier;
use crate::message::Message;
use crate::settings::BridgeSettings;

/// Cloneable handle for posting to the bridge from any thread
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    msg_tx: mpsc::UnboundedSender<Message>,
    next_call_id: Arc<AtomicU64>,
}

impl BridgeHandle {
    /// Submit an inbound method call. The reply is delivered through the
    /// channel's `send_reply` with the returned id.
    pub fn method_call(&self, method: impl Into<String>, arguments: Value) -> Result<CallId> {
        let call_id = self.next_call_id.fetch_add(1, Ordering::Relaxed);
        self.post(Message::MethodCall {
            call_id,
            method: method.into(),
            arguments,
        })?;
        Ok(call_id)
    }

    pub fn lifecycle(&self, event: LifecycleEvent) -> Result<()> {
        self.post(Message::Lifecycle(event))
    }

    pub fn forward_hook(&self, hook: PlatformHook) -> Result<()> {
        self.post(Message::Hook(hook))
    }

    /// Stop the bridge (engine detached). In-flight completions are discarded.
    pub fn shutdown(&self) -> Result<()> {
        self.post(Message::Shutdown)
    }

    pub fn is_closed(&self) -> bool {
        self.msg_tx.is_closed()
    }

    fn post(&self, msg: Message) -> Result<()> {
        self.msg_tx.send(msg).map_err(|_| Error::ChannelClosed)
    }
}

/// The bridge actor
pub struct Bridge<C, P> {
    settings: BridgeSettings,
    collaborator: Arc<C>,
    channel: P,
    cache: InitialNotificationCache,
    binder: LifecycleBinder,
    msg_tx: mpsc::UnboundedSender<Message>,
    msg_rx: mpsc::UnboundedReceiver<Message>,
    next_call_id: Arc<AtomicU64>,
}

impl<C, P> std::fmt::Debug for Bridge<C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("channel", &self.settings.channel.name)
            .field("cache", &self.cache)
            .field("binder", &self.binder)
            .finish()
    }
}

impl<C, P> Bridge<C, P>
where
    C: Collaborator + Sync + 'static,
    P: PlatformChannel,
{
    /// Create the bridge and install its listeners on the collaborator
    pub fn new(settings: BridgeSettings, collaborator: Arc<C>, channel: P) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();

        collaborator.set_foreground_listener(NotificationListener::new(
            DeliveryKind::Foreground,
            msg_tx.clone(),
        ));
        collaborator.set_opened_listener(NotificationListener::new(
            DeliveryKind::Opened,
            msg_tx.clone(),
        ));

        let binder = LifecycleBinder::new(LaunchClassifier::new(settings.launch.clone()));

        Self {
            settings,
            collaborator,
            channel,
            cache: InitialNotificationCache::new(),
            binder,
            msg_tx,
            msg_rx,
            next_call_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn handle(&self) -> BridgeHandle {
        BridgeHandle {
            msg_tx: self.msg_tx.clone(),
            next_call_id: self.next_call_id.clone(),
        }
    }

    /// Spawn the actor on the current tokio runtime
    pub fn spawn(self) -> (BridgeHandle, JoinHandle<()>) {
        let handle = self.handle();
        let task = tokio::spawn(self.run());
        (handle, task)
    }

    /// Drain the mailbox until shutdown
    pub async fn run(mut self) {
        info!("Bridge started on channel {}", self.settings.channel.name);
        while let Some(msg) = self.msg_rx.recv().await {
            if !self.process_message(msg) {
                break;
            }
        }
        self.msg_rx.close();
        info!("Bridge stopped");
    }

    /// Process one message. Returns false when the bridge should stop.
    pub fn process_message(&mut self, msg: Message) -> bool {
        match msg {
            Message::MethodCall {
                call_id,
                method,
                arguments,
            } => self.dispatch(call_id, &method, &arguments),
            Message::CommandCompleted { call_id, reply } => {
                self.channel.send_reply(call_id, reply);
            }
            Message::Delivery { kind, payload } => {
                match NotificationEvent::from_native(&payload) {
                    Ok(event) => self.deliver(kind, &event),
                    Err(e) => warn!("Dropping {:?} notification: {}", kind, e),
                }
            }
            Message::Lifecycle(event) => {
                for action in self.binder.handle(event) {
                    self.apply(action);
                }
            }
            Message::Hook(hook) => {
                debug!("Forwarding platform hook: {:?}", hook);
                self.collaborator.forward_hook(hook);
            }
            Message::Shutdown => return false,
        }
        true
    }

    fn dispatch(&mut self, call_id: CallId, method: &str, arguments: &Value) {
        let command = match Command::decode(method, arguments) {
            Ok(command) => command,
            Err(e) => {
                self.reply_error(call_id, method, &e);
                return;
            }
        };
        debug!("Call #{}: {}", call_id, command.method());

        let foreground = self.binder.foreground().cloned();
        let collaborator = self.collaborator.clone();
        match (command, foreground) {
            (Command::Init(config), _) => self.complete_later(call_id, async move {
                sdk_reply(CollaboratorOp::Init, collaborator.initialize(config).await)
            }),
            (Command::Register(args), Some(foreground)) => {
                let sdk = self.settings.sdk.name.clone();
                self.complete_later(call_id, async move {
                    sdk_reply(
                        CollaboratorOp::Register,
                        collaborator.register(args.user_id, foreground, sdk).await,
                    )
                })
            }
            (Command::RequestPermission, Some(foreground)) => {
                self.complete_later(call_id, async move {
                    let granted = collaborator.request_permission(foreground).await;
                    MethodReply::success(granted)
                })
            }
            (Command::Unregister, _) => self.complete_later(call_id, async move {
                sdk_reply(CollaboratorOp::Unregister, collaborator.unregister().await)
            }),
            (Command::GetInitialNotification, _) => match self.cache.consume() {
                Some(event) => {
                    debug!("Handing out cached initial notification");
                    let value = Value::Object(event.to_map());
                    self.channel
                        .send_reply(call_id, MethodReply::Success(value));
                }
                None => self.complete_later(call_id, async move {
                    let fallback = collaborator.initial_notification().await;
                    MethodReply::Success(fallback_value(fallback))
                }),
            },
            (Command::Register(_) | Command::RequestPermission, None) => {
                self.reply_error(call_id, method, &Error::NoForegroundContext);
            }
        }
    }

    /// Reply with an error; only unexpected failures are logged loudly
    fn reply_error(&mut self, call_id: CallId, method: &str, err: &Error) {
        if err.is_recoverable() {
            debug!("Call #{} '{}' failed: {}", call_id, method, err);
        } else {
            warn!("Call #{} '{}' rejected: {}", call_id, method, err);
        }
        self.channel
            .send_reply(call_id, MethodReply::from_error(err));
    }

    /// Run a collaborator call off the actor and post its reply back
    fn complete_later<F>(&self, call_id: CallId, call: F)
    where
        F: Future<Output = MethodReply> + Send + 'static,
    {
        let msg_tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let reply = call.await;
            if msg_tx
                .send(Message::CommandCompleted { call_id, reply })
                .is_err()
            {
                debug!("Bridge stopped before call #{} completed", call_id);
            }
        });
    }

    fn deliver(&mut self, kind: DeliveryKind, event: &NotificationEvent) {
        let method = match kind {
            DeliveryKind::Foreground => &self.settings.channel.foreground_event,
            DeliveryKind::Opened => &self.settings.channel.opened_event,
        };
        let payload = event.to_delivery(kind.is_foreground());
        debug!("{} {}", method, payload);
        self.channel.invoke_method(method, payload);
    }

    fn apply(&mut self, action: BinderAction) {
        match action {
            BinderAction::SetForegroundContext(foreground) => {
                self.collaborator
                    .set_foreground_context(foreground.as_ref());
            }
            BinderAction::HandOffLaunch(launch) => {
                self.collaborator.handle_launch_context(&launch);
            }
            BinderAction::CacheInitial(event) => match self.cache.store(event) {
                StoreOutcome::Stored => debug!("Cached initial notification"),
                StoreOutcome::DroppedPending => {
                    warn!("Initial notification already pending, dropping newer one")
                }
                StoreOutcome::DroppedConsumed => {
                    warn!("Initial notification already consumed, dropping")
                }
            },
        }
    }
}

fn sdk_reply(op: CollaboratorOp, result: SdkResult) -> MethodReply {
    match result {
        Ok(()) => MethodReply::Success(Value::Null),
        Err(reason) => MethodReply::from_error(&Error::collaborator(op, reason)),
    }
}

/// Normalize the collaborator's own initial notification; decode failures
/// are answered with `null`
fn fallback_value(payload: Option<entrig_core::NativePayload>) -> Value {
    let Some(payload) = payload else {
        return Value::Null;
    };
    match NotificationEvent::from_native(&payload) {
        Ok(event) => Value::Object(event.to_map()),
        Err(e) => {
            warn!("Collaborator initial notification is malformed: {}", e);
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::ForegroundContext;
    use crate::launch::RawLaunchContext;
    use crate::test_utils::{ChannelFrame, FakeCollaborator, RecordingChannel};
    use entrig_core::{NativePayload, NativeValue};
    use serde_json::json;

    type TestBridge = Bridge<FakeCollaborator, RecordingChannel>;

    fn new_bridge() -> (
        TestBridge,
        Arc<FakeCollaborator>,
        mpsc::UnboundedReceiver<ChannelFrame>,
    ) {
        let collaborator = Arc::new(FakeCollaborator::new());
        let (channel, frames) = RecordingChannel::new();
        let bridge = Bridge::new(BridgeSettings::default(), collaborator.clone(), channel);
        (bridge, collaborator, frames)
    }

    fn call(bridge: &mut TestBridge, id: CallId, method: &str, args: Value) {
        bridge.process_message(Message::MethodCall {
            call_id: id,
            method: method.to_string(),
            arguments: args,
        });
    }

    fn attach(bridge: &mut TestBridge, launch: Option<RawLaunchContext>) {
        bridge.process_message(Message::Lifecycle(LifecycleEvent::Attached {
            foreground: ForegroundContext::new(1, "MainActivity"),
            launch,
        }));
    }

    #[tokio::test]
    async fn test_new_installs_listeners() {
        let (_bridge, collaborator, _frames) = new_bridge();
        assert!(collaborator.has_listeners());
    }

    #[tokio::test]
    async fn test_unknown_method_replies_not_implemented() {
        let (mut bridge, _collaborator, mut frames) = new_bridge();
        call(&mut bridge, 1, "setBadge", Value::Null);

        assert_eq!(
            frames.try_recv().unwrap(),
            ChannelFrame::Reply {
                call_id: 1,
                reply: MethodReply::NotImplemented
            }
        );
    }

    #[tokio::test]
    async fn test_empty_api_key_never_reaches_collaborator() {
        let (mut bridge, collaborator, mut frames) = new_bridge();
        call(&mut bridge, 7, "init", json!({"apiKey": ""}));

        let frame = frames.try_recv().unwrap();
        assert_eq!(frame.reply_code(), Some("INVALID_API_KEY"));
        assert_eq!(collaborator.init_calls(), 0);
    }

    #[tokio::test]
    async fn test_register_without_foreground() {
        let (mut bridge, collaborator, mut frames) = new_bridge();
        call(&mut bridge, 2, "register", json!({"userId": "u"}));
        call(&mut bridge, 3, "requestPermission", Value::Null);

        assert_eq!(frames.try_recv().unwrap().reply_code(), Some("NO_ACTIVITY"));
        assert_eq!(frames.try_recv().unwrap().reply_code(), Some("NO_ACTIVITY"));
        assert!(collaborator.registered_users().is_empty());
    }

    #[tokio::test]
    async fn test_cached_initial_notification_is_answered_inline() {
        let (mut bridge, collaborator, mut frames) = new_bridge();
        let launch = RawLaunchContext::new(
            vec![
                ("message_id".to_string(), NativeValue::string("m1")),
                ("payload".to_string(), NativeValue::string(r#"{"title":"T"}"#)),
            ],
            0,
        );
        attach(&mut bridge, Some(launch));
        assert_eq!(collaborator.handed_off_launches(), 1);

        call(&mut bridge, 4, "getInitialNotification", Value::Null);
        match frames.try_recv().unwrap() {
            ChannelFrame::Reply {
                call_id: 4,
                reply: MethodReply::Success(value),
            } => assert_eq!(value["title"], "T"),
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delivery_invokes_named_event() {
        let (mut bridge, _collaborator, mut frames) = new_bridge();
        bridge.process_message(Message::Delivery {
            kind: DeliveryKind::Opened,
            payload: NativePayload::Flat(NativeValue::object([
                ("title", NativeValue::string("T")),
                ("type", NativeValue::string("order")),
            ])),
        });

        assert_eq!(
            frames.try_recv().unwrap(),
            ChannelFrame::Invoke {
                method: "notifications#onClick".to_string(),
                arguments: json!({
                    "title": "T", "body": "", "type": "order", "data": {}, "isForeground": false
                }),
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_delivery_is_dropped() {
        let (mut bridge, _collaborator, mut frames) = new_bridge();
        bridge.process_message(Message::Delivery {
            kind: DeliveryKind::Foreground,
            payload: NativePayload::Flat(NativeValue::object([
                ("a", NativeValue::Int(1)),
                ("a", NativeValue::Int(2)),
            ])),
        });

        assert!(frames.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_hook_is_forwarded() {
        let (mut bridge, collaborator, _frames) = new_bridge();
        let hook = PlatformHook::PermissionResult {
            request_code: 1001,
            grant_results: vec![0],
        };
        bridge.process_message(Message::Hook(hook.clone()));
        assert_eq!(collaborator.hooks(), vec![hook]);
    }

    #[tokio::test]
    async fn test_shutdown_stops_processing() {
        let (mut bridge, _collaborator, _frames) = new_bridge();
        assert!(!bridge.process_message(Message::Shutdown));
    }
}
