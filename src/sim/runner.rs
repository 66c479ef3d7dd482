//! Scenario runner - drives a bridge through a scripted session

use std::io::Write;
use std::sync::Arc;

use entrig_bridge::{
    Bridge, BridgeHandle, BridgeSettings, CallId, ForegroundContext, LifecycleEvent,
    PlatformHook, RawLaunchContext,
};
use entrig_core::prelude::*;
use entrig_core::NativePayload;
use tokio::sync::mpsc;

use super::collaborator::ScriptedCollaborator;
use super::scenario::{Scenario, Step};
use super::SimChannel;

const FOREGROUND_NAME: &str = "MainActivity";

/// Replay a scenario, writing frames to stdout
pub async fn run_scenario(scenario: Scenario, settings: BridgeSettings) -> Result<()> {
    run_scenario_with_writer(scenario, settings, std::io::stdout()).await
}

/// Replay a scenario, writing frames to `out`
pub async fn run_scenario_with_writer<W>(
    scenario: Scenario,
    settings: BridgeSettings,
    out: W,
) -> Result<()>
where
    W: Write + Send + 'static,
{
    info!("═══════════════════════════════════════════════════════");
    info!("entrig-sim: {} step(s)", scenario.steps.len());
    info!("═══════════════════════════════════════════════════════");

    let (replies_tx, replies_rx) = mpsc::unbounded_channel();
    let collaborator = Arc::new(ScriptedCollaborator::new(scenario.collaborator.clone()));
    let bridge = Bridge::new(
        settings,
        collaborator.clone(),
        SimChannel::new(out, replies_tx),
    );
    let (handle, task) = bridge.spawn();

    let mut session = Session {
        handle,
        collaborator,
        replies_rx,
        launch: scenario.launch.as_ref().map(|spec| spec.to_context()),
        foreground_id: 0,
    };

    let result = session.run(scenario.steps).await;

    if let Err(e) = session.handle.shutdown() {
        debug!("Bridge already stopped: {}", e);
    }
    if let Err(e) = task.await {
        warn!("Bridge task ended abnormally: {}", e);
    }

    info!("entrig-sim finished");
    result
}

/// Host-side state of a simulated session
struct Session {
    handle: BridgeHandle,
    collaborator: Arc<ScriptedCollaborator>,
    replies_rx: mpsc::UnboundedReceiver<CallId>,
    /// Launch context the process was started with
    launch: Option<RawLaunchContext>,
    foreground_id: u64,
}

impl Session {
    async fn run(&mut self, steps: Vec<Step>) -> Result<()> {
        let foreground = self.next_foreground();
        self.handle.lifecycle(LifecycleEvent::Attached {
            foreground,
            launch: self.launch.clone(),
        })?;

        for (index, step) in steps.into_iter().enumerate() {
            trace!("Step {}: {:?}", index, step);
            self.run_step(step).await?;
        }
        Ok(())
    }

    async fn run_step(&mut self, step: Step) -> Result<()> {
        match step {
            Step::Call { method, arguments } => {
                let call_id = self.handle.method_call(method, arguments)?;
                self.wait_for_reply(call_id).await?;
            }
            Step::Foreground(value) => {
                self.collaborator
                    .receive_foreground(NativePayload::Flat(value.into()));
            }
            Step::Opened(value) => {
                self.collaborator
                    .open(NativePayload::Envelope(value.into()));
            }
            Step::Rotate => {
                self.handle
                    .lifecycle(LifecycleEvent::DetachedForConfigChanges)?;
                let foreground = self.next_foreground();
                self.handle.lifecycle(LifecycleEvent::Reattached {
                    foreground,
                    launch: self.launch.clone(),
                })?;
            }
            Step::Detach => self.handle.lifecycle(LifecycleEvent::Detached)?,
            Step::Attach => {
                let foreground = self.next_foreground();
                self.handle.lifecycle(LifecycleEvent::Attached {
                    foreground,
                    launch: None,
                })?;
            }
            Step::NewLaunch(spec) => {
                let launch = spec.to_context();
                self.handle.lifecycle(LifecycleEvent::NewLaunch(launch))?;
            }
            Step::DeviceToken(token) => {
                let hook = PlatformHook::DeviceToken(token);
                self.handle.forward_hook(hook)?;
            }
            Step::PermissionResult {
                request_code,
                grant_results,
            } => self.handle.forward_hook(PlatformHook::PermissionResult {
                request_code,
                grant_results,
            })?,
        }
        Ok(())
    }

    fn next_foreground(&mut self) -> ForegroundContext {
        self.foreground_id += 1;
        ForegroundContext::new(self.foreground_id, FOREGROUND_NAME)
    }

    /// Wait until the bridge has replied to `call_id`
    async fn wait_for_reply(&mut self, call_id: CallId) -> Result<()> {
        while let Some(replied) = self.replies_rx.recv().await {
            if replied == call_id {
                return Ok(());
            }
        }
        Err(Error::ChannelClosed)
    }
}
