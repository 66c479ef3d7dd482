//! Lifecycle binder
//!
//! Tracks the foreground context across attach, config-change detach,
//! reattach and full detach. Lifecycle events are turned into
//! [`BinderAction`]s that the bridge applies to the collaborator and the
//! initial-notification cache.

use std::fmt;

use entrig_core::prelude::*;
use entrig_core::NotificationEvent;

use crate::launch::{Classification, LaunchClassifier, RawLaunchContext};

/// The live foreground surface (an Activity / view controller)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundContext {
    pub id: u64,
    pub name: String,
}

impl ForegroundContext {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for ForegroundContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// Lifecycle notifications from the host
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// A foreground context attached, with the launch context it was started with
    Attached {
        foreground: ForegroundContext,
        launch: Option<RawLaunchContext>,
    },

    /// The foreground context is being torn down for a configuration change
    DetachedForConfigChanges,

    /// The foreground context came back after a configuration change
    Reattached {
        foreground: ForegroundContext,
        launch: Option<RawLaunchContext>,
    },

    /// The foreground context is gone for good
    Detached,

    /// A new launch context arrived while the process is alive
    NewLaunch(RawLaunchContext),
}

/// Side effects requested by the binder
#[derive(Debug, Clone, PartialEq)]
pub enum BinderAction {
    /// Tell the collaborator which foreground context is current
    SetForegroundContext(Option<ForegroundContext>),
    /// Hand a launch context to the collaborator for its own handling
    HandOffLaunch(RawLaunchContext),
    /// Hold a cold-start event for `getInitialNotification`
    CacheInitial(NotificationEvent),
}

#[derive(Debug)]
pub struct LifecycleBinder {
    foreground: Option<ForegroundContext>,
    classifier: LaunchClassifier,
    /// Cleared by the first attach; later launches are forwarded live only
    cold_start: bool,
}

impl LifecycleBinder {
    pub fn new(classifier: LaunchClassifier) -> Self {
        Self {
            foreground: None,
            classifier,
            cold_start: true,
        }
    }

    /// The attached foreground context, if any
    pub fn foreground(&self) -> Option<&ForegroundContext> {
        self.foreground.as_ref()
    }

    pub fn handle(&mut self, event: LifecycleEvent) -> Vec<BinderAction> {
        match event {
            LifecycleEvent::Attached { foreground, launch } => {
                let cold_start = std::mem::replace(&mut self.cold_start, false);
                self.attach(foreground, launch, cold_start)
            }
            LifecycleEvent::Reattached { foreground, launch } => {
                self.attach(foreground, launch, false)
            }
            LifecycleEvent::DetachedForConfigChanges => {
                debug!("Foreground detached for config change");
                self.foreground = None;
                Vec::new()
            }
            LifecycleEvent::Detached => {
                debug!("Foreground detached");
                self.foreground = None;
                vec![BinderAction::SetForegroundContext(None)]
            }
            LifecycleEvent::NewLaunch(launch) => {
                debug!("New launch context {:?} forwarded live", launch.id());
                vec![BinderAction::HandOffLaunch(launch)]
            }
        }
    }

    fn attach(
        &mut self,
        foreground: ForegroundContext,
        launch: Option<RawLaunchContext>,
        cold_start: bool,
    ) -> Vec<BinderAction> {
        debug!("Foreground attached: {}", foreground);
        self.foreground = Some(foreground.clone());
        let mut actions = vec![BinderAction::SetForegroundContext(Some(foreground))];

        let Some(launch) = launch else {
            return actions;
        };
        if self.classifier.is_classified(&launch) {
            trace!("Launch {:?} already classified, skipping", launch.id());
            return actions;
        }

        let classification = self.classifier.classify(&launch);
        let launch_id = launch.id();
        if launch.is_handoff_candidate() {
            actions.push(BinderAction::HandOffLaunch(launch));
        }
        match classification {
            Classification::Accepted(event) if cold_start => {
                actions.push(BinderAction::CacheInitial(event));
            }
            Classification::Accepted(_) => {
                debug!("Warm launch {:?} not cached", launch_id);
            }
            Classification::Rejected(_) => {}
        }
        actions
    }
}

impl Default for LifecycleBinder {
    fn default() -> Self {
        Self::new(LaunchClassifier::default())
    }
}
