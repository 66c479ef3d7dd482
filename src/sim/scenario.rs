//! Scenario files replayed by `entrig-sim`
//!
//! ```json
//! {
//!   "launch": { "extras": { "message_id": "m1", "payload": "{\"title\":\"T\"}" } },
//!   "collaborator": { "permissionGranted": true, "register": { "fail": "denied" } },
//!   "steps": [
//!     { "call": { "method": "getInitialNotification" } },
//!     { "opened": { "title": "Hello", "data": { "orderId": 7 } } },
//!     "rotate",
//!     "detach"
//!   ]
//! }
//! ```

use std::path::Path;

use entrig_bridge::{RawLaunchContext, SdkResult};
use entrig_core::prelude::*;
use entrig_core::NativeValue;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Launch context the first foreground context attaches with
    #[serde(default)]
    pub launch: Option<LaunchSpec>,

    #[serde(default)]
    pub collaborator: CollaboratorScript,

    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Load a scenario from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid scenario")
    }
}

/// Launch extras and flags, as the host would report them
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchSpec {
    #[serde(default)]
    pub extras: Map<String, Value>,
    #[serde(default)]
    pub flags: u32,
}

impl LaunchSpec {
    pub fn to_context(&self) -> RawLaunchContext {
        let extras = self
            .extras
            .iter()
            .map(|(key, value)| (key.clone(), NativeValue::from(value.clone())))
            .collect();
        RawLaunchContext::new(extras, self.flags)
    }
}

/// Outcome of one scripted SDK operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScriptedOutcome {
    #[default]
    Ok,
    /// Fail with the SDK's reason, or none to use the default message
    Fail(Option<String>),
}

impl ScriptedOutcome {
    pub fn to_result(&self) -> SdkResult {
        match self {
            ScriptedOutcome::Ok => Ok(()),
            ScriptedOutcome::Fail(reason) => Err(reason.clone()),
        }
    }
}

/// How the simulated push SDK answers
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorScript {
    #[serde(default)]
    pub init: ScriptedOutcome,
    #[serde(default)]
    pub register: ScriptedOutcome,
    #[serde(default)]
    pub unregister: ScriptedOutcome,
    #[serde(default)]
    pub permission_granted: bool,
    /// The SDK's own record of the launch notification, used as fallback
    #[serde(default)]
    pub initial_notification: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    /// Inbound method call; the runner waits for its reply
    Call {
        method: String,
        #[serde(default)]
        arguments: Value,
    },
    /// SDK receives a notification while in foreground (flat payload)
    Foreground(Value),
    /// User opens a notification from background (SDK envelope)
    Opened(Value),
    /// Configuration change: detach and reattach with the original launch
    Rotate,
    /// Foreground context goes away
    Detach,
    /// A fresh foreground context attaches without a launch context
    Attach,
    /// A new launch context arrives while the process is alive
    NewLaunch(LaunchSpec),
    /// Platform hands over a device token
    DeviceToken(Vec<u8>),
    /// Runtime permission result
    #[serde(rename_all = "camelCase")]
    PermissionResult {
        request_code: i32,
        grant_results: Vec<i32>,
    },
}
