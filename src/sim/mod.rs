//! Headless simulator - replay scenarios through the bridge
//!
//! Drives a real [`Bridge`](entrig_bridge::Bridge) with a scripted
//! collaborator and prints every frame the bridge sends to the application
//! layer as NDJSON.
//!
//! # Frame Format
//!
//! ```json
//! {"frame":"reply","call_id":1,"status":"success","result":null,"timestamp":1704700001000}
//! {"frame":"invoke","method":"notifications#onClick","arguments":{"title":"T","body":"","type":null,"data":{},"isForeground":false},"timestamp":1704700002000}
//! {"frame":"reply","call_id":2,"status":"error","code":"NO_ACTIVITY","message":"Activity not available","timestamp":1704700003000}
//! ```

pub mod collaborator;
pub mod runner;
pub mod scenario;

use std::io::Write;

use chrono::Utc;
use entrig_bridge::{CallId, MethodReply, PlatformChannel};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::error;

pub use collaborator::ScriptedCollaborator;
pub use runner::{run_scenario, run_scenario_with_writer};
pub use scenario::{CollaboratorScript, LaunchSpec, Scenario, ScriptedOutcome, Step};

/// Frames emitted by the simulator
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum SimFrame {
    /// Outbound event invoked on the application layer
    Invoke {
        method: String,
        arguments: Value,
        timestamp: i64,
    },

    /// Reply to an inbound method call
    Reply {
        call_id: CallId,
        status: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        timestamp: i64,
    },
}

impl SimFrame {
    pub fn invoke(method: &str, arguments: Value) -> Self {
        Self::Invoke {
            method: method.to_string(),
            arguments,
            timestamp: Self::now(),
        }
    }

    pub fn reply(call_id: CallId, reply: MethodReply) -> Self {
        let (status, result, code, message) = match reply {
            MethodReply::Success(value) => ("success", Some(value), None, None),
            MethodReply::Error { code, message } => ("error", None, Some(code), Some(message)),
            MethodReply::NotImplemented => ("not_implemented", None, None, None),
        };
        Self::Reply {
            call_id,
            status,
            result,
            code,
            message,
            timestamp: Self::now(),
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Platform channel writing frames as NDJSON.
///
/// Reply ids are also reported to the runner so it can wait for each call.
pub struct SimChannel<W> {
    out: W,
    replies_tx: mpsc::UnboundedSender<CallId>,
}

impl<W: Write + Send + 'static> SimChannel<W> {
    pub fn new(out: W, replies_tx: mpsc::UnboundedSender<CallId>) -> Self {
        Self { out, replies_tx }
    }

    fn emit(&mut self, frame: &SimFrame) {
        let json = match serde_json::to_string(frame) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize frame: {}", e);
                return;
            }
        };

        if let Err(e) = writeln!(self.out, "{}", json) {
            error!("Failed to write frame: {}", e);
            return;
        }

        if let Err(e) = self.out.flush() {
            error!("Failed to flush frame output: {}", e);
        }
    }
}

impl<W: Write + Send + 'static> PlatformChannel for SimChannel<W> {
    fn invoke_method(&mut self, method: &str, arguments: Value) {
        self.emit(&SimFrame::invoke(method, arguments));
    }

    fn send_reply(&mut self, call_id: CallId, reply: MethodReply) {
        self.emit(&SimFrame::reply(call_id, reply));
        let _ = self.replies_tx.send(call_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_frame_serialization() {
        let frame = SimFrame::reply(
            2,
            MethodReply::Error {
                code: "NO_ACTIVITY".to_string(),
                message: "Activity not available".to_string(),
            },
        );
        let value = serde_json::to_value(&frame).unwrap();

        assert_eq!(value["frame"], "reply");
        assert_eq!(value["call_id"], 2);
        assert_eq!(value["status"], "error");
        assert_eq!(value["code"], "NO_ACTIVITY");
        assert!(value.get("result").is_none());
        assert!(value["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_success_frame_keeps_null_result() {
        let frame = SimFrame::reply(1, MethodReply::Success(Value::Null));
        let value = serde_json::to_value(frame).unwrap();
        assert_eq!(value["status"], "success");
        assert!(value.get("result").is_some());
        assert!(value.get("code").is_none());
    }

    #[test]
    fn test_channel_writes_ndjson() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut channel = SimChannel::new(Vec::new(), tx);

        channel.invoke_method("notifications#onForeground", json!({"title": "T"}));
        channel.send_reply(5, MethodReply::NotImplemented);

        let text = String::from_utf8(channel.out.clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"frame\":\"invoke\""));
        assert!(lines[1].contains("\"status\":\"not_implemented\""));
        assert_eq!(rx.try_recv().unwrap(), 5);
    }
}
