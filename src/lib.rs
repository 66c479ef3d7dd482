//! Entrig Plugin
//!
//! Push-notification delivery bridge between a native push SDK and an
//! application layer's method channel, plus the `entrig-sim` scenario
//! replayer.

pub use entrig_bridge as bridge;
pub use entrig_core as core;

pub mod sim;

pub use sim::{run_scenario, Scenario};
