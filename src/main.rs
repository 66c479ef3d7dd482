//! entrig-sim - replay a notification scenario through the bridge
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use entrig_plugin::bridge::{load_settings, settings::SETTINGS_FILENAME};
use entrig_plugin::core::{logging, prelude::*};
use entrig_plugin::sim::{run_scenario, Scenario};

/// Replay a notification scenario and print bridge frames as NDJSON
#[derive(Parser, Debug)]
#[command(name = "entrig-sim")]
#[command(about = "Replay a notification scenario through the bridge", long_about = None)]
struct Args {
    /// Scenario file (JSON)
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// Bridge settings (TOML); defaults to ./entrig.toml when present
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to a file so stdout carries frames only
    if let Err(e) = logging::init() {
        eprintln!("Logging disabled: {}", e);
    }

    let settings_path = args
        .settings
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILENAME));
    let settings = load_settings(&settings_path);

    let scenario = match Scenario::load(&args.scenario) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("❌ Cannot read scenario {}: {}", args.scenario.display(), e);
            std::process::exit(1);
        }
    };

    run_scenario(scenario, settings).await
}
