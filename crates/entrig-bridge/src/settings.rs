//! Bridge settings (`entrig.toml`)
//!
//! Every field has a default matching the published plugin contract, so an
//! empty or missing file yields a working configuration.

use std::path::Path;

use entrig_core::prelude::*;
use serde::{Deserialize, Serialize};

/// Default settings file name
pub const SETTINGS_FILENAME: &str = "entrig.toml";

/// Top-level bridge settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BridgeSettings {
    #[serde(default)]
    pub channel: ChannelSettings,

    #[serde(default)]
    pub launch: LaunchSettings,

    #[serde(default)]
    pub sdk: SdkSettings,
}

/// Method channel identity and outbound event names
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChannelSettings {
    #[serde(default = "default_channel_name")]
    pub name: String,

    #[serde(default = "default_foreground_event")]
    pub foreground_event: String,

    #[serde(default = "default_opened_event")]
    pub opened_event: String,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            name: default_channel_name(),
            foreground_event: default_foreground_event(),
            opened_event: default_opened_event(),
        }
    }
}

/// Launch extras recognition
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LaunchSettings {
    /// Extras keys carrying the push delivery message id, checked in order
    #[serde(default = "default_message_id_keys")]
    pub message_id_keys: Vec<String>,

    /// Extras key carrying the JSON-encoded notification payload
    #[serde(default = "default_payload_key")]
    pub payload_key: String,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            message_id_keys: default_message_id_keys(),
            payload_key: default_payload_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SdkSettings {
    /// SDK tag reported to the collaborator on register
    #[serde(default = "default_sdk_name")]
    pub name: String,
}

impl Default for SdkSettings {
    fn default() -> Self {
        Self {
            name: default_sdk_name(),
        }
    }
}

fn default_channel_name() -> String {
    "com.entrig.plugin.notifications".to_string()
}

fn default_foreground_event() -> String {
    "notifications#onForeground".to_string()
}

fn default_opened_event() -> String {
    "notifications#onClick".to_string()
}

fn default_message_id_keys() -> Vec<String> {
    vec!["google.message_id".to_string(), "message_id".to_string()]
}

fn default_payload_key() -> String {
    "payload".to_string()
}

fn default_sdk_name() -> String {
    "flutter".to_string()
}

impl BridgeSettings {
    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.launch.message_id_keys.is_empty() {
            return Err(Error::config("launch.message_id_keys must not be empty"));
        }
        if self.launch.message_id_keys.iter().any(|k| k.is_empty()) {
            return Err(Error::config(
                "launch.message_id_keys must not contain empty keys",
            ));
        }
        if self.channel.foreground_event == self.channel.opened_event {
            return Err(Error::config(
                "channel.foreground_event and channel.opened_event must differ",
            ));
        }
        Ok(())
    }
}

/// Parse settings from TOML text (strict)
pub fn parse_settings(content: &str) -> Result<BridgeSettings> {
    let settings: BridgeSettings =
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from a file, falling back to defaults
///
/// A missing file is normal. An unreadable or invalid file is logged and
/// the defaults are used instead.
pub fn load_settings(path: &Path) -> BridgeSettings {
    if !path.exists() {
        debug!("No settings file at {}, using defaults", path.display());
        return BridgeSettings::default();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return BridgeSettings::default();
        }
    };

    match parse_settings(&content) {
        Ok(settings) => {
            debug!("Loaded settings from {}", path.display());
            settings
        }
        Err(e) => {
            warn!("Invalid settings in {}: {}", path.display(), e);
            BridgeSettings::default()
        }
    }
}
