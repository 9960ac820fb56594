//! Process configuration
//!
//! The Config document carries the active profile pointer, the default mode
//! for newly created faders, the console TCP endpoint with its input/output
//! enable flags, and the MIDI input selection. It is created with defaults at
//! startup, replaced wholesale by a persisted document only when that document
//! parses as the full typed shape, mutated through the process lifetime, and
//! persisted on shutdown. A structurally invalid file keeps the defaults and
//! is reported, never silently merged.

use crate::state::types::{FaderMode, Id};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default console OSC/TCP port (ETC Eos)
pub const DEFAULT_OSC_PORT: u16 = 3032;

/// Shared handle to the process configuration.
///
/// The mutex is held for the duration of each logical operation that touches
/// config, reproducing single-writer atomicity on a threaded runtime.
pub type SharedConfig = Arc<parking_lot::Mutex<AppConfig>>;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSection,
    pub tcp: TcpSection,
    pub midi: MidiSection,
}

/// Application-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSection {
    /// Id of the active fader profile; empty when unset or after a delete
    pub fader_profile_id: Option<Id>,
    /// Mode assigned to newly created faders
    pub default_fader_mode: FaderMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autostart: Option<bool>,
    #[serde(
        default,
        rename = "autostartUI",
        skip_serializing_if = "Option::is_none"
    )]
    pub autostart_ui: Option<bool>,
}

/// Console TCP endpoint and direction enable flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpSection {
    /// Process inbound OSC feedback
    pub input: bool,
    /// Send outbound OSC messages
    pub output: bool,
    pub local_address: String,
    pub local_port: u16,
}

impl TcpSection {
    /// The transport should hold an open connection whenever either
    /// direction is enabled.
    pub fn wants_open(&self) -> bool {
        self.input || self.output
    }
}

/// MIDI input selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidiSection {
    pub input: bool,
    pub device: String,
    pub channel: u8,
}

/// UI color theme preference, stored here so every client converges on the
/// same setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
    System,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection {
                fader_profile_id: None,
                default_fader_mode: FaderMode::Submaster,
                theme: None,
                autostart: None,
                autostart_ui: None,
            },
            tcp: TcpSection {
                input: true,
                output: true,
                local_address: "127.0.0.1".to_string(),
                local_port: DEFAULT_OSC_PORT,
            },
            midi: MidiSection {
                input: true,
                device: String::new(),
                channel: 0,
            },
        }
    }
}

impl AppConfig {
    /// Parse a persisted document. Any structural mismatch is a validation
    /// error; the caller keeps its defaults in that case.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::error::Error::validation("config file", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.app.fader_profile_id.is_none());
        assert_eq!(config.app.default_fader_mode, FaderMode::Submaster);
        assert!(config.tcp.input && config.tcp.output);
        assert_eq!(config.tcp.local_port, DEFAULT_OSC_PORT);
        assert!(config.midi.input);
        assert!(config.midi.device.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let mut config = AppConfig::default();
        config.midi.device = "Faderport".to_string();
        config.app.theme = Some(Theme::Dark);

        let json = serde_json::to_string_pretty(&config).unwrap();
        let reloaded = AppConfig::from_json(&json).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_invalid_shape_is_rejected_whole() {
        // A document missing the tcp section must not partially load
        let json = r#"{"app":{"faderProfileId":null,"defaultFaderMode":"sub"},"midi":{"input":true,"device":"","channel":0}}"#;
        assert!(AppConfig::from_json(json).is_err());
    }

    #[test]
    fn test_wants_open() {
        let mut tcp = AppConfig::default().tcp;
        assert!(tcp.wants_open());
        tcp.input = false;
        assert!(tcp.wants_open());
        tcp.output = false;
        assert!(!tcp.wants_open());
    }
}
