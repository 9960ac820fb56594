//! Event broadcaster
//!
//! Stateless fan-out of state-change notifications to UI subscribers. Every
//! accepted mutation produces exactly one broadcast of the corresponding full
//! current value (fader list, group list, config, profile list), never a
//! delta, so a late-joining subscriber and a long-lived one converge to the
//! same view after any single event. Log lines are mirrored here so remote
//! clients see the same diagnostics as the local console.

use crate::config::AppConfig;
use crate::state::types::{Fader, FaderGroup, FaderProfile};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Severity/category tag carried with broadcast log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogCategory {
    #[serde(rename = "log")]
    Log,
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "MIDI")]
    Midi,
}

/// Full-state notification fanned out to every subscriber
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum UiEvent {
    /// Full fader list of the active profile
    Faders(Vec<Fader>),
    /// Full group list of the active profile
    FaderGroups(Vec<FaderGroup>),
    /// Full profile list
    Profiles(Vec<FaderProfile>),
    /// Full process configuration
    Config(AppConfig),
    /// MIDI device connectivity
    MidiConnection(bool),
    /// Console connectivity
    OscConnection(bool),
    /// Available MIDI input devices (reply to a device-list request)
    MidiDevices(Vec<String>),
    /// Structured log line
    Log {
        category: LogCategory,
        message: String,
    },
    /// Transport failure detail (the flags have already been disabled)
    TransportError { detail: String },
}

/// Broadcast hub shared by the store, the adapters, and the API layer.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<UiEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Subscribe to all subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }

    /// Fan out one event. Dropped silently when no subscriber is connected.
    pub fn emit(&self, event: UiEvent) {
        let _ = self.tx.send(event);
    }

    /// Log locally and mirror the line to all subscribers.
    pub fn log(&self, category: LogCategory, message: impl Into<String>) {
        let message = message.into();
        match category {
            LogCategory::Error => error!("{message}"),
            LogCategory::Warn => warn!("{message}"),
            LogCategory::Tcp => info!(target: "eos_gw::tcp", "{message}"),
            LogCategory::Midi => info!(target: "eos_gw::midi", "{message}"),
            LogCategory::Log | LogCategory::Info => info!("{message}"),
        }
        self.emit(UiEvent::Log { category, message });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_full_state_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(UiEvent::MidiConnection(true));
        match rx.recv().await.unwrap() {
            UiEvent::MidiConnection(connected) => assert!(connected),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_log_is_mirrored() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.log(LogCategory::Tcp, "connected");
        match rx.recv().await.unwrap() {
            UiEvent::Log { category, message } => {
                assert_eq!(category, LogCategory::Tcp);
                assert_eq!(message, "connected");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_event_wire_shape() {
        let json = serde_json::to_value(UiEvent::OscConnection(false)).unwrap();
        assert_eq!(json["event"], "osc-connection");
        assert_eq!(json["data"], false);
    }
}
