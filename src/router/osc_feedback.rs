//! Inbound translation: console OSC feedback → fader state
//!
//! Two address families are recognized: fader-bank position echoes and the
//! console's active-channel notification. Updates route through the store
//! (broadcasting the fader list) and never touch `last_midi`, since feedback
//! is not an operator action. Transport errors apply the hard fallback: both
//! TCP flags are disabled and the connection is closed until the operator
//! re-enables explicitly.

use crate::events::{LogCategory, UiEvent};
use crate::osc::{address, OscEvent};
use crate::state::types::FaderMode;
use rosc::{OscMessage, OscType};

fn first_float(args: &[OscType]) -> Option<f32> {
    match args.first()? {
        OscType::Float(f) => Some(*f),
        OscType::Double(d) => Some(*d as f32),
        _ => None,
    }
}

fn first_string(args: &[OscType]) -> Option<&str> {
    match args.first()? {
        OscType::String(s) => Some(s),
        _ => None,
    }
}

impl super::Router {
    /// Entry point for transport notifications.
    pub async fn on_osc_event(&mut self, event: OscEvent) {
        match event {
            OscEvent::Message(msg) => {
                if !self.input_enabled() {
                    return;
                }
                self.events.log(
                    LogCategory::Tcp,
                    format!("Received OSC message: {} {:?}", msg.addr, msg.args),
                );
                self.handle_feedback(msg);
            }
            OscEvent::Closed => {
                // Peer closed the stream: notify, but leave the enable flags
                // to the operator
                self.transport.close().await;
            }
            OscEvent::Error(detail) => self.on_transport_error(detail).await,
        }
    }

    fn handle_feedback(&self, msg: OscMessage) {
        if let Some(bank) = address::parse_fader_feedback(&msg.addr) {
            let Some(level) = first_float(&msg.args) else {
                return;
            };
            self.apply_feedback(level * 127.0, |f| {
                f.config.mode == FaderMode::Fader && f.config.eos_controller == bank
            });
        } else if msg.addr == address::ACTIVE_CHANNEL_ADDRESS {
            let Some(text) = first_string(&msg.args) else {
                return;
            };
            let Some((channels, level)) = address::parse_active_channels(text) else {
                return;
            };
            self.apply_feedback((level as f32 / 100.0) * 127.0, move |f| {
                f.config.mode == FaderMode::Channel && channels.contains(&f.config.eos_controller)
            });
        }
    }

    /// Set `value` on every fader matching the predicate. No-op (and no
    /// broadcast) when nothing matches.
    fn apply_feedback(
        &self,
        value: f32,
        matches: impl Fn(&crate::state::types::Fader) -> bool,
    ) {
        if !self.store.faders().iter().any(&matches) {
            return;
        }
        let _ = self.store.update_faders(move |faders| {
            faders
                .into_iter()
                .map(|mut f| {
                    if matches(&f) {
                        f.value = value;
                    }
                    f
                })
                .collect()
        });
    }

    /// Hard fallback on socket failure: disable both directions, close the
    /// connection, and surface the detail. A flapping link must not silently
    /// retry and spam the console.
    pub(crate) async fn on_transport_error(&mut self, detail: String) {
        let config_snapshot = {
            let mut config = self.config.lock();
            config.tcp.input = false;
            config.tcp.output = false;
            config.clone()
        };
        self.events.log(
            LogCategory::Error,
            format!("OSC TCP error: {detail}"),
        );
        self.events.emit(UiEvent::TransportError { detail });
        self.transport.close().await;
        self.events.emit(UiEvent::Config(config_snapshot));
    }
}
