//! MIDI adapter
//!
//! Owns the single hardware input connection and its lifecycle
//! (Closed → Open → Closed). Raw device bytes are decoded into typed events
//! and delivered over a channel into the translation loop; the adapter itself
//! never applies fader policy. Config's device/input fields always reflect
//! the outcome of the last open attempt.

use crate::config::SharedConfig;
use crate::error::{Error, Result};
use crate::events::{EventBus, LogCategory, UiEvent};
use midir::{MidiInput, MidiInputConnection};
use tokio::sync::mpsc;
use tracing::debug;

/// Client name announced to the MIDI subsystem
const CLIENT_NAME: &str = "eos-gw";

/// Decoded hardware event delivered to the translation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    /// Continuous controller movement (fader/knob)
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Momentary control pressed
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Momentary control released
    NoteOff { channel: u8, note: u8 },
}

impl MidiEvent {
    /// Decode a raw MIDI message into one of the events the gateway handles.
    /// Everything else (pitch bend, sysex, clock, ...) is ignored.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 3 {
            return None;
        }
        let status = data[0];
        let channel = status & 0x0F;
        match status & 0xF0 {
            0xB0 => Some(MidiEvent::ControlChange {
                channel,
                controller: data[1] & 0x7F,
                value: data[2] & 0x7F,
            }),
            0x90 => {
                let note = data[1] & 0x7F;
                let velocity = data[2] & 0x7F;
                // Note On with velocity 0 is a Note Off
                if velocity == 0 {
                    Some(MidiEvent::NoteOff { channel, note })
                } else {
                    Some(MidiEvent::NoteOn {
                        channel,
                        note,
                        velocity,
                    })
                }
            }
            0x80 => Some(MidiEvent::NoteOff {
                channel,
                note: data[1] & 0x7F,
            }),
            _ => None,
        }
    }
}

/// Hardware MIDI input adapter. At most one device handle is open at a time;
/// opening a new device always fully closes the previous one first.
pub struct MidiAdapter {
    conn: Option<MidiInputConnection<()>>,
    event_tx: mpsc::Sender<MidiEvent>,
    config: SharedConfig,
    events: EventBus,
}

impl MidiAdapter {
    pub fn new(event_tx: mpsc::Sender<MidiEvent>, config: SharedConfig, events: EventBus) -> Self {
        Self {
            conn: None,
            event_tx,
            config,
            events,
        }
    }

    /// List available MIDI input devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| Error::DeviceUnavailable {
            device: String::new(),
            reason: e.to_string(),
        })?;
        Ok(midi_in
            .ports()
            .iter()
            .filter_map(|port| midi_in.port_name(port).ok())
            .collect())
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Acquire the named device. On success the device name and input flag
    /// are stored in config and connectivity is broadcast; on failure the
    /// adapter reverts to Closed, the flags are cleared, and the failure is
    /// reported. No retry: reopening is an explicit operator action.
    pub fn open(&mut self, device: &str) -> Result<()> {
        self.close();

        match self.try_connect(device) {
            Ok(conn) => {
                self.conn = Some(conn);
                {
                    let mut config = self.config.lock();
                    config.midi.device = device.to_string();
                    config.midi.input = true;
                }
                self.events.emit(UiEvent::MidiConnection(true));
                self.events.log(
                    LogCategory::Midi,
                    format!("MIDI input opened for device: {device}"),
                );
                Ok(())
            }
            Err(e) => {
                {
                    let mut config = self.config.lock();
                    config.midi.input = false;
                    config.midi.device = String::new();
                }
                self.events.emit(UiEvent::MidiConnection(false));
                self.events.log(
                    LogCategory::Error,
                    format!("Failed to open MIDI input for device: {device}: {e}"),
                );
                Err(e)
            }
        }
    }

    /// Release the device handle if open and broadcast the disconnection.
    pub fn close(&mut self) {
        if self.conn.take().is_some() {
            {
                let mut config = self.config.lock();
                config.midi.input = false;
            }
            self.events.emit(UiEvent::MidiConnection(false));
            self.events.log(LogCategory::Midi, "MIDI input closed");
        }
    }

    /// Switch to another device: full close, then open.
    pub fn change_device(&mut self, device: &str) -> Result<()> {
        self.close();
        self.open(device)
    }

    /// Reconcile the connection with the configured input flag: open the
    /// configured device when input is enabled and nothing is open, close
    /// when input is disabled but a device is open. Runs at startup and after
    /// every input-flag toggle.
    pub fn reconcile(&mut self) {
        let (input, device) = {
            let config = self.config.lock();
            (config.midi.input, config.midi.device.clone())
        };
        if input && self.conn.is_none() {
            let _ = self.open(&device);
        } else if !input && self.conn.is_some() {
            self.close();
        }
    }

    fn try_connect(&self, device: &str) -> Result<MidiInputConnection<()>> {
        let unavailable = |reason: String| Error::DeviceUnavailable {
            device: device.to_string(),
            reason,
        };

        let midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| unavailable(e.to_string()))?;

        // Case-insensitive substring match keeps the stored name stable across
        // OS-side port renumbering
        let wanted = device.to_lowercase();
        let port = midi_in
            .ports()
            .into_iter()
            .find(|port| {
                midi_in
                    .port_name(port)
                    .map(|name| name.to_lowercase().contains(&wanted))
                    .unwrap_or(false)
            })
            .ok_or_else(|| unavailable("no matching input port".to_string()))?;

        let event_tx = self.event_tx.clone();
        midi_in
            .connect(
                &port,
                CLIENT_NAME,
                move |_timestamp, data, _| {
                    if let Some(event) = MidiEvent::parse(data) {
                        debug!("MIDI in: {event:?}");
                        // Never block the device callback thread
                        let _ = event_tx.try_send(event);
                    }
                },
                (),
            )
            .map_err(|e| unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_control_change() {
        let event = MidiEvent::parse(&[0xB0, 7, 100]).unwrap();
        assert_eq!(
            event,
            MidiEvent::ControlChange {
                channel: 0,
                controller: 7,
                value: 100
            }
        );
    }

    #[test]
    fn test_parse_note_on_off() {
        assert_eq!(
            MidiEvent::parse(&[0x92, 60, 127]).unwrap(),
            MidiEvent::NoteOn {
                channel: 2,
                note: 60,
                velocity: 127
            }
        );
        assert_eq!(
            MidiEvent::parse(&[0x82, 60, 0]).unwrap(),
            MidiEvent::NoteOff {
                channel: 2,
                note: 60
            }
        );
        // Note On with velocity 0 is a release
        assert_eq!(
            MidiEvent::parse(&[0x90, 60, 0]).unwrap(),
            MidiEvent::NoteOff {
                channel: 0,
                note: 60
            }
        );
    }

    #[test]
    fn test_parse_ignores_other_messages() {
        assert!(MidiEvent::parse(&[0xE0, 0x00, 0x40]).is_none()); // pitch bend
        assert!(MidiEvent::parse(&[0xF8]).is_none()); // clock
        assert!(MidiEvent::parse(&[]).is_none());
    }

    #[test]
    fn test_open_failure_clears_config_flags() {
        let config = std::sync::Arc::new(parking_lot::Mutex::new(
            crate::config::AppConfig::default(),
        ));
        config.lock().midi.device = "ghost-device".to_string();
        let (tx, _rx) = mpsc::channel(8);
        let mut adapter = MidiAdapter::new(tx, config.clone(), EventBus::new());

        let result = adapter.open("surely-no-such-midi-device-exists");
        assert!(matches!(result, Err(Error::DeviceUnavailable { .. })));
        assert!(!adapter.is_open());

        let config = config.lock();
        assert!(!config.midi.input);
        assert!(config.midi.device.is_empty());
    }
}
