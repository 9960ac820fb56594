//! Outbound translation: hardware MIDI events → console OSC messages
//!
//! The cc path runs the soft-takeover filter before anything is sent or
//! stored; note on/off drive the momentary "fire"/release semantics. Sends
//! are gated on the TCP output flag at send time, and the authoritative
//! fader state is updated only when an event is actually forwarded.

use super::takeover;
use crate::midi::MidiEvent;
use crate::osc::address;
use crate::state::types::{Fader, FaderMode};
use rosc::{OscMessage, OscType};
use tracing::debug;

/// Level message for a forwarded cc value.
pub(crate) fn level_message(fader: &Fader, raw: u8) -> OscMessage {
    OscMessage {
        addr: address::level_address(&fader.config),
        args: vec![OscType::Float(address::scale_to_console(
            fader.config.mode,
            raw as f32,
        ))],
    }
}

/// Momentary press: submasters fire, fader banks and channels jump to full.
pub(crate) fn note_on_message(fader: &Fader) -> OscMessage {
    match fader.config.mode {
        FaderMode::Submaster => OscMessage {
            addr: address::fire_address(fader.config.eos_controller),
            args: vec![OscType::Float(1.0)],
        },
        FaderMode::Fader | FaderMode::Channel => OscMessage {
            addr: address::level_address(&fader.config),
            args: vec![OscType::Float(address::full_level(fader.config.mode))],
        },
    }
}

/// Momentary release: submasters release the fire; fader banks and channels
/// restore the fader's last stored level rather than zeroing it.
pub(crate) fn note_off_message(fader: &Fader) -> OscMessage {
    match fader.config.mode {
        FaderMode::Submaster => OscMessage {
            addr: address::fire_address(fader.config.eos_controller),
            args: vec![OscType::Float(0.0)],
        },
        FaderMode::Fader | FaderMode::Channel => OscMessage {
            addr: address::level_address(&fader.config),
            args: vec![OscType::Float(address::scale_to_console(
                fader.config.mode,
                fader.value,
            ))],
        },
    }
}

impl super::Router {
    /// Entry point for decoded hardware events.
    pub async fn on_midi_event(&mut self, event: MidiEvent) {
        match event {
            MidiEvent::ControlChange {
                controller, value, ..
            } => self.on_cc(controller, value).await,
            MidiEvent::NoteOn { note, .. } => self.on_note_on(note).await,
            MidiEvent::NoteOff { note, .. } => self.on_note_off(note).await,
        }
    }

    async fn on_cc(&mut self, controller: u8, raw: u8) {
        let Some(fader) = self.store.find_fader_by_midi_controller(controller) else {
            return;
        };

        if !takeover::should_forward(fader.value, fader.last_midi, raw as f32) {
            // The operator has not yet caught the authoritative value; leave
            // value and last_midi untouched so the catch point stays fixed.
            debug!(
                "takeover: suppressed cc {controller} raw {raw} (value {}, last {:?})",
                fader.value, fader.last_midi
            );
            return;
        }

        if self.output_enabled() {
            self.transport.send(level_message(&fader, raw)).await;
        }

        let raw_value = raw as f32;
        let id = fader.id.clone();
        let _ = self.store.update_faders(move |faders| {
            faders
                .into_iter()
                .map(|mut f| {
                    if f.id == id {
                        f.value = raw_value;
                        f.last_midi = Some(raw_value);
                    }
                    f
                })
                .collect()
        });
    }

    async fn on_note_on(&mut self, note: u8) {
        let Some(fader) = self.store.find_fader_by_midi_controller(note) else {
            return;
        };
        if self.output_enabled() {
            self.transport.send(note_on_message(&fader)).await;
        }
    }

    async fn on_note_off(&mut self, note: u8) {
        let Some(fader) = self.store.find_fader_by_midi_controller(note) else {
            return;
        };
        if self.output_enabled() {
            self.transport.send(note_off_message(&fader)).await;
        }
    }
}
