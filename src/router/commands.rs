//! UI command set
//!
//! Named operations accepted from remote clients, deserialized from the
//! WebSocket carrier and dispatched sequentially by the router loop.

use crate::config::Theme;
use crate::state::types::{Fader, FaderConfig, FaderGroup, FaderMode, Id};
use serde::Deserialize;

/// Inbound UI command
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cmd", rename_all = "kebab-case")]
pub enum UiCommand {
    /// Create a profile with pre-built groups/faders and make it active
    ProfileCreate {
        name: Option<String>,
        #[serde(default)]
        groups: usize,
        #[serde(default)]
        faders: usize,
    },
    /// Rename the active profile
    ProfileRename { name: String },
    /// Delete the active profile and clear the active pointer
    ProfileDelete,
    /// Select the active profile by id
    ProfileSelect { id: Id },
    /// Request the full profile list
    ProfilesGet,

    /// Append a group to the active profile
    GroupCreate { name: Option<String> },
    /// Rename a group
    GroupRename { id: Id, name: String },
    /// Delete a group and every fader referencing it
    GroupDelete { id: Id },
    /// Bulk-replace the group list (reorder)
    GroupsReplace { groups: Vec<FaderGroup> },

    /// Append a fader, optionally into a specific group
    FaderCreate { group_id: Option<Id> },
    /// Replace a fader's controller mapping
    FaderUpdateConfig { id: Id, config: FaderConfig },
    /// Set a fader's value from the UI (no console send)
    FaderUpdateValue { id: Id, value: f32 },
    /// Delete a fader
    FaderDelete { id: Id },
    /// Bulk-replace the fader list (reorder)
    FadersReplace { faders: Vec<Fader> },

    /// Request the list of MIDI input devices
    MidiListDevices,
    /// Switch the MIDI input to the named device
    MidiSelectDevice { device: String },
    /// Toggle the MIDI input enable flag
    MidiToggleInput,
    /// Store the MIDI channel selection
    MidiSetChannel { channel: u8 },

    /// Change the console address (reconnects when open)
    TcpSetAddress { address: String },
    /// Change the console port (reconnects when open)
    TcpSetPort { port: u16 },
    /// Toggle inbound OSC processing
    OscToggleInput,
    /// Toggle outbound OSC sending
    OscToggleOutput,

    /// Set the mode assigned to newly created faders
    SetDefaultFaderMode { mode: FaderMode },
    /// Store the UI theme preference
    SetTheme { theme: Theme },
    /// Toggle the start-on-boot flag (registration is external)
    ToggleAutostart,
    /// Toggle the open-UI-on-start flag
    ToggleAutostartUi,

    /// Request every full-state snapshot plus both connectivity booleans
    StateSync,
}
