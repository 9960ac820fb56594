//! Eos GW - MIDI fader gateway for ETC Eos consoles
//!
//! Bridges a physical MIDI fader controller and a lighting console's OSC/TCP
//! protocol, keeping an in-memory fader model synchronized across hardware
//! input, console feedback, and remote UI clients.

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod midi;
pub mod osc;
pub mod paths;
pub mod router;
pub mod state;

pub use config::{AppConfig, SharedConfig};
pub use error::{Error, Result};
pub use events::{EventBus, UiEvent};
pub use router::{Router, UiCommand};
pub use state::ProfileStore;
