//! Fader store: canonical in-memory state plus its persistence collaborator

pub mod persistence;
pub mod store;
pub mod types;

pub use persistence::{JsonStorage, Storage};
pub use store::ProfileStore;
pub use types::{Fader, FaderConfig, FaderGroup, FaderMode, FaderProfile, Id};
