//! OSC transport and console address mapping

pub mod address;
pub mod transport;

pub use transport::{OscEvent, OscTransport};
