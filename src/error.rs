//! Error taxonomy for the gateway core
//!
//! Every failure class the core can produce maps to one of these variants.
//! None of them is fatal to the event loop: callers report the error through
//! the event bus and continue. There are no automatic retries; recovery is
//! always an explicit operator action (reopen the device, re-enable the
//! transport, fix the file).

use thiserror::Error;

/// Gateway error taxonomy
#[derive(Debug, Error)]
pub enum Error {
    /// MIDI open failure: the named device is missing or busy. The adapter
    /// reverts to Closed and the MIDI input flag is cleared.
    #[error("MIDI device unavailable: '{device}': {reason}")]
    DeviceUnavailable { device: String, reason: String },

    /// OSC socket failure. Both TCP flags are disabled and the connection is
    /// closed; the operator must re-enable explicitly.
    #[error("OSC transport error: {0}")]
    Transport(String),

    /// Malformed persisted document or protocol payload. The offending input
    /// is skipped or replaced by defaults, never partially applied.
    #[error("invalid {what}: {reason}")]
    Validation { what: String, reason: String },

    /// An operation referenced a missing active profile or a missing
    /// fader/group id. The operation is a no-op.
    #[error("{0} not found")]
    NotFound(String),
}

impl Error {
    /// Shorthand for a validation error
    pub fn validation(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::Validation {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
