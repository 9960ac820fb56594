//! Fader data model
//!
//! Defines the core types for fader profiles: profiles own ordered groups and
//! faders, faders reference their group by id, and every persisted document is
//! validated against these shapes before acceptance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque, orderable identifier; generated locally, never reused.
///
/// Encodes the creation timestamp plus a process-monotonic counter, so ids
/// created by one process sort in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        let seq = NEXT.fetch_add(1, Ordering::Relaxed);
        let millis = chrono::Utc::now().timestamp_millis();
        Id(format!("{millis:011x}-{seq:04x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id(s.to_string())
    }
}

/// Console target type a software fader can drive.
///
/// Selects the OSC address template and the value scale: submasters and
/// fader banks use 0.0–1.0, channels use 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaderMode {
    #[serde(rename = "sub")]
    Submaster,
    #[serde(rename = "fader")]
    Fader,
    #[serde(rename = "chan")]
    Channel,
}

/// Per-fader controller mapping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaderConfig {
    pub mode: FaderMode,
    /// MIDI CC number (or note number for momentary modes) this fader
    /// listens and responds to
    pub midi_controller: u8,
    /// Console-side submaster/fader-bank/channel number it drives
    pub eos_controller: u32,
}

/// One software fader.
///
/// `value` is the authoritative current position in the device-native 0–127
/// range; `last_midi` is the last raw hardware value seen and is read only by
/// the direction filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fader {
    pub id: Id,
    pub group_id: Id,
    pub value: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_midi: Option<f32>,
    pub config: FaderConfig,
}

impl Fader {
    /// Build a fader with value 0 and no hardware history.
    pub fn new(group_id: Id, mode: FaderMode, midi_controller: u8, eos_controller: u32) -> Self {
        Self {
            id: Id::generate(),
            group_id,
            value: 0.0,
            last_midi: None,
            config: FaderConfig {
                mode,
                midi_controller,
                eos_controller,
            },
        }
    }
}

/// Display/organizational bucket; faders reference it by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaderGroup {
    pub id: Id,
    pub name: String,
}

impl FaderGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Id::generate(),
            name: name.into(),
        }
    }
}

/// One independent, swappable bank of groups and faders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaderProfile {
    pub id: Id,
    pub name: String,
    pub fader_groups: Vec<FaderGroup>,
    pub faders: Vec<Fader>,
}

impl FaderProfile {
    /// Check structural invariants: every fader must reference a group that
    /// exists within this profile. A fader with no group is invalid.
    pub fn validate(&self) -> crate::error::Result<()> {
        for fader in &self.faders {
            if !self.fader_groups.iter().any(|g| g.id == fader.group_id) {
                return Err(crate::error::Error::validation(
                    "fader profile",
                    format!(
                        "fader {} references unknown group {}",
                        fader.id, fader.group_id
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generation_is_unique_and_ordered() {
        let a = Id::generate();
        let b = Id::generate();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&FaderMode::Submaster).unwrap(),
            "\"sub\""
        );
        assert_eq!(serde_json::to_string(&FaderMode::Fader).unwrap(), "\"fader\"");
        assert_eq!(serde_json::to_string(&FaderMode::Channel).unwrap(), "\"chan\"");
    }

    #[test]
    fn test_profile_round_trip() {
        let group = FaderGroup::new("Group 1");
        let fader = Fader::new(group.id.clone(), FaderMode::Fader, 1, 1);
        let profile = FaderProfile {
            id: Id::generate(),
            name: "Show A".to_string(),
            fader_groups: vec![group],
            faders: vec![fader],
        };

        let json = serde_json::to_string_pretty(&profile).unwrap();
        let reloaded: FaderProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, profile);
    }

    #[test]
    fn test_validate_detects_orphan_fader() {
        let group = FaderGroup::new("Group 1");
        let fader = Fader::new(Id::from("missing"), FaderMode::Submaster, 1, 1);
        let profile = FaderProfile {
            id: Id::generate(),
            name: "Broken".to_string(),
            fader_groups: vec![group],
            faders: vec![fader],
        };

        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_persisted_field_names() {
        let group = FaderGroup::new("Group 1");
        let fader = Fader::new(group.id.clone(), FaderMode::Channel, 3, 7);
        let json = serde_json::to_value(&fader).unwrap();
        assert!(json.get("groupId").is_some());
        assert_eq!(json["config"]["midiController"], 3);
        assert_eq!(json["config"]["eosController"], 7);
        // last_midi is internal state and absent until a hardware event
        assert!(json.get("lastMidi").is_none());
    }
}
