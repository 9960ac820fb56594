//! Eos OSC address templates, value scaling, and inbound address parsing
//!
//! One device-class mapping: console submaster/fader-bank/channel control.
//! Submasters and fader banks take levels in 0.0–1.0; channels use the
//! console's 0–100 scale.

use crate::state::types::{FaderConfig, FaderMode};

/// Address prefix for outbound user commands
const USER_PREFIX: &str = "/eos/user/0";

/// Inbound fader-bank feedback prefix (`/eos/fader/1/{n}`)
const FADER_FEEDBACK_PREFIX: &str = "/eos/fader/1/";

/// Inbound active-channel notification address
pub const ACTIVE_CHANNEL_ADDRESS: &str = "/eos/out/active/chan";

/// Level address for a fader's console target.
pub fn level_address(config: &FaderConfig) -> String {
    match config.mode {
        FaderMode::Submaster => format!("{USER_PREFIX}/sub/{}", config.eos_controller),
        FaderMode::Fader => format!("{USER_PREFIX}/fader/1/{}", config.eos_controller),
        FaderMode::Channel => format!("{USER_PREFIX}/chan/{}", config.eos_controller),
    }
}

/// Fire address for a submaster's momentary control.
pub fn fire_address(eos_controller: u32) -> String {
    format!("{USER_PREFIX}/sub/{eos_controller}/fire")
}

/// One-shot bank-size announcement, telling the console how many motorized
/// faders to expect.
pub fn bank_config_address(fader_count: usize) -> String {
    format!("/eos/fader/1/config/{fader_count}")
}

/// Scale a device-native value (0–127) to the console scale for the mode.
pub fn scale_to_console(mode: FaderMode, raw: f32) -> f32 {
    match mode {
        FaderMode::Channel => (raw / 127.0) * 100.0,
        FaderMode::Submaster | FaderMode::Fader => raw / 127.0,
    }
}

/// Full-scale console value for the mode (momentary "on" level).
pub fn full_level(mode: FaderMode) -> f32 {
    match mode {
        FaderMode::Channel => 100.0,
        FaderMode::Submaster | FaderMode::Fader => 1.0,
    }
}

/// Parse a fader-bank feedback address, returning the bank position number.
pub fn parse_fader_feedback(addr: &str) -> Option<u32> {
    let rest = addr.strip_prefix(FADER_FEEDBACK_PREFIX)?;
    // Exclude the outbound config announcement and any deeper paths
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

/// Parse the console's active-channel notation `"<ranges>[<level>]"`, e.g.
/// `"1-3,7 [50]"`: comma-separated channel ranges (inclusive `a-b`, or a bare
/// integer) followed by a bracketed 0–100 level. Returns the expanded channel
/// set and the level, or None for a non-matching string.
pub fn parse_active_channels(arg: &str) -> Option<(Vec<u32>, u32)> {
    let open = arg.find('[')?;
    let close = arg[open..].find(']')? + open;
    let level: u32 = arg[open + 1..close].parse().ok()?;

    // The ranges are the trailing digit/comma/dash run before the bracket
    let head = arg[..open].trim_end();
    let start = head
        .rfind(|c: char| !(c.is_ascii_digit() || c == ',' || c == '-'))
        .map(|i| i + 1)
        .unwrap_or(0);
    let ranges = &head[start..];
    if ranges.is_empty() {
        return None;
    }

    let mut channels = Vec::new();
    for part in ranges.split(',') {
        match part.split_once('-') {
            Some((a, b)) => {
                let (Ok(a), Ok(b)) = (a.parse::<u32>(), b.parse::<u32>()) else {
                    continue;
                };
                channels.extend(a..=b);
            }
            None => {
                if let Ok(n) = part.parse::<u32>() {
                    channels.push(n);
                }
            }
        }
    }
    if channels.is_empty() {
        return None;
    }
    Some((channels, level))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: FaderMode, eos: u32) -> FaderConfig {
        FaderConfig {
            mode,
            midi_controller: 1,
            eos_controller: eos,
        }
    }

    #[test]
    fn test_level_addresses() {
        assert_eq!(
            level_address(&config(FaderMode::Submaster, 4)),
            "/eos/user/0/sub/4"
        );
        assert_eq!(
            level_address(&config(FaderMode::Fader, 4)),
            "/eos/user/0/fader/1/4"
        );
        assert_eq!(
            level_address(&config(FaderMode::Channel, 4)),
            "/eos/user/0/chan/4"
        );
        assert_eq!(fire_address(9), "/eos/user/0/sub/9/fire");
        assert_eq!(bank_config_address(12), "/eos/fader/1/config/12");
    }

    #[test]
    fn test_mode_dependent_scaling() {
        assert_eq!(scale_to_console(FaderMode::Fader, 127.0), 1.0);
        assert_eq!(scale_to_console(FaderMode::Channel, 127.0), 100.0);
        assert_eq!(scale_to_console(FaderMode::Submaster, 0.0), 0.0);
    }

    #[test]
    fn test_parse_fader_feedback() {
        assert_eq!(parse_fader_feedback("/eos/fader/1/3"), Some(3));
        assert_eq!(parse_fader_feedback("/eos/fader/1/12"), Some(12));
        // Deeper paths and the config announcement are not feedback
        assert_eq!(parse_fader_feedback("/eos/fader/1/config/5"), None);
        assert_eq!(parse_fader_feedback("/eos/fader/1/"), None);
        assert_eq!(parse_fader_feedback("/eos/out/active/chan"), None);
    }

    #[test]
    fn test_parse_active_channels_ranges() {
        let (channels, level) = parse_active_channels("1-3,7 [50]").unwrap();
        assert_eq!(channels, vec![1, 2, 3, 7]);
        assert_eq!(level, 50);
    }

    #[test]
    fn test_parse_active_channels_with_label_prefix() {
        // The console prefixes the list with display text
        let (channels, level) = parse_active_channels("Chan 2,4-5 [100]").unwrap();
        assert_eq!(channels, vec![2, 4, 5]);
        assert_eq!(level, 100);
    }

    #[test]
    fn test_parse_active_channels_singleton() {
        let (channels, level) = parse_active_channels("12 [0]").unwrap();
        assert_eq!(channels, vec![12]);
        assert_eq!(level, 0);
    }

    #[test]
    fn test_parse_active_channels_rejects_garbage() {
        assert!(parse_active_channels("").is_none());
        assert!(parse_active_channels("no brackets here").is_none());
        assert!(parse_active_channels("[50]").is_none());
        assert!(parse_active_channels("1-3[high]").is_none());
    }

    #[test]
    fn test_parse_active_channels_reversed_range_is_empty() {
        // 5-3 expands to nothing; the whole match then carries no channels
        assert!(parse_active_channels("5-3 [10]").is_none());
    }
}
