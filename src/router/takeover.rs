//! Soft-takeover direction filter
//!
//! Motorized-fader echo and "value snap" suppression: once the hardware and
//! the software fader have diverged (a scene recall moved the console-side
//! value without moving the hardware), raw movement is forwarded only while
//! the hardware travels toward the authoritative value from the side it is
//! already on. Until it catches that value, nothing is sent and no state is
//! touched, so the operator keeps moving in the indicated direction and
//! forwarding resumes exactly at the catch point.

/// Decide whether a raw hardware value may be forwarded.
///
/// Forward unconditionally when `last_midi` is unset (first event since
/// connect or profile load), when the incoming value equals the authoritative
/// value, or when it equals the last raw value seen. Otherwise forward only
/// when the incoming value continues past `value` on the same side that
/// `value` sits relative to `last_midi`.
pub fn should_forward(value: f32, last_midi: Option<f32>, incoming: f32) -> bool {
    let Some(last) = last_midi else {
        return true;
    };
    incoming == value
        || incoming == last
        || (value < last && incoming < value)
        || (value > last && incoming > value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_event_always_forwards() {
        assert!(should_forward(60.0, None, 0.0));
        assert!(should_forward(60.0, None, 127.0));
    }

    #[test]
    fn test_diverged_fader_suppresses_wrong_side() {
        // value=60 below last_midi=70: hardware must approach from below
        assert!(!should_forward(60.0, Some(70.0), 65.0));
        assert!(should_forward(60.0, Some(70.0), 55.0));
    }

    #[test]
    fn test_diverged_fader_upward() {
        // value=80 above last_midi=40: hardware must approach from above
        assert!(should_forward(80.0, Some(40.0), 90.0));
        assert!(!should_forward(80.0, Some(40.0), 70.0));
    }

    #[test]
    fn test_exact_matches_forward() {
        assert!(should_forward(60.0, Some(70.0), 60.0)); // catches value
        assert!(should_forward(60.0, Some(70.0), 70.0)); // repeats last raw
    }

    #[test]
    fn test_converged_fader_forwards_everything() {
        // After every forward value == last_midi, so movement is unrestricted
        for incoming in [0.0, 30.0, 64.0, 127.0] {
            assert!(should_forward(64.0, Some(64.0), incoming));
        }
    }

    proptest! {
        #[test]
        fn prop_no_history_never_suppresses(value in 0u8..=127, incoming in 0u8..=127) {
            prop_assert!(should_forward(value as f32, None, incoming as f32));
        }

        #[test]
        fn prop_converged_never_suppresses(value in 0u8..=127, incoming in 0u8..=127) {
            prop_assert!(should_forward(value as f32, Some(value as f32), incoming as f32));
        }

        #[test]
        fn prop_suppressed_only_when_diverged_and_between(
            value in 0u8..=127, last in 0u8..=127, incoming in 0u8..=127,
        ) {
            let (value, last, incoming) = (value as f32, last as f32, incoming as f32);
            if !should_forward(value, Some(last), incoming) {
                // Suppression requires real divergence and an incoming value
                // that is neither past the authoritative value nor equal to
                // either endpoint
                prop_assert!(value != last);
                prop_assert!(incoming != value && incoming != last);
                if value < last {
                    prop_assert!(incoming > value);
                } else {
                    prop_assert!(incoming < value);
                }
            }
        }
    }
}
