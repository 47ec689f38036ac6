//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Number of whole control ticks of period `dt_s` which fit in `duration_s`.
///
/// Rounds to the nearest tick, so that a duration which is a multiple of the
/// period up to floating point error gives the expected count.
pub fn ticks_in(duration_s: f64, dt_s: f64) -> usize {
    if dt_s <= 0.0 || !duration_s.is_finite() || duration_s <= 0.0 {
        return 0;
    }

    (duration_s / dt_s).round() as usize
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ticks_in() {
        assert_eq!(ticks_in(1.0, 0.01), 100);
        assert_eq!(ticks_in(0.5, 0.01), 50);
        assert_eq!(ticks_in(0.9, 0.01), 90);
        assert_eq!(ticks_in(0.0, 0.01), 0);
        assert_eq!(ticks_in(1.0, 0.0), 0);
    }

    #[test]
    fn test_duration_to_seconds() {
        let d = chrono::Duration::milliseconds(1500);
        assert_eq!(duration_to_seconds(d), Some(1.5));
    }
}
