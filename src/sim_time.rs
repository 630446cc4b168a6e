//! Simulated time as a normalized (seconds, nanoseconds) pair.
//!
//! Every operation returns a normalized value: `0 <= nanoseconds < 1e9`.
//! The representation is deliberately kept as two fields rather than a
//! single nanosecond counter because the simulator peers (the scheduler
//! and the clock driver) exchange and log the two fields separately.

use std::fmt;

/// Nanoseconds per simulated second.
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A simulated timestamp or duration.
///
/// Field order matters: the derived `Ord` compares seconds first and
/// nanoseconds second, which is exactly the comparison the blocked-wait
/// logic needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimTime {
    pub seconds: u64,
    pub nanoseconds: u64,
}

impl SimTime {
    pub const ZERO: SimTime = SimTime {
        seconds: 0,
        nanoseconds: 0,
    };

    /// Construct from already-normalized fields.
    ///
    /// # Panics
    /// Panics in debug builds if `nanoseconds >= 1e9`.
    pub fn new(seconds: u64, nanoseconds: u64) -> SimTime {
        debug_assert!(nanoseconds < NANOS_PER_SEC, "unnormalized SimTime");
        SimTime {
            seconds,
            nanoseconds,
        }
    }

    /// Construct from a raw nanosecond count, normalizing the carry.
    pub fn from_nanos(ns: u64) -> SimTime {
        SimTime {
            seconds: ns / NANOS_PER_SEC,
            nanoseconds: ns % NANOS_PER_SEC,
        }
    }

    /// Field-wise sum. A single carry step suffices because both inputs
    /// are normalized.
    pub fn add(self, other: SimTime) -> SimTime {
        let mut seconds = self.seconds + other.seconds;
        let mut nanoseconds = self.nanoseconds + other.nanoseconds;
        if nanoseconds >= NANOS_PER_SEC {
            nanoseconds -= NANOS_PER_SEC;
            seconds += 1;
        }
        SimTime {
            seconds,
            nanoseconds,
        }
    }

    /// Field-wise difference with borrow.
    ///
    /// Precondition: `self >= other`. The result for `self < other` is
    /// unspecified (debug builds panic).
    pub fn subtract(self, other: SimTime) -> SimTime {
        debug_assert!(self >= other, "SimTime::subtract underflow");
        let mut seconds = self.seconds.wrapping_sub(other.seconds);
        let nanoseconds;
        if self.nanoseconds < other.nanoseconds {
            nanoseconds = self.nanoseconds + NANOS_PER_SEC - other.nanoseconds;
            seconds = seconds.wrapping_sub(1);
        } else {
            nanoseconds = self.nanoseconds - other.nanoseconds;
        }
        SimTime {
            seconds,
            nanoseconds,
        }
    }

    /// Truncating per-field division.
    ///
    /// NOTE: this divides the seconds and nanoseconds fields independently
    /// and does NOT redistribute the seconds remainder into nanoseconds:
    /// `divide({3,0}, 2) == {1,0}`, not `{1,500000000}`. Consumers of the
    /// averaged statistics expect exactly this truncating behavior, so do
    /// not "fix" it into a real-time division.
    pub fn divide(self, divisor: u64) -> SimTime {
        debug_assert!(divisor > 0, "SimTime::divide by zero");
        SimTime {
            seconds: self.seconds / divisor,
            nanoseconds: self.nanoseconds / divisor,
        }
    }

    /// Add a signed nanosecond delta in place, normalizing carry/borrow.
    ///
    /// Negative deltas are used to subtract a burst length from a wake
    /// time. Precondition: the overall result is non-negative (debug
    /// builds panic; release builds clamp to zero).
    pub fn increment_by(&mut self, delta_ns: i64) {
        let total = self.seconds as i128 * NANOS_PER_SEC as i128
            + self.nanoseconds as i128
            + delta_ns as i128;
        debug_assert!(total >= 0, "SimTime::increment_by underflow");
        let total = total.max(0);
        self.seconds = (total / NANOS_PER_SEC as i128) as u64;
        self.nanoseconds = (total % NANOS_PER_SEC as i128) as u64;
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s.{:09}ns", self.seconds, self.nanoseconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_carries_nanoseconds() {
        let sum = SimTime::new(5, 999_999_999).add(SimTime::new(0, 1));
        assert_eq!(sum, SimTime::new(6, 0));
    }

    #[test]
    fn add_without_carry() {
        let sum = SimTime::new(1, 2).add(SimTime::new(3, 4));
        assert_eq!(sum, SimTime::new(4, 6));
    }

    #[test]
    fn subtract_borrows_from_seconds() {
        let diff = SimTime::new(5, 0).subtract(SimTime::new(0, 1));
        assert_eq!(diff, SimTime::new(4, 999_999_999));
    }

    #[test]
    fn subtract_without_borrow() {
        let diff = SimTime::new(5, 500).subtract(SimTime::new(2, 400));
        assert_eq!(diff, SimTime::new(3, 100));
    }

    #[test]
    fn divide_truncates_each_field() {
        let half = SimTime::new(10, 500_000_000).divide(2);
        assert_eq!(half, SimTime::new(5, 250_000_000));
    }

    #[test]
    fn divide_does_not_redistribute_seconds_remainder() {
        // The odd second is dropped, not converted into 5e8 ns.
        assert_eq!(SimTime::new(3, 0).divide(2), SimTime::new(1, 0));
    }

    #[test]
    fn increment_by_positive_carries() {
        let mut t = SimTime::new(2, 999_999_000);
        t.increment_by(2_000);
        assert_eq!(t, SimTime::new(3, 1_000));
    }

    #[test]
    fn increment_by_negative_borrows() {
        let mut t = SimTime::new(3, 100);
        t.increment_by(-200);
        assert_eq!(t, SimTime::new(2, 999_999_900));
    }

    #[test]
    fn increment_by_large_delta_normalizes() {
        let mut t = SimTime::new(0, 0);
        t.increment_by(2 * NANOS_PER_SEC as i64 + 7);
        assert_eq!(t, SimTime::new(2, 7));
    }

    #[test]
    fn ordering_compares_seconds_first() {
        assert!(SimTime::new(2, 0) > SimTime::new(1, 999_999_999));
        assert!(SimTime::new(1, 5) > SimTime::new(1, 4));
        assert!(SimTime::new(1, 4) >= SimTime::new(1, 4));
    }

    #[test]
    fn from_nanos_normalizes() {
        assert_eq!(
            SimTime::from_nanos(3 * NANOS_PER_SEC + 42),
            SimTime::new(3, 42)
        );
    }
}
