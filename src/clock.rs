//! The shared simulated clock.
//!
//! The clock is created by the scheduler before any process starts and is
//! advanced only by a clock-driving peer; processes hold a read-only view.
//! Each advance notifies waiters, so a blocked process can sleep on a
//! condition (`wait_until`) instead of spinning on raw reads. A process
//! that misses a tick simply re-checks on the next one; the comparison is
//! against the absolute clock value, not the tick count.

use std::sync::{Condvar, Mutex, MutexGuard};

use crate::sim_time::SimTime;

/// Shared simulated clock: a single [`SimTime`] plus a tick condition.
#[derive(Debug, Default)]
pub struct SimClock {
    now: Mutex<SimTime>,
    tick: Condvar,
}

impl SimClock {
    pub fn new(start: SimTime) -> SimClock {
        SimClock {
            now: Mutex::new(start),
            tick: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimTime> {
        // A poisoned lock only means another holder panicked; the clock
        // value itself is always a valid SimTime.
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        *self.lock()
    }

    /// Advance the clock and wake every waiter. Driver side only.
    pub fn advance(&self, delta: SimTime) {
        let mut now = self.lock();
        *now = now.add(delta);
        self.tick.notify_all();
    }

    /// Advance the clock by a raw nanosecond count. Driver side only.
    pub fn advance_ns(&self, delta_ns: u64) {
        self.advance(SimTime::from_nanos(delta_ns));
    }

    /// Block until the clock reaches `wake` (seconds compared first,
    /// then nanoseconds). Returns the clock value observed on wakeup.
    ///
    /// There is no timeout: if the clock driver stalls, so does the
    /// waiter — but parked on the condition, not burning a CPU.
    pub fn wait_until(&self, wake: SimTime) -> SimTime {
        let mut now = self.lock();
        while *now < wake {
            now = self.tick.wait(now).unwrap_or_else(|e| e.into_inner());
        }
        *now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn advance_accumulates_with_carry() {
        let clock = SimClock::new(SimTime::new(0, 999_999_999));
        clock.advance(SimTime::new(0, 2));
        assert_eq!(clock.now(), SimTime::new(1, 1));
    }

    #[test]
    fn wait_until_returns_immediately_when_already_past() {
        let clock = SimClock::new(SimTime::new(5, 0));
        let seen = clock.wait_until(SimTime::new(4, 999_999_999));
        assert_eq!(seen, SimTime::new(5, 0));
    }

    #[test]
    fn wait_until_wakes_on_tick() {
        let clock = Arc::new(SimClock::new(SimTime::ZERO));
        let waiter = {
            let clock = Arc::clone(&clock);
            thread::spawn(move || clock.wait_until(SimTime::new(2, 0)))
        };
        // Tick past the wake time in two steps; the first is not enough.
        clock.advance(SimTime::new(1, 0));
        clock.advance(SimTime::new(1, 500));
        let seen = waiter.join().unwrap();
        assert!(seen >= SimTime::new(2, 0));
    }
}
