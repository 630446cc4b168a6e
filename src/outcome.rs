//! Per-dispatch outcome classification.
//!
//! Each granted quantum ends one of three ways: the process consumes it
//! all, terminates partway through, or blocks on a simulated event. The
//! classification and every derived magnitude come from an injected
//! random source, so a seeded run is reproducible.

use rand::Rng;

use crate::sim_time::SimTime;

/// Outcome probabilities, in whole percent.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeConfig {
    /// Chance per dispatch that the process terminates. Default 5.
    pub terminate_pct: u8,
    /// Chance per dispatch that the process blocks. Default 5.
    pub block_pct: u8,
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        OutcomeConfig {
            terminate_pct: 5,
            block_pct: 5,
        }
    }
}

/// How a process spent one granted quantum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The whole quantum was consumed.
    Running,
    /// The process exits after consuming `percent` of the quantum.
    Terminating { percent: u8 },
    /// The process blocks after consuming `percent` of the quantum.
    Blocked { percent: u8, plan: BlockPlan },
}

/// Everything a blocked process needs to wait out its event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPlan {
    /// Simulated CPU consumed before blocking, in nanoseconds:
    /// `percent * (quantum / 100) * 2^priority`.
    pub burst_ns: u64,
    /// Random event delay added to the cumulative wait-time accumulator.
    pub wait_delay: SimTime,
    /// Clock value at which the process becomes ready again.
    pub wake_time: SimTime,
}

impl Outcome {
    /// Wire encoding of the outcome: a single signed code.
    ///
    /// `100` = full quantum, `1..=99` = terminating (percent consumed),
    /// `-99..=-1` = blocked (percent consumed, negated). The three ranges
    /// are mutually exclusive and exhaustive.
    pub fn code(&self) -> i32 {
        match self {
            Outcome::Running => 100,
            Outcome::Terminating { percent } => *percent as i32,
            Outcome::Blocked { percent, .. } => -(*percent as i32),
        }
    }

    /// Nanoseconds of the quantum actually consumed.
    pub fn consumed_ns(&self, quantum_ns: u64) -> u64 {
        match self {
            Outcome::Running => quantum_ns,
            Outcome::Terminating { percent } | Outcome::Blocked { percent, .. } => {
                quantum_ns * *percent as u64 / 100
            }
        }
    }
}

/// Classify one dispatch.
///
/// Two independent draws in [1,100] pick the class (terminate checked
/// first, both draws always taken); a third draw in [1,99] sets the
/// magnitude for the non-running classes.
pub fn decide<R: Rng>(
    rng: &mut R,
    cfg: &OutcomeConfig,
    quantum_ns: u64,
    priority: u32,
    now: SimTime,
) -> Outcome {
    let terminating = rng.random_range(1..=100u32) <= cfg.terminate_pct as u32;
    let blocked = rng.random_range(1..=100u32) <= cfg.block_pct as u32;
    if terminating {
        Outcome::Terminating {
            percent: rng.random_range(1..=99u8),
        }
    } else if blocked {
        let percent = rng.random_range(1..=99u8);
        let wait_delay = SimTime::new(
            rng.random_range(1..=4u64),
            rng.random_range(0..=999u64) * 1_000_000,
        );
        Outcome::Blocked {
            percent,
            plan: blocked_plan(percent, quantum_ns, priority, now, wait_delay),
        }
    } else {
        Outcome::Running
    }
}

/// Derive the burst and wake time for a blocked dispatch.
///
/// The burst scales exponentially with priority, and the wake time is
/// the event time pulled back by the burst already consumed:
/// `now + wait_delay - burst`.
pub fn blocked_plan(
    percent: u8,
    quantum_ns: u64,
    priority: u32,
    now: SimTime,
    wait_delay: SimTime,
) -> BlockPlan {
    let burst_ns = percent as u64 * (quantum_ns / 100) * 2u64.saturating_pow(priority);
    let mut wake_time = now.add(wait_delay);
    wake_time.increment_by(-(burst_ns as i64));
    BlockPlan {
        burst_ns,
        wait_delay,
        wake_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn codes_cover_the_three_disjoint_ranges() {
        assert_eq!(Outcome::Running.code(), 100);
        assert_eq!(Outcome::Terminating { percent: 42 }.code(), 42);
        let blocked = Outcome::Blocked {
            percent: 7,
            plan: blocked_plan(7, 200, 0, SimTime::ZERO, SimTime::new(1, 0)),
        };
        assert_eq!(blocked.code(), -7);
    }

    #[test]
    fn zero_probabilities_always_run_full_quantum() {
        let cfg = OutcomeConfig {
            terminate_pct: 0,
            block_pct: 0,
        };
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..50 {
            let outcome = decide(&mut rng, &cfg, 500, 0, SimTime::ZERO);
            assert_eq!(outcome, Outcome::Running);
            assert_eq!(outcome.code(), 100);
        }
    }

    #[test]
    fn certain_termination_wins_over_certain_block() {
        let cfg = OutcomeConfig {
            terminate_pct: 100,
            block_pct: 100,
        };
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..50 {
            match decide(&mut rng, &cfg, 500, 0, SimTime::ZERO) {
                Outcome::Terminating { percent } => assert!((1..=99).contains(&percent)),
                other => panic!("expected termination, got {other:?}"),
            }
        }
    }

    #[test]
    fn certain_block_draws_delay_in_range() {
        let cfg = OutcomeConfig {
            terminate_pct: 0,
            block_pct: 100,
        };
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..50 {
            match decide(&mut rng, &cfg, 500, 1, SimTime::new(10, 0)) {
                Outcome::Blocked { percent, plan } => {
                    assert!((1..=99).contains(&percent));
                    assert!((1..=4).contains(&plan.wait_delay.seconds));
                    assert!(plan.wait_delay.nanoseconds <= 999_000_000);
                    assert_eq!(plan.wait_delay.nanoseconds % 1_000_000, 0);
                }
                other => panic!("expected block, got {other:?}"),
            }
        }
    }

    #[test]
    fn every_generated_code_falls_in_exactly_one_range() {
        let cfg = OutcomeConfig::default();
        let mut rng = SmallRng::seed_from_u64(4);
        for _ in 0..1000 {
            let code = decide(&mut rng, &cfg, 500, 0, SimTime::ZERO).code();
            let ranges = [code == 100, (1..=99).contains(&code), (-99..=-1).contains(&code)];
            assert_eq!(ranges.iter().filter(|&&r| r).count(), 1, "code {code}");
        }
    }

    #[test]
    fn burst_scales_exponentially_with_priority() {
        let plan = blocked_plan(7, 500, 2, SimTime::ZERO, SimTime::new(1, 0));
        assert_eq!(plan.burst_ns, 7 * (500 / 100) * 4); // 140
        let flat = blocked_plan(7, 200, 0, SimTime::ZERO, SimTime::new(1, 0));
        assert_eq!(flat.burst_ns, 14);
    }

    #[test]
    fn wake_time_is_event_time_minus_burst() {
        let now = SimTime::new(3, 500);
        let plan = blocked_plan(10, 1000, 1, now, SimTime::new(2, 1_000_000));
        // burst = 10 * 10 * 2 = 200 ns
        assert_eq!(plan.burst_ns, 200);
        assert_eq!(plan.wake_time, SimTime::new(5, 1_000_300));
    }

    #[test]
    fn sub_hundred_quantum_truncates_burst_to_zero() {
        let plan = blocked_plan(99, 50, 3, SimTime::ZERO, SimTime::new(1, 0));
        assert_eq!(plan.burst_ns, 0);
        assert_eq!(plan.wake_time, SimTime::new(1, 0));
    }

    #[test]
    fn consumed_is_percent_of_quantum() {
        assert_eq!(Outcome::Running.consumed_ns(500), 500);
        assert_eq!(Outcome::Terminating { percent: 42 }.consumed_ns(500), 210);
        let blocked = Outcome::Blocked {
            percent: 7,
            plan: blocked_plan(7, 200, 0, SimTime::ZERO, SimTime::new(1, 0)),
        };
        assert_eq!(blocked.consumed_ns(200), 14);
    }
}
