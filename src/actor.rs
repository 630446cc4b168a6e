//! The user-process actor: one simulated process, one thread.
//!
//! The actor attaches to the shared clock and table, then loops on a
//! two-message rendezvous with the scheduler: receive a dispatch on
//! `pid + 1`, classify the quantum, publish the result into its own
//! table row, respond on `pid + 100`. A blocked outcome parks the actor
//! on the clock until its wake time passes; a terminating outcome ends
//! the loop after the response is sent.
//!
//! Ordering invariant: on a blocked outcome the readiness flag is stored
//! `false` (Release) strictly before the response is sent. The scheduler
//! is synchronously blocked receiving that response, so it can never
//! observe the stale `true`. The flag is set back to `true` by the actor
//! itself once the clock passes the wake time; no peer ever writes it.

use std::sync::Arc;

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::clock::SimClock;
use crate::errors::ActorError;
use crate::msgq::MsgQueue;
use crate::outcome::{decide, Outcome, OutcomeConfig};
use crate::pcb::{PcbHandle, PcbTable};
use crate::sim_time::SimTime;
use crate::types::{Pid, Selector};

/// A running user process, generic over its random source.
pub struct UserProc<R: Rng> {
    pid: Pid,
    quantum_ns: u64,
    clock: Arc<SimClock>,
    row: PcbHandle,
    queue: Arc<MsgQueue>,
    cfg: OutcomeConfig,
    rng: R,
}

impl UserProc<SmallRng> {
    /// Attach with a pid-salted seeded generator. Mixing the pid into the
    /// seed keeps processes spawned in the same instant on distinct
    /// random streams.
    pub fn attach(
        pid: Pid,
        quantum_ns: u64,
        clock: Arc<SimClock>,
        table: &Arc<PcbTable>,
        queue: Arc<MsgQueue>,
        cfg: OutcomeConfig,
        seed: u64,
    ) -> Result<Self, ActorError> {
        let rng = SmallRng::seed_from_u64(seed.wrapping_add(pid.0 as u64 + 1));
        Self::attach_with_rng(pid, quantum_ns, clock, table, queue, cfg, rng)
    }
}

impl<R: Rng> UserProc<R> {
    /// Attach to the shared resources with an explicit random source.
    ///
    /// The clock and table must already exist (they are created and sized
    /// by the scheduler); a pid outside the table's capacity is an
    /// attachment error.
    pub fn attach_with_rng(
        pid: Pid,
        quantum_ns: u64,
        clock: Arc<SimClock>,
        table: &Arc<PcbTable>,
        queue: Arc<MsgQueue>,
        cfg: OutcomeConfig,
        rng: R,
    ) -> Result<Self, ActorError> {
        let row = table.attach(pid)?;
        Ok(UserProc {
            pid,
            quantum_ns,
            clock,
            row,
            queue,
            cfg,
            rng,
        })
    }

    /// Run the dispatch loop until the process terminates.
    ///
    /// Returns `Ok(())` after a terminating response has been sent; after
    /// that the actor never touches the channel again. Any channel
    /// failure is fatal and returned as-is.
    pub fn run(mut self) -> Result<(), ActorError> {
        let dispatch = Selector::dispatch(self.pid);
        let response = Selector::response(self.pid);
        loop {
            // The grant's payload is informational; the quantum length
            // was fixed at startup.
            let _grant = self.queue.recv(dispatch)?;

            let priority = self.row.snapshot().priority;
            let now = self.clock.now();
            let outcome = decide(&mut self.rng, &self.cfg, self.quantum_ns, priority, now);
            debug!(
                "pid {}: dispatched at {now}, outcome code {}",
                self.pid,
                outcome.code()
            );

            self.publish(&outcome);
            self.queue.send(response, outcome.code())?;

            match outcome {
                Outcome::Terminating { percent } => {
                    info!("pid {}: terminating after {percent}% of a quantum", self.pid);
                    return Ok(());
                }
                Outcome::Blocked { plan, .. } => self.wait_until_ready(plan.wake_time),
                Outcome::Running => {}
            }
        }
    }

    /// Fold one outcome into the owned table row. For a blocked outcome
    /// this also clears the readiness flag, which must happen before the
    /// response send (the caller sends right after).
    fn publish(&self, outcome: &Outcome) {
        let consumed = outcome.consumed_ns(self.quantum_ns);
        self.row.update(|entry| {
            entry.cpu_time.increment_by(consumed as i64);
            if let Outcome::Blocked { plan, .. } = outcome {
                entry.burst_time = SimTime::from_nanos(plan.burst_ns);
                entry.wait_time = entry.wait_time.add(plan.wait_delay);
            }
        });
        if matches!(outcome, Outcome::Blocked { .. }) {
            self.row.set_ready(false);
        }
    }

    /// Park on the clock until it reaches `wake_time`, then flip the
    /// readiness flag back on. The actor clears its own block; the
    /// scheduler only ever reads the flag.
    fn wait_until_ready(&self, wake_time: SimTime) {
        let seen = self.clock.wait_until(wake_time);
        self.row.set_ready(true);
        debug!(
            "pid {}: woke at {seen} (wake time was {wake_time})",
            self.pid
        );
    }
}
