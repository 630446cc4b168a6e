//! Scripted peer harness: a dispatch stub and a clock driver.
//!
//! The scheduler and the clock driver are external collaborators; this
//! module stands in for both so the actor can be exercised end to end by
//! the demo binary and the integration tests. The dispatch stub grants
//! quanta round-robin to whichever processes are ready and interprets
//! the response codes — it is deliberately not a scheduling policy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};

use crate::actor::UserProc;
use crate::clock::SimClock;
use crate::msgq::MsgQueue;
use crate::outcome::OutcomeConfig;
use crate::pcb::{PcbTable, DEFAULT_CAPACITY};
use crate::sim_time::SimTime;
use crate::types::{Pid, Selector};

/// Parameters for one demo run.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub nr_procs: u32,
    /// Quantum granted per dispatch, in simulated nanoseconds.
    pub quantum_ns: u64,
    pub outcome: OutcomeConfig,
    pub seed: u64,
    /// Process table capacity; `nr_procs` must fit.
    pub capacity: usize,
    /// Simulated nanoseconds the clock driver adds per tick.
    pub tick_ns: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            nr_procs: 4,
            quantum_ns: 500,
            outcome: OutcomeConfig::default(),
            seed: 0,
            capacity: DEFAULT_CAPACITY,
            tick_ns: 5_000_000,
        }
    }
}

/// Tallies from one demo run.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoSummary {
    pub dispatches: u64,
    pub full_quanta: u64,
    pub blocks: u64,
    pub terminations: u64,
}

/// Stand up the shared resources, run `nr_procs` actors to termination
/// and return the dispatch tallies. `shutdown` aborts the run early
/// (actors still parked on the channel are released by closing it).
pub fn run_demo(cfg: &DemoConfig, shutdown: &AtomicBool) -> Result<DemoSummary> {
    if cfg.nr_procs as usize > cfg.capacity {
        bail!(
            "{} processes exceed table capacity {}",
            cfg.nr_procs,
            cfg.capacity
        );
    }

    let clock = Arc::new(SimClock::new(SimTime::ZERO));
    let table = Arc::new(PcbTable::new(cfg.capacity));
    let queue = Arc::new(MsgQueue::new());

    // Clock driver: ticks the simulated clock until told to stop.
    let stop_driver = Arc::new(AtomicBool::new(false));
    let driver = {
        let clock = Arc::clone(&clock);
        let stop = Arc::clone(&stop_driver);
        let tick_ns = cfg.tick_ns;
        thread::Builder::new()
            .name("clock-driver".into())
            .spawn(move || {
                while !stop.load(Ordering::Acquire) {
                    clock.advance_ns(tick_ns);
                    thread::sleep(Duration::from_micros(20));
                }
            })
            .context("spawning clock driver")?
    };

    // Admit and start the actors. Alternating priorities exercise the
    // exponential burst scaling.
    let mut actors = Vec::new();
    for pid in (0..cfg.nr_procs).map(Pid) {
        table.admit(pid, pid.0 % 2, clock.now())?;
        let actor = UserProc::attach(
            pid,
            cfg.quantum_ns,
            Arc::clone(&clock),
            &table,
            Arc::clone(&queue),
            cfg.outcome,
            cfg.seed,
        )?;
        let handle = thread::Builder::new()
            .name(format!("proc-{pid}"))
            .spawn(move || actor.run())
            .with_context(|| format!("spawning actor for pid {pid}"))?;
        actors.push((pid, handle));
    }

    let result = dispatch_loop(cfg, &table, &queue, shutdown);

    // Unblock anything still parked on the channel, then reap.
    stop_driver.store(true, Ordering::Release);
    let aborted = result.is_err() || shutdown.load(Ordering::Acquire);
    if aborted {
        queue.close();
    }
    for (pid, handle) in actors {
        match handle.join() {
            Ok(Ok(())) => debug!("pid {pid}: exited cleanly"),
            Ok(Err(e)) if aborted => warn!("pid {pid}: released during shutdown: {e}"),
            Ok(Err(e)) => bail!("pid {pid}: {e}"),
            Err(_) => bail!("pid {pid}: actor thread panicked"),
        }
    }
    let _ = driver.join();
    let summary = result?;

    // Final accounting, done after every actor has exited: total time in
    // the system for each process.
    let end = clock.now();
    for pid in (0..cfg.nr_procs).map(Pid) {
        table.with_entry(pid, |e| e.sys_time = end.subtract(e.arrival_time))?;
        let entry = table.snapshot(pid)?;
        info!(
            "pid {pid}: sys {} cpu {} wait {} last-burst {}",
            entry.sys_time, entry.cpu_time, entry.wait_time, entry.burst_time
        );
    }

    Ok(summary)
}

fn dispatch_loop(
    cfg: &DemoConfig,
    table: &PcbTable,
    queue: &MsgQueue,
    shutdown: &AtomicBool,
) -> Result<DemoSummary> {
    let mut summary = DemoSummary::default();
    let mut alive = vec![true; cfg.nr_procs as usize];
    let grant = cfg.quantum_ns.min(i32::MAX as u64) as i32;

    while alive.iter().any(|&a| a) {
        if shutdown.load(Ordering::Acquire) {
            info!("shutdown requested, abandoning dispatch loop");
            break;
        }
        let mut progress = false;
        for pid in (0..cfg.nr_procs).map(Pid) {
            if !alive[pid.index()] || !table.is_ready(pid)? {
                continue;
            }
            queue.send(Selector::dispatch(pid), grant)?;
            let code = queue.recv(Selector::response(pid))?;
            summary.dispatches += 1;
            progress = true;
            match code {
                100 => summary.full_quanta += 1,
                1..=99 => {
                    summary.terminations += 1;
                    alive[pid.index()] = false;
                }
                -99..=-1 => summary.blocks += 1,
                other => bail!("pid {pid}: malformed response code {other}"),
            }
        }
        if !progress {
            // Everyone still alive is blocked; let the clock catch up.
            thread::sleep(Duration::from_micros(50));
        }
    }

    Ok(summary)
}
