use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use simproc::harness::{run_demo, DemoConfig};
use simproc::outcome::OutcomeConfig;
use simproc::pcb::DEFAULT_CAPACITY;

/// simproc: simulated user processes for a message-driven scheduling
/// simulator.
///
/// Stands up a shared simulated clock, a bounded process table and a
/// rendezvous message channel, then runs a set of user-process actors
/// against a round-robin dispatch stub until every process terminates.
/// Each granted quantum is either fully consumed, ended early by
/// termination, or cut short by a simulated I/O block with a random
/// wake time.
#[derive(Debug, Parser)]
struct Opts {
    /// Number of simulated processes.
    #[clap(short = 'n', long, default_value = "4")]
    nr_procs: u32,

    /// Quantum granted per dispatch, in simulated nanoseconds.
    #[clap(short = 'q', long, default_value = "500")]
    quantum_ns: u64,

    /// Percent chance per dispatch that a process terminates.
    #[clap(short = 't', long, default_value = "5")]
    terminate_pct: u8,

    /// Percent chance per dispatch that a process blocks.
    #[clap(short = 'b', long, default_value = "5")]
    block_pct: u8,

    /// Random seed; each process salts it with its pid.
    #[clap(short = 's', long, default_value = "0")]
    seed: u64,

    /// Process table capacity.
    #[clap(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Enable verbose output, including per-dispatch decisions. Repeat
    /// for trace output.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let opts = Opts::parse();

    let llv = match opts.verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    let mut lcfg = simplelog::ConfigBuilder::new();
    lcfg.set_time_level(simplelog::LevelFilter::Error)
        .set_location_level(simplelog::LevelFilter::Off)
        .set_target_level(simplelog::LevelFilter::Off)
        .set_thread_level(simplelog::LevelFilter::Off);
    simplelog::TermLogger::init(
        llv,
        lcfg.build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    if opts.terminate_pct > 100 || opts.block_pct > 100 {
        bail!("outcome probabilities are percentages, max 100");
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_clone.store(true, Ordering::Release);
    })
    .context("Error setting Ctrl-C handler")?;

    let cfg = DemoConfig {
        nr_procs: opts.nr_procs,
        quantum_ns: opts.quantum_ns,
        outcome: OutcomeConfig {
            terminate_pct: opts.terminate_pct,
            block_pct: opts.block_pct,
        },
        seed: opts.seed,
        capacity: opts.capacity,
        ..DemoConfig::default()
    };

    let summary = run_demo(&cfg, &shutdown)?;
    info!(
        "{} dispatches: {} full quanta, {} blocks, {} terminations",
        summary.dispatches, summary.full_quanta, summary.blocks, summary.terminations
    );
    Ok(())
}
