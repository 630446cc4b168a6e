//! simproc - simulated user processes for a message-driven CPU-scheduling
//! simulator.
//!
//! Each [`actor::UserProc`] models one scheduled process. When the
//! scheduler grants it a quantum over the rendezvous channel, the actor
//! decides probabilistically whether it consumes the whole quantum,
//! terminates partway through, or blocks on a simulated I/O event with a
//! randomly generated wake time, and reports the outcome back as a single
//! signed code.
//!
//! # Architecture
//!
//! - **SimTime**: normalized (seconds, nanoseconds) arithmetic
//! - **SimClock**: the shared simulated clock, ticked by an external driver
//! - **PcbTable**: the shared per-process control records; each actor owns
//!   exactly one row
//! - **MsgQueue**: the selector-addressed rendezvous channel
//! - **Outcome**: the per-dispatch classification with injectable randomness
//! - **Harness**: a scripted dispatch stub and clock driver for the demo
//!   binary and the integration tests (the real scheduler is an external
//!   collaborator)
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use simproc::{OutcomeConfig, PcbTable, Pid, SimClock, SimTime, MsgQueue, UserProc};
//!
//! let clock = Arc::new(SimClock::new(SimTime::ZERO));
//! let table = Arc::new(PcbTable::new(19));
//! let queue = Arc::new(MsgQueue::new());
//!
//! table.admit(Pid(3), 0, clock.now()).unwrap();
//! let actor = UserProc::attach(
//!     Pid(3), 500, clock, &table, queue, OutcomeConfig::default(), 42,
//! )
//! .unwrap();
//! actor.run().unwrap();
//! ```

pub mod actor;
pub mod clock;
pub mod errors;
pub mod harness;
pub mod msgq;
pub mod outcome;
pub mod pcb;
pub mod sim_time;
pub mod types;

// Re-export the main public types for convenience.
pub use actor::UserProc;
pub use clock::SimClock;
pub use errors::{ActorError, ChannelOp};
pub use msgq::MsgQueue;
pub use outcome::{blocked_plan, decide, BlockPlan, Outcome, OutcomeConfig};
pub use pcb::{PcbHandle, PcbTable, ProcessEntry, DEFAULT_CAPACITY};
pub use sim_time::{SimTime, NANOS_PER_SEC};
pub use types::{Pid, Selector};
