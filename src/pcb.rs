//! The shared process table and the per-process attachment handle.
//!
//! The scheduler creates and sizes the table before any process starts;
//! a process attaches to exactly one row and is that row's only writer.
//! The readiness flag is the one field the scheduler reads concurrently,
//! so it lives in an `AtomicBool` beside the row body. The body itself
//! sits behind a `Mutex` only so the harness and tests can snapshot it;
//! within a run the write side is single-threaded by construction.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::ActorError;
use crate::sim_time::SimTime;
use crate::types::Pid;

/// Default table capacity: one row per pid, max pid 18.
pub const DEFAULT_CAPACITY: usize = 19;

/// One process's control record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: Pid,
    /// Scheduling priority; acts as an exponent on burst lengths.
    pub priority: u32,
    /// When the process was admitted, stamped from the shared clock.
    pub arrival_time: SimTime,
    /// Cumulative simulated CPU time consumed.
    pub cpu_time: SimTime,
    /// Total time in the system, filled in at termination.
    pub sys_time: SimTime,
    /// Length of the most recent burst before blocking.
    pub burst_time: SimTime,
    /// Cumulative time spent waiting on events. Monotone.
    pub wait_time: SimTime,
}

impl ProcessEntry {
    /// A fresh record for an admitted process: ready, zeroed accumulators,
    /// arrival stamped from the current clock.
    pub fn new(pid: Pid, priority: u32, arrival_time: SimTime) -> ProcessEntry {
        ProcessEntry {
            pid,
            priority,
            arrival_time,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
struct Row {
    ready: AtomicBool,
    entry: Mutex<ProcessEntry>,
}

/// The shared table, one row per pid, fixed capacity.
#[derive(Debug)]
pub struct PcbTable {
    rows: Vec<Row>,
}

impl PcbTable {
    /// Create a table with an explicit capacity. Scheduler side only.
    pub fn new(capacity: usize) -> PcbTable {
        let rows = (0..capacity)
            .map(|_| Row {
                ready: AtomicBool::new(false),
                entry: Mutex::new(ProcessEntry::default()),
            })
            .collect();
        PcbTable { rows }
    }

    pub fn capacity(&self) -> usize {
        self.rows.len()
    }

    fn row(&self, pid: Pid) -> Result<&Row, ActorError> {
        self.rows.get(pid.index()).ok_or_else(|| {
            ActorError::Attach(format!(
                "pid {pid} outside table capacity {}",
                self.rows.len()
            ))
        })
    }

    fn entry(&self, pid: Pid) -> Result<MutexGuard<'_, ProcessEntry>, ActorError> {
        let row = self.row(pid)?;
        Ok(row.entry.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Initialize a row for a newly admitted process and mark it ready.
    /// Scheduler side; must happen before the process attaches.
    pub fn admit(&self, pid: Pid, priority: u32, arrival_time: SimTime) -> Result<(), ActorError> {
        *self.entry(pid)? = ProcessEntry::new(pid, priority, arrival_time);
        self.row(pid)?.ready.store(true, Ordering::Release);
        Ok(())
    }

    /// Whether the process is ready for another quantum. This is the only
    /// per-row field the scheduler reads while the process runs.
    pub fn is_ready(&self, pid: Pid) -> Result<bool, ActorError> {
        Ok(self.row(pid)?.ready.load(Ordering::Acquire))
    }

    /// Copy of the row body, for reporting and tests.
    pub fn snapshot(&self, pid: Pid) -> Result<ProcessEntry, ActorError> {
        Ok(self.entry(pid)?.clone())
    }

    /// Mutate a row from the scheduler side. Only valid while the owning
    /// process is not running (admission and post-termination accounting).
    pub fn with_entry<R>(
        &self,
        pid: Pid,
        f: impl FnOnce(&mut ProcessEntry) -> R,
    ) -> Result<R, ActorError> {
        Ok(f(&mut *self.entry(pid)?))
    }

    /// Attach to one row, validating the pid against the capacity.
    pub fn attach(self: &Arc<Self>, pid: Pid) -> Result<PcbHandle, ActorError> {
        self.row(pid)?;
        Ok(PcbHandle {
            table: Arc::clone(self),
            pid,
        })
    }
}

/// A process's handle to its own table row. Constructed through
/// [`PcbTable::attach`], which bounds-checks the pid; every accessor is
/// therefore infallible and restricted to that single row.
#[derive(Debug, Clone)]
pub struct PcbHandle {
    table: Arc<PcbTable>,
    pid: Pid,
}

impl PcbHandle {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    fn row(&self) -> &Row {
        // Bounds were checked at attach time and the table never shrinks.
        &self.table.rows[self.pid.index()]
    }

    /// Publish the readiness flag. The Release store pairs with the
    /// scheduler's Acquire load: a `false` stored before the blocked
    /// response is sent can never be observed stale.
    pub fn set_ready(&self, ready: bool) {
        self.row().ready.store(ready, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.row().ready.load(Ordering::Acquire)
    }

    /// Mutate the owned row.
    pub fn update<R>(&self, f: impl FnOnce(&mut ProcessEntry) -> R) -> R {
        let mut entry = self.row().entry.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut entry)
    }

    /// Copy of the owned row.
    pub fn snapshot(&self) -> ProcessEntry {
        self.update(|e| e.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_rejects_pid_beyond_capacity() {
        let table = Arc::new(PcbTable::new(4));
        assert!(table.attach(Pid(3)).is_ok());
        let err = table.attach(Pid(4)).unwrap_err();
        assert!(matches!(err, ActorError::Attach(_)));
    }

    #[test]
    fn admit_initializes_and_marks_ready() {
        let table = Arc::new(PcbTable::new(DEFAULT_CAPACITY));
        table.admit(Pid(7), 2, SimTime::new(1, 5)).unwrap();
        assert!(table.is_ready(Pid(7)).unwrap());
        let entry = table.snapshot(Pid(7)).unwrap();
        assert_eq!(entry.pid, Pid(7));
        assert_eq!(entry.priority, 2);
        assert_eq!(entry.arrival_time, SimTime::new(1, 5));
        assert_eq!(entry.wait_time, SimTime::ZERO);
    }

    #[test]
    fn with_entry_mutates_from_the_scheduler_side() {
        let table = Arc::new(PcbTable::new(2));
        table.admit(Pid(0), 3, SimTime::ZERO).unwrap();
        let prev_priority = table
            .with_entry(Pid(0), |e| {
                e.sys_time = SimTime::new(9, 1);
                e.priority
            })
            .unwrap();
        assert_eq!(prev_priority, 3);
        assert_eq!(table.snapshot(Pid(0)).unwrap().sys_time, SimTime::new(9, 1));
    }

    #[test]
    fn handle_is_scoped_to_its_own_row() {
        let table = Arc::new(PcbTable::new(4));
        table.admit(Pid(0), 0, SimTime::ZERO).unwrap();
        table.admit(Pid(1), 0, SimTime::ZERO).unwrap();
        let handle = table.attach(Pid(1)).unwrap();
        handle.set_ready(false);
        handle.update(|e| e.wait_time = SimTime::new(3, 0));
        assert!(table.is_ready(Pid(0)).unwrap());
        assert!(!table.is_ready(Pid(1)).unwrap());
        assert_eq!(table.snapshot(Pid(0)).unwrap().wait_time, SimTime::ZERO);
        assert_eq!(table.snapshot(Pid(1)).unwrap().wait_time, SimTime::new(3, 0));
    }
}
