//! Newtype wrappers for domain identifiers.
//!
//! Newtypes for process identifiers and channel selectors prevent silent
//! confusion between a pid, the selector its dispatches arrive on, and
//! the selector its responses leave on.

use std::fmt;

/// Simulated process identifier. Doubles as the index of the process's
/// row in the shared table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Pid(pub u32);

impl Pid {
    /// Row index in the shared process table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message-channel selector.
///
/// The channel is shared by every process; messages are addressed by
/// selector the way SysV message queues address by `mtype`: the
/// scheduler dispatches to `pid + 1` and the process responds on
/// `pid + 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selector(pub i64);

impl Selector {
    /// Selector the scheduler dispatches quanta on for `pid`.
    pub fn dispatch(pid: Pid) -> Selector {
        Selector(pid.0 as i64 + 1)
    }

    /// Selector the process sends its outcome responses on.
    pub fn response(pid: Pid) -> Selector {
        Selector(pid.0 as i64 + 100)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_are_offset_from_pid() {
        assert_eq!(Selector::dispatch(Pid(3)), Selector(4));
        assert_eq!(Selector::response(Pid(3)), Selector(103));
    }

    #[test]
    fn dispatch_and_response_never_collide_within_capacity() {
        // Dispatch selectors span 1..=cap, responses 100..=cap+99; with a
        // table capacity below 100 the ranges cannot overlap.
        for pid in 0..19 {
            let p = Pid(pid);
            assert_ne!(Selector::dispatch(p), Selector::response(p));
        }
    }
}
