//! Error types for the actor core.
//!
//! Only two kinds of failure exist and both are fatal: the shared
//! resources were not set up before the actor started (attachment), or
//! the rendezvous channel broke underneath it (channel I/O). Neither is
//! retried; the actor reports a diagnostic and exits non-zero.

use std::error::Error;
use std::fmt;

use crate::types::Selector;

/// A fatal actor failure.
#[derive(Debug)]
pub enum ActorError {
    /// The shared clock or process table could not be attached, or the
    /// pid falls outside the table's declared capacity.
    Attach(String),
    /// A send or receive on the rendezvous channel failed.
    Channel { selector: Selector, op: ChannelOp },
}

/// Which half of the rendezvous failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOp {
    Send,
    Recv,
}

impl fmt::Display for ActorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorError::Attach(msg) => write!(f, "resource attachment failed: {msg}"),
            ActorError::Channel { selector, op } => {
                let op = match op {
                    ChannelOp::Send => "send",
                    ChannelOp::Recv => "receive",
                };
                write!(f, "channel {op} failed on selector {selector}")
            }
        }
    }
}

impl Error for ActorError {}
