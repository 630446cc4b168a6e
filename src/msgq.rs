//! The selector-addressed rendezvous channel.
//!
//! Models a single shared message queue addressed by selector, the way
//! SysV queues address by `mtype`: the scheduler dispatches a quantum on
//! `pid + 1` and synchronously receives the outcome on `pid + 100`.
//! Internally each selector lazily gets its own crossbeam channel, so a
//! receive on one selector never consumes a message meant for another.
//!
//! `close()` tears down every endpoint; blocked receivers wake with a
//! channel error. That is the only channel-failure path in-process, and
//! it maps to the fatal channel I/O failure of the original IPC.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::errors::{ActorError, ChannelOp};
use crate::types::Selector;

#[derive(Debug)]
struct Endpoint {
    tx: Sender<i32>,
    rx: Receiver<i32>,
}

/// A shared message queue carrying one `i32` outcome code per message.
#[derive(Debug, Default)]
pub struct MsgQueue {
    endpoints: Mutex<HashMap<i64, Endpoint>>,
    closed: AtomicBool,
}

impl MsgQueue {
    pub fn new() -> MsgQueue {
        MsgQueue::default()
    }

    /// Look up (or lazily create) the endpoint for `selector` and clone
    /// one half out of it. Callers take only the half they need: a
    /// receiver parked in [`MsgQueue::recv`] must not hold a `Sender` of
    /// its own channel, or [`MsgQueue::close`] could never disconnect it.
    fn with_endpoint<T>(
        &self,
        selector: Selector,
        op: ChannelOp,
        f: impl FnOnce(&Endpoint) -> T,
    ) -> Result<T, ActorError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ActorError::Channel { selector, op });
        }
        let mut endpoints = self.endpoints.lock().unwrap_or_else(|e| e.into_inner());
        let ep = endpoints.entry(selector.0).or_insert_with(|| {
            let (tx, rx) = unbounded();
            Endpoint { tx, rx }
        });
        Ok(f(ep))
    }

    /// Send one outcome code addressed to `selector`.
    pub fn send(&self, selector: Selector, code: i32) -> Result<(), ActorError> {
        let tx = self.with_endpoint(selector, ChannelOp::Send, |ep| ep.tx.clone())?;
        tx.send(code).map_err(|_| ActorError::Channel {
            selector,
            op: ChannelOp::Send,
        })
    }

    /// Block until a message addressed to `selector` arrives.
    pub fn recv(&self, selector: Selector) -> Result<i32, ActorError> {
        let rx = self.with_endpoint(selector, ChannelOp::Recv, |ep| ep.rx.clone())?;
        rx.recv().map_err(|_| ActorError::Channel {
            selector,
            op: ChannelOp::Recv,
        })
    }

    /// Tear the queue down. Every endpoint is dropped, so receivers
    /// blocked in [`MsgQueue::recv`] return a channel error, and any
    /// later send or receive fails immediately.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.endpoints
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
