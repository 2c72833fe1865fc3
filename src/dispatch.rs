//! Applying updates on the UI thread.
//!
//! Pollers never touch a sink.  They send [`UpdateEvent`]s into an
//! [`mpsc`] channel whose single receiver is owned by the [`Dispatcher`],
//! which lives on the thread that owns the sinks.  The channel is FIFO, so
//! updates for one item are applied in the order that item's poller sent
//! them.  Updates for different items may interleave freely.

use crate::item::{ItemId, UpdateEvent};
use crate::shutdown::ShutdownSignal;
use crate::traits::LabelSink;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::mpsc;
use std::time::Duration;

/// How often [`Dispatcher::run_until`] rechecks the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Result of one [`Dispatcher::drain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainStatus {
    /// Events handed to a sink.
    pub applied: usize,
    /// Every sender is gone; no further events can arrive.
    pub disconnected: bool,
}

/// Single consumer of the update channel.
pub struct Dispatcher<S: LabelSink> {
    rx: mpsc::Receiver<UpdateEvent>,
    sinks: HashMap<ItemId, S>,
}

impl<S: LabelSink> Dispatcher<S> {
    pub fn new(rx: mpsc::Receiver<UpdateEvent>) -> Self {
        Self {
            rx,
            sinks: HashMap::new(),
        }
    }

    /// Attach the sink that displays item `id`.  Replaces any previous one.
    pub fn register(&mut self, id: ItemId, sink: S) {
        self.sinks.insert(id, sink);
    }

    pub fn sink(&self, id: ItemId) -> Option<&S> {
        self.sinks.get(&id)
    }

    /// Hand one event to its sink.  Returns `false` for unknown targets.
    pub fn apply(&mut self, event: UpdateEvent) -> bool {
        match self.sinks.get_mut(&event.target) {
            Some(sink) => {
                debug!("apply {} <- {:?}", event.target, event.text);
                sink.apply(&event.text);
                true
            }
            None => {
                warn!("update for unknown item {}, dropped", event.target);
                false
            }
        }
    }

    /// Apply every event that is already queued, without blocking.
    pub fn drain(&mut self) -> DrainStatus {
        let mut applied = 0;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if self.apply(event) {
                        applied += 1;
                    }
                }
                Err(mpsc::TryRecvError::Empty) => {
                    return DrainStatus {
                        applied,
                        disconnected: false,
                    }
                }
                Err(mpsc::TryRecvError::Disconnected) => {
                    return DrainStatus {
                        applied,
                        disconnected: true,
                    }
                }
            }
        }
    }

    /// Block applying events until `shutdown` is raised or every sender is
    /// gone.
    pub fn run_until(&mut self, shutdown: &ShutdownSignal) {
        while !shutdown.is_requested() {
            match self.rx.recv_timeout(SHUTDOWN_POLL) {
                Ok(event) => {
                    self.apply(event);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    debug!("all pollers finished");
                    return;
                }
            }
        }
    }
}

//  Tests
