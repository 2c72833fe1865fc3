//! One background worker per tracked item.
//!
//! A [`Poller`] owns its item's [`Sampler`], samples once immediately, then
//! sleeps for the item's interval and samples again, forever.  Whenever the
//! text differs from the last one it emitted, it sends an [`UpdateEvent`]
//! to the dispatcher.
//!
//! # Stopping
//!
//! The sleep is a condition-variable wait with a deadline fixed when the
//! sleep begins.  The [`Supervisor`](crate::lifecycle::Supervisor) sets
//! `stop_requested` and notifies the condvar; the poller notices at its next
//! wait and exits without sampling again.  A sample that is already running
//! is never interrupted: its result is still compared and, if it changed,
//! still emitted.
//!
//! ```text
//! Created ── spawn ──▶ Running ── request_stop ──▶ StopRequested ── wait sees flag ──▶ Stopped
//! ```

use crate::change::has_changed;
use crate::exec::SampleError;
use crate::item::{ItemId, Slot, UpdateEvent};
use crate::traits::Sampler;
use log::{debug, info, warn};
use std::ops::ControlFlow;
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Per-item state shared between a poller thread and its supervisor.
///
/// The poller writes `previous_output` and `running`; the supervisor writes
/// `stop_requested` and takes `thread`.
#[derive(Debug, Default)]
struct PollerState {
    previous_output: Option<String>,
    stop_requested: bool,
    running: bool,
    thread: Option<JoinHandle<()>>,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<PollerState>,
    /// Wakes the poller on stop, and the supervisor on exit.
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PollerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// How an interval wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Elapsed,
    Stopped,
}

/// The worker for one item.  Consumed by [`spawn`](Poller::spawn).
pub struct Poller {
    id: ItemId,
    slot: Slot,
    interval: Option<Duration>,
    sampler: Arc<dyn Sampler>,
    tx: mpsc::Sender<UpdateEvent>,
    shared: Arc<Shared>,
}

impl Poller {
    /// Create a poller for item `id`.
    ///
    /// With `interval == None` the poller samples once and finishes.
    pub fn new(
        id: ItemId,
        slot: Slot,
        interval: Option<Duration>,
        sampler: Arc<dyn Sampler>,
        tx: mpsc::Sender<UpdateEvent>,
    ) -> Self {
        Self {
            id,
            slot,
            interval,
            sampler,
            tx,
            shared: Arc::new(Shared::default()),
        }
    }

    /// Start the poller on its own named thread.
    ///
    /// Fails only if the OS refuses to create the thread.
    pub fn spawn(self) -> std::io::Result<PollerHandle> {
        self.spawn_with(thread::Builder::new())
    }

    /// Like [`spawn`](Self::spawn), on a thread configured by `builder`.
    /// The thread name is always set here.
    pub fn spawn_with(self, builder: thread::Builder) -> std::io::Result<PollerHandle> {
        let handle = PollerHandle {
            id: self.id,
            slot: self.slot,
            shared: Arc::clone(&self.shared),
        };
        // Marked before the thread exists so a stop can never miss it.
        handle.shared.lock().running = true;
        let spawned = builder
            .name(format!("poll-{}", self.slot))
            .spawn(move || self.run());
        let mut state = handle.shared.lock();
        match spawned {
            Ok(thread) => state.thread = Some(thread),
            Err(e) => {
                state.running = false;
                return Err(e);
            }
        }
        drop(state);
        Ok(handle)
    }

    fn run(self) {
        debug!("{} poller started", self.slot);
        let _exit = ExitGuard {
            shared: &self.shared,
            slot: self.slot,
        };

        let mut flow = self.cycle();
        if let Some(interval) = self.interval {
            while flow.is_continue() && self.wait(interval) == Wake::Elapsed {
                flow = self.cycle();
            }
        }
    }

    /// Sleep until `interval` has passed or a stop is requested.
    ///
    /// Wakes that are neither go back to sleep until the original deadline.
    fn wait(&self, interval: Duration) -> Wake {
        let deadline = Instant::now() + interval;
        let mut state = self.shared.lock();
        loop {
            if state.stop_requested {
                return Wake::Stopped;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Wake::Elapsed;
            }
            state = match self.shared.wake.wait_timeout(state, remaining) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    /// Sample once and emit if the text changed.
    ///
    /// Breaks when the dispatcher has gone away.
    fn cycle(&self) -> ControlFlow<()> {
        let text = match self.sampler.sample() {
            Ok(text) => text,
            Err(SampleError::Empty) => {
                debug!("{}: empty output, keeping previous", self.slot);
                return ControlFlow::Continue(());
            }
            Err(e) => {
                warn!("{}: {}", self.slot, e);
                return ControlFlow::Continue(());
            }
        };

        {
            let mut state = self.shared.lock();
            if !has_changed(state.previous_output.as_deref(), &text) {
                return ControlFlow::Continue(());
            }
            state.previous_output = Some(text.clone());
        }

        debug!("{} changed: {:?}", self.slot, text);
        let event = UpdateEvent {
            target: self.id,
            text,
        };
        if self.tx.send(event).is_err() {
            info!("{}: dispatcher closed, stopping", self.slot);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}

/// Clears `running` and wakes the supervisor when the poller thread leaves
/// [`Poller::run`], including by unwinding from a panicking sampler.
struct ExitGuard<'a> {
    shared: &'a Shared,
    slot: Slot,
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.running = false;
        self.shared.wake.notify_all();
        drop(state);
        if thread::panicking() {
            warn!("{} poller panicked", self.slot);
        } else {
            debug!("{} poller stopped", self.slot);
        }
    }
}

/// Supervisor-side view of a running poller.
pub struct PollerHandle {
    id: ItemId,
    slot: Slot,
    shared: Arc<Shared>,
}

impl PollerHandle {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Whether the poller thread is still inside its loop.
    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    /// The last text this poller emitted.
    pub fn previous_output(&self) -> Option<String> {
        self.shared.lock().previous_output.clone()
    }

    /// Take the thread handle, raise the stop flag and wake the poller, all
    /// in one critical section.
    ///
    /// Returns `None` if the handle was already taken, in which case nothing
    /// else is changed.
    pub fn request_stop(&self) -> Option<JoinHandle<()>> {
        let mut state = self.shared.lock();
        let thread = state.thread.take();
        if thread.is_some() {
            state.stop_requested = true;
            self.shared.wake.notify_all();
        }
        thread
    }

    /// Block until the poller reports it is no longer running, or `budget`
    /// expires.  Returns `false` on expiry.
    pub fn wait_stopped(&self, budget: Duration) -> bool {
        let state = self.shared.lock();
        let timed_out = match self
            .shared
            .wake
            .wait_timeout_while(state, budget, |s| s.running)
        {
            Ok((_, result)) => result.timed_out(),
            Err(poisoned) => poisoned.into_inner().1.timed_out(),
        };
        !timed_out
    }

    /// Drop the retained output once the poller has been joined.
    pub fn release(&self) {
        self.shared.lock().previous_output = None;
    }

    /// Notify the condvar without requesting a stop.
    #[cfg(test)]
    fn nudge(&self) {
        let _state = self.shared.lock();
        self.shared.wake.notify_all();
    }

    #[cfg(test)]
    fn thread_finished(&self) -> bool {
        self.shared
            .lock()
            .thread
            .as_ref()
            .map_or(true, |t| t.is_finished())
    }
}

//  Tests
