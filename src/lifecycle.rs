//! Starting and stopping the pollers.
//!
//! [`Supervisor`] spawns one [`Poller`] per non-spacer item and owns the
//! resulting handles.  [`Supervisor::stop_all`] is safe to call any number
//! of times from any thread; only the first call does any work.

use crate::exec::ShellCommand;
use crate::item::{ItemSource, TrackedItem, UpdateEvent};
use crate::poller::{Poller, PollerHandle};
use crate::traits::Sampler;
use log::{error, info, warn};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

/// How long `stop_all` waits for each poller to report it has exited.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// The sampler an item runs by default, or `None` for spacers.
pub fn sampler_for(item: &TrackedItem) -> Option<Arc<dyn Sampler>> {
    match &item.source {
        ItemSource::Spacer => None,
        ItemSource::Shell(command) => {
            Some(Arc::new(ShellCommand::new(command.clone())) as Arc<dyn Sampler>)
        }
        ItemSource::Date(field) => Some(Arc::new(*field) as Arc<dyn Sampler>),
    }
}

/// Owner of every running poller.
pub struct Supervisor {
    pollers: Vec<PollerHandle>,
    shutdown_timeout: Duration,
}

impl Supervisor {
    /// Start one poller per non-spacer item, each running its default
    /// sampler.
    pub fn start(items: &[TrackedItem], tx: mpsc::Sender<UpdateEvent>) -> Self {
        Self::start_with(items, tx, sampler_for)
    }

    /// Like [`start`](Self::start), but `make` chooses each item's sampler.
    /// Items for which `make` returns `None` are skipped.
    ///
    /// A poller whose thread cannot be created is logged and left out; its
    /// sink simply keeps its initial text.
    pub fn start_with<F>(items: &[TrackedItem], tx: mpsc::Sender<UpdateEvent>, make: F) -> Self
    where
        F: FnMut(&TrackedItem) -> Option<Arc<dyn Sampler>>,
    {
        Self::launch(items, tx, make, |_| thread::Builder::new())
    }

    /// Shared body of the constructors; `builder` configures each item's
    /// thread.
    fn launch<F, B>(
        items: &[TrackedItem],
        tx: mpsc::Sender<UpdateEvent>,
        mut make: F,
        mut builder: B,
    ) -> Self
    where
        F: FnMut(&TrackedItem) -> Option<Arc<dyn Sampler>>,
        B: FnMut(&TrackedItem) -> thread::Builder,
    {
        let mut pollers = Vec::new();
        for item in items.iter().filter(|i| !i.is_spacer()) {
            let Some(sampler) = make(item) else {
                continue;
            };
            let poller = Poller::new(item.id, item.slot, item.interval, sampler, tx.clone());
            match poller.spawn_with(builder(item)) {
                Ok(handle) => pollers.push(handle),
                Err(e) => error!("failed to start poller for {}: {}", item.slot, e),
            }
        }
        info!("started {} poller(s)", pollers.len());
        Self {
            pollers,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Set the per-poller budget used by [`stop_all`](Self::stop_all).
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Number of pollers that were successfully started.
    pub fn len(&self) -> usize {
        self.pollers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pollers.is_empty()
    }

    pub fn pollers(&self) -> &[PollerHandle] {
        &self.pollers
    }

    /// Stop and join every poller.  Returns how many this call stopped.
    ///
    /// For each poller: take its thread handle while raising its stop flag,
    /// wait (bounded) for it to report exit, join it, then drop its retained
    /// output.  A poller that overruns the budget is logged and joined
    /// anyway.  A second call finds no handles and returns `0`.
    pub fn stop_all(&self) -> usize {
        let mut stopped = 0;
        for poller in &self.pollers {
            let Some(thread) = poller.request_stop() else {
                continue;
            };
            if !poller.wait_stopped(self.shutdown_timeout) {
                warn!(
                    "{} poller still running after {:?}, joining anyway",
                    poller.slot(),
                    self.shutdown_timeout
                );
            }
            if thread.join().is_err() {
                error!("{} poller panicked", poller.slot());
            }
            poller.release();
            stopped += 1;
        }
        if stopped > 0 {
            info!("stopped {} poller(s)", stopped);
        }
        stopped
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.stop_all();
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::DateField;
    use crate::dispatch::Dispatcher;
    use crate::item::{interval_from_millis, ItemId, Slot};
    use crate::testing::{GatedSampler, RecordingSink, ScriptedSampler, UNSPAWNABLE_STACK};
    use std::collections::HashMap;
    use std::time::Instant;

    const PATIENCE: Duration = Duration::from_secs(5);

    fn shell(id: usize, command: &str, interval_ms: u64) -> TrackedItem {
        TrackedItem {
            id: ItemId(id),
            slot: Slot::Bar(id),
            source: ItemSource::from_command(command),
            interval: interval_from_millis(interval_ms),
        }
    }

    fn dynamic<S: Sampler + 'static>(sampler: &Arc<S>) -> Arc<dyn Sampler> {
        sampler.clone()
    }

    /// Build a factory that hands out pre-made samplers by item id.
    fn scripted(
        samplers: Vec<(usize, Arc<dyn Sampler>)>,
    ) -> impl FnMut(&TrackedItem) -> Option<Arc<dyn Sampler>> {
        let mut by_id: HashMap<usize, Arc<dyn Sampler>> = samplers.into_iter().collect();
        move |item: &TrackedItem| by_id.remove(&item.id.0)
    }

    /// Drain until `sink` has seen `n` texts.
    fn pump(d: &mut Dispatcher<RecordingSink>, sink: &RecordingSink, n: usize) {
        let started = Instant::now();
        while sink.texts().len() < n {
            assert!(started.elapsed() < PATIENCE, "only got {:?}", sink.texts());
            d.drain();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn spacers_get_no_poller() {
        let items = vec![
            shell(0, "echo a", 60_000),
            shell(1, "echo b", 60_000),
            shell(2, "<separator>", 0),
            shell(3, "echo d", 60_000),
        ];
        let (tx, _rx) = mpsc::channel();
        let sup = Supervisor::start(&items, tx);
        assert_eq!(sup.len(), 3);
        let ids: Vec<_> = sup.pollers().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![ItemId(0), ItemId(1), ItemId(3)]);
        assert_eq!(sup.stop_all(), 3);
    }

    #[test]
    fn stop_all_is_idempotent() {
        let items = vec![shell(0, "echo a", 60_000), shell(1, "echo b", 60_000)];
        let (tx, _rx) = mpsc::channel();
        let sup = Supervisor::start(&items, tx);
        assert_eq!(sup.stop_all(), 2);
        assert_eq!(sup.stop_all(), 0);
        assert!(sup.pollers().iter().all(|p| !p.is_running()));
        assert!(sup.pollers().iter().all(|p| p.previous_output().is_none()));
    }

    #[test]
    fn stop_all_from_two_threads_joins_each_poller_once() {
        let items: Vec<_> = (0..4).map(|i| shell(i, "echo x", 60_000)).collect();
        let (tx, _rx) = mpsc::channel();
        let sup = Supervisor::start(&items, tx);
        let total = std::thread::scope(|s| {
            let a = s.spawn(|| sup.stop_all());
            let b = s.spawn(|| sup.stop_all());
            a.join().unwrap() + b.join().unwrap()
        });
        assert_eq!(total, 4);
    }

    #[test]
    fn end_to_end_unchanged_tick_is_silent() {
        let items = vec![shell(0, "ignored", 30)];
        let sampler = Arc::new(ScriptedSampler::ok(&["X", "X", "Y"]));
        let (tx, rx) = mpsc::channel();
        let sup = Supervisor::start_with(&items, tx, scripted(vec![(0, dynamic(&sampler))]));

        let mut d = Dispatcher::new(rx);
        let sink = RecordingSink::default();
        d.register(ItemId(0), sink.clone());
        pump(&mut d, &sink, 2);
        assert!(sampler.calls() >= 3);

        sup.stop_all();
        d.drain();
        assert_eq!(sink.texts(), vec!["X", "Y"]);
    }

    #[test]
    fn run_once_item_samples_exactly_once() {
        let items = vec![shell(0, "ignored", 0)];
        let sampler = Arc::new(ScriptedSampler::ok(&["only", "again"]));
        let (tx, rx) = mpsc::channel();
        let sup = Supervisor::start_with(&items, tx, scripted(vec![(0, dynamic(&sampler))]));

        let mut d = Dispatcher::new(rx);
        let sink = RecordingSink::default();
        d.register(ItemId(0), sink.clone());
        pump(&mut d, &sink, 1);
        std::thread::sleep(Duration::from_millis(50));

        assert_eq!(sup.stop_all(), 1);
        d.drain();
        assert_eq!(sink.texts(), vec!["only"]);
        assert_eq!(sampler.calls(), 1);
    }

    #[test]
    fn stop_while_sleeping_does_not_sample_again() {
        let items = vec![shell(0, "ignored", 60_000)];
        let sampler = Arc::new(ScriptedSampler::ok(&["a", "b"]));
        let (tx, rx) = mpsc::channel();
        let sup = Supervisor::start_with(&items, tx, scripted(vec![(0, dynamic(&sampler))]));
        rx.recv_timeout(PATIENCE).unwrap();

        let started = Instant::now();
        assert_eq!(sup.stop_all(), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(sampler.calls(), 1);
    }

    #[test]
    fn stop_during_sample_waits_and_keeps_result() {
        let items = vec![shell(0, "ignored", 10)];
        let (gated, gate) = GatedSampler::new();
        let gated = Arc::new(gated);
        let (tx, rx) = mpsc::channel();
        let sup = Supervisor::start_with(&items, tx, scripted(vec![(0, dynamic(&gated))]));

        gate.wait_entered(1);
        gate.release("first");
        assert_eq!(rx.recv_timeout(PATIENCE).unwrap().text, "first");
        gate.wait_entered(2);

        std::thread::scope(|s| {
            let stopping = s.spawn(|| sup.stop_all());
            std::thread::sleep(Duration::from_millis(50));
            assert!(!stopping.is_finished());
            gate.release("second");
            assert_eq!(stopping.join().unwrap(), 1);
        });

        assert_eq!(rx.recv_timeout(PATIENCE).unwrap().text, "second");
        assert_eq!(gated.calls(), 2);
    }

    #[test]
    fn shutdown_timeout_is_reported_but_join_proceeds() {
        let items = vec![shell(0, "ignored", 10)];
        let (gated, gate) = GatedSampler::new();
        let (tx, _rx) = mpsc::channel();
        let sup = Supervisor::start_with(&items, tx, scripted(vec![(0, dynamic(&Arc::new(gated)))]))
            .with_shutdown_timeout(Duration::from_millis(20));

        gate.wait_entered(1);
        std::thread::scope(|s| {
            let stopping = s.spawn(|| sup.stop_all());
            // Budget expires while the sample is still blocked.
            std::thread::sleep(Duration::from_millis(100));
            assert!(!stopping.is_finished());
            gate.release("late");
            assert_eq!(stopping.join().unwrap(), 1);
        });
    }

    #[test]
    fn items_update_independently_and_in_order() {
        let items = vec![shell(0, "a", 5), shell(1, "b", 7)];
        let a_out: Vec<String> = (0..6).map(|n| format!("a{}", n)).collect();
        let b_out: Vec<String> = (0..6).map(|n| format!("b{}", n)).collect();
        let a = Arc::new(ScriptedSampler::ok(
            &a_out.iter().map(String::as_str).collect::<Vec<_>>(),
        ));
        let b = Arc::new(ScriptedSampler::ok(
            &b_out.iter().map(String::as_str).collect::<Vec<_>>(),
        ));
        let (tx, rx) = mpsc::channel();
        let sup = Supervisor::start_with(
            &items,
            tx,
            scripted(vec![(0, dynamic(&a)), (1, dynamic(&b))]),
        );

        let mut d = Dispatcher::new(rx);
        let sink_a = RecordingSink::default();
        let sink_b = RecordingSink::default();
        d.register(ItemId(0), sink_a.clone());
        d.register(ItemId(1), sink_b.clone());
        pump(&mut d, &sink_a, 6);
        pump(&mut d, &sink_b, 6);
        sup.stop_all();

        assert_eq!(sink_a.texts(), a_out);
        assert_eq!(sink_b.texts(), b_out);
    }

    #[test]
    fn real_shell_commands_reach_their_sinks() {
        let items = vec![
            shell(0, "echo left", 60_000),
            shell(1, "<separator>", 0),
            shell(2, "printf 'right\\n'", 0),
        ];
        let (tx, rx) = mpsc::channel();
        let sup = Supervisor::start(&items, tx);

        let mut d = Dispatcher::new(rx);
        let left = RecordingSink::default();
        let right = RecordingSink::default();
        d.register(ItemId(0), left.clone());
        d.register(ItemId(2), right.clone());
        pump(&mut d, &left, 1);
        pump(&mut d, &right, 1);
        sup.stop_all();

        assert_eq!(left.texts(), vec!["left"]);
        assert_eq!(right.texts(), vec!["right"]);
    }

    #[test]
    fn thread_creation_failure_leaves_other_items_running() {
        let items = vec![
            shell(0, "ignored", 60_000),
            shell(1, "ignored", 60_000),
            shell(2, "ignored", 0),
        ];
        let first = Arc::new(ScriptedSampler::ok(&["zero"]));
        let broken = Arc::new(ScriptedSampler::ok(&["one"]));
        let last = Arc::new(ScriptedSampler::ok(&["two"]));
        let (tx, rx) = mpsc::channel();
        let make = scripted(vec![
            (0, dynamic(&first)),
            (1, dynamic(&broken)),
            (2, dynamic(&last)),
        ]);
        let sup = Supervisor::launch(&items, tx, make, |item: &TrackedItem| {
            let builder = thread::Builder::new();
            if item.id == ItemId(1) {
                builder.stack_size(UNSPAWNABLE_STACK)
            } else {
                builder
            }
        });
        assert_eq!(sup.len(), 2);
        let ids: Vec<_> = sup.pollers().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![ItemId(0), ItemId(2)]);

        let mut d = Dispatcher::new(rx);
        let sinks: Vec<RecordingSink> = (0..3).map(|_| RecordingSink::default()).collect();
        for (i, sink) in sinks.iter().enumerate() {
            d.register(ItemId(i), sink.clone());
        }
        pump(&mut d, &sinks[0], 1);
        pump(&mut d, &sinks[2], 1);

        assert_eq!(sup.stop_all(), 2);
        d.drain();
        assert_eq!(sinks[0].texts(), vec!["zero"]);
        assert!(sinks[1].texts().is_empty());
        assert_eq!(sinks[2].texts(), vec!["two"]);
        assert_eq!(broken.calls(), 0);
    }

    #[test]
    fn date_items_use_the_clock() {
        let item = TrackedItem {
            id: ItemId(0),
            slot: Slot::DayNumber,
            source: ItemSource::Date(DateField::DayNumber),
            interval: None,
        };
        let sampler = sampler_for(&item).unwrap();
        assert_eq!(sampler.sample().unwrap().len(), 2);
        assert!(sampler_for(&shell(1, "<separator>", 0)).is_none());
    }

    #[test]
    fn drop_stops_pollers() {
        let items = vec![shell(0, "ignored", 60_000)];
        let sampler = Arc::new(ScriptedSampler::ok(&["a", "b"]));
        let (tx, rx) = mpsc::channel();
        {
            let _sup =
                Supervisor::start_with(&items, tx, scripted(vec![(0, dynamic(&sampler))]));
            rx.recv_timeout(PATIENCE).unwrap();
        }
        // Every sender went away with the joined poller.
        assert!(matches!(
            rx.recv_timeout(Duration::from_millis(200)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        ));
        assert_eq!(sampler.calls(), 1);
    }
}
