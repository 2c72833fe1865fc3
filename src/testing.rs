//! Test doubles shared by the poller, lifecycle and dispatch tests.

use crate::exec::SampleError;
use crate::traits::{LabelSink, Sampler};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Mutex;
use std::time::Duration;

/// Replays a fixed sequence of results, then reports `Empty` forever.
pub struct ScriptedSampler {
    outputs: Mutex<VecDeque<Option<String>>>,
    calls: AtomicUsize,
}

impl ScriptedSampler {
    /// `None` entries stand for a failed sample.
    pub fn new(outputs: &[Option<&str>]) -> Self {
        Self {
            outputs: Mutex::new(outputs.iter().map(|o| o.map(str::to_string)).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn ok(outputs: &[&str]) -> Self {
        Self::new(&outputs.iter().map(|o| Some(*o)).collect::<Vec<_>>())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Sampler for ScriptedSampler {
    fn sample(&self) -> Result<String, SampleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outputs.lock().unwrap().pop_front() {
            Some(Some(text)) => Ok(text),
            Some(None) | None => Err(SampleError::Empty),
        }
    }
}

/// Blocks inside every sample until the test releases it with a value.
pub struct GatedSampler {
    entered: Mutex<mpsc::Sender<usize>>,
    release: Mutex<mpsc::Receiver<String>>,
    calls: AtomicUsize,
}

/// Test-side controls of a [`GatedSampler`].
pub struct Gate {
    pub entered: mpsc::Receiver<usize>,
    pub release: mpsc::Sender<String>,
}

impl Gate {
    /// Wait until the sampler is blocked in call number `n` (1-based).
    pub fn wait_entered(&self, n: usize) {
        let got = self
            .entered
            .recv_timeout(Duration::from_secs(5))
            .expect("sampler was not entered");
        assert_eq!(got, n);
    }

    pub fn release(&self, text: &str) {
        self.release.send(text.to_string()).unwrap();
    }
}

impl GatedSampler {
    pub fn new() -> (Self, Gate) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let sampler = Self {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
            calls: AtomicUsize::new(0),
        };
        let gate = Gate {
            entered: entered_rx,
            release: release_tx,
        };
        (sampler, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Sampler for GatedSampler {
    fn sample(&self) -> Result<String, SampleError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.entered.lock().unwrap().send(n);
        self.release
            .lock()
            .unwrap()
            .recv()
            .map_err(|_| SampleError::Empty)
    }
}

/// A stack size no thread can be created with.
pub const UNSPAWNABLE_STACK: usize = 1 << (usize::BITS - 2);

/// Panics on every sample.
pub struct PanickingSampler;

impl Sampler for PanickingSampler {
    fn sample(&self) -> Result<String, SampleError> {
        panic!("sampler failure");
    }
}

/// A sink whose history can be inspected after it has been handed over.
#[derive(Clone, Default)]
pub struct RecordingSink {
    log: Rc<RefCell<Vec<String>>>,
}

impl RecordingSink {
    pub fn texts(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl LabelSink for RecordingSink {
    fn apply(&mut self, text: &str) {
        self.log.borrow_mut().push(text.to_string());
    }
}
