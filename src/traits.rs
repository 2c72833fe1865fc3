//! Core traits that decouple the polling engine from what it runs and from
//! where the results are shown.
//!
//! Every concrete backend (a shell command, the local clock, a GTK label,
//! stdout, a test harness, …) implements one of these traits.  The
//! [`Poller`](crate::poller::Poller) and
//! [`Dispatcher`](crate::dispatch::Dispatcher) only depend on these
//! abstractions.

use crate::exec::SampleError;

/// Something a poller can ask for the current text of its item.
///
/// An implementation might run a shell command, format the local date, or
/// replay a scripted sequence in tests.
///
/// # Contract
///
/// * [`sample`](Sampler::sample) may **block** for as long as it needs; the
///   poller calling it is the only thread that waits.
/// * An `Err` means "nothing to show this cycle".  The poller keeps the
///   previous value and tries again on its next tick.
/// * Implementations must be [`Send`] + [`Sync`] so they can be shared with
///   a poller thread.
pub trait Sampler: Send + Sync {
    /// Produce the item's current text.
    fn sample(&self) -> Result<String, SampleError>;
}

/// A UI element that can display a text value.
///
/// Sinks live on the UI thread and are only touched by the
/// [`Dispatcher`](crate::dispatch::Dispatcher).  They need not be `Send`;
/// a GTK label is not.
pub trait LabelSink {
    /// Replace the displayed text.
    fn apply(&mut self, text: &str);
}
