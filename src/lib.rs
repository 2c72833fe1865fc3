//! **backdrop**: a layer-shell desktop decoration.
//!
//! Three layer-shell surfaces make up the decoration: a background (with an
//! optional image), a date/weather overlay just above it, and a status bar
//! whose labels show the output of shell commands.
//!
//! # Architecture
//!
//! Every label is a [`item::TrackedItem`].  The [`lifecycle::Supervisor`]
//! starts one [`poller::Poller`] thread per item; each poller samples its
//! item on an interval and, when the text changes, sends an
//! [`item::UpdateEvent`] over a channel.  The [`dispatch::Dispatcher`] owns
//! the receiving end on the UI thread and applies updates to the sinks, so
//! UI state is only ever touched from one thread.
//!
//! The engine is coupled to the outside world through two traits:
//!
//! * [`traits::Sampler`]: what a poller runs (a shell command, the clock).
//! * [`traits::LabelSink`]: where the dispatcher puts the text (a GTK
//!   label, stdout).
//!
//! Concrete surfaces live in [`surface`].

pub mod change;
pub mod config;
pub mod date;
pub mod dispatch;
pub mod exec;
pub mod item;
pub mod layout;
pub mod lifecycle;
pub mod poller;
pub mod shutdown;
pub mod style;
pub mod surface;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;
