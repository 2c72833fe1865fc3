//! Presentation surfaces that own the sinks and run the dispatcher.
//!
//! When the `surface-gtk` feature is enabled, [`gtk::run`] takes over the
//! main thread and drives the dispatcher from the GLib main loop.
//! [`console::run`] is always available and prints updates instead.

pub mod console;

#[cfg(feature = "surface-gtk")]
pub mod gtk;
