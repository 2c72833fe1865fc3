//! Headless surface: every update becomes a line on stdout.
//!
//! Useful without a compositor, or to check a configuration's commands.

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::item::Slot;
use crate::layout::Layout;
use crate::lifecycle::Supervisor;
use crate::shutdown::ShutdownSignal;
use crate::traits::LabelSink;
use log::info;
use std::io::Write;
use std::sync::mpsc;

/// A sink that prints `<slot>: <text>` per update.
pub struct LinePrinter<W: Write> {
    slot: Slot,
    out: W,
}

impl LinePrinter<std::io::Stdout> {
    pub fn stdout(slot: Slot) -> Self {
        Self::new(slot, std::io::stdout())
    }
}

impl<W: Write> LinePrinter<W> {
    pub fn new(slot: Slot, out: W) -> Self {
        Self { slot, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> LabelSink for LinePrinter<W> {
    fn apply(&mut self, text: &str) {
        // A closed stdout is not worth stopping for.
        let _ = writeln!(self.out, "{}: {}", self.slot, text).and_then(|_| self.out.flush());
    }
}

/// Run every poller and print updates until `shutdown` is raised or every
/// poller has finished.
pub fn run(config: &Config, layout: &Layout, shutdown: &ShutdownSignal) {
    let (tx, rx) = mpsc::channel();
    let mut dispatcher = Dispatcher::new(rx);
    for item in layout.items().iter().filter(|i| !i.is_spacer()) {
        dispatcher.register(item.id, LinePrinter::stdout(item.slot));
    }

    let supervisor =
        Supervisor::start(layout.items(), tx).with_shutdown_timeout(config.shutdown_timeout());
    info!("headless: printing updates to stdout");

    dispatcher.run_until(shutdown);
    supervisor.stop_all();
}
