//! GTK4 + layer-shell surface that runs on the **main thread**.
//!
//! # Windows
//!
//! ```text
//! background   (Background layer, all edges, exclusive zone -2)
//! └ GtkPicture              (optional, stretched)
//! day-text     (Background layer, all edges, exclusive zone -1)
//! └ vbox
//!     ├ .date-align-container
//!     │   ├ [.month-text] [.day-number-text]
//!     │   └ .day-text
//!     └ .date-align-container
//!         └ <spacer> [.weather-emoji] [.weather-temp]
//! bar          (Top layer, top/left/right, exclusive zone = height + padding)
//! └ .bar
//!     └ label | spacer | label …
//! ```
//!
//! Every label is registered with the [`Dispatcher`] under its item id.
//! The dispatcher is drained from a GLib timeout, so labels are only ever
//! touched on this thread.

use crate::config::{BarConfig, Config};
use crate::dispatch::Dispatcher;
use crate::item::{ItemId, Slot, UpdateEvent};
use crate::layout::Layout;
use crate::lifecycle::Supervisor;
use crate::shutdown::ShutdownSignal;
use crate::style::{self, ColorError};
use crate::traits::LabelSink;
use gtk4::prelude::*;
use gtk4::{gdk, glib};
use gtk4_layer_shell::{Edge, KeyboardMode, Layer, LayerShell};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

/// How often queued updates are applied.
const DRAIN_INTERVAL: Duration = Duration::from_millis(16);

/// Errors that prevent the GTK surface from starting.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("failed to initialise GTK4: {0}")]
    Init(#[from] glib::BoolError),
    #[error("stylesheet: {0}")]
    Style(#[from] ColorError),
}

impl LabelSink for gtk4::Label {
    fn apply(&mut self, text: &str) {
        gtk4::Label::set_text(self, text);
    }
}

/// Labels created for tracked items, keyed by item id.
type Sinks = Vec<(ItemId, gtk4::Label)>;

//  Public API

/// Build the three layer windows, start the pollers and run the GLib main
/// loop on the **current** (main) thread until `shutdown` is raised.
pub fn run(
    config: &Config,
    layout: &Layout,
    css_path: Option<PathBuf>,
    shutdown: ShutdownSignal,
) -> Result<(), SurfaceError> {
    gtk4::init()?;
    info!("GTK4 initialised on main thread");

    load_css(&style::stylesheet(config)?, css_path.as_deref());

    let background = background_window(config.background_image.as_deref());
    background.present();

    let mut sinks = Sinks::new();
    let overlay = overlay_window(layout, &mut sinks);
    overlay.present();

    let bar = bar_window(&config.bar, layout, &mut sinks);
    bar.present();
    info!("layer windows mapped ({} labels)", sinks.len());

    //  Dispatcher + pollers
    let (tx, rx) = mpsc::channel::<UpdateEvent>();
    let mut dispatcher = Dispatcher::new(rx);
    for (id, label) in sinks {
        dispatcher.register(id, label);
    }
    let supervisor =
        Supervisor::start(layout.items(), tx).with_shutdown_timeout(config.shutdown_timeout());

    let main_loop = glib::MainLoop::new(None, false);
    let quit = main_loop.clone();
    glib::timeout_add_local(DRAIN_INTERVAL, move || {
        let status = dispatcher.drain();
        if status.applied > 0 {
            debug!("applied {} update(s)", status.applied);
        }
        if shutdown.is_requested() {
            info!("shutdown requested, leaving main loop");
            quit.quit();
            return glib::ControlFlow::Break;
        }
        glib::ControlFlow::Continue
    });

    info!("entering GLib main loop");
    main_loop.run();
    info!("GLib main loop exited");

    supervisor.stop_all();
    Ok(())
}

//  Windows

/// A keyboard-less, transparent layer-shell window.
fn layer_window(namespace: &str, layer: Layer, anchors: &[Edge]) -> gtk4::Window {
    let window = gtk4::Window::new();
    window.init_layer_shell();
    window.set_namespace(namespace);
    window.set_layer(layer);
    window.set_keyboard_mode(KeyboardMode::None);
    for edge in anchors {
        window.set_anchor(*edge, true);
        window.set_margin(*edge, 0);
    }
    window.set_decorated(false);
    window.remove_css_class("background");
    window.add_css_class("transparent-window");
    window
}

const ALL_EDGES: [Edge; 4] = [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right];

fn background_window(image: Option<&Path>) -> gtk4::Window {
    let window = layer_window("background", Layer::Background, &ALL_EDGES);
    // Cover the whole output, ignoring other surfaces' exclusive zones.
    window.set_exclusive_zone(-2);

    match image {
        Some(path) if path.exists() => {
            let picture = gtk4::Picture::for_filename(path);
            picture.set_content_fit(gtk4::ContentFit::Fill);
            window.set_child(Some(&picture));
            info!("background image: {}", path.display());
        }
        Some(path) => warn!("background image not found: {}", path.display()),
        None => debug!("no background image"),
    }
    window
}

/// Create a label for `slot` and register it if the layout tracks that slot.
fn slot_label(layout: &Layout, slot: Slot, class: &str, sinks: &mut Sinks) -> gtk4::Label {
    let label = gtk4::Label::new(Some(""));
    label.set_halign(gtk4::Align::Start);
    label.add_css_class(class);
    if let Some(item) = layout.find(slot) {
        sinks.push((item.id, label.clone()));
    }
    label
}

fn overlay_window(layout: &Layout, sinks: &mut Sinks) -> gtk4::Window {
    let window = layer_window("day-text", Layer::Background, &ALL_EDGES);
    window.set_exclusive_zone(-1);
    window.add_css_class("transparent-day-window");

    let vbox = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    vbox.set_halign(gtk4::Align::Center);
    vbox.set_valign(gtk4::Align::Center);

    //  Date rows: both left-aligned inside a centred container
    let align = gtk4::Box::new(gtk4::Orientation::Vertical, 0);
    align.set_halign(gtk4::Align::Center);
    align.set_valign(gtk4::Align::Center);
    align.set_hexpand(false);
    align.add_css_class("date-align-container");

    let month_day = gtk4::Box::new(gtk4::Orientation::Horizontal, 10);
    month_day.set_halign(gtk4::Align::Start);
    month_day.set_hexpand(false);
    month_day.append(&slot_label(layout, Slot::Month, "month-text", sinks));
    month_day.append(&slot_label(layout, Slot::DayNumber, "day-number-text", sinks));

    let day = slot_label(layout, Slot::Day, "day-text", sinks);
    day.set_xalign(0.5);
    day.set_halign(gtk4::Align::Fill);
    day.set_hexpand(true);

    align.append(&month_day);
    align.append(&day);
    vbox.append(&align);

    //  Weather row, pushed to the right edge of the date block
    let weather_container = gtk4::Box::new(gtk4::Orientation::Horizontal, 0);
    weather_container.set_halign(gtk4::Align::Center);
    weather_container.set_hexpand(false);
    weather_container.add_css_class("date-align-container");

    let weather = gtk4::Box::new(gtk4::Orientation::Horizontal, 10);
    weather.set_halign(gtk4::Align::Fill);
    weather.set_hexpand(true);
    weather.append(&spacer());
    weather.append(&slot_label(layout, Slot::WeatherEmoji, "weather-emoji", sinks));
    weather.append(&slot_label(layout, Slot::WeatherTemp, "weather-temp", sinks));

    weather_container.append(&weather);
    vbox.append(&weather_container);

    window.set_child(Some(&vbox));
    window
}

fn spacer() -> gtk4::Box {
    let spacer = gtk4::Box::new(gtk4::Orientation::Horizontal, 0);
    spacer.set_hexpand(true);
    spacer.set_halign(gtk4::Align::Fill);
    spacer
}

fn bar_window(bar: &BarConfig, layout: &Layout, sinks: &mut Sinks) -> gtk4::Window {
    let window = layer_window("bar", Layer::Top, &[Edge::Top, Edge::Left, Edge::Right]);
    window.set_margin(Edge::Top, bar.padding_top);
    window.set_margin(Edge::Left, bar.padding_horizontal);
    window.set_margin(Edge::Right, bar.padding_horizontal);
    window.set_exclusive_zone(bar.exclusive_zone());

    let outer = gtk4::Box::new(gtk4::Orientation::Horizontal, 0);
    outer.set_hexpand(true);
    outer.set_halign(gtk4::Align::Fill);

    let inner = gtk4::Box::new(gtk4::Orientation::Horizontal, 10);
    inner.set_size_request(-1, bar.height);
    inner.set_vexpand(false);
    inner.set_hexpand(true);
    inner.set_halign(gtk4::Align::Fill);
    inner.set_valign(gtk4::Align::Center);
    inner.add_css_class("bar");
    inner.set_overflow(gtk4::Overflow::Hidden);

    for item in layout.bar() {
        if item.is_spacer() {
            inner.append(&spacer());
        } else {
            let label = gtk4::Label::new(Some(""));
            label.set_halign(gtk4::Align::Start);
            // Multi-line output must not grow the bar past its exclusive zone.
            label.set_single_line_mode(true);
            inner.append(&label);
            sinks.push((item.id, label));
        }
    }

    outer.append(&inner);
    window.set_child(Some(&outer));
    window
}

//  CSS loading

/// Install the generated stylesheet, then the user's `style.css` (if any)
/// at a higher priority so it can override it.
fn load_css(generated: &str, user_css: Option<&Path>) {
    let Some(display) = gdk::Display::default() else {
        warn!("no GDK display, CSS will not be applied");
        return;
    };

    let provider = gtk4::CssProvider::new();
    #[allow(deprecated)]
    provider.load_from_data(generated);
    gtk4::style_context_add_provider_for_display(
        &display,
        &provider,
        gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
    info!("generated CSS registered ({} bytes)", generated.len());

    let Some(path) = user_css.filter(|p| p.exists()) else {
        info!("no user CSS");
        return;
    };
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let user = gtk4::CssProvider::new();
            #[allow(deprecated)]
            user.load_from_data(&content);
            gtk4::style_context_add_provider_for_display(
                &display,
                &user,
                gtk4::STYLE_PROVIDER_PRIORITY_USER,
            );
            info!("user CSS: {} ({} bytes)", path.display(), content.len());
        }
        Err(e) => warn!("CSS read failed ({}): {}, using generated only", path.display(), e),
    }
}
