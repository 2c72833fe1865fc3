//! Entry point for **backdrop**.
//!
//! Loads the configuration, turns it into the item list and hands both to a
//! surface.  With the `surface-gtk` feature the main thread runs the GLib
//! main loop; with `--headless` (or without the feature) updates are
//! printed to stdout instead.

use backdrop::config::Config;
use backdrop::layout::Layout;
use backdrop::shutdown::ShutdownSignal;
use backdrop::surface::console;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

/// Desktop background, date/weather overlay and status bar.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the JSON config file [default: $XDG_CONFIG_HOME/backdrop/config.json].
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a background image (overrides the config file).
    #[arg(short, long, value_name = "PATH")]
    background_image: Option<PathBuf>,

    /// Print updates to stdout instead of opening layer-shell windows.
    #[arg(long)]
    headless: bool,
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/backdrop`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("backdrop")
}

/// Load the config from `path` (or the default location), falling back to
/// compiled-in defaults.
fn load_config(path: Option<PathBuf>) -> Config {
    let explicit = path.is_some();
    let path = path.unwrap_or_else(|| config_dir().join("config.json"));
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) if explicit => {
            warn!("{}, using defaults", e);
            Config::default()
        }
        Err(e) => {
            info!("no usable config file ({}), using defaults", e);
            Config::default()
        }
    }
}

/// Resolve the user stylesheet path.
#[cfg(feature = "surface-gtk")]
fn css_path() -> PathBuf {
    config_dir().join("style.css")
}

//  Main

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut config = load_config(args.config);
    if let Some(image) = args.background_image {
        config.background_image = Some(image);
    }
    let layout = Layout::from_config(&config);

    let shutdown = match ShutdownSignal::install() {
        Ok(signal) => signal,
        Err(e) => {
            warn!("cannot install signal handler: {}", e);
            ShutdownSignal::new()
        }
    };

    if args.headless || !cfg!(feature = "surface-gtk") {
        console::run(&config, &layout, &shutdown);
        return;
    }

    #[cfg(feature = "surface-gtk")]
    if let Err(e) = backdrop::surface::gtk::run(&config, &layout, Some(css_path()), shutdown) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
