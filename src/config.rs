//! Application configuration.
//!
//! The configuration is loaded from a JSON file, by default
//! `$XDG_CONFIG_HOME/backdrop/config.json`.  Every section is optional and
//! falls back to compiled-in defaults, so an empty `{}` file reproduces the
//! stock decoration.
//!
//! # Example
//!
//! ```json
//! {
//!   "background_image": "/home/me/wall.png",
//!   "bar": {
//!     "height": 30,
//!     "items": [
//!       { "command": "mango-tags", "interval_ms": 300 },
//!       { "command": "<separator>" },
//!       { "command": "date +%H:%M", "interval_ms": 1000 }
//!     ]
//!   },
//!   "weather": { "interval_ms": 600000 }
//! }
//! ```

use crate::item::SPACER_COMMAND;
use crate::style::Rgb;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Image stretched over the background layer.  `None` leaves it
    /// transparent.
    pub background_image: Option<PathBuf>,
    /// Per-poller budget for a clean shutdown (ms).
    pub shutdown_timeout_ms: u64,
    /// Status bar appearance and items.
    pub bar: BarConfig,
    /// Date overlay styles and refresh period.
    pub date: DateConfig,
    /// Weather commands, styles and refresh period.
    pub weather: WeatherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            background_image: None,
            shutdown_timeout_ms: 5000,
            bar: BarConfig::default(),
            date: DateConfig::default(),
            weather: WeatherConfig::default(),
        }
    }
}

/// One bar entry: a shell command and how often to rerun it.
///
/// The command `"<separator>"` is an expanding spacer and is never run.
/// An `interval_ms` of `0` (the default) runs the command once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemConfig {
    pub command: String,
    #[serde(default)]
    pub interval_ms: u64,
}

impl ItemConfig {
    pub fn new(command: &str, interval_ms: u64) -> Self {
        Self {
            command: command.to_string(),
            interval_ms,
        }
    }

    pub fn spacer() -> Self {
        Self::new(SPACER_COMMAND, 0)
    }
}

/// Status bar settings.  Sizes are in pixels, `text_size` in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarConfig {
    pub height: i32,
    pub padding_horizontal: i32,
    pub padding_top: i32,
    pub padding_bottom: i32,
    pub border_radius: i32,
    pub border_width: f64,
    /// `#RRGGBB`.
    pub background_color: String,
    /// `#RRGGBB`.
    pub border_color: String,
    /// Applied to both the background and the border colour.
    pub background_opacity: f64,
    pub font: String,
    pub text_size: u32,
    pub items: Vec<ItemConfig>,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            height: 30,
            padding_horizontal: 0,
            padding_top: 0,
            padding_bottom: 0,
            border_radius: 0,
            border_width: 0.0,
            background_color: "#1D2021".into(),
            border_color: "#EBDBB2".into(),
            background_opacity: 1.0,
            font: "CodeNewRoman Nerd Font".into(),
            text_size: 11,
            items: vec![
                ItemConfig::new("mango-tags", 300),
                ItemConfig::new("mango-window-title", 300),
                ItemConfig::spacer(),
                ItemConfig::new("status", 500),
            ],
        }
    }
}

impl BarConfig {
    /// Space the bar reserves at the top of the output.
    pub fn exclusive_zone(&self) -> i32 {
        self.height + self.padding_top + self.padding_bottom
    }
}

/// CSS margins in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

/// Font and spacing of one overlay label.
///
/// A style given in the config file replaces the built-in one as a whole;
/// fields it omits take the generic defaults below, not the built-in
/// style's values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font: String,
    /// Points.
    pub size: u32,
    /// Pixels.
    pub letter_spacing: i32,
    pub margin: Margins,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: "sans-serif".into(),
            size: 12,
            letter_spacing: 0,
            margin: Margins::default(),
        }
    }
}

impl TextStyle {
    fn new(font: &str, size: u32, letter_spacing: i32, margin: Margins) -> Self {
        Self {
            font: font.into(),
            size,
            letter_spacing,
            margin,
        }
    }
}

/// Date overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    /// How often the date labels are refreshed (ms).  `0` renders once.
    pub interval_ms: u64,
    pub day: TextStyle,
    pub month: TextStyle,
    pub day_number: TextStyle,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            interval_ms: 60_000,
            day: TextStyle::new(
                "Anurati",
                90,
                5,
                Margins {
                    top: 20,
                    ..Margins::default()
                },
            ),
            month: TextStyle::new("Anurati", 30, 5, Margins::default()),
            day_number: TextStyle::new(
                "Computerfont",
                36,
                5,
                Margins {
                    top: -10,
                    left: 10,
                    ..Margins::default()
                },
            ),
        }
    }
}

/// Weather overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// How often both weather commands are rerun (ms).  `0` runs them once.
    pub interval_ms: u64,
    pub emoji_command: String,
    pub temp_command: String,
    pub emoji: TextStyle,
    pub temp: TextStyle,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        let margin = Margins {
            top: 10,
            left: 5,
            ..Margins::default()
        };
        Self {
            interval_ms: 300_000,
            emoji_command: "curl -s wttr.in/ballia?format=3 | awk '{print $2}'".into(),
            temp_command: "curl -s wttr.in/ballia?format=3 | awk '{print $3}' | cut -d \"+\" -f2"
                .into(),
            emoji: TextStyle::new("Apple Color Emoji", 30, 0, margin),
            temp: TextStyle::new("Computerfont", 36, 5, margin),
        }
    }
}

impl Config {
    /// Load and validate configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the surfaces cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Rgb::parse(&self.bar.background_color)
            .map_err(|e| ConfigError(format!("bar.background_color: {}", e)))?;
        Rgb::parse(&self.bar.border_color)
            .map_err(|e| ConfigError(format!("bar.border_color: {}", e)))?;
        if !(0.0..=1.0).contains(&self.bar.background_opacity) {
            return Err(ConfigError(format!(
                "bar.background_opacity must be within 0..=1, got {}",
                self.bar.background_opacity
            )));
        }
        if let Some(i) = self
            .bar
            .items
            .iter()
            .position(|item| item.command.trim().is_empty())
        {
            return Err(ConfigError(format!("bar.items[{}]: empty command", i)));
        }
        Ok(())
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// Error from loading, parsing or validating a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(pub String);
