//! Items and events used throughout backdrop.
//!
//! This module defines the vocabulary that all components share:
//! [`TrackedItem`] describes one thing the decoration displays,
//! [`ItemId`] / [`Slot`] identify it, and [`UpdateEvent`] carries a new
//! text value from a poller to the UI thread.

use crate::date::DateField;
use std::fmt;
use std::time::Duration;

/// Command string that marks a bar entry as an expanding spacer.
pub const SPACER_COMMAND: &str = "<separator>";

/// Stable identity of a tracked item.
///
/// Assigned densely by [`Layout`](crate::layout::Layout) at startup and
/// never changed afterwards.  The dispatcher uses it as the sink key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub usize);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an item is shown by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Day,
    Month,
    DayNumber,
    WeatherEmoji,
    WeatherTemp,
    /// Position in the status bar, counting spacers.
    Bar(usize),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Day => write!(f, "day"),
            Slot::Month => write!(f, "month"),
            Slot::DayNumber => write!(f, "day-number"),
            Slot::WeatherEmoji => write!(f, "weather-emoji"),
            Slot::WeatherTemp => write!(f, "weather-temp"),
            Slot::Bar(i) => write!(f, "bar[{}]", i),
        }
    }
}

/// What produces an item's text.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemSource {
    /// Layout marker only.  Never polled, never has a sink.
    Spacer,
    /// Shell command run through `sh -c`.
    Shell(String),
    /// A field of the local date.
    Date(DateField),
}

impl ItemSource {
    /// Interpret a configured bar command, mapping the spacer sentinel.
    pub fn from_command(command: &str) -> Self {
        if command == SPACER_COMMAND {
            ItemSource::Spacer
        } else {
            ItemSource::Shell(command.to_string())
        }
    }
}

/// One entry of the fixed item list.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedItem {
    pub id: ItemId,
    pub slot: Slot,
    pub source: ItemSource,
    /// Poll period.  `None` means sample once at startup and never again.
    pub interval: Option<Duration>,
}

impl TrackedItem {
    /// Whether the item takes part in polling and dispatch at all.
    pub fn is_spacer(&self) -> bool {
        matches!(self.source, ItemSource::Spacer)
    }
}

/// Convert a configured millisecond interval, where `0` means "run once".
pub fn interval_from_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// A new text value for one item, travelling from its poller to the
/// dispatcher.
///
/// The text is owned and moved through the channel, so the poller never
/// shares a buffer with the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEvent {
    pub target: ItemId,
    pub text: String,
}
