//! Turning the configuration into the fixed list of tracked items.
//!
//! Ids are assigned densely in display order: the three date fields, the
//! two weather fields, then every bar entry including spacers.

use crate::config::Config;
use crate::date::DateField;
use crate::item::{interval_from_millis, ItemId, ItemSource, Slot, TrackedItem};

/// The complete item list, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    items: Vec<TrackedItem>,
}

impl Layout {
    pub fn from_config(config: &Config) -> Self {
        let date_interval = interval_from_millis(config.date.interval_ms);
        let weather_interval = interval_from_millis(config.weather.interval_ms);

        let mut entries = vec![
            (Slot::Month, ItemSource::Date(DateField::MonthName), date_interval),
            (Slot::DayNumber, ItemSource::Date(DateField::DayNumber), date_interval),
            (Slot::Day, ItemSource::Date(DateField::DayName), date_interval),
            (
                Slot::WeatherEmoji,
                ItemSource::Shell(config.weather.emoji_command.clone()),
                weather_interval,
            ),
            (
                Slot::WeatherTemp,
                ItemSource::Shell(config.weather.temp_command.clone()),
                weather_interval,
            ),
        ];
        entries.extend(config.bar.items.iter().enumerate().map(|(i, item)| {
            (
                Slot::Bar(i),
                ItemSource::from_command(&item.command),
                interval_from_millis(item.interval_ms),
            )
        }));

        let items = entries
            .into_iter()
            .enumerate()
            .map(|(id, (slot, source, interval))| TrackedItem {
                id: ItemId(id),
                slot,
                source,
                interval,
            })
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[TrackedItem] {
        &self.items
    }

    /// The item shown in `slot`, if any.
    pub fn find(&self, slot: Slot) -> Option<&TrackedItem> {
        self.items.iter().find(|item| item.slot == slot)
    }

    /// Bar entries in display order, spacers included.
    pub fn bar(&self) -> impl Iterator<Item = &TrackedItem> {
        self.items
            .iter()
            .filter(|item| matches!(item.slot, Slot::Bar(_)))
    }
}
