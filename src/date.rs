//! Date fields shown on the overlay.
//!
//! Each field is an ordinary tracked item whose [`Sampler`] reads the local
//! clock instead of running a command, so the overlay refreshes through the
//! same poller machinery as the bar.
//!
//! Names are always English: chrono's `%A`/`%B` ignore `LANG` and
//! `LC_TIME`.  A bar item running `date +%A` follows the locale.

use crate::exec::SampleError;
use crate::traits::Sampler;
use chrono::{Datelike, Local, NaiveDate};

/// One piece of the date overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateField {
    /// Full weekday name, upper-cased (`MONDAY`).
    DayName,
    /// Full month name, upper-cased (`OCTOBER`).
    MonthName,
    /// Zero-padded day of month (`07`).
    DayNumber,
}

impl DateField {
    /// Render this field for `date`.
    pub fn render(self, date: NaiveDate) -> String {
        match self {
            DateField::DayName => date.format("%A").to_string().to_ascii_uppercase(),
            DateField::MonthName => date.format("%B").to_string().to_ascii_uppercase(),
            DateField::DayNumber => format!("{:02}", date.day()),
        }
    }
}

impl Sampler for DateField {
    fn sample(&self) -> Result<String, SampleError> {
        Ok(self.render(Local::now().date_naive()))
    }
}
