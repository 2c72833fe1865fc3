//! Stylesheet generation.
//!
//! The GTK surface styles its widgets with CSS built from [`Config`].  The
//! generation lives here, away from GTK, so it can be tested headless.
//!
//! # CSS selectors
//!
//! | Selector                 | Targets                                  |
//! |--------------------------|------------------------------------------|
//! | `.transparent-window`    | All three layer windows                  |
//! | `.bar`                   | The bar's inner box                      |
//! | `.bar label`             | Every bar label                          |
//! | `.date-align-container`  | Boxes that align date and weather rows   |
//! | `.day-text`              | Weekday name                             |
//! | `.month-text`            | Month name                               |
//! | `.day-number-text`       | Day of month                             |
//! | `.weather-emoji`         | Weather symbol                           |
//! | `.weather-temp`          | Temperature                              |
//!
//! A user `style.css` is loaded after the generated sheet and can override
//! any of these.

use crate::config::{BarConfig, Config, DateConfig, TextStyle, WeatherConfig};
use std::fmt::Write;

/// An opaque sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A colour string that is not `#RRGGBB`.
#[derive(Debug, thiserror::Error)]
#[error("expected #RRGGBB, got {0:?}")]
pub struct ColorError(String);

impl Rgb {
    /// Parse `#RRGGBB` (hex digits in either case).
    pub fn parse(s: &str) -> Result<Self, ColorError> {
        let err = || ColorError(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(err)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// CSS `rgba(...)` with the given alpha.
    pub fn rgba(&self, alpha: f64) -> String {
        format!("rgba({}, {}, {}, {:.2})", self.r, self.g, self.b, alpha)
    }
}

/// CSS for the status bar.
pub fn bar_css(bar: &BarConfig) -> Result<String, ColorError> {
    let background = Rgb::parse(&bar.background_color)?;
    let border = Rgb::parse(&bar.border_color)?;
    Ok(format!(
        ".transparent-window {{ background-color: transparent; }}\n\
         .bar {{\n  \
           background-color: {bg};\n  \
           border: {bw:.2}px solid {bc};\n  \
           border-radius: {radius}px;\n  \
           padding: 0 10px;\n  \
           min-height: {h}px;\n  \
           max-height: {h}px;\n  \
           height: {h}px;\n  \
           overflow: hidden;\n  \
           font-family: \"{font}\";\n  \
           font-size: {size}pt;\n\
         }}\n\
         .bar label {{\n  \
           font-family: \"{font}\";\n  \
           font-size: {size}pt;\n  \
           margin-top: 0;\n  \
           margin-bottom: 0;\n\
         }}\n",
        bg = background.rgba(bar.background_opacity),
        bw = bar.border_width,
        bc = border.rgba(bar.background_opacity),
        radius = bar.border_radius,
        h = bar.height,
        font = bar.font,
        size = bar.text_size,
    ))
}

fn text_rule(out: &mut String, class: &str, style: &TextStyle) {
    let m = &style.margin;
    // Writing into a String cannot fail.
    let _ = write!(
        out,
        ".{class} {{\n  \
           font-family: \"{font}\";\n  \
           font-size: {size}pt;\n  \
           color: rgba(255, 255, 255, 1.0);\n  \
           background-color: transparent;\n  \
           letter-spacing: {ls}px;\n  \
           margin: {t}px {r}px {b}px {l}px;\n\
         }}\n",
        font = style.font,
        size = style.size,
        ls = style.letter_spacing,
        t = m.top,
        r = m.right,
        b = m.bottom,
        l = m.left,
    );
}

/// CSS for the date and weather overlay.
pub fn overlay_css(date: &DateConfig, weather: &WeatherConfig) -> String {
    let mut out = String::from(
        ".transparent-day-window { background-color: transparent; }\n\
         .date-align-container { min-width: 800px; }\n",
    );
    text_rule(&mut out, "day-text", &date.day);
    text_rule(&mut out, "month-text", &date.month);
    text_rule(&mut out, "day-number-text", &date.day_number);
    text_rule(&mut out, "weather-emoji", &weather.emoji);
    text_rule(&mut out, "weather-temp", &weather.temp);
    out
}

/// The complete generated stylesheet.
pub fn stylesheet(config: &Config) -> Result<String, ColorError> {
    let mut css = bar_css(&config.bar)?;
    css.push_str(&overlay_css(&config.date, &config.weather));
    Ok(css)
}
