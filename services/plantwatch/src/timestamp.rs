//! Format-tagged timestamp parsing
//!
//! The weather API and the sensor feed report local wall-clock time in
//! different layouts. Every layout the service understands is a
//! [`TimestampFormat`] variant, and [`parse`] never panics on bad input.

use std::fmt;

use chrono::NaiveDateTime;

/// Known timestamp layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `2025-05-13 14:30`, used by `current.last_updated` and hourly entries
    WeatherApi,
    /// `13-05-25 14:30:05`, written by the sensor board
    Device,
    /// `2025-05-13T14:30:05`
    Iso8601,
}

impl TimestampFormat {
    /// chrono format string for this layout
    pub fn pattern(self) -> &'static str {
        match self {
            TimestampFormat::WeatherApi => "%Y-%m-%d %H:%M",
            TimestampFormat::Device => "%d-%m-%y %H:%M:%S",
            TimestampFormat::Iso8601 => "%Y-%m-%dT%H:%M:%S",
        }
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampFormat::WeatherApi => write!(f, "weather API"),
            TimestampFormat::Device => write!(f, "device"),
            TimestampFormat::Iso8601 => write!(f, "ISO 8601"),
        }
    }
}

/// Timestamp parsing failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    #[error("empty {format} timestamp")]
    Empty { format: TimestampFormat },

    #[error("'{input}' is not a {format} timestamp (expected {})", .format.pattern())]
    Malformed {
        input: String,
        format: TimestampFormat,
    },
}

/// Parse `input` using the layout named by `format`
pub fn parse(input: &str, format: TimestampFormat) -> Result<NaiveDateTime, TimestampError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::Empty { format });
    }

    NaiveDateTime::parse_from_str(trimmed, format.pattern()).map_err(|_| {
        TimestampError::Malformed {
            input: trimmed.to_string(),
            format,
        }
    })
}

/// Render `timestamp` in the layout named by `format`
pub fn format(timestamp: &NaiveDateTime, format: TimestampFormat) -> String {
    timestamp.format(format.pattern()).to_string()
}
