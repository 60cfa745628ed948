//! Timestamp formatting utilities
//!
//! Renders the `asctime` field of a record. The default mirrors the classic
//! `2025-01-08 10:30:45,123` layout in local time; a formatter's `datefmt`
//! becomes a [`TimestampFormat::Custom`] strftime pattern.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use rust_log_config::core::TimestampFormat;
///
/// assert_eq!(TimestampFormat::custom("%H:%M").unwrap(), TimestampFormat::Custom("%H:%M".into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `2025-01-08 10:30:45,123`
    #[default]
    Default,

    /// Custom strftime format, validated by [`TimestampFormat::custom`]
    Custom(String),
}

impl TimestampFormat {
    /// Build a custom format, rejecting patterns chrono cannot render
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_log_config::core::TimestampFormat;
    ///
    /// assert!(TimestampFormat::custom("%d/%b/%Y:%H:%M:%S %z").is_ok());
    /// assert!(TimestampFormat::custom("%Q").is_err());
    /// ```
    pub fn custom(pattern: &str) -> Result<Self, String> {
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(format!("invalid strftime pattern '{}'", pattern));
        }
        Ok(TimestampFormat::Custom(pattern.to_string()))
    }

    /// Format in the local time zone
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        self.render(&datetime.with_timezone(&Local))
    }

    fn render<Tz: TimeZone>(&self, datetime: &DateTime<Tz>) -> String
    where
        Tz::Offset: Display,
    {
        match self {
            TimestampFormat::Default => datetime.format("%Y-%m-%d %H:%M:%S,%3f").to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }
}
