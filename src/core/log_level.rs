//! Severity level definitions

use std::fmt;
use std::str::FromStr;

/// Ordered severity of a record, finest to coarsest.
///
/// The discriminants are the conventional numeric levels, so `levelno` in a
/// format template renders `10`, `20`, ... `50`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    Debug = 10,
    Info = 20,
    #[default]
    Warning = 30,
    Error = 40,
    Critical = 50,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Numeric value of the level
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Map a numeric level back to a variant; only exact values are accepted
    pub fn from_u8(value: u8) -> Option<Self> {
        LogLevel::ALL.into_iter().find(|level| level.as_u8() == value)
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Debug => Blue,
            LogLevel::Info => Green,
            LogLevel::Warning => Yellow,
            LogLevel::Error => Red,
            LogLevel::Critical => BrightRed,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" | "FATAL" => Ok(LogLevel::Critical),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// A configured threshold: either a concrete level or `NOTSET`.
///
/// On a handler `NOTSET` lets every record through. On a logger it means the
/// level is inherited from the nearest configured ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LevelSetting {
    #[default]
    NotSet,
    Level(LogLevel),
}

impl LevelSetting {
    pub fn level(&self) -> Option<LogLevel> {
        match self {
            LevelSetting::NotSet => None,
            LevelSetting::Level(level) => Some(*level),
        }
    }

    /// Whether a record at `level` passes this threshold
    pub fn admits(&self, level: LogLevel) -> bool {
        match self {
            LevelSetting::NotSet => true,
            LevelSetting::Level(threshold) => level >= *threshold,
        }
    }
}

impl From<LogLevel> for LevelSetting {
    fn from(level: LogLevel) -> Self {
        LevelSetting::Level(level)
    }
}

impl fmt::Display for LevelSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelSetting::NotSet => f.pad("NOTSET"),
            LevelSetting::Level(level) => level.fmt(f),
        }
    }
}

impl FromStr for LevelSetting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("NOTSET") {
            return Ok(LevelSetting::NotSet);
        }
        s.parse::<LogLevel>().map(LevelSetting::Level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_finest_to_coarsest() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Critical);
    }

    #[test]
    fn test_aliases() {
        assert_eq!("warn".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("FATAL".parse::<LogLevel>(), Ok(LogLevel::Critical));
        assert!("TRACE".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_numeric_levels() {
        assert_eq!(LogLevel::from_u8(40), Some(LogLevel::Error));
        assert_eq!(LogLevel::from_u8(41), None);
        assert_eq!(LogLevel::Critical.as_u8(), 50);
    }

    #[test]
    fn test_level_setting() {
        assert_eq!("notset".parse::<LevelSetting>(), Ok(LevelSetting::NotSet));
        assert!(LevelSetting::NotSet.admits(LogLevel::Debug));

        let error = LevelSetting::from(LogLevel::Error);
        assert!(error.admits(LogLevel::Error));
        assert!(!error.admits(LogLevel::Warning));
    }

    #[test]
    fn test_display_respects_width() {
        assert_eq!(format!("{:<8}|", LogLevel::Info), "INFO    |");
    }
}
