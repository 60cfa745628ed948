//! Logging macros for ergonomic log message formatting.
//!
//! These macros format their arguments like `format!` and record the call
//! site, so `%(filename)s`, `%(lineno)d` and `%(module)s` render the caller's
//! location. The message is only formatted when the logger is enabled for
//! the level.
//!
//! `exception!` logs an error at ERROR together with its `source()` chain.
//!
//! # Examples
//!
//! ```
//! use rust_log_config::prelude::*;
//! use rust_log_config::info;
//!
//! let system = LoggingSystem::builder().build().unwrap();
//! let logger = system.logger("solar.home");
//!
//! let watts = 3400;
//! info!(logger, "Solar output {} W", watts);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_log_config::prelude::*;
/// # let system = LoggingSystem::builder().build().unwrap();
/// # let logger = system.logger("app");
/// use rust_log_config::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level: $crate::LogLevel = $level;
        if logger.is_enabled_for(level) {
            logger.log_at(level, format!($($arg)+), file!(), line!(), module_path!());
        }
    }};
}

/// Log a debug-level message.
///
/// ```
/// # use rust_log_config::prelude::*;
/// # let system = LoggingSystem::builder().build().unwrap();
/// # let logger = system.logger("app");
/// use rust_log_config::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// ```
/// # use rust_log_config::prelude::*;
/// # let system = LoggingSystem::builder().build().unwrap();
/// # let logger = system.logger("app");
/// use rust_log_config::warning;
/// warning!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Critical, $($arg)+)
    };
}

/// Log an error and its source chain at error level.
///
/// ```
/// # use rust_log_config::prelude::*;
/// # let system = LoggingSystem::builder().build().unwrap();
/// # let logger = system.logger("app");
/// use rust_log_config::exception;
/// let err = std::io::Error::other("connection reset");
/// exception!(logger, err);
/// exception!(logger, err, "refresh of token {} failed", 3);
/// ```
#[macro_export]
macro_rules! exception {
    ($logger:expr, $err:expr) => {
        $crate::exception!($logger, $err, "")
    };
    ($logger:expr, $err:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        if logger.is_enabled_for($crate::LogLevel::Error) {
            logger.exception_at(format!($($arg)+), &$err, file!(), line!(), module_path!());
        }
    }};
}

#[cfg(test)]
mod tests {
    use crate::core::{
        Appender, FormatStyle, Formatter, Handler, LevelSetting, LogEntry, LogLevel,
        LoggerSettings, LoggingSystem, Result, SinkKind,
    };
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Collecting(Arc<Mutex<Vec<String>>>);

    impl Appender for Collecting {
        fn append(&mut self, _entry: &LogEntry, formatted: &str) -> Result<()> {
            self.0.lock().push(formatted.to_string());
            Ok(())
        }
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "collecting"
        }
    }

    fn system(template: &str) -> (LoggingSystem, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let formatter = Formatter::new(template, FormatStyle::Percent, None).unwrap();
        let system = LoggingSystem::builder()
            .handler(Handler::new(
                "sink",
                SinkKind::Custom,
                LevelSetting::NotSet,
                None,
                Arc::new(formatter),
                Box::new(Collecting(Arc::clone(&lines))),
            ))
            .root(LoggerSettings::new(LogLevel::Info.into()).with_handlers(["sink"]))
            .build()
            .unwrap();
        (system, lines)
    }

    #[test]
    fn test_macros_format_arguments() {
        let (system, lines) = system("%(levelname)s %(message)s");
        let logger = system.logger("app");

        info!(logger, "charging at {} A", 16);
        warning!(logger, "grid import");
        critical!(logger, "{}", "battery fault");

        assert_eq!(
            *lines.lock(),
            vec![
                "INFO charging at 16 A".to_string(),
                "WARNING grid import".to_string(),
                "CRITICAL battery fault".to_string(),
            ]
        );
    }

    #[test]
    fn test_macros_skip_disabled_levels() {
        let (system, lines) = system("%(message)s");
        debug!(system.logger("app"), "{}", "not rendered");
        assert!(lines.lock().is_empty());
    }

    #[test]
    fn test_exception_macro() {
        let (system, lines) = system("%(levelname)s %(filename)s %(message)s");
        let logger = system.logger("program");
        let err = std::io::Error::other("vehicle offline");

        exception!(logger, err);
        exception!(logger, err, "poll {} failed", 7);

        assert_eq!(
            *lines.lock(),
            vec![
                "ERROR macros.rs vehicle offline".to_string(),
                "ERROR macros.rs poll 7 failed: vehicle offline".to_string(),
            ]
        );
    }

    #[test]
    fn test_macros_record_call_site() {
        let (system, lines) = system("%(filename)s %(lineno)d %(module)s");
        error!(system.logger("app"), "boom");

        let lines = lines.lock();
        assert!(lines[0].starts_with("macros.rs "), "{}", lines[0]);
        assert!(lines[0].ends_with("macros::tests"), "{}", lines[0]);
        assert!(!lines[0].contains(" 0 "));
    }
}
