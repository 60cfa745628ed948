//! Property-based tests for rust_log_config using proptest

use proptest::prelude::*;
use rust_log_config::config::Loader;
use rust_log_config::core::{Appender, LogEntry, Result};
use rust_log_config::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warning),
        Just(LogLevel::Error),
        Just(LogLevel::Critical),
    ]
}

fn any_setting() -> impl Strategy<Value = LevelSetting> {
    prop_oneof![
        Just(LevelSetting::NotSet),
        any_level().prop_map(LevelSetting::Level),
    ]
}

struct Counting(Arc<Mutex<usize>>);

impl Appender for Counting {
    fn append(&mut self, _entry: &LogEntry, _formatted: &str) -> Result<()> {
        *self.0.lock() += 1;
        Ok(())
    }
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &str {
        "counting"
    }
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Level names parse back to the same level, in any letter case
    #[test]
    fn test_log_level_str_roundtrip(level in any_level(), upper in any::<bool>()) {
        let name = if upper { level.to_str().to_string() } else { level.to_str().to_lowercase() };
        let parsed: LogLevel = name.parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Ordering agrees with the numeric values
    #[test]
    fn test_log_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a < b, a.as_u8() < b.as_u8());
        prop_assert_eq!(LogLevel::from_u8(a.as_u8()), Some(a));
    }

    /// Arbitrary words that are not level names never parse
    #[test]
    fn test_unknown_level_names_rejected(name in "[a-z]{1,12}") {
        let known = ["debug", "info", "warning", "warn", "error", "critical", "fatal", "notset"];
        prop_assume!(!known.contains(&name.as_str()));
        prop_assert!(name.parse::<LevelSetting>().is_err());
    }
}

// ============================================================================
// Severity filter
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// A handler emits a record iff the record clears both the handler level
    /// and the logger's effective level
    #[test]
    fn test_severity_filter(
        record in any_level(),
        handler_level in any_setting(),
        logger_level in any_level(),
    ) {
        let count = Arc::new(Mutex::new(0usize));
        let system = LoggingSystem::builder()
            .handler(Handler::new(
                "sink",
                SinkKind::Custom,
                handler_level,
                None,
                Arc::new(Formatter::default()),
                Box::new(Counting(Arc::clone(&count))),
            ))
            .root(LoggerSettings::new(logger_level.into()).with_handlers(["sink"]))
            .build()
            .unwrap();

        system.logger("prop.case").log(record, "x");

        let expected = handler_level.admits(record) && record >= logger_level;
        prop_assert_eq!(*count.lock() == 1, expected);
    }

    /// Numeric levels in a document are accepted exactly for the five values and zero
    #[test]
    fn test_numeric_document_levels(n in -20i64..80) {
        let json = format!(r#"{{ "version": 1, "root": {{ "level": {} }} }}"#, n);
        let result = Loader::new().load_str(&json);
        let valid = matches!(n, 0 | 10 | 20 | 30 | 40 | 50);
        prop_assert_eq!(result.is_ok(), valid);
    }
}
