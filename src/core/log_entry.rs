//! Log record structure

use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use std::cell::RefCell;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

/// Get cached thread ID, computing and caching it on first access
fn get_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

/// Get cached thread name, computing and caching it on first access
fn get_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// Call-site information captured by the logging macros
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub module_path: String,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Dotted name of the logger the record was emitted through
    pub logger: String,
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub location: Option<Location>,
    pub thread_id: String,
    pub thread_name: Option<String>,
    pub process_id: u32,
}

impl LogEntry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so a single record always renders as a single line.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(
        logger: impl Into<String>,
        level: LogLevel,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            logger: logger.into(),
            level,
            message: Self::sanitize_message(message),
            timestamp,
            location: None,
            thread_id: get_thread_id(),
            thread_name: get_thread_name(),
            process_id: std::process::id(),
        }
    }

    pub fn with_location(mut self, file: &str, line: u32, module_path: &str) -> Self {
        self.location = Some(Location {
            file: file.to_string(),
            line,
            module_path: module_path.to_string(),
        });
        self
    }

    /// Thread name when the thread has one, otherwise its id
    pub fn thread_label(&self) -> &str {
        self.thread_name.as_deref().unwrap_or(&self.thread_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_single_line() {
        let entry = LogEntry::new("app", LogLevel::Info, "a\nb\rc\td", Utc::now());
        assert_eq!(entry.message, "a\\nb\\rc\\td");
    }

    #[test]
    fn test_location() {
        let entry = LogEntry::new("app", LogLevel::Info, "msg", Utc::now())
            .with_location("src/main.rs", 42, "app::main");
        let location = entry.location.expect("location set");
        assert_eq!(location.line, 42);
        assert_eq!(location.module_path, "app::main");
    }
}
