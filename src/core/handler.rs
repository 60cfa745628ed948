//! Handlers: a level threshold and a formatter in front of one sink

use super::{
    appender::Appender, error::Result, formatter::Formatter, log_entry::LogEntry,
    log_level::LevelSetting, metrics::LoggerMetrics,
};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Sink family a handler writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Stream,
    File,
    TimedRotatingFile,
    /// Appender attached programmatically
    Custom,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Stream => "stream",
            SinkKind::File => "file",
            SinkKind::TimedRotatingFile => "timed_rotating_file",
            SinkKind::Custom => "custom",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named handler
///
/// The sink sits behind a mutex: formatting happens before the lock is taken,
/// the write (and any rotation it triggers) happens under it, so records from
/// concurrent callers never interleave.
pub struct Handler {
    name: String,
    kind: SinkKind,
    level: LevelSetting,
    formatter_name: Option<String>,
    formatter: Arc<Formatter>,
    appender: Mutex<Box<dyn Appender>>,
}

impl Handler {
    pub fn new(
        name: impl Into<String>,
        kind: SinkKind,
        level: LevelSetting,
        formatter_name: Option<String>,
        formatter: Arc<Formatter>,
        appender: Box<dyn Appender>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            level,
            formatter_name,
            formatter,
            appender: Mutex::new(appender),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SinkKind {
        self.kind
    }

    pub fn level(&self) -> LevelSetting {
        self.level
    }

    pub fn formatter_name(&self) -> Option<&str> {
        self.formatter_name.as_deref()
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Format and write `entry` if it meets this handler's threshold.
    ///
    /// Returns `true` when the record passed the threshold, whether or not
    /// the write succeeded. Sink errors and panics are reported on stderr and
    /// counted, never propagated.
    pub fn handle(&self, entry: &LogEntry, metrics: &LoggerMetrics) -> bool {
        if !self.level.admits(entry.level) {
            return false;
        }

        let line = self.formatter.format(entry);
        let mut appender = self.appender.lock();
        let append_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            appender.append(entry, &line)
        }));

        match append_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                metrics.record_sink_failure();
                eprintln!("[LOGGER ERROR] Handler '{}' failed: {}", self.name, e);
            }
            Err(panic_info) => {
                metrics.record_sink_failure();
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                eprintln!(
                    "[LOGGER CRITICAL] Handler '{}' panicked: {}. \
                     Other handlers continue to function.",
                    self.name, panic_msg
                );
            }
        }
        true
    }

    pub fn flush(&self) -> Result<()> {
        self.appender.lock().flush()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("level", &self.level)
            .field("formatter", &self.formatter_name)
            .finish()
    }
}
