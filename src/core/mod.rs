//! Core logging types and traits

pub mod appender;
pub mod clock;
pub mod error;
pub mod formatter;
pub mod handler;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod timestamp;

pub use appender::Appender;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{LoggerError, Result};
pub use formatter::{FormatStyle, Formatter, RecordField, DEFAULT_FORMAT};
pub use handler::{Handler, SinkKind};
pub use log_entry::{LogEntry, Location};
pub use log_level::{LevelSetting, LogLevel};
pub use logger::{
    HandlerBinding, Logger, LoggerSettings, LoggingSystem, LoggingSystemBuilder, ROOT_LOGGER_NAME,
};
pub use metrics::LoggerMetrics;
pub use timestamp::TimestampFormat;
