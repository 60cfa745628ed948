//! # Rust Log Config
//!
//! Declarative logging configuration: a JSON document names formatters,
//! handlers and loggers, and loading it yields a [`LoggingSystem`] from which
//! application code borrows named [`Logger`] handles.
//!
//! ## Features
//!
//! - **Validated up front**: schema and reference errors are reported with
//!   the offending document path before any file is created
//! - **Hierarchical loggers**: dotted names inherit levels and propagate
//!   records to ancestor handlers
//! - **Time-based rotation**: midnight, weekday and interval rotation with
//!   bounded retention and optional gzip compression
//! - **Thread safe**: one system can be shared by reference across threads
//!
//! ## Example
//!
//! ```
//! use rust_log_config::config::Loader;
//!
//! let system = Loader::new().load_str(r#"{
//!     "version": 1,
//!     "formatters": { "simple": { "format": "%(asctime)s - %(name)s - %(levelname)s - %(message)s" } },
//!     "handlers": { "console": { "class": "stream", "level": "DEBUG", "formatter": "simple" } },
//!     "root": { "handlers": ["console"], "level": "DEBUG" }
//! }"#)?;
//!
//! system.logger("solar.home").info("charging started");
//! # Ok::<(), rust_log_config::LoggerError>(())
//! ```

pub mod appenders;
pub mod config;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{
        ConsoleAppender, ConsoleStream, FileAppender, FileMode, RotationPolicy, RotationTrigger,
        TimedRotatingFileAppender,
    };
    pub use crate::config::{Loader, LoggingConfig};
    pub use crate::core::{
        Appender, Clock, FormatStyle, Formatter, Handler, LevelSetting, LogEntry, LogLevel,
        Logger, LoggerError, LoggerMetrics, LoggerSettings, LoggingSystem, ManualClock, Result,
        SinkKind, SystemClock, TimestampFormat,
    };
}

pub use appenders::{ConsoleAppender, FileAppender, TimedRotatingFileAppender};
pub use config::{load, Loader, LoggingConfig};
pub use core::{
    Appender, Clock, FormatStyle, Formatter, Handler, HandlerBinding, LevelSetting, LogEntry,
    LogLevel, Logger, LoggerError, LoggerMetrics, LoggerSettings, LoggingSystem,
    LoggingSystemBuilder, ManualClock, Result, SinkKind, SystemClock, TimestampFormat,
};
