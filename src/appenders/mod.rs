//! Appender implementations

pub mod console;
pub mod file;
pub mod timed_rotating_file;

pub use console::{ConsoleAppender, ConsoleStream};
pub use file::{FileAppender, FileMode};
pub use timed_rotating_file::{RotationPolicy, RotationTrigger, TimedRotatingFileAppender};

pub use crate::core::Appender;
