//! Appender trait for log output destinations

use super::{error::Result, log_entry::LogEntry};

/// A sink that receives already-formatted records.
///
/// `formatted` carries no line terminator; the appender adds its own. The
/// entry is passed alongside for sinks that key behavior off the record
/// (the console colors by level).
pub trait Appender: Send {
    fn append(&mut self, entry: &LogEntry, formatted: &str) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
