//! Console appender implementation

use crate::core::{Appender, LogEntry, LoggerError, Result};
#[cfg(feature = "console")]
use colored::Colorize;
use std::io::Write;
use std::str::FromStr;

/// Standard stream a console appender writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleStream {
    #[default]
    Stdout,
    Stderr,
}

impl ConsoleStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleStream::Stdout => "stdout",
            ConsoleStream::Stderr => "stderr",
        }
    }
}

impl FromStr for ConsoleStream {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "stdout" | "sys.stdout" | "ext://sys.stdout" => Ok(ConsoleStream::Stdout),
            "stderr" | "sys.stderr" | "ext://sys.stderr" => Ok(ConsoleStream::Stderr),
            _ => Err(format!(
                "stream must be 'ext://sys.stdout' or 'ext://sys.stderr', found '{}'",
                s
            )),
        }
    }
}

/// Writes each record as one line and flushes immediately
pub struct ConsoleAppender {
    stream: ConsoleStream,
    use_colors: bool,
}

impl ConsoleAppender {
    pub fn new(stream: ConsoleStream) -> Self {
        Self {
            stream,
            use_colors: false,
        }
    }

    pub fn stdout() -> Self {
        Self::new(ConsoleStream::Stdout)
    }

    pub fn stderr() -> Self {
        Self::new(ConsoleStream::Stderr)
    }

    /// Color each line by its level (requires the `console` feature)
    ///
    /// # Example
    ///
    /// ```
    /// use rust_log_config::appenders::ConsoleAppender;
    ///
    /// let appender = ConsoleAppender::stdout().with_colors(true);
    /// ```
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }

    fn render(&self, entry: &LogEntry, formatted: &str) -> String {
        #[cfg(feature = "console")]
        if self.use_colors {
            return formatted.color(entry.level.color_code()).to_string();
        }
        let _ = entry;
        formatted.to_string()
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        match self.stream {
            ConsoleStream::Stdout => {
                let mut out = std::io::stdout().lock();
                writeln!(out, "{}", line)?;
                out.flush()
            }
            ConsoleStream::Stderr => {
                let mut out = std::io::stderr().lock();
                writeln!(out, "{}", line)?;
                out.flush()
            }
        }
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, entry: &LogEntry, formatted: &str) -> Result<()> {
        let line = self.render(entry, formatted);
        self.write_line(&line)
            .map_err(|e| LoggerError::sink_io(self.stream.as_str(), "writing record", e))
    }

    fn flush(&mut self) -> Result<()> {
        let result = match self.stream {
            ConsoleStream::Stdout => std::io::stdout().flush(),
            ConsoleStream::Stderr => std::io::stderr().flush(),
        };
        result.map_err(|e| LoggerError::sink_io(self.stream.as_str(), "flushing", e))
    }

    fn name(&self) -> &str {
        "console"
    }
}
