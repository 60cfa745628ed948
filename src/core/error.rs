//! Error types for the logging configuration system
//!
//! Three families of failure exist:
//!
//! - [`LoggerError::Schema`]: the document is malformed (bad JSON, wrong value
//!   type, missing field, unknown level name, unrecognized rotation trigger).
//! - [`LoggerError::Reference`]: a handler names a formatter, or a logger names
//!   a handler, that the document does not define.
//! - [`LoggerError::Sink`]: a sink cannot be opened, written, or rotated.
//!
//! Schema and reference errors only occur while loading. Sink errors occur at
//! load time (fatal) and at runtime (reported and swallowed by the handler).

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Structural violation in the configuration document
    #[error("Schema error at '{path}': {message}")]
    Schema { path: String, message: String },

    /// Dangling formatter or handler name
    #[error("Reference error at '{path}': unknown {kind} '{name}'")]
    Reference {
        path: String,
        kind: &'static str,
        name: String,
    },

    /// Sink could not be opened, written, or rotated
    #[error("Sink error for '{target}' while {operation}: {message}")]
    Sink {
        target: String,
        operation: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl LoggerError {
    /// Create a schema error for the document location `path`
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a reference error; `kind` is `"formatter"` or `"handler"`
    pub fn reference(path: impl Into<String>, kind: &'static str, name: impl Into<String>) -> Self {
        LoggerError::Reference {
            path: path.into(),
            kind,
            name: name.into(),
        }
    }

    /// Create a sink error without an underlying IO cause
    pub fn sink(
        target: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        LoggerError::Sink {
            target: target.into(),
            operation: operation.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a sink error caused by an IO failure
    pub fn sink_io(
        target: impl Into<String>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::Sink {
            target: target.into(),
            operation: operation.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, LoggerError::Schema { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, LoggerError::Reference { .. })
    }

    pub fn is_sink(&self) -> bool {
        matches!(self, LoggerError::Sink { .. })
    }
}

impl From<serde_json::Error> for LoggerError {
    fn from(err: serde_json::Error) -> Self {
        let path = if err.line() == 0 {
            "<document>".to_string()
        } else {
            format!("<document>:{}:{}", err.line(), err.column())
        };
        LoggerError::schema(path, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::schema("handlers.console.level", "unknown level 'LOUD'");
        assert!(err.is_schema());

        let err = LoggerError::reference("handlers.file.formatter", "formatter", "missing");
        assert!(err.is_reference());

        let err = LoggerError::sink("logs/program.log", "opening sink", "Permission denied");
        assert!(err.is_sink());
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::reference("root.handlers[1]", "handler", "nope");
        assert_eq!(
            err.to_string(),
            "Reference error at 'root.handlers[1]': unknown handler 'nope'"
        );

        let err = LoggerError::schema("version", "expected 1, found 2");
        assert_eq!(err.to_string(), "Schema error at 'version': expected 1, found 2");
    }

    #[test]
    fn test_sink_io_error_keeps_source() {
        use std::error::Error;

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::sink_io("/var/log/app.log", "opening sink", io_err);

        assert!(err.to_string().contains("opening sink"));
        assert!(err.to_string().contains("access denied"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_json_error_becomes_schema_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
        let err = LoggerError::from(json_err);
        assert!(err.is_schema());
        assert!(err.to_string().starts_with("Schema error at '<document>:1:"));
    }
}
