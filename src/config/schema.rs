//! Serde model of the logging configuration document
//!
//! These types mirror the JSON document as written. They are deliberately
//! loose where the document is (level names are strings, sink parameters are
//! optional); [`crate::config::Loader`] turns them into checked runtime
//! objects.

use crate::core::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn default_true() -> bool {
    true
}

/// Whole document
///
/// # Example
///
/// ```
/// use rust_log_config::config::LoggingConfig;
///
/// let config = LoggingConfig::from_json_str(r#"{
///     "version": 1,
///     "formatters": { "simple": { "format": "%(levelname)s %(message)s" } },
///     "handlers": { "console": { "class": "stream", "level": "INFO", "formatter": "simple" } },
///     "root": { "handlers": ["console"], "level": "DEBUG" }
/// }"#).unwrap();
///
/// assert_eq!(config.handlers["console"].class, "stream");
/// assert!(config.disable_existing_loggers);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub version: u32,
    #[serde(default = "default_true")]
    pub disable_existing_loggers: bool,
    #[serde(default)]
    pub formatters: BTreeMap<String, FormatterConfig>,
    #[serde(default)]
    pub handlers: BTreeMap<String, HandlerConfig>,
    #[serde(default)]
    pub loggers: BTreeMap<String, LoggerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<LoggerConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatterConfig {
    #[serde(default, alias = "fmt", skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datefmt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

/// Level as written: a name such as `"INFO"` or a number such as `20`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelValue {
    Number(i64),
    Name(String),
}

impl From<&str> for LevelValue {
    fn from(name: &str) -> Self {
        LevelValue::Name(name.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerConfig {
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LevelValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatter: Option<String>,

    // stream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colorize: Option<bool>,

    // file and timed_rotating_file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<bool>,

    // timed_rotating_file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<i64>,
    #[serde(
        default,
        rename = "backupCount",
        alias = "backup_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub backup_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compress: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggerConfig {
    #[serde(default)]
    pub handlers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LevelValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propagate: Option<bool>,
}

impl LoggingConfig {
    /// Parse a JSON document; syntax and type errors become schema errors
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Read and parse a JSON document from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::schema(
                path.display().to_string(),
                format!("unable to read configuration: {}", e),
            )
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LoggerError::schema("<document>", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::from_json_str(r#"{ "version": 1 }"#).unwrap();
        assert!(config.disable_existing_loggers);
        assert!(config.formatters.is_empty());
        assert!(config.root.is_none());
    }

    #[test]
    fn test_backup_count_spellings() {
        let camel: HandlerConfig =
            serde_json::from_str(r#"{ "class": "timed_rotating_file", "backupCount": 10 }"#).unwrap();
        let snake: HandlerConfig =
            serde_json::from_str(r#"{ "class": "timed_rotating_file", "backup_count": 10 }"#).unwrap();
        assert_eq!(camel.backup_count, Some(10));
        assert_eq!(camel, snake);
    }

    #[test]
    fn test_level_accepts_name_or_number() {
        let by_name: LoggerConfig = serde_json::from_str(r#"{ "level": "ERROR" }"#).unwrap();
        let by_number: LoggerConfig = serde_json::from_str(r#"{ "level": 40 }"#).unwrap();
        assert_eq!(by_name.level, Some(LevelValue::Name("ERROR".into())));
        assert_eq!(by_number.level, Some(LevelValue::Number(40)));
    }

    #[test]
    fn test_unknown_handler_key_is_schema_error() {
        let err = LoggingConfig::from_json_str(
            r#"{ "version": 1, "handlers": { "h": { "class": "stream", "colour": true } } }"#,
        )
        .unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn test_wrong_type_is_schema_error() {
        let err = LoggingConfig::from_json_str(r#"{ "version": "one" }"#).unwrap_err();
        assert!(err.is_schema());

        let err = LoggingConfig::from_json_str(r#"{ "formatters": {} }"#).unwrap_err();
        assert!(err.is_schema(), "missing version");
    }

    #[test]
    fn test_serialize_round_trip() {
        let json = r#"{
            "version": 1,
            "handlers": { "f": { "class": "timed_rotating_file", "filename": "a.log", "when": "midnight", "backupCount": 3 } },
            "root": { "handlers": ["f"], "level": "INFO" }
        }"#;
        let config = LoggingConfig::from_json_str(json).unwrap();
        let again = LoggingConfig::from_json_str(&config.to_json_string().unwrap()).unwrap();
        assert_eq!(config, again);
    }
}
