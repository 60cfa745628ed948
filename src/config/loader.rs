//! Configuration loader and validator
//!
//! Loading happens in two phases. [`Loader::validate`] checks the whole
//! document and produces a plan without touching the filesystem; only when the
//! plan is complete does [`Loader::load`] open sinks. A document with any
//! schema or reference error therefore never creates a file.

use super::schema::{HandlerConfig, LevelValue, LoggerConfig, LoggingConfig};
use crate::appenders::file::check_target;
use crate::appenders::{
    ConsoleAppender, ConsoleStream, FileAppender, FileMode, RotationPolicy, RotationTrigger,
    TimedRotatingFileAppender,
};
use crate::core::{
    Appender, Clock, FormatStyle, Formatter, Handler, LevelSetting, LogLevel, LoggerError,
    LoggerSettings, LoggingSystem, Result, SinkKind, SystemClock, DEFAULT_FORMAT,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// The only document version understood
pub const SUPPORTED_VERSION: u32 = 1;

/// Handler class named in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerClass {
    Stream,
    File,
    TimedRotatingFile,
}

impl FromStr for HandlerClass {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "stream" | "logging.StreamHandler" => Ok(HandlerClass::Stream),
            "file" | "logging.FileHandler" => Ok(HandlerClass::File),
            "timed_rotating_file" | "logging.handlers.TimedRotatingFileHandler" => {
                Ok(HandlerClass::TimedRotatingFile)
            }
            _ => Err(format!(
                "unknown handler class '{}', expected 'stream', 'file' or 'timed_rotating_file'",
                s
            )),
        }
    }
}

/// Validated sink parameters, one variant per handler class
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkPlan {
    Stream {
        stream: ConsoleStream,
        colorize: bool,
    },
    File {
        path: PathBuf,
        mode: FileMode,
        delay: bool,
    },
    TimedRotatingFile {
        path: PathBuf,
        policy: RotationPolicy,
        delay: bool,
    },
}

impl SinkPlan {
    pub fn kind(&self) -> SinkKind {
        match self {
            SinkPlan::Stream { .. } => SinkKind::Stream,
            SinkPlan::File { .. } => SinkKind::File,
            SinkPlan::TimedRotatingFile { .. } => SinkKind::TimedRotatingFile,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HandlerPlan {
    pub name: String,
    pub level: LevelSetting,
    pub formatter_name: Option<String>,
    pub formatter: Arc<Formatter>,
    pub sink: SinkPlan,
}

/// Fully validated document, ready to open
#[derive(Debug, Clone)]
pub struct LoadPlan {
    pub handlers: Vec<HandlerPlan>,
    pub root: LoggerSettings,
    pub loggers: BTreeMap<String, LoggerSettings>,
    pub disable_existing_loggers: bool,
}

/// Builds a [`LoggingSystem`] from a [`LoggingConfig`]
///
/// # Example
///
/// ```no_run
/// use rust_log_config::config::{Loader, LoggingConfig};
///
/// let config = LoggingConfig::from_path("logging_config.json")?;
/// let system = Loader::new().with_base_dir("/var/lib/solar").load(&config)?;
/// system.logger("solar.home").info("started");
/// # Ok::<(), rust_log_config::LoggerError>(())
/// ```
pub struct Loader {
    base_dir: Option<PathBuf>,
    clock: Arc<dyn Clock>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            base_dir: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Resolve relative `filename`s against `dir` instead of the working directory
    #[must_use = "builder methods return a new value"]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Clock for record timestamps and rotation boundaries
    #[must_use = "builder methods return a new value"]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate, open every sink, and assemble the system.
    ///
    /// # Errors
    ///
    /// - [`LoggerError::Schema`] for structural violations
    /// - [`LoggerError::Reference`] for dangling formatter or handler names
    /// - [`LoggerError::Sink`] when a file sink cannot be created or opened
    ///
    /// Every file target is checked before any sink is opened, so a path
    /// that names a directory or runs through a regular file fails without
    /// touching the disk. An I/O error while opening a later sink (e.g.
    /// permission denied) still leaves directories and files created for
    /// earlier handlers in place; the sinks themselves are closed again.
    pub fn load(&self, config: &LoggingConfig) -> Result<LoggingSystem> {
        let plan = self.validate(config)?;
        self.materialize(plan)
    }

    pub fn load_str(&self, json: &str) -> Result<LoggingSystem> {
        self.load(&LoggingConfig::from_json_str(json)?)
    }

    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<LoggingSystem> {
        self.load(&LoggingConfig::from_path(path)?)
    }

    /// Check the document without opening anything
    pub fn validate(&self, config: &LoggingConfig) -> Result<LoadPlan> {
        if config.version != SUPPORTED_VERSION {
            return Err(LoggerError::schema(
                "version",
                format!(
                    "unsupported version {}, expected {}",
                    config.version, SUPPORTED_VERSION
                ),
            ));
        }

        let mut formatters = BTreeMap::new();
        for (name, entry) in &config.formatters {
            let path = format!("formatters.{}", name);
            let style = match entry.style.as_deref() {
                Some(style) => {
                    FormatStyle::from_str(style).map_err(|e| LoggerError::schema(format!("{}.style", path), e))?
                }
                None => FormatStyle::Percent,
            };
            let template = entry.format.as_deref().unwrap_or(match style {
                FormatStyle::Percent => DEFAULT_FORMAT,
                FormatStyle::Brace => "{message}",
                FormatStyle::Dollar => "${message}",
            });
            let formatter = Formatter::new(template, style, entry.datefmt.as_deref())
                .map_err(|e| LoggerError::schema(format!("{}.format", path), e))?;
            formatters.insert(name.as_str(), Arc::new(formatter));
        }

        let default_formatter = Arc::new(Formatter::default());
        let mut handlers = Vec::with_capacity(config.handlers.len());
        for (name, entry) in &config.handlers {
            let path = format!("handlers.{}", name);
            let sink = self.sink_plan(&path, entry)?;
            let level = match &entry.level {
                Some(value) => parse_level(&format!("{}.level", path), value)?,
                None => LevelSetting::NotSet,
            };
            let formatter = match entry.formatter.as_deref() {
                Some(formatter_name) => formatters
                    .get(formatter_name)
                    .cloned()
                    .ok_or_else(|| {
                        LoggerError::reference(format!("{}.formatter", path), "formatter", formatter_name)
                    })?,
                None => Arc::clone(&default_formatter),
            };
            handlers.push(HandlerPlan {
                name: name.clone(),
                level,
                formatter_name: entry.formatter.clone(),
                formatter,
                sink,
            });
        }

        let mut root = None;
        let mut loggers = BTreeMap::new();
        for (name, entry) in &config.loggers {
            let path = format!("loggers.{}", name);
            let is_root = name.is_empty() || name == "root";
            let settings = self.logger_settings(&path, entry, &config.handlers, is_root)?;
            if is_root {
                if config.root.is_some() || root.is_some() {
                    return Err(LoggerError::schema(path, "root logger is configured more than once"));
                }
                root = Some(settings);
            } else {
                loggers.insert(name.clone(), settings);
            }
        }
        if let Some(entry) = &config.root {
            root = Some(self.logger_settings("root", entry, &config.handlers, true)?);
        }
        let root = root.unwrap_or_else(|| LoggerSettings::new(LogLevel::Warning.into()));

        Ok(LoadPlan {
            handlers,
            root,
            loggers,
            disable_existing_loggers: config.disable_existing_loggers,
        })
    }

    fn logger_settings(
        &self,
        path: &str,
        entry: &LoggerConfig,
        declared: &BTreeMap<String, HandlerConfig>,
        is_root: bool,
    ) -> Result<LoggerSettings> {
        for (idx, handler) in entry.handlers.iter().enumerate() {
            if !declared.contains_key(handler) {
                return Err(LoggerError::reference(
                    format!("{}.handlers[{}]", path, idx),
                    "handler",
                    handler,
                ));
            }
        }
        let level = match &entry.level {
            Some(value) => parse_level(&format!("{}.level", path), value)?,
            None if is_root => LogLevel::Warning.into(),
            None => LevelSetting::NotSet,
        };
        Ok(LoggerSettings::new(level)
            .with_handlers(entry.handlers.iter().cloned())
            .with_propagate(entry.propagate.unwrap_or(true)))
    }

    fn sink_plan(&self, path: &str, entry: &HandlerConfig) -> Result<SinkPlan> {
        let class = HandlerClass::from_str(&entry.class)
            .map_err(|e| LoggerError::schema(format!("{}.class", path), e))?;

        let reject = |key: &str, present: bool| -> Result<()> {
            if present {
                Err(LoggerError::schema(
                    format!("{}.{}", path, key),
                    format!("not a parameter of '{}' handlers", entry.class),
                ))
            } else {
                Ok(())
            }
        };
        let rotation_keys_present = [
            ("when", entry.when.is_some()),
            ("interval", entry.interval.is_some()),
            ("backupCount", entry.backup_count.is_some()),
            ("utc", entry.utc.is_some()),
            ("compress", entry.compress.is_some()),
        ];

        match class {
            HandlerClass::Stream => {
                reject("filename", entry.filename.is_some())?;
                reject("mode", entry.mode.is_some())?;
                reject("encoding", entry.encoding.is_some())?;
                reject("delay", entry.delay.is_some())?;
                for (key, present) in rotation_keys_present {
                    reject(key, present)?;
                }
                let stream = match entry.stream.as_deref() {
                    Some(stream) => ConsoleStream::from_str(stream)
                        .map_err(|e| LoggerError::schema(format!("{}.stream", path), e))?,
                    None => ConsoleStream::Stdout,
                };
                Ok(SinkPlan::Stream {
                    stream,
                    colorize: entry.colorize.unwrap_or(false),
                })
            }
            HandlerClass::File => {
                reject("stream", entry.stream.is_some())?;
                reject("colorize", entry.colorize.is_some())?;
                for (key, present) in rotation_keys_present {
                    reject(key, present)?;
                }
                check_encoding(path, entry)?;
                let mode = match entry.mode.as_deref() {
                    None | Some("a") => FileMode::Append,
                    Some("w") => FileMode::Truncate,
                    Some(other) => {
                        return Err(LoggerError::schema(
                            format!("{}.mode", path),
                            format!("mode must be 'a' or 'w', found '{}'", other),
                        ))
                    }
                };
                Ok(SinkPlan::File {
                    path: self.resolve_filename(path, entry)?,
                    mode,
                    delay: entry.delay.unwrap_or(false),
                })
            }
            HandlerClass::TimedRotatingFile => {
                reject("stream", entry.stream.is_some())?;
                reject("colorize", entry.colorize.is_some())?;
                reject("mode", entry.mode.is_some())?;
                check_encoding(path, entry)?;

                let trigger = match entry.when.as_deref() {
                    Some(when) => RotationTrigger::from_str(when)
                        .map_err(|e| LoggerError::schema(format!("{}.when", path), e))?,
                    None => RotationTrigger::Hours,
                };
                let interval = match entry.interval {
                    None => 1,
                    Some(n) if n >= 1 => u32::try_from(n).map_err(|_| {
                        LoggerError::schema(format!("{}.interval", path), "interval is too large")
                    })?,
                    Some(n) => {
                        return Err(LoggerError::schema(
                            format!("{}.interval", path),
                            format!("interval must be at least 1, found {}", n),
                        ))
                    }
                };
                let backup_count = match entry.backup_count {
                    None => 0,
                    Some(n) => usize::try_from(n).map_err(|_| {
                        LoggerError::schema(
                            format!("{}.backupCount", path),
                            format!("backupCount must be a non-negative integer, found {}", n),
                        )
                    })?,
                };
                let policy = RotationPolicy::new(trigger)
                    .with_interval(interval)
                    .with_backup_count(backup_count)
                    .with_utc(entry.utc.unwrap_or(false))
                    .with_compression(entry.compress.unwrap_or(false));

                Ok(SinkPlan::TimedRotatingFile {
                    path: self.resolve_filename(path, entry)?,
                    policy,
                    delay: entry.delay.unwrap_or(false),
                })
            }
        }
    }

    fn resolve_filename(&self, path: &str, entry: &HandlerConfig) -> Result<PathBuf> {
        let filename = entry
            .filename
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| {
                LoggerError::schema(
                    format!("{}.filename", path),
                    format!("'{}' handlers require a filename", entry.class),
                )
            })?;
        let filename = Path::new(filename);
        Ok(match &self.base_dir {
            Some(base) if filename.is_relative() => base.join(filename),
            _ => filename.to_path_buf(),
        })
    }

    /// Open every sink; the only place a handler class becomes an appender
    fn materialize(&self, plan: LoadPlan) -> Result<LoggingSystem> {
        for handler in &plan.handlers {
            match &handler.sink {
                SinkPlan::File { path, .. } | SinkPlan::TimedRotatingFile { path, .. } => {
                    check_target(path)?;
                }
                SinkPlan::Stream { .. } => {}
            }
        }

        let mut builder = LoggingSystem::builder()
            .clock(Arc::clone(&self.clock))
            .disable_existing_loggers(plan.disable_existing_loggers)
            .root(plan.root);

        for handler in plan.handlers {
            let kind = handler.sink.kind();
            let appender: Box<dyn Appender> = match handler.sink {
                SinkPlan::Stream { stream, colorize } => {
                    Box::new(ConsoleAppender::new(stream).with_colors(colorize))
                }
                SinkPlan::File { path, mode, delay } => {
                    Box::new(FileAppender::with_options(path, mode, delay)?)
                }
                SinkPlan::TimedRotatingFile {
                    path,
                    policy,
                    delay,
                } => Box::new(TimedRotatingFileAppender::with_clock(
                    path,
                    policy,
                    Arc::clone(&self.clock),
                    delay,
                )?),
            };
            builder = builder.handler(Handler::new(
                handler.name,
                kind,
                handler.level,
                handler.formatter_name,
                handler.formatter,
                appender,
            ));
        }

        for (name, settings) in plan.loggers {
            builder = builder.logger(name, settings);
        }
        builder.build()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a document with default options
pub fn load(config: &LoggingConfig) -> Result<LoggingSystem> {
    Loader::new().load(config)
}

fn parse_level(path: &str, value: &LevelValue) -> Result<LevelSetting> {
    match value {
        LevelValue::Name(name) => name
            .parse::<LevelSetting>()
            .map_err(|e| LoggerError::schema(path, e)),
        LevelValue::Number(0) => Ok(LevelSetting::NotSet),
        LevelValue::Number(n) => u8::try_from(*n)
            .ok()
            .and_then(LogLevel::from_u8)
            .map(LevelSetting::Level)
            .ok_or_else(|| {
                LoggerError::schema(
                    path,
                    format!("numeric level must be 0, 10, 20, 30, 40 or 50, found {}", n),
                )
            }),
    }
}

fn check_encoding(path: &str, entry: &HandlerConfig) -> Result<()> {
    match entry.encoding.as_deref() {
        None => Ok(()),
        Some(enc) if matches!(enc.to_lowercase().as_str(), "utf-8" | "utf8") => Ok(()),
        Some(enc) => Err(LoggerError::schema(
            format!("{}.encoding", path),
            format!("only UTF-8 is supported, found '{}'", enc),
        )),
    }
}
