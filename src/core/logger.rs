//! Logging system and logger handles
//!
//! A [`LoggingSystem`] owns every handler and the logger tree built from a
//! configuration. Application code borrows [`Logger`] handles from it by
//! dotted name; there is no process-wide registry.

use super::{
    clock::{Clock, SystemClock},
    error::{LoggerError, Result},
    handler::{Handler, SinkKind},
    log_entry::LogEntry,
    log_level::{LevelSetting, LogLevel},
    metrics::LoggerMetrics,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Name records carry when emitted through the root logger
pub const ROOT_LOGGER_NAME: &str = "root";

/// Declared settings of one logger, handlers referenced by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerSettings {
    pub level: LevelSetting,
    pub propagate: bool,
    pub handlers: Vec<String>,
}

impl LoggerSettings {
    pub fn new(level: LevelSetting) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_handlers<I, S>(mut self, handlers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.handlers = handlers.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_propagate(mut self, propagate: bool) -> Self {
        self.propagate = propagate;
        self
    }
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: LevelSetting::NotSet,
            propagate: true,
            handlers: Vec::new(),
        }
    }
}

struct LoggerNode {
    level: LevelSetting,
    propagate: bool,
    handlers: Vec<Arc<Handler>>,
}

/// Snapshot of one handler's configuration, used to compare loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerBinding {
    pub name: String,
    pub kind: SinkKind,
    pub level: LevelSetting,
    pub formatter: Option<String>,
    pub template: String,
}

pub struct LoggingSystem {
    root: LoggerNode,
    loggers: HashMap<String, LoggerNode>,
    handlers: BTreeMap<String, Arc<Handler>>,
    clock: Arc<dyn Clock>,
    metrics: LoggerMetrics,
    disable_existing_loggers: bool,
}

impl LoggingSystem {
    /// Create a builder for assembling a system by hand
    ///
    /// # Example
    /// ```
    /// use rust_log_config::prelude::*;
    /// use std::sync::Arc;
    ///
    /// let console = Handler::new(
    ///     "console",
    ///     SinkKind::Stream,
    ///     LevelSetting::NotSet,
    ///     None,
    ///     Arc::new(Formatter::default()),
    ///     Box::new(ConsoleAppender::stdout()),
    /// );
    /// let system = LoggingSystem::builder()
    ///     .handler(console)
    ///     .root(LoggerSettings::new(LogLevel::Info.into()).with_handlers(["console"]))
    ///     .build()
    ///     .unwrap();
    ///
    /// system.logger("app").info("ready");
    /// ```
    #[must_use]
    pub fn builder() -> LoggingSystemBuilder {
        LoggingSystemBuilder::new()
    }

    /// Borrow a logger handle for a dotted name; `""` and `"root"` address the root
    pub fn logger(&self, name: &str) -> Logger<'_> {
        let name = if name.is_empty() { ROOT_LOGGER_NAME } else { name };
        Logger {
            system: self,
            name: name.to_string(),
        }
    }

    pub fn root(&self) -> Logger<'_> {
        self.logger(ROOT_LOGGER_NAME)
    }

    /// Configured level of `name`, else of its nearest configured ancestor,
    /// else the root level
    pub fn effective_level(&self, name: &str) -> LevelSetting {
        if name == ROOT_LOGGER_NAME {
            return self.root.level;
        }
        let mut candidate = name;
        loop {
            if let Some(node) = self.loggers.get(candidate) {
                if node.level != LevelSetting::NotSet {
                    return node.level;
                }
            }
            match candidate.rfind('.') {
                Some(idx) => candidate = &candidate[..idx],
                None => return self.root.level,
            }
        }
    }

    pub fn is_enabled_for(&self, name: &str, level: LogLevel) -> bool {
        self.effective_level(name).admits(level)
    }

    /// Dispatch a record through its logger's handler chain.
    ///
    /// A handler emits the record iff `record.level >= handler.level` and
    /// `record.level >= effective_level(record.logger)`. Ancestors' handlers
    /// receive the record while `propagate` holds; ancestors' own levels do
    /// not filter it.
    pub fn emit(&self, entry: &LogEntry) {
        if !self.is_enabled_for(&entry.logger, entry.level) {
            self.metrics.record_filtered();
            return;
        }

        let mut found = 0usize;
        let mut delivered = false;
        for node in self.chain(&entry.logger) {
            for handler in &node.handlers {
                found += 1;
                if handler.handle(entry, &self.metrics) {
                    delivered = true;
                }
            }
            if !node.propagate {
                break;
            }
        }

        if found == 0 && entry.level >= LogLevel::Warning {
            // Last resort so warnings are never silently lost
            eprintln!("{}", entry.message);
            delivered = true;
        }

        if delivered {
            self.metrics.record_emitted();
        } else {
            self.metrics.record_filtered();
        }
    }

    /// Nodes whose handlers see a record from `name`, nearest first
    fn chain<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a LoggerNode> + 'a {
        let named = if name == ROOT_LOGGER_NAME {
            None
        } else {
            Some(name)
        };
        let ancestors = std::iter::successors(named, |current: &&'a str| {
            let current: &'a str = current;
            current.rfind('.').map(|idx| &current[..idx])
        })
        .filter_map(move |candidate| self.loggers.get(candidate));
        ancestors.chain(std::iter::once(&self.root))
    }

    fn log_record(&self, name: &str, level: LogLevel, message: &str, location: Option<(&str, u32, &str)>) {
        if !self.is_enabled_for(name, level) {
            self.metrics.record_filtered();
            return;
        }
        let mut entry = LogEntry::new(name, level, message, self.clock.now());
        if let Some((file, line, module_path)) = location {
            entry = entry.with_location(file, line, module_path);
        }
        self.emit(&entry);
    }

    pub fn handler(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name).map(Arc::as_ref)
    }

    pub fn handlers(&self) -> impl Iterator<Item = &Handler> {
        self.handlers.values().map(Arc::as_ref)
    }

    /// Handler configuration sorted by handler name
    pub fn handler_bindings(&self) -> Vec<HandlerBinding> {
        self.handlers
            .values()
            .map(|handler| HandlerBinding {
                name: handler.name().to_string(),
                kind: handler.kind(),
                level: handler.level(),
                formatter: handler.formatter_name().map(String::from),
                template: handler.formatter().template().to_string(),
            })
            .collect()
    }

    /// Names of explicitly configured (non-root) loggers, sorted
    pub fn logger_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.loggers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn disable_existing_loggers(&self) -> bool {
        self.disable_existing_loggers
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Flush every handler, returning the first failure after trying all
    pub fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for handler in self.handlers.values() {
            if let Err(e) = handler.flush() {
                eprintln!("[LOGGER ERROR] Handler '{}' flush failed: {}", handler.name(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Flush all sinks; returns `false` if any flush failed
    ///
    /// Sinks stay open until the system is dropped.
    pub fn shutdown(&self) -> bool {
        self.flush().is_ok()
    }
}

impl Drop for LoggingSystem {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }

        let failures = self.metrics.sink_failure_count();
        if failures > 0 {
            eprintln!(
                "[LOGGER WARNING] Logging system shutting down with {} failed sink writes (failure rate: {:.2}%)",
                failures,
                self.metrics.failure_rate()
            );
        }
    }
}

impl fmt::Debug for LoggingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingSystem")
            .field("root_level", &self.root.level)
            .field("loggers", &self.logger_names())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Named entry point for emitting records
///
/// Cheap to create; borrows the system it came from.
#[derive(Clone)]
pub struct Logger<'a> {
    system: &'a LoggingSystem,
    name: String,
}

impl<'a> Logger<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle for `self.name + "." + suffix`
    pub fn child(&self, suffix: &str) -> Logger<'a> {
        let name = if self.name == ROOT_LOGGER_NAME {
            suffix.to_string()
        } else {
            format!("{}.{}", self.name, suffix)
        };
        self.system.logger(&name)
    }

    pub fn effective_level(&self) -> LevelSetting {
        self.system.effective_level(&self.name)
    }

    pub fn is_enabled_for(&self, level: LogLevel) -> bool {
        self.system.is_enabled_for(&self.name, level)
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        self.system.log_record(&self.name, level, message.as_ref(), None);
    }

    /// Emit with call-site information; used by the logging macros
    pub fn log_at(
        &self,
        level: LogLevel,
        message: impl AsRef<str>,
        file: &str,
        line: u32,
        module_path: &str,
    ) {
        self.system
            .log_record(&self.name, level, message.as_ref(), Some((file, line, module_path)));
    }

    #[inline]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warning(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warning, message);
    }

    #[inline]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn critical(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Critical, message);
    }

    /// Log `err` and its `source()` chain at `ERROR`, after `message` when it
    /// is non-empty.
    ///
    /// Each cause follows a `caused by:` marker on what would be a new line;
    /// line breaks are escaped like any other message, so the record stays
    /// on one line.
    pub fn exception(&self, message: impl AsRef<str>, err: &dyn std::error::Error) {
        self.log(LogLevel::Error, render_exception(message.as_ref(), err));
    }

    /// [`Logger::exception`] with call-site information; used by `exception!`
    pub fn exception_at(
        &self,
        message: impl AsRef<str>,
        err: &dyn std::error::Error,
        file: &str,
        line: u32,
        module_path: &str,
    ) {
        let message = render_exception(message.as_ref(), err);
        self.log_at(LogLevel::Error, message, file, line, module_path);
    }
}

fn render_exception(message: &str, err: &dyn std::error::Error) -> String {
    let mut out = if message.is_empty() {
        err.to_string()
    } else {
        format!("{}: {}", message, err)
    };
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\ncaused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

impl fmt::Debug for Logger<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("effective_level", &self.effective_level())
            .finish()
    }
}

/// Builder for constructing a [`LoggingSystem`] with a fluent API
pub struct LoggingSystemBuilder {
    root: LoggerSettings,
    loggers: BTreeMap<String, LoggerSettings>,
    handlers: BTreeMap<String, Arc<Handler>>,
    clock: Arc<dyn Clock>,
    disable_existing_loggers: bool,
}

impl LoggingSystemBuilder {
    /// Root at `WARNING`, no handlers, wall clock
    pub fn new() -> Self {
        Self {
            root: LoggerSettings::new(LogLevel::Warning.into()),
            loggers: BTreeMap::new(),
            handlers: BTreeMap::new(),
            clock: Arc::new(SystemClock),
            disable_existing_loggers: true,
        }
    }

    /// Register a handler under its own name, replacing one of the same name
    #[must_use = "builder methods return a new value"]
    pub fn handler(mut self, handler: Handler) -> Self {
        self.handlers.insert(handler.name().to_string(), Arc::new(handler));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn root(mut self, settings: LoggerSettings) -> Self {
        self.root = settings;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn logger(mut self, name: impl Into<String>, settings: LoggerSettings) -> Self {
        self.loggers.insert(name.into(), settings);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn disable_existing_loggers(mut self, disable: bool) -> Self {
        self.disable_existing_loggers = disable;
        self
    }

    /// Resolve handler references and build the system
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Reference`] if a logger names a handler that was
    /// never registered.
    pub fn build(self) -> Result<LoggingSystem> {
        let root = Self::resolve(&self.handlers, "root", &self.root)?;
        let mut loggers = HashMap::with_capacity(self.loggers.len());
        for (name, settings) in &self.loggers {
            let node = Self::resolve(&self.handlers, &format!("loggers.{}", name), settings)?;
            loggers.insert(name.clone(), node);
        }

        Ok(LoggingSystem {
            root,
            loggers,
            handlers: self.handlers,
            clock: self.clock,
            metrics: LoggerMetrics::new(),
            disable_existing_loggers: self.disable_existing_loggers,
        })
    }

    fn resolve(
        handlers: &BTreeMap<String, Arc<Handler>>,
        path: &str,
        settings: &LoggerSettings,
    ) -> Result<LoggerNode> {
        let resolved = settings
            .handlers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                handlers.get(name).cloned().ok_or_else(|| {
                    LoggerError::reference(format!("{}.handlers[{}]", path, idx), "handler", name)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(LoggerNode {
            level: settings.level,
            propagate: settings.propagate,
            handlers: resolved,
        })
    }
}

impl Default for LoggingSystemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Appender, Formatter};
    use parking_lot::Mutex;

    type Lines = Arc<Mutex<Vec<String>>>;

    struct Collecting(Lines);

    impl Appender for Collecting {
        fn append(&mut self, _entry: &LogEntry, formatted: &str) -> Result<()> {
            self.0.lock().push(formatted.to_string());
            Ok(())
        }
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            "collecting"
        }
    }

    fn collecting(name: &str, level: LevelSetting) -> (Handler, Lines) {
        let lines = Lines::default();
        let formatter = Formatter::new(
            "%(name)s:%(levelname)s:%(message)s",
            crate::core::FormatStyle::Percent,
            None,
        )
        .unwrap();
        let handler = Handler::new(
            name,
            SinkKind::Custom,
            level,
            Some("plain".to_string()),
            Arc::new(formatter),
            Box::new(Collecting(Arc::clone(&lines))),
        );
        (handler, lines)
    }

    #[test]
    fn test_effective_level_inherits_from_nearest_ancestor() {
        let system = LoggingSystem::builder()
            .root(LoggerSettings::new(LogLevel::Error.into()))
            .logger("solar", LoggerSettings::new(LogLevel::Debug.into()))
            .logger("solar.home", LoggerSettings::default())
            .build()
            .unwrap();

        assert_eq!(system.effective_level("solar.home.charger"), LogLevel::Debug.into());
        assert_eq!(system.effective_level("solar.home"), LogLevel::Debug.into());
        assert_eq!(system.effective_level("other"), LogLevel::Error.into());
        assert_eq!(system.effective_level("solarized"), LogLevel::Error.into());
        assert_eq!(system.root().effective_level(), LogLevel::Error.into());
    }

    #[test]
    fn test_propagation_reaches_root_handlers() {
        let (root_handler, root_lines) = collecting("root_sink", LevelSetting::NotSet);
        let (app_handler, app_lines) = collecting("app_sink", LevelSetting::NotSet);

        let system = LoggingSystem::builder()
            .handler(root_handler)
            .handler(app_handler)
            .root(LoggerSettings::new(LogLevel::Info.into()).with_handlers(["root_sink"]))
            .logger("app", LoggerSettings::default().with_handlers(["app_sink"]))
            .build()
            .unwrap();

        system.logger("app.db").info("connected");

        assert_eq!(*app_lines.lock(), vec!["app.db:INFO:connected".to_string()]);
        assert_eq!(*root_lines.lock(), vec!["app.db:INFO:connected".to_string()]);
    }

    #[test]
    fn test_propagate_false_stops_chain() {
        let (root_handler, root_lines) = collecting("root_sink", LevelSetting::NotSet);
        let (app_handler, app_lines) = collecting("app_sink", LevelSetting::NotSet);

        let system = LoggingSystem::builder()
            .handler(root_handler)
            .handler(app_handler)
            .root(LoggerSettings::new(LogLevel::Debug.into()).with_handlers(["root_sink"]))
            .logger(
                "app",
                LoggerSettings::default()
                    .with_handlers(["app_sink"])
                    .with_propagate(false),
            )
            .build()
            .unwrap();

        system.logger("app").warning("isolated");

        assert_eq!(app_lines.lock().len(), 1);
        assert!(root_lines.lock().is_empty());
    }

    #[test]
    fn test_logger_level_filters_before_handlers() {
        let (handler, lines) = collecting("sink", LevelSetting::NotSet);
        let system = LoggingSystem::builder()
            .handler(handler)
            .root(LoggerSettings::new(LogLevel::Warning.into()).with_handlers(["sink"]))
            .build()
            .unwrap();

        let logger = system.logger("svc");
        logger.info("dropped");
        logger.warning("kept");

        assert_eq!(*lines.lock(), vec!["svc:WARNING:kept".to_string()]);
        assert_eq!(system.metrics().filtered_count(), 1);
        assert_eq!(system.metrics().emitted_count(), 1);
    }

    #[test]
    fn test_unknown_handler_reference() {
        let err = LoggingSystem::builder()
            .root(LoggerSettings::default().with_handlers(["missing"]))
            .build()
            .unwrap_err();
        assert!(err.is_reference());
        assert!(err.to_string().contains("root.handlers[0]"));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("charger did not answer")]
    struct ChargerTimeout {
        #[source]
        source: std::io::Error,
    }

    #[test]
    fn test_exception_renders_source_chain_on_one_line() {
        let (handler, lines) = collecting("sink", LevelSetting::NotSet);
        let system = LoggingSystem::builder()
            .handler(handler)
            .root(LoggerSettings::new(LogLevel::Info.into()).with_handlers(["sink"]))
            .build()
            .unwrap();
        let err = ChargerTimeout {
            source: std::io::Error::new(std::io::ErrorKind::TimedOut, "read timed out\nafter 15s"),
        };

        system.logger("program").exception("set_charger failed", &err);
        system.logger("program").exception("", &err);

        assert_eq!(
            *lines.lock(),
            vec![
                "program:ERROR:set_charger failed: charger did not answer\\ncaused by: read timed out\\nafter 15s"
                    .to_string(),
                "program:ERROR:charger did not answer\\ncaused by: read timed out\\nafter 15s".to_string(),
            ]
        );
    }

    #[test]
    fn test_exception_respects_level() {
        let (handler, lines) = collecting("sink", LevelSetting::NotSet);
        let system = LoggingSystem::builder()
            .handler(handler)
            .root(LoggerSettings::new(LogLevel::Critical.into()).with_handlers(["sink"]))
            .build()
            .unwrap();

        let err = std::io::Error::other("boom");
        system.logger("program").exception("ignored", &err);
        assert!(lines.lock().is_empty());
        assert_eq!(system.metrics().filtered_count(), 1);
    }

    #[test]
    fn test_child_names() {
        let system = LoggingSystem::builder().build().unwrap();
        assert_eq!(system.root().child("app").name(), "app");
        assert_eq!(system.logger("app").child("db").name(), "app.db");
        assert_eq!(system.logger("").name(), ROOT_LOGGER_NAME);
    }

    #[test]
    fn test_handler_bindings_sorted() {
        let (b, _) = collecting("b", LogLevel::Error.into());
        let (a, _) = collecting("a", LevelSetting::NotSet);
        let system = LoggingSystem::builder().handler(b).handler(a).build().unwrap();

        let names: Vec<_> = system.handler_bindings().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
