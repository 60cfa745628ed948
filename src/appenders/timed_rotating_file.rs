//! Time-rotating file appender
//!
//! Appends records to a file and, once the clock reaches the next scheduled
//! boundary, moves the file aside under a timestamp suffix, starts a fresh
//! one, and prunes old backups beyond the configured count.

use super::file::{ensure_parent_dir, open_log_file, FileMode};
use crate::core::{Appender, Clock, LogEntry, LoggerError, Result, SystemClock};
use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{DateTime, Datelike, Days, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;

/// Boundary that triggers a rotation
///
/// # Examples
///
/// ```
/// use rust_log_config::appenders::RotationTrigger;
///
/// assert_eq!("midnight".parse(), Ok(RotationTrigger::Midnight));
/// assert_eq!("W6".parse(), Ok(RotationTrigger::Weekday(6)));
/// assert!("W7".parse::<RotationTrigger>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationTrigger {
    /// Every `interval` seconds
    Seconds,
    /// Every `interval` minutes
    Minutes,
    /// Every `interval` hours
    Hours,
    /// Every `interval` days
    Days,
    /// At midnight
    Midnight,
    /// At the midnight that starts the given weekday (0 = Monday)
    Weekday(u8),
}

impl FromStr for RotationTrigger {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let trigger = match upper.as_str() {
            "S" => RotationTrigger::Seconds,
            "M" => RotationTrigger::Minutes,
            "H" => RotationTrigger::Hours,
            "D" => RotationTrigger::Days,
            "MIDNIGHT" => RotationTrigger::Midnight,
            w if w.len() == 2 && w.starts_with('W') => match w[1..].parse::<u8>() {
                Ok(day) if day <= 6 => RotationTrigger::Weekday(day),
                _ => return Err(format!("invalid weekday rotation '{}', expected W0-W6", s)),
            },
            _ => {
                return Err(format!(
                    "unrecognized rotation trigger '{}', expected S, M, H, D, MIDNIGHT or W0-W6",
                    s
                ))
            }
        };
        Ok(trigger)
    }
}

impl fmt::Display for RotationTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationTrigger::Seconds => f.write_str("S"),
            RotationTrigger::Minutes => f.write_str("M"),
            RotationTrigger::Hours => f.write_str("H"),
            RotationTrigger::Days => f.write_str("D"),
            RotationTrigger::Midnight => f.write_str("MIDNIGHT"),
            RotationTrigger::Weekday(day) => write!(f, "W{}", day),
        }
    }
}

impl RotationTrigger {
    /// strftime pattern of the suffix appended to rotated files
    pub fn suffix_format(&self) -> &'static str {
        match self {
            RotationTrigger::Seconds => "%Y-%m-%d_%H-%M-%S",
            RotationTrigger::Minutes => "%Y-%m-%d_%H-%M",
            RotationTrigger::Hours => "%Y-%m-%d_%H",
            RotationTrigger::Days | RotationTrigger::Midnight | RotationTrigger::Weekday(_) => {
                "%Y-%m-%d"
            }
        }
    }
}

/// Configuration for a time-rotating file appender
///
/// # Examples
///
/// ```
/// use rust_log_config::appenders::{RotationPolicy, RotationTrigger};
///
/// // Rotate at midnight, keep ten days of history
/// let policy = RotationPolicy::new(RotationTrigger::Midnight).with_backup_count(10);
///
/// // Rotate every six hours in UTC, gzip the backups
/// let policy = RotationPolicy::new(RotationTrigger::Hours)
///     .with_interval(6)
///     .with_utc(true)
///     .with_compression(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    pub trigger: RotationTrigger,
    /// Multiplier for S/M/H/D triggers; at least 1
    pub interval: u32,
    /// Rotated files to keep; 0 keeps all
    pub backup_count: usize,
    /// Compute boundaries and suffixes in UTC instead of local time
    pub utc: bool,
    /// Gzip each rotated file
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::new(RotationTrigger::Hours)
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new(trigger: RotationTrigger) -> Self {
        Self {
            trigger,
            interval: 1,
            backup_count: 0,
            utc: false,
            compress: false,
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval.max(1);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_backup_count(mut self, count: usize) -> Self {
        self.backup_count = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_utc(mut self, utc: bool) -> Self {
        self.utc = utc;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    /// Length of one rotation period
    pub fn period(&self) -> chrono::Duration {
        let interval = i64::from(self.interval.max(1));
        match self.trigger {
            RotationTrigger::Seconds => chrono::Duration::seconds(interval),
            RotationTrigger::Minutes => chrono::Duration::minutes(interval),
            RotationTrigger::Hours => chrono::Duration::hours(interval),
            RotationTrigger::Days => chrono::Duration::days(interval),
            RotationTrigger::Midnight => chrono::Duration::days(1),
            RotationTrigger::Weekday(_) => chrono::Duration::days(7),
        }
    }

    /// First boundary strictly after `now`
    pub fn next_boundary(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if self.utc {
            self.boundary_in(now, &Utc)
        } else {
            self.boundary_in(now, &Local)
        }
    }

    /// Suffix for the file being closed at `boundary`: the start of its period
    pub fn suffix_for(&self, boundary: DateTime<Utc>) -> String {
        if self.utc {
            self.suffix_in(boundary, &Utc)
        } else {
            self.suffix_in(boundary, &Local)
        }
    }

    fn boundary_in<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
        let days_ahead = match self.trigger {
            RotationTrigger::Seconds
            | RotationTrigger::Minutes
            | RotationTrigger::Hours
            | RotationTrigger::Days => return now + self.period(),
            RotationTrigger::Midnight => 1,
            RotationTrigger::Weekday(day) => {
                let today = now.with_timezone(tz).weekday().num_days_from_monday();
                match (u32::from(day) + 7 - today) % 7 {
                    0 => 7,
                    n => n,
                }
            }
        };
        let date = now.with_timezone(tz).date_naive() + Days::new(u64::from(days_ahead));
        first_instant_of(date, tz).unwrap_or_else(|| now + chrono::Duration::days(i64::from(days_ahead)))
    }

    fn suffix_in<Tz: TimeZone>(&self, boundary: DateTime<Utc>, tz: &Tz) -> String {
        let pattern = self.trigger.suffix_format();
        let period_days = match self.trigger {
            RotationTrigger::Midnight => 1,
            RotationTrigger::Weekday(_) => 7,
            _ => {
                let start = boundary - self.period();
                return start.with_timezone(tz).naive_local().format(pattern).to_string();
            }
        };
        // Calendar periods are named by date; days may be 23 or 25 hours long
        let boundary_date = (boundary - chrono::Duration::seconds(1))
            .with_timezone(tz)
            .date_naive()
            + Days::new(1);
        (boundary_date - Days::new(period_days)).format(pattern).to_string()
    }

    fn is_valid_suffix(&self, suffix: &str) -> bool {
        let mut parsed = Parsed::new();
        parse(&mut parsed, suffix, StrftimeItems::new(self.trigger.suffix_format())).is_ok()
    }
}

/// Rotating file appender driven by a [`RotationPolicy`]
///
/// # Examples
///
/// ```no_run
/// use rust_log_config::appenders::{RotationPolicy, RotationTrigger, TimedRotatingFileAppender};
///
/// let policy = RotationPolicy::new(RotationTrigger::Midnight).with_backup_count(10);
/// let appender = TimedRotatingFileAppender::with_policy("logs/program.log", policy).unwrap();
/// ```
pub struct TimedRotatingFileAppender {
    base_path: PathBuf,
    policy: RotationPolicy,
    clock: Arc<dyn Clock>,
    writer: Option<BufWriter<File>>,
    rollover_at: DateTime<Utc>,
}

impl TimedRotatingFileAppender {
    /// Create an appender on the wall clock, opening the file now
    ///
    /// # Errors
    ///
    /// Returns a sink error if the directory or file cannot be created
    pub fn with_policy<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        Self::with_clock(path, policy, Arc::new(SystemClock), false)
    }

    /// Create an appender on an explicit clock; with `delay` the file is
    /// opened on the first record
    ///
    /// # Errors
    ///
    /// Returns a sink error if the directory or file cannot be created
    pub fn with_clock<P: AsRef<Path>>(
        path: P,
        policy: RotationPolicy,
        clock: Arc<dyn Clock>,
        delay: bool,
    ) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        ensure_parent_dir(&base_path)?;

        let writer = if delay {
            None
        } else {
            Some(BufWriter::new(open_log_file(&base_path, FileMode::Append)?))
        };

        // An existing file's period started when it was last written
        let now = clock.now();
        let start = fs::metadata(&base_path)
            .and_then(|meta| meta.modified())
            .map(|modified: SystemTime| DateTime::<Utc>::from(modified).min(now))
            .unwrap_or(now);
        let rollover_at = policy.next_boundary(start);

        Ok(Self {
            base_path,
            policy,
            clock,
            writer,
            rollover_at,
        })
    }

    pub fn path(&self) -> &Path {
        &self.base_path
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Instant at which the next write triggers a rotation
    pub fn next_rollover(&self) -> DateTime<Utc> {
        self.rollover_at
    }

    /// Rotated files that belong to this appender, oldest first
    pub fn backup_files(&self) -> Vec<PathBuf> {
        let Some(file_name) = self.base_path.file_name().and_then(|n| n.to_str()) else {
            return Vec::new();
        };
        let dir = match self.base_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let prefix = format!("{}.", file_name);

        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut backups: Vec<(String, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let suffix = name.strip_prefix(&prefix)?;
                let suffix = suffix.strip_suffix(".gz").unwrap_or(suffix);
                self.policy
                    .is_valid_suffix(suffix)
                    .then(|| (name.clone(), entry.path()))
            })
            .collect();
        backups.sort_by(|a, b| a.0.cmp(&b.0));
        backups.into_iter().map(|(_, path)| path).collect()
    }

    fn rotated_path(&self, suffix: &str) -> PathBuf {
        let mut name = self.base_path.as_os_str().to_owned();
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }

    fn rotate(&mut self, now: DateTime<Utc>) -> Result<()> {
        let target = self.base_path.display().to_string();

        // Flush and close the current file before it is renamed
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .map_err(|e| LoggerError::sink_io(&target, "flushing before rotation", e))?;
        }

        let rotated = self.rotated_path(&self.policy.suffix_for(self.rollover_at));
        for stale in [rotated.clone(), gz_path(&rotated)] {
            if stale.exists() {
                if let Err(e) = fs::remove_file(&stale) {
                    eprintln!(
                        "[LOGGER WARNING] Failed to replace existing backup {}: {}",
                        stale.display(),
                        e
                    );
                }
            }
        }

        if self.base_path.exists() {
            fs::rename(&self.base_path, &rotated)
                .map_err(|e| LoggerError::sink_io(&target, "renaming current log file", e))?;

            if self.policy.compress {
                if let Err(e) = compress_file(&rotated) {
                    eprintln!(
                        "[LOGGER WARNING] Failed to compress {}: {}. Keeping it uncompressed.",
                        rotated.display(),
                        e
                    );
                }
            }
        }

        self.delete_expired();

        self.writer = Some(BufWriter::new(open_log_file(&self.base_path, FileMode::Append)?));
        self.rollover_at = self.policy.next_boundary(now);
        Ok(())
    }

    /// Remove the oldest backups beyond `backup_count`; failures are reported
    /// and skipped so delivery never stalls on cleanup
    fn delete_expired(&self) {
        let keep = self.policy.backup_count;
        if keep == 0 {
            return;
        }
        let backups = self.backup_files();
        if backups.len() <= keep {
            return;
        }
        for expired in &backups[..backups.len() - keep] {
            if let Err(e) = fs::remove_file(expired) {
                eprintln!(
                    "[LOGGER WARNING] Failed to remove expired backup {}: {}",
                    expired.display(),
                    e
                );
            }
        }
    }
}

/// Local midnight of `date`, or the first instant after it when a DST
/// transition skips midnight
fn first_instant_of<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<DateTime<Utc>> {
    (0..=24 * 60).find_map(|minutes| {
        let local = date.and_time(NaiveTime::MIN) + chrono::Duration::minutes(minutes);
        tz.from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// Compress a rotated file in place, streaming through a temporary file so
/// the original is only removed after compression fully succeeds
fn compress_file(path: &Path) -> Result<()> {
    use std::io::BufReader;

    let gz = gz_path(path);
    let mut temp_name = gz.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_gz = PathBuf::from(temp_name);
    let target = path.display().to_string();

    let input = File::open(path).map_err(|e| LoggerError::sink_io(&target, "opening for compression", e))?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp_gz)
        .map_err(|e| LoggerError::sink_io(temp_gz.display().to_string(), "creating compressed file", e))?;
    let mut encoder =
        flate2::write::GzEncoder::new(BufWriter::with_capacity(64 * 1024, output), flate2::Compression::default());

    let streamed = std::io::copy(&mut reader, &mut encoder)
        .and_then(|_| encoder.finish())
        .and_then(|mut inner| inner.flush());
    if let Err(e) = streamed {
        let _ = fs::remove_file(&temp_gz);
        return Err(LoggerError::sink_io(&target, "compressing", e));
    }

    fs::rename(&temp_gz, &gz).map_err(|e| {
        let _ = fs::remove_file(&temp_gz);
        LoggerError::sink_io(gz.display().to_string(), "finalizing compressed file", e)
    })?;

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compression succeeded but failed to remove original file {}: {}",
            path.display(),
            e
        );
    }
    Ok(())
}

impl Appender for TimedRotatingFileAppender {
    fn name(&self) -> &str {
        "timed_rotating_file"
    }

    fn append(&mut self, _entry: &LogEntry, formatted: &str) -> Result<()> {
        let now = self.clock.now();
        if now >= self.rollover_at {
            if let Err(e) = self.rotate(now) {
                eprintln!(
                    "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                    e
                );
                // Retry at the next boundary rather than on every record
                self.rollover_at = self.policy.next_boundary(now);
            }
        }

        if self.writer.is_none() {
            self.writer = Some(BufWriter::new(open_log_file(&self.base_path, FileMode::Append)?));
        }
        let target = &self.base_path;
        let Some(writer) = self.writer.as_mut() else {
            return Err(LoggerError::sink(
                target.display().to_string(),
                "writing record",
                "Writer not initialized",
            ));
        };

        writer
            .write_all(formatted.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush())
            .map_err(|e| LoggerError::sink_io(target.display().to_string(), "writing record", e))
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::sink_io(self.base_path.display().to_string(), "flushing", e)
            })?;
        }
        Ok(())
    }
}

impl Drop for TimedRotatingFileAppender {
    fn drop(&mut self) {
        // Best effort flush; the writer releases the file handle when dropped
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}
