//! Criterion benchmarks for rust_log_config

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_log_config::config::Loader;
use rust_log_config::core::{Appender, LogEntry, Result};
use rust_log_config::prelude::*;
use std::sync::Arc;

const CONFIG: &str = r#"{
    "version": 1,
    "formatters": { "simple": { "format": "%(asctime)s - %(name)s - %(levelname)s - %(message)s" } },
    "handlers": { "console": { "class": "stream", "level": "INFO", "formatter": "simple" } },
    "root": { "handlers": [], "level": "INFO" }
}"#;

/// Discards everything, so benchmarks measure dispatch and formatting only
struct NullAppender;

impl Appender for NullAppender {
    fn append(&mut self, _entry: &LogEntry, formatted: &str) -> Result<()> {
        black_box(formatted);
        Ok(())
    }
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &str {
        "null"
    }
}

fn null_system(template: &str) -> LoggingSystem {
    let formatter = Formatter::new(template, FormatStyle::Percent, None).unwrap();
    LoggingSystem::builder()
        .handler(Handler::new(
            "null",
            SinkKind::Custom,
            LevelSetting::NotSet,
            None,
            Arc::new(formatter),
            Box::new(NullAppender),
        ))
        .root(LoggerSettings::new(LogLevel::Info.into()).with_handlers(["null"]))
        .build()
        .unwrap()
}

// ============================================================================
// Loading
// ============================================================================

fn bench_config_loading(c: &mut Criterion) {
    let mut group = c.benchmark_group("config_loading");
    group.throughput(Throughput::Elements(1));

    group.bench_function("parse_and_validate", |b| {
        let loader = Loader::new();
        b.iter(|| {
            let config = LoggingConfig::from_json_str(black_box(CONFIG)).unwrap();
            black_box(loader.validate(&config).unwrap())
        });
    });

    group.finish();
}

// ============================================================================
// Formatting
// ============================================================================

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatting");
    group.throughput(Throughput::Elements(1));

    let entry = LogEntry::new("solar.home", LogLevel::Info, "charging at 16 A", Utc::now());
    let templates = [
        ("message_only", "%(message)s", FormatStyle::Percent),
        ("percent_full", "%(asctime)s - %(name)s - %(levelname)-8s - %(message)s", FormatStyle::Percent),
        ("brace_full", "{asctime} - {name} - {levelname:<8} - {message}", FormatStyle::Brace),
    ];
    for (label, template, style) in templates {
        let formatter = Formatter::new(template, style, None).unwrap();
        group.bench_function(label, |b| b.iter(|| black_box(formatter.format(black_box(&entry)))));
    }

    group.finish();
}

// ============================================================================
// Dispatch
// ============================================================================

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");
    group.throughput(Throughput::Elements(1));

    let system = null_system("%(levelname)s %(message)s");
    let logger = system.logger("solar.home.charger");

    group.bench_function("filtered_debug", |b| {
        b.iter(|| logger.debug(black_box("skipped")));
    });

    group.bench_function("emitted_info", |b| {
        b.iter(|| logger.info(black_box("delivered")));
    });

    group.finish();
}

fn bench_concurrent_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_logging");
    const THREADS: usize = 4;
    const PER_THREAD: usize = 250;
    group.throughput(Throughput::Elements((THREADS * PER_THREAD) as u64));

    let system = null_system("%(threadName)s %(message)s");
    group.bench_function("four_threads", |b| {
        b.iter(|| {
            std::thread::scope(|scope| {
                for _ in 0..THREADS {
                    let system = &system;
                    scope.spawn(move || {
                        let logger = system.logger("bench");
                        for i in 0..PER_THREAD {
                            logger.info(format!("record {}", i));
                        }
                    });
                }
            });
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_config_loading,
    bench_formatting,
    bench_level_filtering,
    bench_concurrent_logging
);
criterion_main!(benches);
