//! Basic usage without a configuration document
//!
//! Assembles a logging system by hand: a colored console handler on the root
//! logger and a plain file handler for one subsystem.
//!
//! Run with: cargo run --example basic_usage

use rust_log_config::prelude::*;
use rust_log_config::{info, warning};
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Rust Log Config - Basic Usage Example ===\n");

    let console_format = Formatter::new("%(levelname)-8s %(name)s: %(message)s", FormatStyle::Percent, None)
        .map_err(|e| LoggerError::schema("console", e))?;
    let file_format = Formatter::new(
        "{asctime} [{threadName}] {levelname} {message}",
        FormatStyle::Brace,
        Some("%H:%M:%S"),
    )
    .map_err(|e| LoggerError::schema("file", e))?;

    let system = LoggingSystem::builder()
        .handler(Handler::new(
            "console",
            SinkKind::Stream,
            LevelSetting::NotSet,
            None,
            Arc::new(console_format),
            Box::new(ConsoleAppender::stdout().with_colors(true)),
        ))
        .handler(Handler::new(
            "charger_file",
            SinkKind::File,
            LogLevel::Info.into(),
            None,
            Arc::new(file_format),
            Box::new(FileAppender::new("logs/charger.log")?),
        ))
        .root(LoggerSettings::new(LogLevel::Debug.into()).with_handlers(["console"]))
        .logger("solar.charger", LoggerSettings::default().with_handlers(["charger_file"]))
        .build()?;

    println!("1. Logging at different levels:");
    let root = system.root();
    root.debug("This is a debug message");
    root.info("This is an info message");
    root.warning("This is a warning message");
    root.error("This is an error message");
    root.critical("This is a critical message");

    println!("\n2. Hierarchical loggers:");
    let charger = system.logger("solar.charger");
    charger.debug("only on the console");
    info!(charger, "charging at {} A", 16);
    warning!(charger.child("meter"), "meter reading is {} minutes old", 12);

    println!("\n3. Metrics:");
    println!("   emitted:  {}", system.metrics().emitted_count());
    println!("   filtered: {}", system.metrics().filtered_count());

    system.flush()?;
    println!("\nDone. See logs/charger.log for the file output.");
    Ok(())
}
