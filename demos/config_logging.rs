//! Configuration-driven logging example
//!
//! Loads `demos/logging_config.json`, which sends everything to stdout,
//! INFO and above to `logs/program.log`, and ERROR and above to
//! `logs/error.log`. Both files rotate at midnight and keep 10 backups.
//!
//! Run with: cargo run --example config_logging [path/to/logging_config.json]

use rust_log_config::config::{Loader, LoggingConfig};
use rust_log_config::{critical, debug, error, info, Result};
use std::env;
use std::path::PathBuf;

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/logging_config.json"));

    let config = LoggingConfig::from_path(&path)?;
    let system = match Loader::new().load(&config) {
        Ok(system) => system,
        Err(e) => {
            eprintln!("Failed to configure logging from {}: {}", path.display(), e);
            return Err(e);
        }
    };

    for binding in system.handler_bindings() {
        println!(
            "handler {:<20} class={:<20} level={:<8} format={:?}",
            binding.name, binding.kind, binding.level, binding.template
        );
    }
    println!();

    let program = system.logger("program");
    let ford = system.logger("fordconnect");

    info!(program, "Starting solar charging controller");
    debug!(ford, "Requesting access token");
    info!(program, "Solar production {} W, house load {} W", 4200, 1300);
    error!(ford, "Vehicle status request failed: HTTP {}", 503);
    critical!(program, "Charger stopped responding");

    system.shutdown();
    println!("\nWrote logs/program.log and logs/error.log");
    Ok(())
}
