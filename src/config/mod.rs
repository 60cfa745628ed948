//! Configuration document and loader

pub mod loader;
pub mod schema;

pub use loader::{load, HandlerClass, HandlerPlan, LoadPlan, Loader, SinkPlan, SUPPORTED_VERSION};
pub use schema::{FormatterConfig, HandlerConfig, LevelValue, LoggerConfig, LoggingConfig};

use crate::core::{LoggingSystem, Result};
use std::path::Path;

impl LoggingSystem {
    /// Read a JSON document and load it.
    ///
    /// Relative file names resolve against the document's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut loader = Loader::new();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            loader = loader.with_base_dir(dir);
        }
        loader.load_path(path)
    }
}
