//! Flipview Logging & Observability Module
//!
//! Provides structured logging, log retention, and crash reports.

mod panic_hook;
mod logging;

pub use panic_hook::init_panic_hook;
pub use logging::{init_logging, cleanup_old_logs, cleanup_logs_in};

use std::path::PathBuf;
use directories::ProjectDirs;

/// Get the application log directory
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("com", "Flipview", "Flipview")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialize all observability features
pub fn init() -> anyhow::Result<()> {
    init_logging()?;
    init_panic_hook();
    Ok(())
}
