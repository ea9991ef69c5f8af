//! Structured logging setup with tracing

use once_cell::sync::OnceCell;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_ENV: &str = "FLIPVIEW_LOG";
const DEFAULT_DIRECTIVES: &str = "info,winit=warn";

/// Flush guard of the file writer; dropping it would lose buffered lines.
static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Initialize the logging system
pub fn init_logging() -> anyhow::Result<()> {
    let log_dir = super::log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "flipview.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    if FILE_GUARD.set(guard).is_err() {
        anyhow::bail!("logging already initialized");
    }

    // FLIPVIEW_LOG wins over RUST_LOG
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    #[cfg(debug_assertions)]
    {
        // Development: pretty console output + file
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init()?;
    }

    #[cfg(not(debug_assertions))]
    {
        // Release: JSON file only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init()?;
    }

    tracing::info!(dir = %log_dir.display(), "Logging initialized");
    Ok(())
}

/// Clean up log files older than specified days
pub fn cleanup_old_logs(days: u32) -> anyhow::Result<usize> {
    cleanup_logs_in(&super::log_dir(), days)
}

/// Clean up `.log` files in `log_dir` whose modification time is older than `days`
pub fn cleanup_logs_in(log_dir: &Path, days: u32) -> anyhow::Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let threshold = SystemTime::now() - Duration::from_secs(days as u64 * 24 * 60 * 60);
    let mut deleted = 0;

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        // Rolling appender names files "flipview.log.YYYY-MM-DD"
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".log") || n.contains(".log."));
        if !is_log {
            continue;
        }

        let modified = entry.metadata().and_then(|m| m.modified());
        if let Ok(modified) = modified {
            if modified < threshold && std::fs::remove_file(&path).is_ok() {
                deleted += 1;
                tracing::debug!("Deleted old log: {:?}", path);
            }
        }
    }

    tracing::info!("Cleaned up {} old log files", deleted);
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(cleanup_logs_in(&missing, 7).unwrap(), 0);
    }

    #[test]
    fn test_cleanup_keeps_fresh_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("flipview.log.2026-01-01"), "x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        // Freshly written files are younger than any positive threshold
        assert_eq!(cleanup_logs_in(dir.path(), 1).unwrap(), 0);
        std::thread::sleep(Duration::from_millis(20));
        // A zero-day threshold removes every log but leaves other files alone
        assert_eq!(cleanup_logs_in(dir.path(), 0).unwrap(), 1);
        assert!(dir.path().join("notes.txt").exists());
    }
}
