//! Panic hook writing crash reports next to the logs

use backtrace::Backtrace;
use chrono::{DateTime, Local};
use std::any::Any;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};

/// Initialize the panic hook for crash reporting
pub fn init_panic_hook() {
    std::panic::set_hook(Box::new(panic_handler));
    tracing::debug!("Panic hook initialized");
}

fn panic_handler(info: &PanicHookInfo<'_>) {
    let now = Local::now();
    let location = info
        .location()
        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
        .unwrap_or_else(|| "<unknown>".to_string());
    let report = crash_report(
        now,
        std::thread::current().name().unwrap_or("<unnamed>"),
        &location,
        &payload_message(info.payload()),
        &format!("{:?}", Backtrace::new()),
    );

    eprintln!("{}", report);
    tracing::error!("{}", report);

    let dir = super::log_dir().join("crashes");
    let written = std::fs::create_dir_all(&dir)
        .and_then(|_| std::fs::write(crash_file_path(&dir, now), &report));
    if let Err(e) = written {
        eprintln!("Failed to write crash dump: {}", e);
    }
}

/// Text of a panic payload; `panic!` produces either `&str` or `String`
fn payload_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<unknown>".to_string())
}

fn crash_file_path(dir: &Path, at: DateTime<Local>) -> PathBuf {
    dir.join(format!("flipview_crash_{}.txt", at.format("%Y%m%d_%H%M%S")))
}

fn crash_report(
    at: DateTime<Local>,
    thread: &str,
    location: &str,
    message: &str,
    backtrace: &str,
) -> String {
    format!(
        "=== Flipview crashed ===\n\
         Timestamp: {}\n\
         Version: {}\n\
         Thread: {}\n\
         Location: {}\n\
         Message: {}\n\n\
         Backtrace:\n{}",
        at.to_rfc3339(),
        env!("CARGO_PKG_VERSION"),
        thread,
        location,
        message,
        backtrace
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_payload_message() {
        let static_str: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        let other: Box<dyn Any + Send> = Box::new(42u8);

        assert_eq!(payload_message(static_str.as_ref()), "boom");
        assert_eq!(payload_message(owned.as_ref()), "owned boom");
        assert_eq!(payload_message(other.as_ref()), "<unknown>");
    }

    #[test]
    fn test_crash_file_and_report() {
        let at = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let path = crash_file_path(Path::new("/logs/crashes"), at);
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("flipview_crash_20260304_050607.txt")
        );

        let report = crash_report(at, "main", "src/app.rs:1:2", "boom", "<frames>");
        assert!(report.contains("Thread: main"));
        assert!(report.contains("Location: src/app.rs:1:2"));
        assert!(report.contains("Message: boom"));
        assert!(report.ends_with("<frames>"));
    }
}
