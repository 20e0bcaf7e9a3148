use std::any::Any;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_PREFIX: &str = "clipfind";
const LOG_FILE_SUFFIX: &str = "log";
const LOG_FILTER_ENV: &str = "CLIPFIND_LOG";
/// Daily files kept on disk, today's included.
const KEPT_LOG_FILES: usize = 5;

static PANIC_HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

pub fn logs_dir() -> PathBuf {
    crate::config::stable_app_data_dir().join("logs")
}

/// `clipfind.YYYY-MM-DD.log` files in `log_dir`, rolled daily and pruned to the newest few.
pub fn file_appender(log_dir: &Path) -> io::Result<RollingFileAppender> {
    fs::create_dir_all(log_dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(KEPT_LOG_FILES)
        .build(log_dir)
        .map_err(io::Error::other)
}

/// Installs the stderr and file subscribers. Keep the guard alive until exit
/// so buffered file lines are flushed.
pub fn init(default_level: &str) -> io::Result<WorkerGuard> {
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender(&logs_dir())?);

    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()
        .map_err(io::Error::other)?;

    install_panic_hook();
    Ok(guard)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text
    } else {
        "non-string panic payload"
    }
}

/// Routes panics into the log before the default hook prints them.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.get_or_init(|| {
        let prior = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let message = panic_message(info.payload());
            match info.location() {
                Some(at) => tracing::error!(file = at.file(), line = at.line(), "panic: {message}"),
                None => tracing::error!("panic: {message}"),
            }
            prior(info);
        }));
    });
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{file_appender, logs_dir, panic_message};

    #[test]
    fn logs_dir_uses_stable_app_data_layout() {
        let dir = logs_dir();
        assert!(dir
            .to_string_lossy()
            .to_ascii_lowercase()
            .contains("clipfind"));
    }

    #[test]
    fn appender_writes_dated_file_in_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let mut appender = file_appender(&log_dir).unwrap();
        appender.write_all(b"hello\n").unwrap();
        appender.flush().unwrap();

        let names: Vec<String> = std::fs::read_dir(&log_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("clipfind."));
        assert!(names[0].ends_with(".log"));
    }

    #[test]
    fn panic_payloads_become_messages() {
        let borrowed: Box<dyn std::any::Any + Send> = Box::new("boom");
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(borrowed.as_ref()), "boom");
        assert_eq!(panic_message(owned.as_ref()), "bang");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
