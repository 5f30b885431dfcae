use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_RETENTION_DAYS: u64 = 7;
const LOG_DIR_NAME: &str = "robot-data-editor";

/// Session logs live in the user's cache directory:
/// - Linux: ~/.cache/robot-data-editor/
/// - macOS: ~/Library/Caches/robot-data-editor/
/// - Windows: %LOCALAPPDATA%\robot-data-editor\
fn log_dir() -> io::Result<PathBuf> {
    let log_dir = dirs::cache_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Unable to determine user cache directory"))?
        .join(LOG_DIR_NAME);
    fs::create_dir_all(&log_dir)?;
    Ok(log_dir)
}

fn is_session_log(name: &str) -> bool {
    name.starts_with("session-") && name.ends_with(".log")
}

/// Removes session logs last modified more than `retention` ago.
fn cleanup_old_logs(log_dir: &Path, retention: Duration) {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };
    let now = SystemTime::now();
    for entry in entries.flatten() {
        let expired = entry
            .metadata()
            .ok()
            .filter(|metadata| metadata.is_file())
            .and_then(|metadata| metadata.modified().ok())
            .and_then(|modified| now.duration_since(modified).ok())
            .is_some_and(|age| age > retention);
        let is_log = entry.file_name().to_str().is_some_and(is_session_log);
        if expired && is_log {
            if let Err(e) = fs::remove_file(entry.path()) {
                eprintln!("Failed to remove old log file {:?}: {}", entry.path(), e);
            }
        }
    }
}

fn session_log_name() -> io::Result<String> {
    let timestamp = OffsetDateTime::now_utc()
        .format(format_description!("[year][month][day]-[hour][minute][second]"))
        .map_err(io::Error::other)?;
    Ok(format!("session-{}-{}.log", timestamp, std::process::id()))
}

/// A subscriber installed earlier (another test, an embedding process) is not an error.
fn tolerate_existing(result: Result<(), TryInitError>) -> io::Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.to_string().contains("already been set") || e.to_string().contains("SetLoggerError") => Ok(()),
        Err(e) => Err(io::Error::other(e)),
    }
}

/// Installs the global subscriber: stderr at `log_level` (else `RUST_LOG`,
/// else `info`), plus a DEBUG session file when `enable_file_logging` is set.
///
/// The returned guard flushes the file writer on drop and must be kept alive.
pub fn init_logger(no_color: bool, log_level: Option<&str>, enable_file_logging: bool) -> io::Result<WorkerGuard> {
    let timer = fmt::time::OffsetTime::new(
        UtcOffset::UTC,
        format_description!("[[[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z]"),
    );

    let stderr_filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(timer.clone())
        .with_ansi(!no_color)
        .with_filter(stderr_filter);

    if !enable_file_logging {
        let (_, guard) = tracing_appender::non_blocking(io::sink());
        tolerate_existing(tracing_subscriber::registry().with(stderr_layer).try_init())?;
        return Ok(guard);
    }

    let log_dir = log_dir()?;
    cleanup_old_logs(&log_dir, Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60));
    let log_path = log_dir.join(session_log_name()?);
    let file = fs::OpenOptions::new().create(true).append(true).open(&log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_timer(timer)
        .with_ansi(false)
        .with_filter(EnvFilter::new("debug"));

    tolerate_existing(tracing_subscriber::registry().with(stderr_layer).with(file_layer).try_init())?;
    eprintln!("Logging to file: {:?}", log_path);
    Ok(guard)
}
