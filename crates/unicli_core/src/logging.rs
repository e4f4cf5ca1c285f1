//! Rolling file logs for the organizer core.
//!
//! # Responsibility
//! - Start the `flexi_logger` backend once per process, writing
//!   `<log_dir>/unicli_rCURRENT.log` with size-based rotation.
//! - Record panics as single-line `event=panic_captured` entries.
//!
//! # Invariants
//! - Records are single-line `key=value` events; titles, descriptions and
//!   note bodies never reach the log.
//! - A second init with the same level and directory is a no-op; any other
//!   combination is rejected with [`LoggingError::AlreadyInitialized`].

use crate::config::CoreConfig;
use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::panic::{self, PanicHookInfo};
use std::path::{Path, PathBuf};
use thiserror::Error;

const LOG_FILE_BASENAME: &str = "unicli";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 5;
const PANIC_PAYLOAD_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unsupported log level `{0}`; expected trace|debug|info|warn|error")]
    UnsupportedLevel(String),
    #[error("log directory must be absolute, got {0:?}")]
    RelativeLogDir(PathBuf),
    #[error("failed to create log directory `{path}`: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to start logger: {0}")]
    Backend(#[from] FlexiLoggerError),
    #[error(
        "logging already active ({active_level} at {active_dir:?}); cannot switch to {requested_level} at {requested_dir:?}"
    )]
    AlreadyInitialized {
        active_level: &'static str,
        active_dir: PathBuf,
        requested_level: &'static str,
        requested_dir: PathBuf,
    },
}

struct ActiveLogger {
    level: &'static str,
    log_dir: PathBuf,
    _handle: LoggerHandle,
}

impl ActiveLogger {
    fn accept(&self, level: &'static str, log_dir: &Path) -> Result<(), LoggingError> {
        if self.level == level && self.log_dir == log_dir {
            return Ok(());
        }
        Err(LoggingError::AlreadyInitialized {
            active_level: self.level,
            active_dir: self.log_dir.clone(),
            requested_level: level,
            requested_dir: log_dir.to_path_buf(),
        })
    }
}

/// Starts file logging at `level` under `log_dir`.
///
/// # Errors
/// - Unknown `level`, relative `log_dir`, or a directory that cannot be
///   created.
/// - Logging already active with a different level or directory.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<(), LoggingError> {
    let level = parse_level(level)?;
    if !log_dir.is_absolute() {
        return Err(LoggingError::RelativeLogDir(log_dir.to_path_buf()));
    }

    if let Some(active) = ACTIVE.get() {
        return active.accept(level, log_dir);
    }

    ACTIVE
        .get_or_try_init(|| start_backend(level, log_dir))?
        .accept(level, log_dir)
}

/// Starts logging with the level and directory of a resolved config.
pub fn init_from_config(config: &CoreConfig) -> Result<(), LoggingError> {
    init_logging(&config.log_level, &config.log_dir)
}

/// `(level, log_dir)` of the running logger, if any.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE
        .get()
        .map(|active| (active.level, active.log_dir.clone()))
}

/// `debug` in debug builds, `info` in release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn parse_level(level: &str) -> Result<&'static str, LoggingError> {
    let level = match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => return Err(LoggingError::UnsupportedLevel(level.to_string())),
    };
    Ok(level)
}

fn start_backend(level: &'static str, log_dir: &Path) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDir {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let handle = Logger::try_with_str(level)?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()?;

    install_panic_hook();
    info!(
        "event=logging_start module=core status=ok version={} os={} level={} log_dir={}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        level,
        log_dir.display()
    );

    Ok(ActiveLogger {
        level,
        log_dir: log_dir.to_path_buf(),
        _handle: handle,
    })
}

/// Runs inside the `ACTIVE` initializer, so at most once.
fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        error!(
            "event=panic_captured module=core status=error location={location} payload={}",
            panic_payload(info)
        );
        previous(info);
    }));
}

fn panic_payload(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    let text = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    single_line(text, PANIC_PAYLOAD_LIMIT)
}

/// Folds line breaks to spaces and caps at `limit` chars.
fn single_line(text: &str, limit: usize) -> String {
    let mut line: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .take(limit)
        .collect();
    if text.chars().nth(limit).is_some() {
        line.push_str("...");
    }
    line
}
