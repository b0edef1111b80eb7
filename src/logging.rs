//! File-based tracing setup
//!
//! The terminal belongs to the UI, so log output goes to a file.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{default_log_path, LOG_FILTER_ENV};

/// Errors that can occur while setting up logging
#[derive(Debug, Error)]
pub enum LoggingError {
    /// No explicit path and no home directory to derive one from
    #[error("No log file location available")]
    NoLogPath,

    /// The log file could not be created
    #[error("Failed to open log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber was already installed
    #[error("Failed to install log subscriber: {0}")]
    Init(String),
}

/// Installs the global tracing subscriber writing to `path` or the default
/// log location
///
/// The filter is read from `LINGOLAH_LOG` and defaults to `info`.
///
/// # Returns
/// The path of the log file in use
pub fn init(path: Option<PathBuf>) -> Result<PathBuf, LoggingError> {
    let path = path.or_else(default_log_path).ok_or(LoggingError::NoLogPath)?;
    let file = open_log_file(&path)?;

    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(path)
}

/// Opens the log file for appending, creating parent directories as needed
fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    let io_error = |source| LoggingError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_error)
}
