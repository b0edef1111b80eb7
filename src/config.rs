//! Runtime configuration read from the environment
//!
//! The API credential never comes from the command line. It is read from
//! `GEMINI_API_KEY`, optionally populated from a `.env` file in the working
//! directory.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Environment variable holding the Gemini API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable holding the log filter directive
pub const LOG_FILTER_ENV: &str = "LINGOLAH_LOG";

/// Loads `.env` (if present) and returns the API key
///
/// Returns `None` when the key is unset or blank. A missing key is not fatal:
/// each fetch reports it as a configuration failure.
pub fn load_api_key() -> Option<String> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
    }
    api_key_from(std::env::var(API_KEY_ENV).ok())
}

fn api_key_from(value: Option<String>) -> Option<String> {
    value
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

/// Returns the default log file path
///
/// Uses `~/.local/share/lingolah/lingolah.log` on Linux, or the equivalent
/// XDG data path on other platforms. Returns `None` if no home directory
/// can be determined.
pub fn default_log_path() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "lingolah")?;
    Some(project_dirs.data_dir().join("lingolah.log"))
}
