//! Command-line interface parsing for lingolah
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a validated [`StartupConfig`].

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::cache::FetchPolicy;
use crate::glossary::{Glossary, GlossaryError};
use crate::provider::gemini::DEFAULT_MODEL;
use crate::provider::DEFAULT_REGION;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The timeout must be at least one second
    #[error("Invalid timeout: must be greater than 0 seconds")]
    InvalidTimeout,

    /// The region code is empty or contains whitespace
    #[error("Invalid region: '{0}'. Use a short code such as MY")]
    InvalidRegion(String),

    /// The model name is empty
    #[error("Invalid model: the model name cannot be empty")]
    EmptyModel,

    /// The glossary file could not be loaded
    #[error(transparent)]
    Glossary(#[from] GlossaryError),
}

/// Lingo-Lah - browse Malaysian lingo and get explanations on demand
#[derive(Parser, Debug)]
#[command(name = "lingolah")]
#[command(about = "Your local lingo guide: Malaysian slang explained on demand")]
#[command(version)]
pub struct Cli {
    /// Gemini model used for explanations
    #[arg(long, value_name = "NAME", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Region whose slang the terms belong to
    #[arg(long, value_name = "CODE", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Seconds to wait for a whole explanation before giving up
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub timeout: u64,

    /// Wait for the complete explanation instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Allow fetches for different terms to run at the same time
    ///
    /// By default only one explanation is fetched at a time and other
    /// selections wait until it finishes.
    #[arg(long)]
    pub per_term: bool,

    /// Load categories and terms from a JSON file instead of the built-in list
    #[arg(long, value_name = "PATH")]
    pub glossary: Option<PathBuf>,

    /// Write logs to this file instead of the default data directory
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Gemini model name
    pub model: String,
    /// Region qualifier for prompts
    pub region: String,
    /// Timeout for a whole fetch
    pub timeout: Duration,
    /// Whether explanations are streamed
    pub streaming: bool,
    /// How many fetches may run at once
    pub policy: FetchPolicy,
    /// The catalog to browse
    pub glossary: Glossary,
    /// Explicit log file location
    pub log_file: Option<PathBuf>,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            region: DEFAULT_REGION.to_string(),
            timeout: Duration::from_secs(60),
            streaming: true,
            policy: FetchPolicy::SessionExclusive,
            glossary: Glossary::builtin(),
            log_file: None,
        }
    }
}

/// Validates a region code argument
///
/// # Returns
/// * `Ok(String)` with the trimmed code in upper case
/// * `Err(CliError::InvalidRegion)` if the code is empty or contains whitespace
pub fn parse_region_arg(s: &str) -> Result<String, CliError> {
    let code = s.trim();
    if code.is_empty() || code.chars().any(char::is_whitespace) {
        return Err(CliError::InvalidRegion(s.to_string()));
    }
    Ok(code.to_uppercase())
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// Loads the glossary file when one is given.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if any argument is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.timeout == 0 {
            return Err(CliError::InvalidTimeout);
        }
        let model = cli.model.trim();
        if model.is_empty() {
            return Err(CliError::EmptyModel);
        }
        let region = parse_region_arg(&cli.region)?;

        let glossary = match &cli.glossary {
            Some(path) => Glossary::from_json_file(path)?,
            None => Glossary::builtin(),
        };

        Ok(StartupConfig {
            model: model.to_string(),
            region,
            timeout: Duration::from_secs(cli.timeout),
            streaming: !cli.no_stream,
            policy: if cli.per_term {
                FetchPolicy::PerTerm
            } else {
                FetchPolicy::SessionExclusive
            },
            glossary,
            log_file: cli.log_file.clone(),
        })
    }
}
