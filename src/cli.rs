//! Command-line interface parsing for scentdb
//!
//! This module handles parsing of CLI arguments using clap. Every load option
//! can also be supplied through an environment variable.

use chrono::Duration as ChronoDuration;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::gate::{GateConfig, DEFAULT_FRESHNESS_SECS};
use crate::source::DEFAULT_SHEET_URL;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The catalog URL is not an http(s) URL
    #[error("Invalid catalog URL: '{0}'. Expected an http:// or https:// URL")]
    InvalidUrl(String),

    /// The version tag is empty or contains unsupported characters
    #[error("Invalid version tag: '{0}'. Use letters, digits, '-' or '_'")]
    InvalidVersionTag(String),

    /// The watch interval is zero
    #[error("Invalid interval: must be at least 1 second")]
    InvalidInterval,

    /// No cache directory could be determined and none was given
    #[error("Could not determine a cache directory; pass --cache-dir")]
    NoCacheDir,
}

/// scentdb - Load, cache, and inspect the product catalog
#[derive(Parser, Debug)]
#[command(name = "scentdb")]
#[command(about = "Load, cache, and inspect a product catalog published as CSV")]
#[command(version)]
pub struct Cli {
    /// CSV export URL of the published catalog sheet
    #[arg(long, env = "SCENTDB_URL", value_name = "URL", global = true)]
    pub url: Option<String>,

    /// Directory for cached catalog entries (defaults to the XDG cache dir)
    #[arg(long, env = "SCENTDB_CACHE_DIR", value_name = "DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Seconds a cached catalog stays fresh
    #[arg(
        long,
        env = "SCENTDB_FRESHNESS",
        value_name = "SECS",
        default_value_t = DEFAULT_FRESHNESS_SECS as u64,
        global = true
    )]
    pub freshness: u64,

    /// Cache version tag; changing it invalidates earlier cached catalogs
    #[arg(long, value_name = "TAG", global = true)]
    pub version_tag: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands; `show` runs when none is given
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load the catalog from cache or network and print it
    Show {
        /// Print records as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Parse a local CSV file without touching the cache
    Parse {
        /// CSV file to parse
        file: PathBuf,
        /// Drop rows with more values than headers
        #[arg(long)]
        strict: bool,
        /// Print records as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Keep reloading the catalog on an interval until interrupted
    Watch {
        /// Seconds between reloads
        #[arg(long, value_name = "SECS", default_value_t = 60)]
        interval: u64,
    },
}

impl Cli {
    /// The subcommand to run, defaulting to `show`
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Show { json: false })
    }

    /// Log filter directive for the requested verbosity
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Settings needed to build the source, store and gate
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// CSV export URL
    pub url: String,
    /// Explicit store directory, if given
    pub cache_dir: Option<PathBuf>,
    /// Cache gate settings
    pub gate: GateConfig,
}

impl LoadConfig {
    /// Creates a LoadConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(LoadConfig)` with defaults filled in
    /// * `Err(CliError)` if the URL or version tag is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let url = cli
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_SHEET_URL.to_string());
        let url = parse_url_arg(&url)?;

        // chrono durations are bounded by i64::MAX milliseconds
        let freshness_secs = i64::try_from(cli.freshness)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1000);
        let mut gate = GateConfig {
            freshness_window: ChronoDuration::seconds(freshness_secs),
            ..GateConfig::default()
        };
        if let Some(tag) = &cli.version_tag {
            gate.version_tag = parse_version_tag_arg(tag)?;
        }

        Ok(LoadConfig {
            url,
            cache_dir: cli.cache_dir.clone(),
            gate,
        })
    }
}

/// Validates a catalog URL argument
pub fn parse_url_arg(s: &str) -> Result<String, CliError> {
    let trimmed = s.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(CliError::InvalidUrl(s.to_string()))
    }
}

/// Validates a version tag argument
pub fn parse_version_tag_arg(s: &str) -> Result<String, CliError> {
    let valid = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(s.to_string())
    } else {
        Err(CliError::InvalidVersionTag(s.to_string()))
    }
}

/// Converts a watch interval in seconds, rejecting zero
pub fn parse_interval_arg(secs: u64) -> Result<Duration, CliError> {
    if secs == 0 {
        return Err(CliError::InvalidInterval);
    }
    Ok(Duration::from_secs(secs))
}
