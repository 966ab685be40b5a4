//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Preloader - load many images at once and watch them settle
///
/// Every identifier is fetched concurrently. Each load reports progress
/// or an error as it settles, and a final completion line follows once
/// all of them have.
///
/// Examples:
///   preloader https://example.com/a.png https://example.com/b.png
///   preloader --dir ./assets --output preload.md
///   preloader --mode collect images/nujji.png images/other.jpg
///   preloader --dir ./assets --format json --output preload.json --fail-on-error
///   preloader --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// URLs or local paths to load
    #[arg(value_name = "IDENTIFIER")]
    pub identifiers: Vec<String>,

    /// Load every image file found under this directory
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// How results are delivered
    #[arg(long, default_value = "events", value_name = "MODE")]
    pub mode: LoadMode,

    /// Write a report of the run to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .preloader.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds for each remote resource
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// User agent for HTTP requests
    #[arg(long, value_name = "AGENT", env = "PRELOADER_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Accept payloads that are not recognised images
    #[arg(long)]
    pub allow_any: bool,

    /// File extensions collected by --dir (comma-separated)
    ///
    /// Example: --extensions png,jpg
    #[arg(long, value_name = "EXTS", value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Maximum number of files collected by --dir
    #[arg(long, value_name = "COUNT")]
    pub max_files: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Exit with code 2 if any resource failed to load
    #[arg(long)]
    pub fail_on_error: bool,

    /// Generate a default .preloader.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Delivery form used by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LoadMode {
    /// Stream progress, error and complete notifications as loads settle
    #[default]
    Events,
    /// Wait for every load, then list results in input order
    Collect,
    /// Print each result through a single callback as it settles
    Callback,
}

impl LoadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadMode::Events => "events",
            LoadMode::Collect => "collect",
            LoadMode::Callback => "callback",
        }
    }
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.identifiers.is_empty() && self.dir.is_none() {
            return Err("Nothing to load: pass identifiers or --dir".to_string());
        }

        if let Some(id) = self.identifiers.iter().find(|id| id.trim().is_empty()) {
            return Err(format!("Empty identifier: {:?}", id));
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.max_files == Some(0) {
            return Err("Max files must be at least 1".to_string());
        }

        if let Some(ref dir) = self.dir {
            if !dir.exists() {
                return Err(format!("Directory does not exist: {}", dir.display()));
            }
            if !dir.is_dir() {
                return Err(format!("Path is not a directory: {}", dir.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` comes from `general.verbose`; `--quiet` overrides it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Whether to draw the progress bar.
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}
