//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// mailsift - heuristic email forensics
///
/// Scan a directory of plain-text email records for risky content,
/// after-hours activity, external senders and high-volume senders,
/// then write a severity-ranked report.
///
/// Examples:
///   mailsift --input ./mail
///   mailsift --generate 200 --seed 7 --format markdown -o report.md
///   mailsift --input ./mail --fail-on high
///   mailsift --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory containing `*.txt` message files
    ///
    /// Defaults to the config value, or output/emails.
    #[arg(short, long, value_name = "DIR", env = "MAILSIFT_INPUT")]
    pub input: Option<PathBuf>,

    /// Generate synthetic messages into the input directory first
    ///
    /// Without a value, the count comes from the config file (default 50).
    #[arg(short, long, value_name = "COUNT", num_args = 0..=1)]
    pub generate: Option<Option<usize>>,

    /// Share of generated messages that are suspicious (0.0 - 1.0)
    #[arg(long, value_name = "RATIO")]
    pub suspicious_ratio: Option<f64>,

    /// Seed for reproducible synthetic data
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (text, markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .mailsift.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Minimum severity to list in the report
    ///
    /// Statistics still count every finding. Values: high, medium, low
    #[arg(long, value_name = "LEVEL")]
    pub min_severity: Option<SeverityLevel>,

    /// Fail if findings at or above this severity are found
    ///
    /// Useful for CI pipelines. Exit code 2 when threshold is exceeded.
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<SeverityLevel>,

    /// Number of entries in the top senders and connections tables
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .mailsift.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text format (default)
    #[default]
    Text,
    /// Markdown format
    Markdown,
    /// JSON format
    Json,
}

/// Severity level for --fail-on and --min-severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
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

        if let Some(ratio) = self.suspicious_ratio {
            if !(0.0..=1.0).contains(&ratio) {
                return Err("Suspicious ratio must be between 0.0 and 1.0".to_string());
            }
        }

        if self.top == Some(0) {
            return Err("Top must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref input) = self.input {
            if self.generate.is_none() && !input.exists() {
                return Err(format!("Input directory does not exist: {}", input.display()));
            }
            if input.exists() && !input.is_dir() {
                return Err(format!("Input path is not a directory: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
