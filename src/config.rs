//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.mailsift.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::OutputFormat;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".mailsift.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Synthetic data settings.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding `*.txt` message files.
    #[serde(default = "default_input_dir")]
    pub input_dir: String,

    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_input_dir() -> String {
    "output/emails".to_string()
}

fn default_output() -> String {
    "output/reports/forensics_report.txt".to_string()
}

/// Synthetic message settings, used with `--generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Number of messages to generate.
    #[serde(default = "default_count")]
    pub count: usize,

    /// Share of generated messages that are suspicious.
    #[serde(default = "default_suspicious_ratio")]
    pub suspicious_ratio: f64,

    /// Seed for reproducible output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            suspicious_ratio: default_suspicious_ratio(),
            seed: None,
        }
    }
}

fn default_count() -> usize {
    50
}

fn default_suspicious_ratio() -> f64 {
    0.3
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Entries in the top senders and connections tables.
    #[serde(default = "default_top_senders")]
    pub top_senders: usize,

    /// Include hourly, daily and sender activity tables.
    #[serde(default = "default_true")]
    pub include_data_series: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            top_senders: default_top_senders(),
            include_data_series: true,
        }
    }
}

fn default_top_senders() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.general.input_dir = input.to_string_lossy().to_string();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.to_string_lossy().to_string();
        }

        if let Some(Some(count)) = args.generate {
            self.generator.count = count;
        }
        if let Some(ratio) = args.suspicious_ratio {
            self.generator.suspicious_ratio = ratio;
        }
        if args.seed.is_some() {
            self.generator.seed = args.seed;
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(top) = args.top {
            self.report.top_senders = top;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values that only the config file can set out of range.
    ///
    /// Call after [`Config::merge_with_args`] so CLI overrides are covered too.
    pub fn validate(&self) -> Result<()> {
        let ratio = self.generator.suspicious_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            bail!(
                "generator.suspicious_ratio must be between 0.0 and 1.0, got {}",
                ratio
            );
        }
        if self.report.top_senders == 0 {
            bail!("report.top_senders must be at least 1");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
