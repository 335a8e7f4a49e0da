//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.psycomark-eda.toml` files.

use crate::analysis::DEFAULT_TOP_SUBREDDITS;
use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".psycomark-eda.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Summary settings.
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Input JSONL dataset.
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Where the summary is written.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_input() -> PathBuf {
    PathBuf::from("../data/train_rehydrated.jsonl")
}

fn default_output() -> PathBuf {
    PathBuf::from("eda_summary.json")
}

/// Summary computation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Number of subreddits kept in the ranking.
    #[serde(default = "default_top_subreddits")]
    pub top_subreddits: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            top_subreddits: default_top_subreddits(),
        }
    }
}

fn default_top_subreddits() -> usize {
    DEFAULT_TOP_SUBREDDITS
}

/// Report output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Format of the saved summary.
    #[serde(default)]
    pub format: OutputFormat,
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
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings when given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.general.input = input.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.clone();
        }
        if let Some(top) = args.top_subreddits {
            self.summary.top_subreddits = top;
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check settings that may have come from a config file.
    pub fn validate(&self) -> Result<()> {
        if self.summary.top_subreddits == 0 {
            anyhow::bail!("summary.top_subreddits must be at least 1");
        }
        if self.general.input == self.general.output {
            anyhow::bail!(
                "Output path would overwrite the input dataset: {}",
                self.general.output.display()
            );
        }
        Ok(())
    }

    /// Log level after merging with CLI arguments.
    ///
    /// `--quiet` wins over `general.verbose`, which is set by either the
    /// config file or `--verbose`.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to render default config")
    }
}
