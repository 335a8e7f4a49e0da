//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Defaults for input, output and the subreddit
//! ranking size live in the configuration layer so a config file can
//! supply them.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// psycomark-eda - quick exploratory statistics for the PsyCoMark dataset
///
/// Streams a JSONL dataset once and reports row count, label counts,
/// the most common subreddits, marker type counts and the text length
/// distribution.
///
/// Examples:
///   psycomark-eda
///   psycomark-eda --input data/train_rehydrated.jsonl --output eda_summary.json
///   psycomark-eda --format markdown --output eda_summary.md
///   psycomark-eda --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the input JSONL file
    ///
    /// Default: ../data/train_rehydrated.jsonl (or general.input from the config file)
    #[arg(short, long, value_name = "FILE", env = "PSYCOMARK_EDA_INPUT")]
    pub input: Option<PathBuf>,

    /// Where to save the summary
    ///
    /// Default: eda_summary.json (or general.output from the config file)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .psycomark-eda.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of subreddits to keep in the ranking (default: 15)
    #[arg(long, value_name = "COUNT")]
    pub top_subreddits: Option<usize>,

    /// Output format (json, markdown)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no progress spinner)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .psycomark-eda.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the saved summary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON document (default)
    #[default]
    Json,
    /// Markdown report
    Markdown,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top_subreddits == Some(0) {
            return Err("Top subreddits must be at least 1".to_string());
        }

        if let (Some(input), Some(output)) = (&self.input, &self.output) {
            if input == output {
                return Err(format!(
                    "Output path would overwrite the input dataset: {}",
                    output.display()
                ));
            }
        }

        if let Some(ref input) = self.input {
            if input.is_dir() {
                return Err(format!("Input path is a directory: {}", input.display()));
            }
        }

        Ok(())
    }
}
