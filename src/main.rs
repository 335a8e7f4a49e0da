//! psycomark-eda - quick exploratory statistics for the PsyCoMark dataset
//!
//! Reads a JSONL dataset of labeled posts in a single pass and writes a
//! summary (row count, label counts, top subreddits, marker type counts,
//! text length distribution) to a file, echoing it to stdout.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any failure (missing input, malformed line, config or write error)

mod analysis;
mod cli;
mod config;
mod dataset;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use models::{ReportMetadata, Summary};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config decides verbosity, so it is resolved before logging starts
    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(config.log_level(args.quiet));

    info!("psycomark-eda v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Config: {:?}", config);

    if let Err(e) = run(&config, args.quiet) {
        error!("EDA failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .psycomark-eda.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml()?;
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging at the resolved level.
///
/// Logs go to stderr; stdout carries only the summary echo.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load the config file and apply CLI overrides.
fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config.validate()?;
    Ok(config)
}

/// Run the complete EDA workflow.
fn run(config: &Config, quiet: bool) -> Result<()> {
    let start_time = Instant::now();

    let input = &config.general.input;
    let output = &config.general.output;
    info!("Reading dataset: {}", input.display());

    let progress = record_spinner(quiet)?;
    let result = summarize_dataset(input, config.summary.top_subreddits, &progress);
    progress.finish_and_clear();
    let summary = result?;

    let duration = start_time.elapsed().as_secs_f64();
    info!("Aggregated {} rows in {:.1}s", summary.rows, duration);

    print!(
        "{}",
        report::render_console_summary(&summary, config.summary.top_subreddits)
    );

    let content = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&summary)?,
        OutputFormat::Markdown => {
            let metadata = ReportMetadata {
                input: input.display().to_string(),
                generated_at: Utc::now(),
                duration_seconds: duration,
            };
            report::generate_markdown_report(&summary, &metadata)
        }
    };

    report::write_report(output, &content)?;
    info!("Summary saved to: {}", output.display());

    Ok(())
}

/// Stream the dataset through the aggregator and build the summary.
fn summarize_dataset(input: &Path, top_n: usize, progress: &ProgressBar) -> Result<Summary> {
    let mut reader = dataset::open(input)?;
    let aggregator = analysis::aggregate(reader.by_ref().inspect(|_| progress.inc(1)))
        .with_context(|| format!("Failed to aggregate {}", input.display()))?;
    debug!(
        "Read {} lines, {} records",
        reader.lines_read(),
        aggregator.rows()
    );

    Ok(aggregator.summarize(top_n))
}

/// Spinner counting records read, hidden in quiet mode.
fn record_spinner(quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} records read")
            .context("Invalid progress template")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is initialized, so the fallback notice goes
/// straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            if !args.quiet {
                eprintln!("⚠️  Failed to load config, using defaults: {:#}", e);
            }
            Ok(Config::default())
        }
    }
}
