//! mailsift - heuristic email forensics
//!
//! A CLI tool that loads plain-text email records, runs a fixed set of
//! risk detectors over them, and writes a severity-ranked report.
//!
//! Exit codes:
//!   0 - Success (no findings above threshold, or no --fail-on set)
//!   1 - Runtime error (missing input, unreadable config, write failure, etc.)
//!   2 - Findings at or above the --fail-on threshold

mod analysis;
mod cli;
mod config;
mod generator;
mod loader;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Local;
use cli::{Args, OutputFormat, SeverityLevel};
use config::Config;
use models::Severity;
use report::{Report, ReportMetadata, ReportOptions};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
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

    // Config may enable verbose logging
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);
    if let Err(e) = config.validate() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    init_logging(&args, config.general.verbose);

    info!("mailsift v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run(args, config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .mailsift.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  .mailsift.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .mailsift.toml")?;

    println!("✅ Created .mailsift.toml with default settings.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config_verbose: bool) {
    let level = if config_verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
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

/// Run the complete pipeline. Returns exit code (0 or 2).
fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let input_dir = Path::new(&config.general.input_dir).to_path_buf();

    // Step 1: Optionally generate synthetic data
    if args.generate.is_some() {
        let settings = &config.generator;
        println!(
            "🧪 Generating {} synthetic emails ({:.0}% suspicious)...",
            settings.count,
            settings.suspicious_ratio * 100.0
        );

        let records = generator::Generator::new(settings.seed).generate(
            settings.count,
            settings.suspicious_ratio,
            Local::now().naive_local(),
            &input_dir,
        );
        generator::write_records(&input_dir, &records, !args.quiet)?;
        println!("   Location: {}", input_dir.display());
    }

    // Step 2: Load records
    println!("📥 Loading emails from {}", input_dir.display());
    let loaded = loader::MessageLoader::new(&input_dir).load()?;
    println!(
        "   Parsed {} of {} files",
        loaded.records.len(),
        loaded.discovered()
    );
    if !loaded.failed.is_empty() {
        warn!("{} files failed to load", loaded.failed.len());
        for failed in &loaded.failed {
            debug!("  {}: {}", failed.path.display(), failed.error);
        }
    }

    // Step 3: Analyze
    println!("\n🔬 Running detectors...");
    let records = loaded.records;
    let findings = analysis::analyze(&records);
    let stats = analysis::summarize(&records, &findings);

    // Step 4: Build and write the report
    println!("\n📝 Generating report...");
    let metadata = ReportMetadata {
        generated_at: Local::now(),
        source: input_dir.display().to_string(),
        files_failed: loaded.failed.len(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };
    let options = ReportOptions {
        min_severity: args.min_severity.map(level_to_severity),
        top_n: config.report.top_senders,
        include_data_series: config.report.include_data_series,
    };
    let report = Report::build(metadata, &records, &findings, stats, &options);

    let output = match config.report.format {
        OutputFormat::Text => report::generate_text_report(&report),
        OutputFormat::Markdown => report::generate_markdown_report(&report),
        OutputFormat::Json => report::generate_json_report(&report)?,
    };

    let output_path = Path::new(&config.general.output);
    report::write_report(output_path, &output)?;

    // Print summary
    println!("\n📊 Threat Summary:");
    println!("   Emails analyzed: {}", stats.total_records);
    println!(
        "   - 🔴 High: {} | 🟡 Medium: {} | 🟢 Low: {}",
        stats.high_count, stats.medium_count, stats.low_count
    );
    println!("   Suspicious content: {}", stats.flagged_count);
    println!("   External sources:   {}", stats.external_count);
    println!("   After-hours timing: {}", stats.off_hours_count);

    let top = analysis::top_findings(&findings, 3);
    if !top.is_empty() {
        println!("\n🚩 Top findings:");
        for finding in &top {
            println!(
                "   {} [{}] {}",
                finding.severity.emoji(),
                finding.kind,
                finding.description
            );
        }
    }
    println!(
        "\n✅ Analysis complete! Report saved to: {}",
        output_path.display()
    );

    // Check --fail-on threshold
    if let Some(fail_level) = args.fail_on {
        let threshold = level_to_severity(fail_level);
        if findings.iter().any(|f| f.severity >= threshold) {
            eprintln!(
                "\n⛔ Findings at or above {:?} severity. Failing (exit code 2).",
                fail_level
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Convert a CLI severity level to a finding severity.
fn level_to_severity(level: SeverityLevel) -> Severity {
    match level {
        SeverityLevel::Low => Severity::Low,
        SeverityLevel::Medium => Severity::Medium,
        SeverityLevel::High => Severity::High,
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // An explicit path must load
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}", config::CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}
