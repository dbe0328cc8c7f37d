//! `rmerge run` / `rmerge validate`: config-driven duplicate resolution.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use recordmerge_resolve::config::{DedupConfig, SourceConfig, Strategy};
use recordmerge_resolve::ingest::{load_csv_records, write_csv_records};
use recordmerge_resolve::model::{DedupResult, Record, RunMode};
use recordmerge_resolve::DedupError;

use crate::exit_codes::{dedup_exit_code, EXIT_DEDUP_INVALID_CONFIG, EXIT_DEDUP_RUNTIME, EXIT_USAGE};
use crate::CliError;

#[derive(Subcommand)]
pub enum DedupCommands {
    /// Find duplicates and apply the configured merge policy
    #[command(after_help = "\
Examples:
  rmerge run centros.toml
  rmerge run centros.toml --strategy merge --output centros.clean.csv
  rmerge run centros.toml --report report.json
  rmerge run centros.toml --json")]
    Run {
        /// Path to the TOML config file
        config: PathBuf,

        /// Override the configured strategy
        /// (review, remove_oldest, remove_newest, merge)
        #[arg(long, value_parser = parse_strategy)]
        strategy: Option<Strategy>,

        /// Write the processed records as CSV
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the full JSON report to a file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print the JSON report to stdout
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate a config without running
    #[command(after_help = "\
Examples:
  rmerge validate centros.toml")]
    Validate {
        /// Path to the TOML config file
        config: PathBuf,
    },
}

pub fn cmd_dedup(cmd: DedupCommands) -> Result<(), CliError> {
    match cmd {
        DedupCommands::Run { config, strategy, output, report, json } => {
            cmd_run(&config, strategy, output, report, json)
        }
        DedupCommands::Validate { config } => cmd_validate(&config),
    }
}

fn parse_strategy(value: &str) -> Result<Strategy, String> {
    value.parse().map_err(|e: DedupError| e.to_string())
}

fn dedup_err(err: DedupError) -> CliError {
    CliError::new(dedup_exit_code(&err), err.to_string())
}

fn read_config(path: &Path) -> Result<DedupConfig, CliError> {
    if !path.exists() {
        return Err(CliError::new(
            EXIT_USAGE,
            format!("config not found: {}", path.display()),
        ));
    }
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| CliError::new(EXIT_DEDUP_RUNTIME, format!("cannot read config: {e}")))?;
    DedupConfig::from_toml(&config_str).map_err(dedup_err)
}

/// Load one CSV source, resolving its path relative to the config file.
fn load_source(base_dir: &Path, source: &SourceConfig) -> Result<Vec<Record>, CliError> {
    let csv_path = base_dir.join(&source.file);
    let csv_data = std::fs::read_to_string(&csv_path).map_err(|e| {
        CliError::new(EXIT_DEDUP_RUNTIME, format!("cannot read {}: {e}", csv_path.display()))
    })?;
    load_csv_records(&csv_data, source.tag(), &source.columns).map_err(|e| {
        CliError::new(dedup_exit_code(&e), format!("{}: {e}", csv_path.display()))
    })
}

fn cmd_run(
    config_path: &Path,
    strategy: Option<Strategy>,
    output_file: Option<PathBuf>,
    report_file: Option<PathBuf>,
    json_output: bool,
) -> Result<(), CliError> {
    let mut config = read_config(config_path)?;
    if let Some(strategy) = strategy {
        config = config.with_strategy(strategy);
    }

    let input = config.input.clone().ok_or_else(|| {
        CliError::new(EXIT_DEDUP_INVALID_CONFIG, "config has no [input] section")
            .with_hint("add [input] with file = \"records.csv\"")
    })?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let primary = load_source(base_dir, &input)?;

    let outcome = match &config.against {
        Some(against) => {
            let secondary = load_source(base_dir, against)?;
            recordmerge_resolve::run_cross(&config, &primary, &secondary)
        }
        None => recordmerge_resolve::run(&config, &primary),
    };

    let result = match outcome {
        Ok(result) => result,
        Err(DedupError::EmptyInput) => {
            eprintln!("no records in {}; nothing to do", input.file);
            return Ok(());
        }
        Err(e) => return Err(dedup_err(e)),
    };

    if let Some(ref path) = output_file {
        let csv = write_csv_records(&result.processed_records).map_err(dedup_err)?;
        std::fs::write(path, csv)
            .map_err(|e| CliError::new(EXIT_DEDUP_RUNTIME, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if report_file.is_some() || json_output {
        let json_str = result.to_json_pretty().map_err(|e| {
            CliError::new(EXIT_DEDUP_RUNTIME, format!("JSON serialization error: {e}"))
        })?;

        if let Some(ref path) = report_file {
            std::fs::write(path, &json_str)
                .map_err(|e| CliError::new(EXIT_DEDUP_RUNTIME, format!("cannot write report: {e}")))?;
            eprintln!("wrote {}", path.display());
        }
        if json_output {
            println!("{json_str}");
        }
    }

    print_summary(&result);
    Ok(())
}

/// Human summary to stderr.
fn print_summary(result: &DedupResult) {
    let s = &result.summary;
    let mode = match result.meta.mode {
        RunMode::SelfCollection => "dedup",
        RunMode::CrossCollection => "cross-check",
    };
    eprintln!(
        "{mode} ({}): {} records in, {} out; {} groups, {} duplicates",
        result.meta.strategy, s.input_records, s.output_records, s.groups, s.duplicates,
    );
    if !s.criterion_counts.is_empty() {
        let parts: Vec<String> = s
            .criterion_counts
            .iter()
            .map(|(criterion, n)| format!("{criterion} {n}"))
            .collect();
        eprintln!("matched by: {}", parts.join(", "));
    }
    if s.degraded_groups > 0 {
        eprintln!("{} group(s) could not be resolved and were flagged for review", s.degraded_groups);
    }
}

fn cmd_validate(config_path: &Path) -> Result<(), CliError> {
    let config = read_config(config_path)?;

    let name = if config.name.is_empty() { "(unnamed)" } else { config.name.as_str() };
    let mode = if config.against.is_some() { "cross-collection" } else { "self" };
    eprintln!("config OK: {name}");
    eprintln!("  strategy: {}", config.strategy);
    eprintln!("  mode: {mode}");
    eprintln!(
        "  thresholds: center_name {}, location {}, email {}, representative {}",
        config.thresholds.center_name,
        config.thresholds.location,
        config.thresholds.email,
        config.thresholds.representative,
    );
    match &config.input {
        Some(input) => eprintln!("  input: {} [{}]", input.file, input.tag()),
        None => eprintln!("  input: (none; `run` will require one)"),
    }
    if let Some(against) = &config.against {
        eprintln!("  against: {} [{}]", against.file, against.tag());
    }
    Ok(())
}
