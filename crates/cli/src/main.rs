// rmerge - find and collapse duplicate organization records in CSV exports

mod dedup;
mod exit_codes;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use exit_codes::EXIT_SUCCESS;

#[derive(Parser)]
#[command(name = "rmerge")]
#[command(about = "Detect, review and merge duplicate records in CSV files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: dedup::DedupCommands,
}

/// Install the stderr subscriber. `RMERGE_LOG` takes an `EnvFilter`
/// directive; defaults to `warn`. Engine `log` records are bridged.
fn init_logging() {
    let filter = EnvFilter::try_from_env("RMERGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    // A subscriber may already be installed when embedded; ignore.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match dedup::cmd_dedup(cli.command) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
