// shipcheck CLI - pre-shipment validation of traveler, photo and BOM data

mod commands;
mod exit_codes;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use shipcheck_engine::SourceKind;

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "shipcheck")]
#[command(about = "Cross-check traveler, hardware photo and BOM data before shipment")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all seven checks on a session bundle (exit 0 = PASS, 3 = WARNING, 4 = FAIL)
    #[command(after_help = "\
Examples:
  shipcheck validate session.json
  shipcheck validate session.json --json
  shipcheck validate session.json --config qc.toml --output report.json
  shipcheck validate session.json --strict

Logging:
  SHIPCHECK_LOG=shipcheck_engine=debug shipcheck validate session.json")]
    Validate {
        /// Session bundle: JSON object with traveler, image and boms field bags
        bundle: PathBuf,

        /// QC policy file (TOML)
        #[arg(long, env = "SHIPCHECK_CONFIG")]
        config: Option<PathBuf>,

        /// Print the validation result as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the validation result as JSON to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Treat warnings as failures for the overall verdict
        #[arg(long)]
        strict: bool,
    },

    /// Print the normalized record for one source in a session bundle
    #[command(after_help = "\
Examples:
  shipcheck normalize session.json --source traveler
  shipcheck normalize session.json --source bom")]
    Normalize {
        /// Session bundle JSON file
        bundle: PathBuf,

        /// Which source to normalize: traveler, image or bom
        #[arg(long, short = 's')]
        source: SourceKind,
    },

    /// Validate a QC policy file without running anything
    #[command(after_help = "\
Examples:
  shipcheck check-config qc.toml")]
    CheckConfig {
        /// Path to the TOML policy file
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  shipcheck-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging();

    let result = match cli.command {
        Commands::Validate {
            bundle,
            config,
            json,
            output,
            strict,
        } => commands::cmd_validate(bundle, config, json, output, strict),
        Commands::Normalize { bundle, source } => commands::cmd_normalize(bundle, source),
        Commands::CheckConfig { config } => commands::cmd_check_config(config),
    };

    match result {
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
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
