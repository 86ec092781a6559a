//! Scorecard CLI
//!
//! Command-line interface for Scorecard - local-first golf round tracking.

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use scorecard_core::{Config, HoleCount, StorageError, Store, StoreError, Units};

mod commands;
mod output;
mod prompt;

use commands::hole::HoleSetArgs;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "scorecard")]
#[command(about = "Scorecard - Local-first golf round tracking")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage rounds
    Round {
        #[command(subcommand)]
        command: RoundCommands,
    },
    /// Record hole results
    Hole {
        #[command(subcommand)]
        command: HoleCommands,
    },
    /// Show statistics for a round, or across all rounds
    Stats {
        /// Round ID (full UUID or prefix)
        round: Option<String>,
    },
    /// Export all data to a JSON file (`-` for stdout)
    Export {
        /// Destination (default: golf-stats-YYYY-MM-DD.json)
        path: Option<PathBuf>,
    },
    /// Import rounds from an export; existing rounds are never changed
    Import {
        /// Exported JSON file
        path: PathBuf,
    },
    /// Delete every round except one
    ClearOld {
        /// Round to keep (full UUID or prefix)
        keep_id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or change settings
    Settings {
        /// Distance units (meters or yards)
        #[arg(long)]
        units: Option<Units>,
    },
    /// Show status (storage, pending rounds, sync)
    Status,
    /// Push local rounds to the sync server
    Sync,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum RoundCommands {
    /// Start a new round
    #[command(alias = "add")]
    New {
        /// Course name (prompted for if omitted)
        #[arg(short, long)]
        course: Option<String>,
        /// Number of holes (9 or 18)
        #[arg(long, value_parser = commands::round::parse_hole_count)]
        holes: Option<HoleCount>,
    },
    /// List all rounds
    #[command(alias = "ls")]
    List,
    /// Show round details
    Show {
        /// Round ID (full UUID or prefix)
        id: String,
    },
    /// Delete a round
    #[command(alias = "rm")]
    Delete {
        /// Round ID (full UUID or prefix)
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum HoleCommands {
    /// Record (or update) one hole
    Set {
        /// Round ID (full UUID or prefix)
        round: String,
        /// Hole number
        number: u8,
        #[command(flatten)]
        fields: HoleSetArgs,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, sync_url, sync_enabled, request_timeout_secs, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            if let Some(hint) = recovery_hint(&e) {
                eprintln!("\nHint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands work even when the config file is broken
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), &output);
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    init_logging(&config, cli.verbose);

    let mut store = Store::open_with_config(config);
    debug!("Using envelope at {}", store.location());

    match cli.command {
        Commands::Round { command } => handle_round_command(command, &mut store, &output),
        Commands::Hole {
            command:
                HoleCommands::Set {
                    round,
                    number,
                    fields,
                },
        } => commands::hole::set(&mut store, round, number, fields, &output),
        Commands::Stats { round } => commands::stats::show(&store, round, &output),
        Commands::Export { path } => commands::data::export(&store, path, &output),
        Commands::Import { path } => commands::data::import(&mut store, path, &output),
        Commands::ClearOld { keep_id, yes } => {
            commands::data::clear_old(&mut store, keep_id, yes, &output)
        }
        Commands::Settings { units } => commands::settings::settings(&mut store, units, &output),
        Commands::Status => commands::status::show(&store, &output).await,
        Commands::Sync => commands::sync::sync(&mut store, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_round_command(command: RoundCommands, store: &mut Store, output: &Output) -> Result<()> {
    match command {
        RoundCommands::New { course, holes } => commands::round::create(store, course, holes, output),
        RoundCommands::List => commands::round::list(store, output),
        RoundCommands::Show { id } => commands::round::show(store, id, output),
        RoundCommands::Delete { id, yes } => commands::round::delete(store, id, yes, output),
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Recovery suggestion for the first storage failure in the error chain
fn recovery_hint(error: &anyhow::Error) -> Option<&'static str> {
    error.chain().find_map(|cause| {
        cause
            .downcast_ref::<StoreError>()
            .and_then(StoreError::recovery_suggestion)
            .or_else(|| {
                cause
                    .downcast_ref::<StorageError>()
                    .and_then(StorageError::recovery_suggestion)
            })
    })
}

/// Install the tracing subscriber
///
/// Logs go to stderr so stdout stays clean for `--json`, or to the configured
/// log file without colours. `RUST_LOG` overrides the default filter unless
/// `--verbose` is given.
fn init_logging(config: &Config, verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("scorecard_core=debug,scorecard_cli=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("scorecard_core=warn,scorecard_cli=warn"))
    };

    let log_file = config.log_file.as_ref().and_then(|path| {
        File::create(path)
            .map_err(|e| eprintln!("Warning: Could not create log file {:?}: {}", path, e))
            .ok()
    });

    // Ignore error if already initialized
    let _ = match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .try_init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn denied() -> StorageError {
        StorageError::from_io(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            PathBuf::from("/data/golf-tracker-data.json"),
        )
    }

    #[test]
    fn test_recovery_hint_through_context() {
        let err = anyhow::Error::new(StoreError::from(denied())).context("Failed to create round");
        assert!(recovery_hint(&err).unwrap().contains("permissions"));

        let err = anyhow::Error::new(denied()).context("Failed to export");
        assert!(recovery_hint(&err).is_some());
    }

    #[test]
    fn test_no_hint_for_other_errors() {
        let err = anyhow::Error::new(StoreError::NotFound { id: "abc".to_string() });
        assert!(recovery_hint(&err).is_none());
        assert!(recovery_hint(&anyhow!("sync is disabled")).is_none());
    }
}
