// SPDX-FileCopyrightText: 2026 vaultsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! vaultsync - periodic Bitwarden vault export to Google Drive.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use vaultsync_config::{ConfigError, VaultSyncConfig};

/// vaultsync - periodic Bitwarden vault export to Google Drive.
#[derive(Parser, Debug)]
#[command(name = "vaultsync", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Back up now and then on every interval until stopped (default).
    Run,
    /// Run a single backup and exit.
    Once,
    /// Validate configuration and print a summary with secrets masked.
    CheckConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            vaultsync_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    let command = cli.command.unwrap_or(Commands::Run);
    if command == Commands::CheckConfig {
        print!("{}", run::summary(&config));
        return match run::build_pipeline(&config) {
            Ok(_) => {
                println!("configuration OK");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("vaultsync: {e}");
                ExitCode::FAILURE
            }
        };
    }

    init_tracing(&config.daemon.log_level);

    let result = match command {
        Commands::Once => run::run_once(&config).await,
        _ => run::run_scheduled(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(stage = %e.stage(), error = %e, "vaultsync exiting");
            eprintln!("vaultsync: {} stage failed: {e}", e.stage());
            ExitCode::FAILURE
        }
    }
}

fn load(path: Option<&std::path::Path>) -> Result<VaultSyncConfig, Vec<ConfigError>> {
    match path {
        Some(path) => vaultsync_config::load_and_validate_path(path),
        None => vaultsync_config::load_and_validate(),
    }
}

/// Initialize tracing subscriber with the configured log level.
/// `RUST_LOG` takes precedence when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vaultsync={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["vaultsync"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["vaultsync", "once", "--config", "/etc/vs.toml"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Once));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/vs.toml")));
    }

    #[test]
    fn check_config_subcommand_parses() {
        let cli = Cli::try_parse_from(["vaultsync", "check-config"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CheckConfig));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["vaultsync", "restore"]).is_err());
    }
}
