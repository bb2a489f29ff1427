// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hatch - a two-party SMS/MMS/email messaging relay.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod migrate;
mod serve;
mod show_config;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hatch_config::model::HatchConfig;

/// Hatch - a two-party SMS/MMS/email messaging relay.
#[derive(Parser, Debug)]
#[command(name = "hatch", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Apply pending database migrations and exit.
    Migrate,
    /// Print the effective configuration with secrets masked.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> HatchConfig {
    let result = match path {
        Some(path) => hatch_config::load_and_validate_from_path(path),
        None => hatch_config::load_and_validate(),
    };
    match result {
        Ok(config) => config,
        Err(errors) => {
            hatch_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("hatch: use --help for available commands");
        return;
    };

    let config = load_config(cli.config.as_ref());

    let result = match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Migrate => migrate::run_migrate(&config).await,
        Commands::Config => show_config::print_config(&config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn default_config_is_valid() {
        let config = hatch_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn cli_parses_global_config_flag() {
        let cli = Cli::try_parse_from(["hatch", "migrate", "--config", "/tmp/hatch.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Migrate)));
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/hatch.toml")));
    }

    #[test]
    fn cli_rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["hatch", "rollback"]).is_err());
    }
}
