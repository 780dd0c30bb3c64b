//! gridcache - unified CLI entrypoint.
//!
//! Usage:
//!   gridcache start --config config/gridcache.toml
//!   gridcache policy [--cache NAME] [--format text|json]
//!   gridcache config validate --config config/gridcache.toml
//!   gridcache config show [--format toml|json]
//!   gridcache config generate [--output PATH]

use anyhow::Result;
use clap::Parser;
use gridcache::cli::commands::{load_config, run_config, run_policy, run_start};
use gridcache::cli::{init_tracing, Cli, Commands};
use gridcache::config::ConfigOverrides;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine config path - use global --config or default
    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/gridcache.toml"));
    let overrides = ConfigOverrides {
        log_level: cli.log_level,
    };

    match cli.command {
        Commands::Start(args) => {
            let config = load_config(&config_path, &overrides)?;
            init_tracing(&config.telemetry.log_level);
            run_start(config, args).await
        }
        Commands::Policy(args) => {
            let config = load_config(&config_path, &overrides)?;
            init_tracing(&config.telemetry.log_level);
            run_policy(&config, args)
        }
        Commands::Config(args) => run_config(&config_path, args),
    }
}
