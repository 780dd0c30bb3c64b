//! Command-line interface.
//!
//! Unified CLI for gridcache operations.

pub mod commands;

use clap::{Parser, Subcommand};

/// gridcache - consistency policies and privileged server access for a
/// replicated transactional cache.
#[derive(Parser, Debug)]
#[command(name = "gridcache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the cache manager and protocol server.
    Start(commands::StartArgs),
    /// Show the resolved consistency policy of configured caches.
    Policy(commands::PolicyArgs),
    /// Configuration operations.
    Config(commands::ConfigArgs),
}

/// Initialize the tracing subscriber if the telemetry feature is enabled.
///
/// `RUST_LOG` wins over the configured level.
#[cfg(feature = "telemetry")]
pub fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init();
}

#[cfg(not(feature = "telemetry"))]
pub fn init_tracing(_level: &str) {}
