//! Config command implementation.

use crate::core::config::ServerConfig;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

/// Configuration operations.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate the configuration file.
    Validate,
    /// Print the configuration with defaults filled in.
    Show {
        /// Output format (toml, json).
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Generate a configuration template.
    Generate {
        /// Output file path.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run the config command against the file at `path`.
pub fn run_config(path: &Path, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Validate => validate_config(path),
        ConfigCommand::Show { format } => show_config(path, &format),
        ConfigCommand::Generate { output } => generate_config(output.as_deref()),
    }
}

fn validate_config(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Config file not found: {:?}", path);
    }

    let config = ServerConfig::from_file(path)?;
    println!("✓ Configuration is valid");
    println!("  node:   {}", config.global.node_name);
    println!(
        "  mode:   {}",
        if config.global.transport.is_some() {
            "clustered"
        } else {
            "local"
        }
    );
    println!("  caches: {}", config.caches.len());

    if config.global.security.authorization && config.global.security.roles.is_empty() {
        println!("  ⚠ Warning: authorization enabled but no roles defined");
    }
    Ok(())
}

fn show_config(path: &Path, format: &str) -> Result<()> {
    let config = ServerConfig::from_file(path)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&config)?),
        "toml" => println!(
            "{}",
            toml::to_string_pretty(&config).context("failed to render config as TOML")?
        ),
        other => anyhow::bail!("unknown format {}, expected toml or json", other),
    }
    Ok(())
}

fn generate_config(output: Option<&Path>) -> Result<()> {
    let template = config_template();
    match output {
        Some(path) => {
            std::fs::write(path, template)
                .with_context(|| format!("failed to write {:?}", path))?;
            println!("Generated config template: {:?}", path);
        }
        None => println!("{}", template),
    }
    Ok(())
}

/// A commented starting configuration. Parses and validates as-is.
pub(crate) fn config_template() -> &'static str {
    r#"# gridcache configuration

[global]
node_name = "node-1"

[global.transport]
cluster_name = "gridcache"
initial_hosts = ["node-1:7800", "node-2:7800"]

[global.security]
authorization = true

[global.security.roles]
admin = ["ALL"]
application = ["READ", "WRITE", "LISTEN"]
observer = ["READ", "MONITOR"]

[global.modules.private]
server_mode = true

[caches.sessions.clustering]
cache_mode = "DIST_SYNC"
segments = 256

[caches.sessions.expiration]
lifespan_ms = 1800000

[caches.orders.clustering]
cache_mode = "REPL_SYNC"

[caches.orders.transaction]
transaction_mode = "TRANSACTIONAL"
locking_mode = "PESSIMISTIC"

[caches.orders.memory]
size = 100000
eviction_strategy = "EXCEPTION"

[[caches.orders.persistence.stores]]
shared = false
fetch_persistent_state = true

[telemetry]
log_level = "info"
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_valid() {
        let config = ServerConfig::from_toml(config_template()).unwrap();
        assert_eq!(config.caches.len(), 2);
        assert!(config.global.security.authorization);
    }
}
