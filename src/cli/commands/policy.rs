//! Policy command implementation.

use crate::core::config::{CacheMode, ServerConfig};
use crate::policy::{is_clustered, is_embedded_mode, PolicyFacts};
use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;

/// Show the resolved consistency policy of configured caches.
#[derive(Args, Debug)]
pub struct PolicyArgs {
    /// Only show this cache.
    #[arg(long)]
    pub cache: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = PolicyFormat::Text)]
    pub format: PolicyFormat,
}

/// Output format of the policy command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
struct PolicyReport<'a> {
    node: &'a str,
    embedded: bool,
    clustered: bool,
    caches: Vec<CacheReport<'a>>,
}

#[derive(Debug, Serialize)]
struct CacheReport<'a> {
    name: &'a str,
    cache_mode: CacheMode,
    segments: u32,
    #[serde(flatten)]
    facts: PolicyFacts,
}

/// Run the policy command.
pub fn run_policy(config: &ServerConfig, args: PolicyArgs) -> Result<()> {
    let output = render_policy(config, args.cache.as_deref(), args.format)?;
    println!("{}", output);
    Ok(())
}

/// Resolve and render policy facts for the configured caches.
pub fn render_policy(
    config: &ServerConfig,
    cache: Option<&str>,
    format: PolicyFormat,
) -> Result<String> {
    if let Some(name) = cache {
        if !config.caches.contains_key(name) {
            anyhow::bail!("cache {} is not defined in the configuration", name);
        }
    }

    let caches = config
        .caches
        .iter()
        .filter(|(name, _)| cache.map_or(true, |wanted| wanted == name.as_str()))
        .map(|(name, cfg)| {
            let facts = PolicyFacts::resolve(cfg);
            CacheReport {
                name,
                cache_mode: cfg.clustering.cache_mode,
                segments: if facts.segmented {
                    cfg.clustering.segments
                } else {
                    1
                },
                facts,
            }
        })
        .collect();

    let report = PolicyReport {
        node: &config.global.node_name,
        embedded: is_embedded_mode(&config.global),
        clustered: is_clustered(&config.global),
        caches,
    };

    match format {
        PolicyFormat::Json => Ok(serde_json::to_string_pretty(&report)?),
        PolicyFormat::Text => Ok(render_text(&report)),
    }
}

fn render_text(report: &PolicyReport<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "node {} ({}, {})",
        report.node,
        if report.embedded { "embedded" } else { "server" },
        if report.clustered { "clustered" } else { "local" },
    );

    for cache in &report.caches {
        let facts = &cache.facts;
        let _ = writeln!(out);
        let _ = writeln!(out, "cache {} ({})", cache.name, cache.cache_mode);
        let _ = writeln!(out, "  commit protocol:       {}", facts.commit_protocol);
        let _ = writeln!(out, "  multi-version:         {}", facts.multi_version_concurrency);
        let _ = writeln!(out, "  segments:              {}", cache.segments);
        let _ = writeln!(out, "  exception eviction:    {}", facts.exception_based_eviction);
        let _ = writeln!(out, "  state-transfer stores: {:?}", facts.state_transfer_stores);
        let _ = writeln!(
            out,
            "  default lifespan:      {}",
            format_duration(facts.default_metadata.lifespan)
        );
        let _ = writeln!(
            out,
            "  default max idle:      {}",
            format_duration(facts.default_metadata.max_idle)
        );
    }

    out.trim_end().to_string()
}

fn format_duration(duration: Option<Duration>) -> String {
    match duration {
        Some(d) => format!("{} ms", d.as_millis()),
        None => "none".to_string(),
    }
}
