//! reload-worker: keeps a live SQL mapping registry in sync with its documents.
//!
//! Loads every mapping document matched by the configured locations, then
//! polls them and rebuilds the registry whenever one changes. A JSON status
//! line with the current generation is logged periodically.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use sqlmap_core::config::{load_dotenv, split_search_path, tokenize_locations};
use sqlmap_core::{LiveRegistry, ReloadConfig, ReloadScope};
use sqlmap_reload::{FsResourceResolver, Poller, ReloadService, YamlMappingParser};

// ── CLI ─────────────────────────────────────────────────────────────

/// Live-reload worker for SQL mapping documents.
#[derive(Parser, Debug)]
#[command(name = "reload-worker", version, about)]
struct Cli {
    /// Config profile; keys are read as `{PROFILE}_{KEY}` before `{KEY}`.
    #[arg(long, env = "SQLMAP_PROFILE", default_value = "")]
    profile: String,

    /// Mapping document location patterns (overrides MAPPER_LOCATIONS).
    #[arg(long)]
    locations: Option<String>,

    /// Search roots for classpath patterns (overrides MAPPER_SEARCH_PATH).
    #[arg(long)]
    search_path: Option<String>,

    /// Seconds before the first poll.
    #[arg(long)]
    initial_delay: Option<u64>,

    /// Seconds between polls.
    #[arg(long)]
    period: Option<u64>,

    /// Reload scope: `all` or `changed`.
    #[arg(long)]
    scope: Option<ReloadScope>,

    /// Status line interval in seconds.
    #[arg(long, env = "SQLMAP_STATUS_INTERVAL", default_value_t = 60)]
    status_interval: u64,
}

impl Cli {
    fn apply(&self, config: &mut ReloadConfig) {
        if let Some(locations) = &self.locations {
            config.mapper_locations = tokenize_locations(locations);
        }
        if let Some(search_path) = &self.search_path {
            config.search_roots = split_search_path(search_path);
        }
        if let Some(secs) = self.initial_delay {
            config.initial_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = self.period {
            config.period = Duration::from_secs(secs);
        }
        if let Some(scope) = self.scope {
            config.scope = scope;
        }
    }
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ReloadConfig::for_profile(&cli.profile).context("invalid reload config")?;
    cli.apply(&mut config);
    config.validate().context("invalid reload config")?;
    config.log_summary();

    let registry = Arc::new(LiveRegistry::new());
    let service = Arc::new(ReloadService::from_config(
        &config,
        registry.clone(),
        Arc::new(FsResourceResolver::new(config.search_roots.clone())),
        Arc::new(YamlMappingParser::new()),
    ));

    // A failed first load leaves the registry partial; the poller retries on change.
    let bootstrap = service.clone();
    match tokio::task::spawn_blocking(move || bootstrap.bootstrap()).await? {
        Ok(report) => info!(
            generation = report.generation,
            resources = report.resources.len(),
            statements = report.stats.statements,
            "initial mapping load complete"
        ),
        Err(e) => warn!(error = %e, "initial mapping load failed"),
    }

    let poller = Poller::from_config(service.clone(), &config);
    if config.enabled {
        poller.start();
    } else {
        info!("mapping reload disabled, registry will not be refreshed");
    }

    let mut status = tokio::time::interval(Duration::from_secs(cli.status_interval.max(1)));
    status.tick().await;

    info!("reload-worker running, press Ctrl-C to stop");
    loop {
        tokio::select! {
            _ = status.tick() => {
                let status = serde_json::json!({
                    "registry": registry.snapshot().stats(),
                    "ticks": poller.tick_count(),
                    "skipped": poller.skipped_count(),
                    "polling": poller.is_running(),
                    "config": config.summary(),
                });
                info!(status = %status, "reload-worker status");
            }
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for shutdown signal")?;
                info!("shutdown requested");
                break;
            }
        }
    }

    poller.stop();
    info!("reload-worker exited cleanly");
    Ok(())
}
