//! fetchcache - drive the caching, retrying data-fetch layer from a terminal

mod report;
mod simulated;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fetchcache_core::{
    CacheConfig, FetchConfig, FetchEvent, FetchOrchestrator, NetworkStatus, PerformanceMetrics, SearchOutcome,
};
use serde_json::Value;
use simulated::{Scenario, SimulatedProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fetchcache",
    version,
    about = "Caching, retrying data-fetch layer with performance metrics",
    long_about = "Runs the fetch orchestrator against a simulated provider so cache,\n\
                  retry/backoff, debounced search and real-time refresh behaviour can be\n\
                  observed from a terminal.\n\
                  \n\
                  Examples:\n\
                    fetchcache config                         # Show effective configuration\n\
                    fetchcache demo --cache-ms 5000           # Fetch twice (second from cache)\n\
                    fetchcache demo --fail-first 2            # Watch retries recover\n\
                    fetchcache demo --search task --json      # Debounced search, JSON output\n\
                    fetchcache watch --interval-ms 500        # Real-time refresh events\n\
                  \n\
                  Environment Variables:\n\
                    FETCHCACHE_CONFIG                         # Path to a .toml or .json config\n\
                    FETCHCACHE_NO_COLOR                       # Disable ANSI colors\n\
                    RUST_LOG                                  # Log filter (default: info)"
)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,

    /// Configuration file (default: <config dir>/fetchcache/config.toml if present)
    #[arg(long, env = "FETCHCACHE_CONFIG")]
    config: Option<PathBuf>,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, env = "FETCHCACHE_NO_COLOR")]
    no_color: bool,
}

#[derive(Subcommand)]
enum Mode {
    /// Print the effective configuration and exit
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run fetch cycles against the simulated provider
    Demo {
        /// Number of records served
        #[arg(long, default_value = "8")]
        items: u32,
        /// Fail this many provider calls before succeeding
        #[arg(long, default_value = "0")]
        fail_first: u32,
        /// Simulated provider latency in milliseconds
        #[arg(long, default_value = "120")]
        latency_ms: u64,
        /// Cache results for this many milliseconds (overrides the config's max age)
        #[arg(long)]
        cache_ms: Option<u64>,
        /// Request params as JSON, e.g. '{"status":"open"}'
        #[arg(long)]
        params: Option<String>,
        /// Run a debounced search after fetching
        #[arg(long)]
        search: Option<String>,
        /// Delete a record by id after fetching, then refetch
        #[arg(long)]
        delete: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start real-time refresh and print events as they arrive
    Watch {
        /// Refresh interval in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u64,
        /// How long to watch, in seconds
        #[arg(long, default_value = "5")]
        duration_secs: u64,
        /// Simulated provider latency in milliseconds
        #[arg(long, default_value = "50")]
        latency_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.mode.unwrap_or(Mode::Config { json: false }) {
        Mode::Config { json } => {
            println!("{}", report::format_config(&config, json));
        }
        Mode::Demo {
            items,
            fail_first,
            latency_ms,
            cache_ms,
            params,
            search,
            delete,
            json,
        } => {
            let scenario = Scenario {
                items,
                fail_first,
                latency: Duration::from_millis(latency_ms),
            };
            let params = params
                .map(|p| serde_json::from_str::<Value>(&p))
                .transpose()
                .context("--params must be valid JSON")?;
            let config = with_demo_cache(config, cache_ms);
            run_demo(config, scenario, params, search, delete, json, cli.no_color).await?;
        }
        Mode::Watch {
            interval_ms,
            duration_secs,
            latency_ms,
        } => {
            let scenario = Scenario {
                items: 5,
                fail_first: 0,
                latency: Duration::from_millis(latency_ms),
            };
            let config = config.with_real_time_updates(Duration::from_millis(interval_ms));
            config.validate().context("Invalid watch configuration")?;
            run_watch(config, scenario, Duration::from_secs(duration_secs)).await?;
        }
    }

    Ok(())
}

/// Explicit path wins; otherwise the per-user config file if it exists
fn load_config(path: Option<&Path>) -> Result<FetchConfig> {
    if let Some(path) = path {
        return FetchConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    let default_path = dirs::config_dir().map(|d| d.join("fetchcache").join("config.toml"));
    match default_path {
        Some(path) if path.exists() => {
            debug!(path = %path.display(), "Using default config file");
            FetchConfig::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        _ => Ok(FetchConfig::default()),
    }
}

/// Turn caching on (or shorten its max age) for `demo --cache-ms`
fn with_demo_cache(config: FetchConfig, cache_ms: Option<u64>) -> FetchConfig {
    let Some(ms) = cache_ms else {
        return config;
    };
    let mut cache = config.cache.clone().unwrap_or_default();
    cache.max_age_ms = ms;
    config.with_cache(cache)
}

async fn run_demo(
    config: FetchConfig,
    scenario: Scenario,
    params: Option<Value>,
    search: Option<String>,
    delete: Option<String>,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let provider = Arc::new(SimulatedProvider::new(scenario));
    let orchestrator = Arc::new(
        FetchOrchestrator::with_shared_provider(Arc::clone(&provider), config).with_metrics_sink(
            |m: &PerformanceMetrics| {
                info!(
                    load_time_ms = m.load_time_ms,
                    requests = m.network_requests,
                    hit_rate = m.cache_hit_rate,
                    "Metrics"
                );
            },
        ),
    );
    orchestrator.start();

    let first = orchestrator.fetch_data(params.clone(), false).await;
    if let fetchcache_core::FetchOutcome::Failed(error) = &first {
        warn!(error = %error, "Initial fetch failed");
    }

    // Same params again: served from the cache when caching is on and no
    // retry policy is configured
    let second = orchestrator.fetch_data(params, false).await;
    debug!(cached = second.is_cached(), "Second fetch");

    if let Some(query) = search {
        match orchestrator.search(&query).await {
            SearchOutcome::Results(data) => info!(query = %query, results = data.len(), "Search"),
            SearchOutcome::Failed(error) => warn!(error = %error, "Search failed"),
            _ => {}
        }
    }

    if let Some(id) = delete {
        match orchestrator.delete(&id).await {
            Ok(()) => {
                info!(id = %id, "Record deleted");
                if let Err(error) = orchestrator.refetch().await {
                    warn!(error = %error, "Refetch after delete failed");
                }
            }
            Err(error) => warn!(error = %error, "Delete failed"),
        }
    }

    let snapshot = orchestrator.snapshot();
    let journal = orchestrator.journal().entries();
    println!("{}", report::format_snapshot(&snapshot, &journal, json, no_color));
    if !json {
        println!("Provider calls:   {}", provider.calls());
    }

    orchestrator.shutdown();
    Ok(())
}

async fn run_watch(config: FetchConfig, scenario: Scenario, duration: Duration) -> Result<()> {
    let status = NetworkStatus::new(true, "simulated");
    let orchestrator = Arc::new(
        FetchOrchestrator::new(SimulatedProvider::new(scenario), config)
            .with_network_monitor(Arc::new(status)),
    );
    let mut events = orchestrator.subscribe();
    orchestrator.start();

    println!("Watching for {}s (Ctrl+C to stop early)...", duration.as_secs());

    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(FetchEvent::DataUpdated { len, from_cache }) => {
                    println!("data updated: {len} record(s){}", if from_cache { " (cache)" } else { "" });
                }
                Ok(FetchEvent::MetricsUpdated(m)) => {
                    println!(
                        "metrics: load {} ms, requests {}, hit rate {:.1}%",
                        m.load_time_ms, m.network_requests, m.cache_hit_rate
                    );
                }
                Ok(FetchEvent::Error(message)) => println!("error: {message}"),
                Ok(FetchEvent::CacheCleaned { removed }) => println!("cache sweep: {removed} removed"),
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event receiver lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    orchestrator.shutdown();
    println!("Stopped after {} request(s)", orchestrator.metrics().network_requests);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_cache_flag_enables_cache() {
        let config = with_demo_cache(FetchConfig::default(), Some(5000));
        let cache = config.cache.unwrap();
        assert_eq!(cache.max_age(), Duration::from_secs(5));
        assert_eq!(cache.max_size, CacheConfig::default().max_size);
    }

    #[test]
    fn test_demo_cache_flag_keeps_configured_size() {
        let base = FetchConfig::new().with_cache(CacheConfig::new(Duration::from_secs(60), 7));
        let config = with_demo_cache(base.clone(), Some(250));
        assert_eq!(config.cache.as_ref().map(|c| (c.max_age_ms, c.max_size)), Some((250, 7)));

        assert_eq!(with_demo_cache(base.clone(), None), base);
        assert!(with_demo_cache(FetchConfig::default(), None).cache.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_demo_cache_serves_second_fetch() {
        let provider = Arc::new(SimulatedProvider::new(Scenario {
            items: 3,
            fail_first: 0,
            latency: Duration::from_millis(10),
        }));
        let config = with_demo_cache(FetchConfig::default(), Some(5000));
        let orchestrator = FetchOrchestrator::with_shared_provider(Arc::clone(&provider), config);

        orchestrator.fetch_data(None, false).await;
        assert!(orchestrator.fetch_data(None, false).await.is_cached());
        assert_eq!(provider.calls(), 1);
    }
}
