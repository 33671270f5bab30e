pub mod config;
pub mod core;
pub mod providers;
pub mod server;

use crate::config::AppConfig;
use crate::providers::daily_rates::DailyRateProvider;
use crate::providers::fetcher::FeedFetcher;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub async fn run(config_path: Option<&str>, port_override: Option<u16>) -> Result<()> {
    info!("Rate service starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let schedule = config.schedule.to_schedule()?;
    let cache_path = config.feed.cache_file_path()?;
    let fetcher = FeedFetcher::new(
        &config.feed.url,
        Duration::from_secs(config.feed.timeout_secs),
    )
    .context("Failed to build feed HTTP client")?;
    let provider = Arc::new(DailyRateProvider::new(fetcher, schedule, cache_path));

    let port = port_override.unwrap_or(config.server.port);
    server::serve(provider, port).await
}
