//! Orchestrates the refresh pipeline: staleness check, download, parse.

use crate::core::rates::{RateProvider, RateTable};
use crate::core::schedule::RefreshSchedule;
use crate::providers::feed;
use crate::providers::fetcher::FeedFetcher;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Cache-validity record held in process memory, deliberately decoupled from
/// the cache file's filesystem metadata.
#[derive(Debug, Default)]
struct CacheState {
    last_refresh: Option<DateTime<Utc>>,
}

/// Serves the current feed snapshot, refreshing the cache file when the
/// daily publication threshold has passed.
///
/// Every request re-evaluates staleness; nothing besides the cache file and
/// the refresh timestamp persists between requests. The state mutex is held
/// across the download, so concurrent requests that find the cache stale
/// coalesce into a single fetch: whoever acquires the lock first downloads,
/// and the rest re-evaluate staleness afterwards and skip their own.
pub struct DailyRateProvider {
    fetcher: FeedFetcher,
    schedule: RefreshSchedule,
    cache_path: PathBuf,
    state: Mutex<CacheState>,
}

impl DailyRateProvider {
    pub fn new(fetcher: FeedFetcher, schedule: RefreshSchedule, cache_path: PathBuf) -> Self {
        Self {
            fetcher,
            schedule,
            cache_path,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Downloads a fresh feed if the cached one is outdated.
    ///
    /// A failed download propagates without updating the refresh timestamp;
    /// the next request evaluates the cache as stale again and retries.
    async fn ensure_fresh(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        if !self.schedule.is_stale(now, state.last_refresh) {
            debug!("Feed cache is fresh");
            return Ok(());
        }

        info!("Feed cache is stale, refreshing");
        self.fetcher
            .download(&self.cache_path)
            .await
            .context("Feed refresh failed")?;
        state.last_refresh = Some(Utc::now());
        Ok(())
    }

    #[cfg(test)]
    async fn set_last_refresh(&self, at: Option<DateTime<Utc>>) {
        self.state.lock().await.last_refresh = at;
    }
}

#[async_trait]
impl RateProvider for DailyRateProvider {
    async fn current_rates(&self) -> Result<RateTable> {
        self.ensure_fresh().await?;

        let raw = tokio::fs::read_to_string(&self.cache_path)
            .await
            .with_context(|| {
                format!("Failed to read feed cache: {}", self.cache_path.display())
            })?;
        let records = feed::parse_feed(&raw).context("Failed to parse feed")?;
        Ok(RateTable::new(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use chrono_tz::Europe::Prague;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED_BODY: &str = "06 Aug 2026 #151\n\
        Country|Currency|Amount|Code|Rate\n\
        USA|dollar|1|USD|23.5\n\
        EMU|euro|1|EUR|25.0\n";

    async fn create_feed_mock_server(
        status_code: u16,
        body: &str,
        expected_requests: u64,
    ) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/daily.txt"))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(body))
            .expect(expected_requests)
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn provider_for(server: &MockServer, cache_path: PathBuf) -> DailyRateProvider {
        let url = format!("{}/daily.txt", server.uri());
        let fetcher = FeedFetcher::new(&url, Duration::from_secs(5)).unwrap();
        let schedule = RefreshSchedule::new(Prague, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
        DailyRateProvider::new(fetcher, schedule, cache_path)
    }

    #[tokio::test]
    async fn test_first_request_downloads_and_parses() {
        let server = create_feed_mock_server(200, FEED_BODY, 1).await;
        let dir = tempfile::tempdir().unwrap();
        let provider = provider_for(&server, dir.path().join("daily_rates.txt"));

        let table = provider.current_rates().await.unwrap();

        assert_eq!(table.records().len(), 2);
        assert_eq!(table.find("USD").unwrap().rate, 23.5);
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_the_download() {
        let server = create_feed_mock_server(200, FEED_BODY, 1).await;
        let dir = tempfile::tempdir().unwrap();
        let provider = provider_for(&server, dir.path().join("daily_rates.txt"));

        provider.current_rates().await.unwrap();
        // The refresh just happened, so the second request reads the cache.
        provider.current_rates().await.unwrap();
    }

    #[tokio::test]
    async fn test_fresh_state_reads_existing_cache_without_fetch() {
        let server = create_feed_mock_server(200, FEED_BODY, 0).await;
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("daily_rates.txt");
        std::fs::write(&cache_path, FEED_BODY).unwrap();

        let provider = provider_for(&server, cache_path);
        provider.set_last_refresh(Some(Utc::now())).await;

        let table = provider.current_rates().await.unwrap();
        assert_eq!(table.records().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_fetch_once() {
        let server = create_feed_mock_server(200, FEED_BODY, 1).await;
        let dir = tempfile::tempdir().unwrap();
        let provider = provider_for(&server, dir.path().join("daily_rates.txt"));

        let results =
            futures::future::join_all((0..8).map(|_| provider.current_rates())).await;

        for result in results {
            assert_eq!(result.unwrap().records().len(), 2);
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_propagates_and_retries_next_request() {
        // Both requests hit the upstream because a failed refresh must not
        // mark the cache fresh.
        let server = create_feed_mock_server(500, "Server Error", 2).await;
        let dir = tempfile::tempdir().unwrap();
        let provider = provider_for(&server, dir.path().join("daily_rates.txt"));

        assert!(provider.current_rates().await.is_err());
        assert!(provider.current_rates().await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_feed_fails_the_request() {
        let server = create_feed_mock_server(200, "meta\nheader\nUSA|dollar|USD\n", 1).await;
        let dir = tempfile::tempdir().unwrap();
        let provider = provider_for(&server, dir.path().join("daily_rates.txt"));

        let err = provider.current_rates().await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse feed"));
    }
}
