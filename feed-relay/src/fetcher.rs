use crate::types::{FetchConfig, RelayError, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use interfaces::FeedFetch;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use url::Url;

/// HTTP client for feeds and article pages: retries with exponential backoff,
/// caps response size and spaces out requests to the same host.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    rate_limiter: Arc<RwLock<HashMap<String, Instant>>>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            config,
            rate_limiter: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Fetch raw feed bytes, retrying transport errors and non-success
    /// statuses until the retry budget runs out.
    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Fetching feed: {}", url);
        self.apply_rate_limit(url).await?;

        let mut backoff = self.backoff();
        let mut last_error = String::from("no attempt made");

        for attempt in 0..=self.config.max_retries {
            match self.fetch_once(url).await {
                Ok(body) => {
                    info!("Successfully fetched feed: {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(FetchAttempt::Fatal(reason)) => {
                    return Err(RelayError::FeedFetch {
                        url: url.to_string(),
                        reason,
                    });
                }
                Err(FetchAttempt::Retryable(reason)) => {
                    last_error = reason;
                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!("Attempt {} failed for {}: {}, retrying in {:?}", attempt + 1, url, last_error, delay);
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                    break;
                }
            }
        }

        error!("Failed to fetch feed after {} attempts: {}", self.config.max_retries + 1, url);
        Err(RelayError::FeedFetch {
            url: url.to_string(),
            reason: last_error,
        })
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<Vec<u8>, FetchAttempt> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchAttempt::Retryable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = format!("HTTP {}: {}", status, status.canonical_reason().unwrap_or("Unknown"));
            return Err(if is_retryable(status) {
                FetchAttempt::Retryable(reason)
            } else {
                FetchAttempt::Fatal(reason)
            });
        }

        let limit = self.config.max_feed_size_mb * 1024 * 1024;
        if let Some(content_length) = response.content_length() {
            if content_length as usize > limit {
                return Err(FetchAttempt::Fatal(format!("Feed too large: {} bytes", content_length)));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchAttempt::Retryable(e.to_string()))?;
        if body.len() > limit {
            return Err(FetchAttempt::Fatal(format!("Feed too large: {} bytes", body.len())));
        }
        Ok(body.to_vec())
    }

    /// Fetch an HTML page as text.
    pub async fn fetch_full_content(&self, url: &str) -> Result<String> {
        debug!("Fetching full content from: {}", url);
        self.apply_rate_limit(url).await?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )
            .into());
        }

        Ok(response.text().await?)
    }

    fn backoff(&self) -> ExponentialBackoff<backoff::SystemClock> {
        let delay = self.config.retry_delay_seconds;
        ExponentialBackoff {
            current_interval: Duration::from_secs(delay),
            initial_interval: Duration::from_secs(delay),
            max_interval: Duration::from_secs(delay * 32),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(delay * 60)),
            ..Default::default()
        }
    }

    async fn apply_rate_limit(&self, url: &str) -> Result<()> {
        let parsed_url = Url::parse(url)?;
        let host = parsed_url.host_str().unwrap_or("").to_string();

        let now = Instant::now();
        let min_interval = Duration::from_secs(1);

        let wait = {
            let rate_limiter = self.rate_limiter.read().await;
            rate_limiter
                .get(&host)
                .map(|last_request| now.duration_since(*last_request))
                .filter(|elapsed| *elapsed < min_interval)
                .map(|elapsed| min_interval - elapsed)
        };
        if let Some(wait_time) = wait {
            debug!("Rate limiting {}: waiting {:?}", host, wait_time);
            tokio::time::sleep(wait_time).await;
        }
        self.rate_limiter.write().await.insert(host, Instant::now());

        Ok(())
    }
}

enum FetchAttempt {
    Retryable(String),
    Fatal(String),
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::REQUEST_TIMEOUT
}

#[async_trait]
impl FeedFetch for Fetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        Ok(self.fetch_feed(url).await?)
    }
}
