//! HTTP client construction and process-wide request pacing.

use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

use super::types::REQUEST_TIMEOUT;
use crate::error::ImportError;
use crate::TARGET_WEB_REQUEST;

/// Build the shared HTTP client used for every upstream call. The
/// User-Agent identifies this importer to the API operators.
pub fn build_http_client(user_agent: &str) -> Result<reqwest::Client, ImportError> {
    debug!(target: TARGET_WEB_REQUEST, "Creating HTTP client with User-Agent: {}", user_agent);

    reqwest::Client::builder()
        .user_agent(user_agent)
        .gzip(true)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|err| ImportError::Configuration(format!("failed to build HTTP client: {}", err)))
}

/// Enforces a minimum delay between upstream calls. One limiter is owned
/// by the pipeline for the whole run, so pacing is process-wide rather
/// than per-tile.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_call: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        RateLimiter {
            interval,
            last_call: None,
        }
    }

    /// Sleep until at least the configured interval has elapsed since
    /// the previous call, then stamp the current call.
    pub async fn acquire(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                sleep(self.interval - elapsed).await;
            }
        }
        self.last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_acquire_does_not_wait() {
        let mut limiter = RateLimiter::new(Duration::from_secs(1));
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn subsequent_acquires_are_paced() {
        let mut limiter = RateLimiter::new(Duration::from_secs(1));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_time_counts_toward_the_interval() {
        let mut limiter = RateLimiter::new(Duration::from_secs(1));
        limiter.acquire().await;
        sleep(Duration::from_secs(5)).await;
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
