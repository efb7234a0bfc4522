//! Request pacing and bounded retry shared by the Yahoo clients.

use crate::config::ProviderConfig;
use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::warn;

/// Spaces consecutive requests at least `min_interval` apart.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    last_request: Option<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    pub(crate) const fn new(min_interval: Duration) -> Self {
        Self {
            last_request: None,
            min_interval,
        }
    }

    pub(crate) async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// Run `op`, retrying retryable failures up to `config.max_retries` times.
pub(crate) async fn with_retry<T, F, Fut>(config: &ProviderConfig, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(e) if attempt < config.max_retries && e.is_retryable() => {
                attempt += 1;
                warn!(
                    what,
                    attempt,
                    max_retries = config.max_retries,
                    error = %e,
                    "request failed, retrying"
                );
                sleep(config.retry_delay).await;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_retries: u32) -> ProviderConfig {
        ProviderConfig {
            max_retries,
            retry_delay: Duration::from_millis(1),
            ..ProviderConfig::default()
        }
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_config(2), "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(DataError::RateLimit { url: "u".to_string() })
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(&fast_config(1), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DataError::HttpStatus {
                status: 503,
                url: "u".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(DataError::HttpStatus { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(&fast_config(3), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DataError::HttpStatus {
                status: 404,
                url: "u".to_string(),
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
