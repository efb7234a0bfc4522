//! Share count and dividend history through the Yahoo Finance chart and
//! quote-summary APIs.

use super::http::{RateLimiter, with_retry};
use crate::config::ProviderConfig;
use crate::error::{DataError, Result};
use crate::statement::{DividendSeries, date_from_unix};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use yahoo_finance_api as yahoo;

/// Yahoo Finance quote provider with rate limiting.
pub struct YahooQuoteProvider {
    provider: Mutex<yahoo::YahooConnector>,
    limiter: Arc<Mutex<RateLimiter>>,
    config: ProviderConfig,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Create a quote provider with the given settings.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let provider = yahoo::YahooConnector::new()?;
        Ok(Self {
            provider: Mutex::new(provider),
            limiter: Arc::new(Mutex::new(RateLimiter::new(config.rate_limit_delay))),
            config,
        })
    }

    /// Current shares outstanding from the key statistics module.
    pub async fn fetch_share_count(&self, ticker: &str) -> Result<Option<f64>> {
        let summary = with_retry(&self.config, "ticker info", || async {
            self.limiter.lock().await.wait().await;
            let mut provider = self.provider.lock().await;
            provider.get_ticker_info(ticker).await.map_err(DataError::from)
        })
        .await?;

        let shares = summary
            .quote_summary
            .and_then(|qs| qs.result)
            .and_then(|results| results.into_iter().next())
            .and_then(|data| data.default_key_statistics)
            .and_then(|stats| stats.shares_outstanding)
            .map(|v| v as f64);

        debug!(ticker, ?shares, "fetched share count");
        Ok(shares)
    }

    /// Every dividend paid since the configured history start.
    ///
    /// `Ok(None)` when the ticker never paid one.
    pub async fn fetch_dividends(&self, ticker: &str) -> Result<Option<DividendSeries>> {
        let start = self
            .config
            .history_start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();

        // Convert chrono timestamps to time::OffsetDateTime
        let start_time = time::OffsetDateTime::from_unix_timestamp(start)
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;
        let end_time = time::OffsetDateTime::from_unix_timestamp(Utc::now().timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;

        let response = with_retry(&self.config, "dividend history", || async {
            self.limiter.lock().await.wait().await;
            let provider = self.provider.lock().await;
            provider
                .get_quote_history_interval(ticker, start_time, end_time, "1mo")
                .await
                .map_err(DataError::from)
        })
        .await?;

        // Ex-dates are midnight at the exchange, so they are read in its offset.
        let utc_offset = response.metadata()?.gmtoffset;
        let events = response
            .dividends()?
            .into_iter()
            .map(|d| Ok((date_from_unix(d.date as i64, utc_offset)?, d.amount)))
            .collect::<Result<Vec<_>>>()?;

        debug!(ticker, events = events.len(), utc_offset, "fetched dividend history");

        if events.is_empty() {
            return Ok(None);
        }
        Ok(Some(DividendSeries::from_events(events)))
    }
}
