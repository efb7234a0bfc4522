//! Provider configuration.

use chrono::NaiveDate;
use std::time::Duration;

/// Settings for network-backed statement providers.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Minimum delay between consecutive requests to the same host.
    pub rate_limit_delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Extra attempts after a rate-limited, 5xx or transport failure.
    pub max_retries: u32,
    /// Pause before each retry.
    pub retry_delay: Duration,
    /// Earliest period requested from the provider.
    pub history_start: NaiveDate,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            rate_limit_delay: Duration::from_millis(250),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_delay: Duration::from_secs(2),
            history_start: NaiveDate::from_ymd_opt(1985, 1, 1).unwrap_or_default(),
        }
    }
}
