//! Yahoo Finance data providers.

mod http;
pub mod quotes;
pub mod timeseries;

pub use quotes::YahooQuoteProvider;
pub use timeseries::{TimeseriesClient, field_label, parse_timeseries};

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::provider::StatementProvider;
use crate::statement::{DividendSeries, Granularity, StatementKind, StatementTable};
use async_trait::async_trait;

/// Statements, share count and dividends from Yahoo Finance.
#[derive(Debug)]
pub struct YahooProvider {
    statements: TimeseriesClient,
    quotes: YahooQuoteProvider,
}

impl YahooProvider {
    /// Create a provider with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(ProviderConfig::default())
    }

    /// Create a provider with custom settings.
    pub fn with_config(config: ProviderConfig) -> Result<Self> {
        Ok(Self {
            statements: TimeseriesClient::new(config.clone())?,
            quotes: YahooQuoteProvider::new(config)?,
        })
    }
}

#[async_trait]
impl StatementProvider for YahooProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    async fn fetch_income_statement(
        &self,
        ticker: &str,
        granularity: Granularity,
    ) -> Result<Option<StatementTable>> {
        self.statements
            .fetch_statement(ticker, StatementKind::Income, granularity)
            .await
    }

    async fn fetch_balance_sheet(
        &self,
        ticker: &str,
        granularity: Granularity,
    ) -> Result<Option<StatementTable>> {
        self.statements
            .fetch_statement(ticker, StatementKind::BalanceSheet, granularity)
            .await
    }

    async fn fetch_cash_flow(
        &self,
        ticker: &str,
        granularity: Granularity,
    ) -> Result<Option<StatementTable>> {
        self.statements
            .fetch_statement(ticker, StatementKind::CashFlow, granularity)
            .await
    }

    async fn fetch_share_count(&self, ticker: &str) -> Result<Option<f64>> {
        self.quotes.fetch_share_count(ticker).await
    }

    async fn fetch_dividends(&self, ticker: &str) -> Result<Option<DividendSeries>> {
        self.quotes.fetch_dividends(ticker).await
    }
}
