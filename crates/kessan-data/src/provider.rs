//! The statement provider seam and the raw input set of one request.

use crate::error::{DataError, Result};
use crate::statement::{DividendSeries, Granularity, StatementKind, StatementTable};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::{debug, warn};

/// Source of raw financial statements.
///
/// `Ok(None)` means the provider has nothing for the request. An empty table
/// and a missing table are both treated as absent downstream, but neither is
/// ever confused with a zero value.
#[async_trait]
pub trait StatementProvider: Send + Sync + Debug {
    /// Provider name used in logs (e.g., "Yahoo Finance").
    fn name(&self) -> &str;

    /// Income statement for `ticker` at the given cadence.
    async fn fetch_income_statement(
        &self,
        ticker: &str,
        granularity: Granularity,
    ) -> Result<Option<StatementTable>>;

    /// Balance sheet for `ticker` at the given cadence.
    async fn fetch_balance_sheet(
        &self,
        ticker: &str,
        granularity: Granularity,
    ) -> Result<Option<StatementTable>>;

    /// Cash-flow statement for `ticker` at the given cadence.
    async fn fetch_cash_flow(
        &self,
        ticker: &str,
        granularity: Granularity,
    ) -> Result<Option<StatementTable>>;

    /// Current number of shares outstanding.
    async fn fetch_share_count(&self, ticker: &str) -> Result<Option<f64>>;

    /// Full dividend history.
    async fn fetch_dividends(&self, ticker: &str) -> Result<Option<DividendSeries>>;

    /// Fetch one statement by kind.
    async fn fetch_statement(
        &self,
        ticker: &str,
        kind: StatementKind,
        granularity: Granularity,
    ) -> Result<Option<StatementTable>> {
        match kind {
            StatementKind::Income => self.fetch_income_statement(ticker, granularity).await,
            StatementKind::BalanceSheet => self.fetch_balance_sheet(ticker, granularity).await,
            StatementKind::CashFlow => self.fetch_cash_flow(ticker, granularity).await,
        }
    }
}

/// Everything fetched for one (ticker, granularity) request.
///
/// Owned by a single pipeline invocation and dropped once the aligned series
/// has been built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStatementSet {
    /// Ticker the set was fetched for
    pub ticker: String,
    /// Cadence of the three statements
    pub granularity: Granularity,
    /// Income statement
    pub income: Option<StatementTable>,
    /// Balance sheet
    pub balance: Option<StatementTable>,
    /// Cash-flow statement
    pub cashflow: Option<StatementTable>,
    /// Current share count
    pub shares_outstanding: Option<f64>,
    /// Dividend history
    pub dividends: Option<DividendSeries>,
}

impl RawStatementSet {
    /// An empty set for `ticker`.
    pub fn new(ticker: impl Into<String>, granularity: Granularity) -> Self {
        Self {
            ticker: ticker.into(),
            granularity,
            income: None,
            balance: None,
            cashflow: None,
            shares_outstanding: None,
            dividends: None,
        }
    }

    /// Fetch all inputs concurrently.
    ///
    /// Any statement or share-count failure fails the whole fetch. Dividends
    /// are optional: a dividend failure is logged and treated as no data.
    pub async fn fetch<P>(provider: &P, ticker: &str, granularity: Granularity) -> Result<Self>
    where
        P: StatementProvider + ?Sized,
    {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(DataError::InvalidSymbol("Empty ticker".to_string()));
        }

        debug!(provider = provider.name(), ticker, %granularity, "fetching statements");

        let required = async {
            tokio::try_join!(
                provider.fetch_income_statement(ticker, granularity),
                provider.fetch_balance_sheet(ticker, granularity),
                provider.fetch_cash_flow(ticker, granularity),
                provider.fetch_share_count(ticker),
            )
        };
        let (required, dividends) = tokio::join!(required, provider.fetch_dividends(ticker));
        let (income, balance, cashflow, shares_outstanding) = required?;

        let dividends = dividends.unwrap_or_else(|e| {
            warn!(ticker, error = %e, "dividend history unavailable, continuing without it");
            None
        });

        Ok(Self {
            ticker: ticker.to_string(),
            granularity,
            income,
            balance,
            cashflow,
            shares_outstanding,
            dividends,
        })
    }

    /// The statement of the given kind.
    pub const fn statement(&self, kind: StatementKind) -> Option<&StatementTable> {
        match kind {
            StatementKind::Income => self.income.as_ref(),
            StatementKind::BalanceSheet => self.balance.as_ref(),
            StatementKind::CashFlow => self.cashflow.as_ref(),
        }
    }
}
