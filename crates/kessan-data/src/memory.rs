//! In-memory statement provider.
//!
//! Serves a [`RawStatementSet`] that was built by hand or loaded from a JSON
//! snapshot. Requests for another ticker or cadence get empty answers, the
//! same way a remote provider answers for an unknown symbol.

use crate::error::Result;
use crate::provider::{RawStatementSet, StatementProvider};
use crate::statement::{DividendSeries, Granularity, StatementTable};
use async_trait::async_trait;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Provider backed by a single raw statement set.
#[derive(Debug, Clone)]
pub struct MemoryProvider {
    set: RawStatementSet,
}

impl MemoryProvider {
    /// Serve `set`.
    pub const fn new(set: RawStatementSet) -> Self {
        Self { set }
    }

    /// Load a JSON snapshot of a [`RawStatementSet`].
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let set: RawStatementSet = serde_json::from_reader(reader)?;
        Ok(Self::new(set))
    }

    /// The served set.
    pub const fn set(&self) -> &RawStatementSet {
        &self.set
    }

    fn serves(&self, ticker: &str) -> bool {
        self.set.ticker.eq_ignore_ascii_case(ticker.trim())
    }

    fn statement(
        &self,
        ticker: &str,
        granularity: Granularity,
        table: Option<&StatementTable>,
    ) -> Option<StatementTable> {
        if self.serves(ticker) && self.set.granularity == granularity {
            table.cloned()
        } else {
            None
        }
    }
}

#[async_trait]
impl StatementProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_income_statement(
        &self,
        ticker: &str,
        granularity: Granularity,
    ) -> Result<Option<StatementTable>> {
        Ok(self.statement(ticker, granularity, self.set.income.as_ref()))
    }

    async fn fetch_balance_sheet(
        &self,
        ticker: &str,
        granularity: Granularity,
    ) -> Result<Option<StatementTable>> {
        Ok(self.statement(ticker, granularity, self.set.balance.as_ref()))
    }

    async fn fetch_cash_flow(
        &self,
        ticker: &str,
        granularity: Granularity,
    ) -> Result<Option<StatementTable>> {
        Ok(self.statement(ticker, granularity, self.set.cashflow.as_ref()))
    }

    async fn fetch_share_count(&self, ticker: &str) -> Result<Option<f64>> {
        Ok(self
            .serves(ticker)
            .then_some(self.set.shares_outstanding)
            .flatten())
    }

    async fn fetch_dividends(&self, ticker: &str) -> Result<Option<DividendSeries>> {
        Ok(if self.serves(ticker) {
            self.set.dividends.clone()
        } else {
            None
        })
    }
}
