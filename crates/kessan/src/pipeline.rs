//! One request end to end: fetch, align, derive.
//!
//! [`get_financial_timeseries`] is the entry point used by the CLI. The
//! synchronous core, [`build_timeseries`], takes an already fetched
//! [`RawStatementSet`] so snapshots and tests can skip the provider.

use kessan_data::{
    DataError, Granularity, RawStatementSet, SharesOutstanding, StatementProvider,
};
use kessan_metrics::{
    Aligner, AlignmentPolicy, FinancialTimeseries, MetricsError, derive, labels::SHARE_COUNT,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Pipeline errors. Either the inputs could not be fetched or they could not
/// be turned into a series.
#[derive(Debug, Error)]
pub enum Error {
    /// Fetching raw statements failed
    #[error(transparent)]
    Data(#[from] DataError),

    /// The fetched statements are incomplete or cannot be aligned
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Options of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// How statement calendars are reconciled
    pub policy: AlignmentPolicy,
    /// Use the balance-sheet share-count row, when reported, instead of the
    /// provider's current share count
    pub prefer_share_history: bool,
    /// Attach dividend per share and payout ratio
    pub include_dividends: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            policy: AlignmentPolicy::default(),
            prefer_share_history: true,
            include_dividends: true,
        }
    }
}

/// Pick the share-count source for `raw`.
///
/// With `prefer_history` a non-empty balance-sheet share row wins and becomes
/// a [`SharesOutstanding::Series`]. Otherwise the provider scalar is
/// broadcast, and the row is used only when there is no scalar at all.
pub fn select_shares(raw: &RawStatementSet, prefer_history: bool) -> Option<SharesOutstanding> {
    let history = raw
        .balance
        .as_ref()
        .and_then(|balance| SHARE_COUNT.resolve(balance))
        .map(|(_, values)| values)
        .filter(|values| !values.is_empty());
    let scalar = raw.shares_outstanding;

    match (history, scalar) {
        (Some(history), _) if prefer_history => Some(SharesOutstanding::Series(history)),
        (_, Some(count)) => Some(SharesOutstanding::Constant(count)),
        (history, None) => history.map(SharesOutstanding::Series),
    }
}

/// Align and derive an already fetched statement set.
pub fn build_timeseries(
    raw: &RawStatementSet,
    config: &PipelineConfig,
) -> Result<FinancialTimeseries, Error> {
    let shares = select_shares(raw, config.prefer_share_history);
    debug!(
        ticker = %raw.ticker,
        policy = %config.policy,
        share_history = matches!(shares, Some(SharesOutstanding::Series(_))),
        "aligning statements"
    );

    let aligned = Aligner::new(config.policy).align(
        raw.income.as_ref(),
        raw.balance.as_ref(),
        raw.cashflow.as_ref(),
        shares.as_ref(),
    )?;

    let mut derived = derive(aligned);
    if config.include_dividends {
        derived = derived.with_dividends(raw.dividends.as_ref(), raw.granularity);
    }

    Ok(FinancialTimeseries::new(&raw.ticker, raw.granularity, derived))
}

/// Fetch every input for `ticker` from `provider` and build its series.
///
/// Fails as a whole: a failed statement or share-count fetch, a missing
/// statement or line item, or an empty calendar all return an error and no
/// partial series.
pub async fn get_financial_timeseries<P>(
    provider: &P,
    ticker: &str,
    granularity: Granularity,
    config: &PipelineConfig,
) -> Result<FinancialTimeseries, Error>
where
    P: StatementProvider + ?Sized,
{
    let raw = RawStatementSet::fetch(provider, ticker, granularity).await?;
    build_timeseries(&raw, config)
}
