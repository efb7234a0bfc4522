//! The aligned, derived timeseries handed to consumers.

use crate::align::AlignmentPolicy;
use crate::derive::{DerivationWarning, DerivedTable};
use crate::error::Result;
use chrono::NaiveDate;
use kessan_data::Granularity;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Raw and derived values for one reporting period.
///
/// `None` means the statement had no cell for the period, or the metric is
/// undefined for it. It is never a stand-in for zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedPeriodRecord {
    /// Period end (timezone-naive)
    pub period_end: NaiveDate,
    /// Revenue
    pub revenue: Option<f64>,
    /// Operating income
    pub operating_income: Option<f64>,
    /// Net income
    pub net_income: Option<f64>,
    /// Operating cash flow
    pub operating_cash_flow: Option<f64>,
    /// Book value (shareholders' equity)
    pub book_value: Option<f64>,
    /// Shares outstanding
    pub shares_outstanding: Option<f64>,
    /// Earnings per share
    pub eps: Option<f64>,
    /// Book value per share
    pub bps: Option<f64>,
    /// Operating income over revenue, in percent (not clamped)
    pub operating_margin_pct: Option<f64>,
    /// Operating cash flow per share
    pub operating_cash_flow_per_share: Option<f64>,
    /// Dividends paid per share in the period
    pub dividend_per_share: Option<f64>,
    /// Dividend per share over EPS, in percent
    pub payout_ratio_pct: Option<f64>,
}

/// Column names, in [`FinancialTimeseries::to_dataframe`] order.
pub const COLUMNS: [&str; 13] = [
    "period_end",
    "revenue",
    "operating_income",
    "net_income",
    "operating_cash_flow",
    "book_value",
    "shares_outstanding",
    "eps",
    "bps",
    "operating_margin_pct",
    "operating_cash_flow_per_share",
    "dividend_per_share",
    "payout_ratio_pct",
];

/// Aligned per-period financials for one ticker and cadence.
///
/// Every column accessor returns a vector of the same length, indexed like
/// [`period_ends`](Self::period_ends), which is strictly ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialTimeseries {
    ticker: String,
    granularity: Granularity,
    policy: AlignmentPolicy,
    records: Vec<AlignedPeriodRecord>,
    warnings: Vec<DerivationWarning>,
    has_dividends: bool,
}

impl FinancialTimeseries {
    /// Wrap a derived table.
    pub fn new(ticker: impl Into<String>, granularity: Granularity, derived: DerivedTable) -> Self {
        let DerivedTable {
            policy,
            records,
            warnings,
            has_dividends,
        } = derived;
        Self {
            ticker: ticker.into(),
            granularity,
            policy,
            records,
            warnings,
            has_dividends,
        }
    }

    /// Ticker the series was built for.
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Reporting cadence.
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Alignment policy used.
    pub const fn policy(&self) -> AlignmentPolicy {
        self.policy
    }

    /// Records, ascending by period end.
    pub fn records(&self) -> &[AlignedPeriodRecord] {
        &self.records
    }

    /// Non-fatal derivation problems, by period.
    pub fn warnings(&self) -> &[DerivationWarning] {
        &self.warnings
    }

    /// Whether any period carries a dividend value.
    pub const fn has_dividends(&self) -> bool {
        self.has_dividends
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no periods.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent period.
    pub fn latest(&self) -> Option<&AlignedPeriodRecord> {
        self.records.last()
    }

    /// The shared date axis.
    pub fn period_ends(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.period_end).collect()
    }

    fn column(&self, f: impl Fn(&AlignedPeriodRecord) -> Option<f64>) -> Vec<Option<f64>> {
        self.records.iter().map(f).collect()
    }

    /// Revenue column.
    pub fn revenue(&self) -> Vec<Option<f64>> {
        self.column(|r| r.revenue)
    }

    /// Operating income column.
    pub fn operating_income(&self) -> Vec<Option<f64>> {
        self.column(|r| r.operating_income)
    }

    /// Net income column.
    pub fn net_income(&self) -> Vec<Option<f64>> {
        self.column(|r| r.net_income)
    }

    /// Operating cash flow column.
    pub fn operating_cash_flow(&self) -> Vec<Option<f64>> {
        self.column(|r| r.operating_cash_flow)
    }

    /// Book value column.
    pub fn book_value(&self) -> Vec<Option<f64>> {
        self.column(|r| r.book_value)
    }

    /// Shares outstanding column.
    pub fn shares_outstanding(&self) -> Vec<Option<f64>> {
        self.column(|r| r.shares_outstanding)
    }

    /// EPS column.
    pub fn eps(&self) -> Vec<Option<f64>> {
        self.column(|r| r.eps)
    }

    /// BPS column.
    pub fn bps(&self) -> Vec<Option<f64>> {
        self.column(|r| r.bps)
    }

    /// Operating margin column, in percent.
    pub fn operating_margin_pct(&self) -> Vec<Option<f64>> {
        self.column(|r| r.operating_margin_pct)
    }

    /// Operating cash flow per share column.
    pub fn operating_cash_flow_per_share(&self) -> Vec<Option<f64>> {
        self.column(|r| r.operating_cash_flow_per_share)
    }

    /// Dividend per share column.
    pub fn dividend_per_share(&self) -> Vec<Option<f64>> {
        self.column(|r| r.dividend_per_share)
    }

    /// Payout ratio column, in percent.
    pub fn payout_ratio_pct(&self) -> Vec<Option<f64>> {
        self.column(|r| r.payout_ratio_pct)
    }

    /// Convert to a DataFrame with a `Date` column `period_end` followed by
    /// one nullable `f64` column per metric.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        // NaiveDate::default() is 1970-01-01
        let days: Vec<i32> = self
            .records
            .iter()
            .map(|r| (r.period_end - NaiveDate::default()).num_days() as i32)
            .collect();

        let df = DataFrame::new(vec![
            Series::new(COLUMNS[0].into(), days).into(),
            Series::new(COLUMNS[1].into(), self.revenue()).into(),
            Series::new(COLUMNS[2].into(), self.operating_income()).into(),
            Series::new(COLUMNS[3].into(), self.net_income()).into(),
            Series::new(COLUMNS[4].into(), self.operating_cash_flow()).into(),
            Series::new(COLUMNS[5].into(), self.book_value()).into(),
            Series::new(COLUMNS[6].into(), self.shares_outstanding()).into(),
            Series::new(COLUMNS[7].into(), self.eps()).into(),
            Series::new(COLUMNS[8].into(), self.bps()).into(),
            Series::new(COLUMNS[9].into(), self.operating_margin_pct()).into(),
            Series::new(COLUMNS[10].into(), self.operating_cash_flow_per_share()).into(),
            Series::new(COLUMNS[11].into(), self.dividend_per_share()).into(),
            Series::new(COLUMNS[12].into(), self.payout_ratio_pct()).into(),
        ])?;

        let df = df
            .lazy()
            .with_column(col(COLUMNS[0]).cast(DataType::Date))
            .collect()?;

        Ok(df)
    }
}
