//! Raw statement types shared by providers and the metrics pipeline.
//!
//! Everything here is keyed by timezone-naive period-end dates held in ordered
//! maps, so iteration order is deterministic regardless of provider order.

use crate::error::{DataError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Reporting cadence of a statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Quarterly reports
    #[default]
    Quarterly,
    /// Annual reports
    Annual,
}

impl Granularity {
    /// Lowercase name, as accepted by [`FromStr`].
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quarterly" | "quarter" | "q" => Ok(Self::Quarterly),
            "annual" | "yearly" | "a" | "y" => Ok(Self::Annual),
            _ => Err(DataError::InvalidValue {
                field: "granularity",
                value: s.to_string(),
            }),
        }
    }
}

/// The three financial statements the pipeline consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// Income statement
    Income,
    /// Balance sheet
    BalanceSheet,
    /// Cash-flow statement
    CashFlow,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Income => "income statement",
            Self::BalanceSheet => "balance sheet",
            Self::CashFlow => "cash flow statement",
        })
    }
}

/// One financial statement: line-item label -> period end -> value.
///
/// `periods` holds every period the statement reported, including periods for
/// which a given row has no cell. A row lookup that fails is an ordinary
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    kind: StatementKind,
    periods: BTreeSet<NaiveDate>,
    rows: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl StatementTable {
    /// Create an empty statement.
    pub const fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            periods: BTreeSet::new(),
            rows: BTreeMap::new(),
        }
    }

    /// Builder form of [`insert`](Self::insert) for a whole row.
    pub fn with_row<I>(mut self, label: &str, values: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        for (period_end, value) in values {
            self.insert(label, period_end, value);
        }
        self
    }

    /// Record a period column without any cell values.
    pub fn add_period(&mut self, period_end: NaiveDate) {
        self.periods.insert(period_end);
    }

    /// Set one cell.
    ///
    /// A second value for the same label and period replaces the first: the
    /// provider's most recent answer wins and a reconciliation note is logged.
    pub fn insert(&mut self, label: impl Into<String>, period_end: NaiveDate, value: f64) {
        let label = label.into();
        self.periods.insert(period_end);
        let row = self.rows.entry(label.clone()).or_default();
        if let Some(previous) = row.insert(period_end, value) {
            info!(
                statement = %self.kind,
                label = %label,
                %period_end,
                previous,
                value,
                "duplicate period in statement, keeping most recent value"
            );
        }
    }

    /// Which statement this is.
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Whether the statement reported no periods at all.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Number of reported periods.
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Reported period ends, ascending.
    pub fn periods(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.periods.iter().copied()
    }

    /// Reported period ends as a set.
    pub const fn period_set(&self) -> &BTreeSet<NaiveDate> {
        &self.periods
    }

    /// Row labels, sorted.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.keys().map(String::as_str)
    }

    /// Whether a row with this label exists.
    pub fn has_row(&self, label: &str) -> bool {
        self.rows.contains_key(label)
    }

    /// A whole row, if present.
    pub fn row(&self, label: &str) -> Option<&BTreeMap<NaiveDate, f64>> {
        self.rows.get(label)
    }

    /// The cell for `label` at exactly `period_end`.
    pub fn value(&self, label: &str, period_end: NaiveDate) -> Option<f64> {
        self.rows.get(label)?.get(&period_end).copied()
    }
}

/// Latest value dated at or before `date`. Never looks forward.
pub fn value_as_of(series: &BTreeMap<NaiveDate, f64>, date: NaiveDate) -> Option<f64> {
    series.range(..=date).next_back().map(|(_, value)| *value)
}

/// Share count input: either the current count assumed constant across
/// history, or a dated series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SharesOutstanding {
    /// One share count applied to every period.
    Constant(f64),
    /// Share counts by date.
    Series(BTreeMap<NaiveDate, f64>),
}

impl SharesOutstanding {
    /// Share count for each calendar date.
    ///
    /// A series is forward-filled: each date takes the latest count dated at
    /// or before it, and dates preceding the series stay `None`.
    pub fn resolve(&self, calendar: &[NaiveDate]) -> Vec<Option<f64>> {
        match self {
            Self::Constant(count) => vec![Some(*count); calendar.len()],
            Self::Series(series) => calendar
                .iter()
                .map(|date| value_as_of(series, *date))
                .collect(),
        }
    }

    /// Whether there is no share count to resolve.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Constant(_) => false,
            Self::Series(series) => series.is_empty(),
        }
    }
}

/// A single ex-dividend event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendEvent {
    /// Ex-dividend date
    pub ex_date: NaiveDate,
    /// Cash amount per share
    pub amount: f64,
}

/// Sparse dividend history on its own calendar.
///
/// Events sharing a date are kept as separate events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DividendSeries {
    events: Vec<DividendEvent>,
}

impl DividendSeries {
    /// Build from `(ex_date, amount)` pairs in any order.
    pub fn from_events<I>(events: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut events: Vec<DividendEvent> = events
            .into_iter()
            .map(|(ex_date, amount)| DividendEvent { ex_date, amount })
            .collect();
        events.sort_by_key(|e| e.ex_date);
        Self { events }
    }

    /// Events sorted by ex-date.
    pub fn events(&self) -> &[DividendEvent] {
        &self.events
    }

    /// Whether there are no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

/// Drop the timezone of a provider timestamp, keeping its wall-clock date.
pub fn naive_date<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> NaiveDate {
    timestamp.naive_local().date()
}

/// Convert unix seconds to the wall-clock date of a venue `utc_offset`
/// seconds east of UTC.
pub fn date_from_unix(seconds: i64, utc_offset: i32) -> Result<NaiveDate> {
    let offset = FixedOffset::east_opt(utc_offset)
        .ok_or_else(|| DataError::TimeConversion(format!("invalid UTC offset: {utc_offset}")))?;
    DateTime::from_timestamp(seconds, 0)
        .map(|dt| naive_date(&dt.with_timezone(&offset)))
        .ok_or_else(|| DataError::TimeConversion(format!("timestamp out of range: {seconds}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("quarterly", Granularity::Quarterly)]
    #[case("Annual", Granularity::Annual)]
    #[case(" q ", Granularity::Quarterly)]
    #[case("yearly", Granularity::Annual)]
    fn test_granularity_from_str(#[case] input: &str, #[case] expected: Granularity) {
        assert_eq!(input.parse::<Granularity>().unwrap(), expected);
    }

    #[test]
    fn test_granularity_rejects_unknown() {
        let err = "monthly".parse::<Granularity>().unwrap_err();
        assert!(matches!(err, DataError::InvalidValue { field: "granularity", .. }));
    }

    #[test]
    fn test_statement_periods_include_empty_cells() {
        let mut table = StatementTable::new(StatementKind::Income)
            .with_row("Total Revenue", [(date(2023, 3, 31), 80_000.0)]);
        table.add_period(date(2023, 6, 30));

        assert_eq!(table.len(), 2);
        assert_eq!(table.value("Total Revenue", date(2023, 3, 31)), Some(80_000.0));
        assert_eq!(table.value("Total Revenue", date(2023, 6, 30)), None);
        assert_eq!(table.value("Net Income", date(2023, 3, 31)), None);
    }

    #[test]
    fn test_duplicate_cell_keeps_latest() {
        let mut table = StatementTable::new(StatementKind::BalanceSheet);
        table.insert("Total Assets", date(2023, 3, 31), 1.0);
        table.insert("Total Assets", date(2023, 3, 31), 2.0);

        assert_eq!(table.len(), 1);
        assert_eq!(table.value("Total Assets", date(2023, 3, 31)), Some(2.0));
    }

    #[test]
    fn test_value_as_of_never_looks_forward() {
        let series: BTreeMap<_, _> = [(date(2023, 3, 31), 10.0), (date(2023, 9, 30), 12.0)]
            .into_iter()
            .collect();

        assert_eq!(value_as_of(&series, date(2023, 1, 1)), None);
        assert_eq!(value_as_of(&series, date(2023, 3, 31)), Some(10.0));
        assert_eq!(value_as_of(&series, date(2023, 6, 30)), Some(10.0));
        assert_eq!(value_as_of(&series, date(2024, 1, 1)), Some(12.0));
    }

    #[test]
    fn test_shares_resolve() {
        let calendar = [date(2023, 3, 31), date(2023, 6, 30), date(2023, 9, 30)];

        let constant = SharesOutstanding::Constant(1_000.0);
        assert_eq!(constant.resolve(&calendar), vec![Some(1_000.0); 3]);

        let series = SharesOutstanding::Series(
            [(date(2023, 6, 30), 900.0)].into_iter().collect(),
        );
        assert_eq!(series.resolve(&calendar), vec![None, Some(900.0), Some(900.0)]);
    }

    #[test]
    fn test_dividend_series_sorted() {
        let series = DividendSeries::from_events([
            (date(2023, 4, 15), 0.25),
            (date(2023, 1, 15), 0.20),
        ]);
        assert_eq!(series.events()[0].ex_date, date(2023, 1, 15));
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_naive_date_keeps_wall_clock() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let ts = tokyo.with_ymd_and_hms(2023, 4, 1, 0, 30, 0).unwrap();
        assert_eq!(naive_date(&ts), date(2023, 4, 1));
    }

    #[rstest]
    // 2023-09-30 00:00 UTC
    #[case(1_696_032_000, 0, date(2023, 9, 30))]
    #[case(1_696_032_000, -5 * 3600, date(2023, 9, 29))]
    // 2023-04-01 09:00 at UTC+12 is still 2023-03-31 in UTC
    #[case(1_680_296_400, 12 * 3600, date(2023, 4, 1))]
    #[case(1_680_296_400, 0, date(2023, 3, 31))]
    fn test_date_from_unix(#[case] seconds: i64, #[case] offset: i32, #[case] expected: NaiveDate) {
        assert_eq!(date_from_unix(seconds, offset).unwrap(), expected);
    }

    #[test]
    fn test_date_from_unix_rejects_bad_offset() {
        assert!(matches!(
            date_from_unix(0, 30 * 3600),
            Err(DataError::TimeConversion(_))
        ));
    }
}
