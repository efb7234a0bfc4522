//! Line-item extraction strategies.
//!
//! Providers label the same concept differently across companies and over
//! time. Each required metric maps to an ordered list of [`Extraction`]s; the
//! first one whose rows exist in the statement is used for the whole series.

use chrono::NaiveDate;
use kessan_data::{StatementKind, StatementTable};
use std::collections::BTreeMap;
use std::fmt;

/// One way of reading a metric out of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// A single row, read as-is.
    Row(&'static str),
    /// One row minus another, per period.
    Difference {
        /// Row subtracted from
        minuend: &'static str,
        /// Row subtracted
        subtrahend: &'static str,
    },
}

impl Extraction {
    /// Values by period, or `None` if the strategy yields no value.
    ///
    /// A difference only has a cell where both rows do, so two rows without a
    /// common period do not apply.
    pub fn extract(&self, table: &StatementTable) -> Option<BTreeMap<NaiveDate, f64>> {
        let values: BTreeMap<NaiveDate, f64> = match self {
            Self::Row(label) => table.row(label).cloned()?,
            Self::Difference {
                minuend,
                subtrahend,
            } => {
                let subtrahend = table.row(subtrahend)?;
                table
                    .row(minuend)?
                    .iter()
                    .filter_map(|(date, a)| subtrahend.get(date).map(|b| (*date, a - b)))
                    .collect()
            }
        };
        (!values.is_empty()).then_some(values)
    }
}

impl fmt::Display for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row(label) => write!(f, "'{label}'"),
            Self::Difference {
                minuend,
                subtrahend,
            } => write!(f, "'{minuend}' - '{subtrahend}'"),
        }
    }
}

/// A metric and where to find it.
#[derive(Debug, Clone, Copy)]
pub struct LineItem {
    /// Metric name used in logs and errors
    pub metric: &'static str,
    /// Statement the metric lives in
    pub statement: StatementKind,
    /// Strategies, tried in order
    pub strategies: &'static [Extraction],
}

impl LineItem {
    /// Label reported when nothing matches.
    pub const fn primary_label(&self) -> &'static str {
        match self.strategies.first() {
            Some(Extraction::Row(label)) => *label,
            Some(Extraction::Difference { minuend, .. }) => *minuend,
            None => self.metric,
        }
    }

    /// First applicable strategy and its values.
    pub fn resolve(&self, table: &StatementTable) -> Option<(Extraction, BTreeMap<NaiveDate, f64>)> {
        self.strategies
            .iter()
            .find_map(|strategy| strategy.extract(table).map(|values| (*strategy, values)))
    }

    /// Human-readable description of every strategy.
    pub fn tried(&self) -> Vec<String> {
        self.strategies.iter().map(ToString::to_string).collect()
    }
}

/// Total revenue.
pub const REVENUE: LineItem = LineItem {
    metric: "revenue",
    statement: StatementKind::Income,
    strategies: &[
        Extraction::Row("Total Revenue"),
        Extraction::Row("Operating Revenue"),
    ],
};

/// Operating income.
pub const OPERATING_INCOME: LineItem = LineItem {
    metric: "operating income",
    statement: StatementKind::Income,
    strategies: &[Extraction::Row("Operating Income")],
};

/// Net income.
pub const NET_INCOME: LineItem = LineItem {
    metric: "net income",
    statement: StatementKind::Income,
    strategies: &[
        Extraction::Row("Net Income"),
        Extraction::Row("Net Income Common Stockholders"),
    ],
};

/// Operating cash flow.
pub const OPERATING_CASH_FLOW: LineItem = LineItem {
    metric: "operating cash flow",
    statement: StatementKind::CashFlow,
    strategies: &[
        Extraction::Row("Operating Cash Flow"),
        Extraction::Row("Cash Flow From Continuing Operating Activities"),
    ],
};

/// Shareholders' equity, falling back to assets minus liabilities.
pub const BOOK_VALUE: LineItem = LineItem {
    metric: "book value",
    statement: StatementKind::BalanceSheet,
    strategies: &[
        Extraction::Row("Stockholders Equity"),
        Extraction::Row("Total Stockholder Equity"),
        Extraction::Row("Common Stock Equity"),
        Extraction::Difference {
            minuend: "Total Assets",
            subtrahend: "Total Liabilities Net Minority Interest",
        },
        Extraction::Difference {
            minuend: "Total Assets",
            subtrahend: "Total Liabilities",
        },
    ],
};

/// Balance-sheet rows holding a dated share count.
pub const SHARE_COUNT: LineItem = LineItem {
    metric: "shares outstanding",
    statement: StatementKind::BalanceSheet,
    strategies: &[
        Extraction::Row("Ordinary Shares Number"),
        Extraction::Row("Share Issued"),
    ],
};
