//! Statement alignment.
//!
//! The income statement, balance sheet and cash-flow statement each arrive on
//! their own calendar. [`Aligner`] picks one working calendar and reads every
//! required line item onto it, producing one [`AlignedRow`] per period.

use crate::error::{MetricsError, MissingItem, Result};
use crate::labels::{self, LineItem};
use chrono::NaiveDate;
use kessan_data::statement::value_as_of;
use kessan_data::{SharesOutstanding, StatementTable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// How the three statement calendars are reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignmentPolicy {
    /// Keep only periods reported by all three statements.
    Intersection,
    /// Use the income statement's periods. Balance-sheet values carry forward
    /// from the latest balance date at or before each period; cash flows are
    /// matched exactly.
    #[default]
    AnchorForwardFill,
}

impl AlignmentPolicy {
    /// Name accepted by [`FromStr`].
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Intersection => "intersection",
            Self::AnchorForwardFill => "forward-fill",
        }
    }
}

impl fmt::Display for AlignmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlignmentPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intersection" | "intersect" => Ok(Self::Intersection),
            "forward-fill" | "anchor-forward-fill" | "ffill" => Ok(Self::AnchorForwardFill),
            other => Err(format!(
                "unknown alignment policy '{other}' (expected 'forward-fill' or 'intersection')"
            )),
        }
    }
}

/// Raw values for one period on the working calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    /// Period end
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
}

/// Rows on one strictly ascending calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    policy: AlignmentPolicy,
    rows: Vec<AlignedRow>,
}

impl AlignedTable {
    /// Policy the calendar was built with.
    pub const fn policy(&self) -> AlignmentPolicy {
        self.policy
    }

    /// Rows, ascending by period end.
    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no periods.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn into_parts(self) -> (AlignmentPolicy, Vec<AlignedRow>) {
        (self.policy, self.rows)
    }
}

/// Reads the three statements onto one calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aligner {
    policy: AlignmentPolicy,
}

impl Aligner {
    /// Create an aligner using `policy`.
    pub const fn new(policy: AlignmentPolicy) -> Self {
        Self { policy }
    }

    /// Align the statements and share count.
    ///
    /// Fails without partial output when a table is missing, a required line
    /// item is missing under every known label, book value cannot be derived,
    /// or the calendars have no period in common.
    pub fn align(
        &self,
        income: Option<&StatementTable>,
        balance: Option<&StatementTable>,
        cashflow: Option<&StatementTable>,
        shares: Option<&SharesOutstanding>,
    ) -> Result<AlignedTable> {
        let (income, balance, cashflow, shares) =
            match (present(income), present(balance), present(cashflow), shares) {
                (Some(i), Some(b), Some(c), Some(s)) if !s.is_empty() => (i, b, c, s),
                _ => {
                    let mut tables = Vec::new();
                    for (name, missing) in [
                        ("income statement", present(income).is_none()),
                        ("balance sheet", present(balance).is_none()),
                        ("cash flow statement", present(cashflow).is_none()),
                        ("shares outstanding", shares.is_none_or(SharesOutstanding::is_empty)),
                    ] {
                        if missing {
                            tables.push(name.to_string());
                        }
                    }
                    return Err(MetricsError::MissingTable { tables });
                }
            };

        let mut missing = Vec::new();
        let revenue = extract(&labels::REVENUE, income, &mut missing);
        let operating_income = extract(&labels::OPERATING_INCOME, income, &mut missing);
        let net_income = extract(&labels::NET_INCOME, income, &mut missing);
        let operating_cash_flow = extract(&labels::OPERATING_CASH_FLOW, cashflow, &mut missing);
        let (Some(revenue), Some(operating_income), Some(net_income), Some(operating_cash_flow)) =
            (revenue, operating_income, net_income, operating_cash_flow)
        else {
            return Err(MetricsError::MissingLineItem { items: missing });
        };

        let (_, book_value) = labels::BOOK_VALUE.resolve(balance).ok_or_else(|| {
            MetricsError::InsufficientData {
                metric: labels::BOOK_VALUE.metric,
                tried: labels::BOOK_VALUE.tried(),
            }
        })?;

        let calendar: Vec<NaiveDate> = match self.policy {
            AlignmentPolicy::AnchorForwardFill => income.periods().collect(),
            AlignmentPolicy::Intersection => common_periods(&[income, balance, cashflow])
                .into_iter()
                .collect(),
        };
        if calendar.is_empty() {
            return Err(MetricsError::Alignment(
                "no reporting period common to income statement, balance sheet and cash flow \
                 statement"
                    .to_string(),
            ));
        }

        let stock = |series: &BTreeMap<NaiveDate, f64>, date: NaiveDate| match self.policy {
            AlignmentPolicy::AnchorForwardFill => value_as_of(series, date),
            AlignmentPolicy::Intersection => series.get(&date).copied(),
        };
        let flow = |series: &BTreeMap<NaiveDate, f64>, date: NaiveDate| series.get(&date).copied();

        let share_counts = shares.resolve(&calendar);
        let rows: Vec<AlignedRow> = calendar
            .iter()
            .zip(share_counts)
            .map(|(&period_end, shares_outstanding)| AlignedRow {
                period_end,
                revenue: flow(&revenue, period_end),
                operating_income: flow(&operating_income, period_end),
                net_income: flow(&net_income, period_end),
                operating_cash_flow: flow(&operating_cash_flow, period_end),
                book_value: stock(&book_value, period_end),
                shares_outstanding,
            })
            .collect();

        debug!(
            policy = %self.policy,
            periods = rows.len(),
            income_periods = income.len(),
            balance_periods = balance.len(),
            cashflow_periods = cashflow.len(),
            "aligned statements"
        );

        Ok(AlignedTable {
            policy: self.policy,
            rows,
        })
    }
}

fn present(table: Option<&StatementTable>) -> Option<&StatementTable> {
    table.filter(|t| !t.is_empty())
}

/// Resolve `item`, recording it as missing when no strategy applies.
fn extract(
    item: &LineItem,
    table: &StatementTable,
    missing: &mut Vec<MissingItem>,
) -> Option<BTreeMap<NaiveDate, f64>> {
    match item.resolve(table) {
        Some((strategy, values)) => {
            if item.strategies.first() != Some(&strategy) {
                debug!(metric = item.metric, %strategy, "using fallback extraction");
            }
            Some(values)
        }
        None => {
            missing.push(MissingItem {
                statement: item.statement,
                label: item.primary_label(),
            });
            None
        }
    }
}

/// Periods every table reports, in order.
pub fn common_periods(tables: &[&StatementTable]) -> BTreeSet<NaiveDate> {
    let mut tables = tables.iter();
    let Some(first) = tables.next() else {
        return BTreeSet::new();
    };
    tables.fold(first.period_set().clone(), |acc, table| {
        acc.intersection(table.period_set()).copied().collect()
    })
}
