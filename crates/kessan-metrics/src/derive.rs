//! Per-share and margin metrics.

use crate::align::{AlignedRow, AlignedTable, AlignmentPolicy};
use crate::record::AlignedPeriodRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Metrics computed from aligned values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedMetric {
    /// Net income per share
    Eps,
    /// Book value per share
    Bps,
    /// Operating income over revenue
    OperatingMarginPct,
    /// Operating cash flow per share
    OperatingCashFlowPerShare,
    /// Dividend per share over EPS
    PayoutRatioPct,
}

impl fmt::Display for DerivedMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eps => "eps",
            Self::Bps => "bps",
            Self::OperatingMarginPct => "operating_margin_pct",
            Self::OperatingCashFlowPerShare => "operating_cash_flow_per_share",
            Self::PayoutRatioPct => "payout_ratio_pct",
        })
    }
}

/// Why a metric is undefined for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningReason {
    /// The denominator is zero.
    ZeroDenominator,
    /// An input has no value for the period.
    MissingInput,
    /// The quotient is NaN or infinite.
    NonFinite,
}

impl fmt::Display for WarningReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ZeroDenominator => "zero denominator",
            Self::MissingInput => "missing input",
            Self::NonFinite => "non-finite result",
        })
    }
}

/// A metric left undefined for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationWarning {
    /// Affected period
    pub period_end: NaiveDate,
    /// Affected metric
    pub metric: DerivedMetric,
    /// Cause
    pub reason: WarningReason,
}

impl fmt::Display for DerivationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} undefined ({})", self.period_end, self.metric, self.reason)
    }
}

/// Records with derived metrics, before the series is labelled with its
/// ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTable {
    /// Policy the calendar was built with
    pub policy: AlignmentPolicy,
    /// Records, ascending by period end
    pub records: Vec<AlignedPeriodRecord>,
    /// Undefined metrics, by period
    pub warnings: Vec<DerivationWarning>,
    /// Whether any period carries a dividend value
    pub has_dividends: bool,
}

/// `numerator / denominator * scale`, or the reason it is undefined.
pub(crate) fn ratio(
    numerator: Option<f64>,
    denominator: Option<f64>,
    scale: f64,
) -> Result<f64, WarningReason> {
    let (Some(numerator), Some(denominator)) = (numerator, denominator) else {
        return Err(WarningReason::MissingInput);
    };
    if denominator == 0.0 {
        return Err(WarningReason::ZeroDenominator);
    }
    let value = numerator / denominator * scale;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(WarningReason::NonFinite)
    }
}

/// Record `metric` for `period_end`, turning an undefined value into `None`
/// plus a warning.
pub(crate) fn checked(
    value: Result<f64, WarningReason>,
    period_end: NaiveDate,
    metric: DerivedMetric,
    warnings: &mut Vec<DerivationWarning>,
) -> Option<f64> {
    match value {
        Ok(value) => Some(value),
        Err(reason) => {
            warn!(%period_end, %metric, %reason, "derived metric undefined");
            warnings.push(DerivationWarning {
                period_end,
                metric,
                reason,
            });
            None
        }
    }
}

/// Compute EPS, BPS, operating margin and operating cash flow per share for
/// every period independently.
///
/// Dividend fields are left empty; see [`DerivedTable::with_dividends`].
pub fn derive(aligned: AlignedTable) -> DerivedTable {
    let (policy, rows) = aligned.into_parts();
    let mut warnings = Vec::new();

    let records = rows
        .into_iter()
        .map(|row| {
            let AlignedRow {
                period_end,
                revenue,
                operating_income,
                net_income,
                operating_cash_flow,
                book_value,
                shares_outstanding,
            } = row;
            let mut define = |value, metric| checked(value, period_end, metric, &mut warnings);

            let eps = define(ratio(net_income, shares_outstanding, 1.0), DerivedMetric::Eps);
            let bps = define(ratio(book_value, shares_outstanding, 1.0), DerivedMetric::Bps);
            let operating_margin_pct = define(
                ratio(operating_income, revenue, 100.0),
                DerivedMetric::OperatingMarginPct,
            );
            let operating_cash_flow_per_share = define(
                ratio(operating_cash_flow, shares_outstanding, 1.0),
                DerivedMetric::OperatingCashFlowPerShare,
            );

            AlignedPeriodRecord {
                period_end,
                revenue,
                operating_income,
                net_income,
                operating_cash_flow,
                book_value,
                shares_outstanding,
                eps,
                bps,
                operating_margin_pct,
                operating_cash_flow_per_share,
                dividend_per_share: None,
                payout_ratio_pct: None,
            }
        })
        .collect();

    DerivedTable {
        policy,
        records,
        warnings,
        has_dividends: false,
    }
}
