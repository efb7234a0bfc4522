//! Latest-period summary and text tables.

use crate::format::{
    DisplayConfig, format_count, format_financial_value, format_per_share, format_percentage,
    or_missing,
};
use chrono::NaiveDate;
use kessan_metrics::FinancialTimeseries;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Headline figures of the most recent period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatestMetrics {
    /// Ticker
    pub ticker: String,
    /// Most recent period end
    pub period_end: NaiveDate,
    /// Revenue
    pub revenue: Option<f64>,
    /// Operating income
    pub operating_income: Option<f64>,
    /// Net income
    pub net_income: Option<f64>,
    /// Earnings per share
    pub eps: Option<f64>,
    /// Book value per share
    pub bps: Option<f64>,
    /// Operating margin, in percent
    pub operating_margin_pct: Option<f64>,
    /// Dividend per share
    pub dividend_per_share: Option<f64>,
}

impl LatestMetrics {
    /// Summary of the last period, or `None` for an empty series.
    pub fn from_series(series: &FinancialTimeseries) -> Option<Self> {
        let latest = series.latest()?;
        Some(Self {
            ticker: series.ticker().to_string(),
            period_end: latest.period_end,
            revenue: latest.revenue,
            operating_income: latest.operating_income,
            net_income: latest.net_income,
            eps: latest.eps,
            bps: latest.bps,
            operating_margin_pct: latest.operating_margin_pct,
            dividend_per_share: latest.dividend_per_share,
        })
    }

    /// `(label, formatted value)` pairs in display order.
    pub fn entries(&self, config: &DisplayConfig) -> Vec<(&'static str, String)> {
        let money = |v: Option<f64>| or_missing(v, |v| format_financial_value(v, config));
        let per_share = |v: Option<f64>| or_missing(v, |v| format_per_share(v, config));

        let mut entries = vec![
            ("Revenue", money(self.revenue)),
            ("Operating Income", money(self.operating_income)),
            ("Net Income", money(self.net_income)),
            ("EPS", per_share(self.eps)),
            ("BPS", per_share(self.bps)),
            (
                "Operating Margin",
                or_missing(self.operating_margin_pct, |v| format_percentage(v, 1)),
            ),
        ];
        if self.dividend_per_share.is_some() {
            entries.push(("DPS", per_share(self.dividend_per_share)));
        }
        entries
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self, config: &DisplayConfig) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "\nLatest Financial Metrics: {}", self.ticker);
        let _ = writeln!(output, "Period: {}", config.format_date(self.period_end));
        output.push_str(&"=".repeat(40));
        output.push('\n');

        for (label, value) in self.entries(config) {
            let _ = writeln!(output, "{label:<20} {value:>19}");
        }

        output.push_str(&"=".repeat(40));
        output.push('\n');
        output
    }
}

/// Format the whole series as an ASCII table, one row per period, followed
/// by any derivation warnings.
pub fn series_table(series: &FinancialTimeseries, config: &DisplayConfig) -> String {
    let mut output = String::new();
    let width = 124;

    let _ = writeln!(
        output,
        "\n{} ({}, {} alignment)",
        series.ticker(),
        series.granularity(),
        series.policy()
    );
    output.push_str(&"=".repeat(width));
    output.push('\n');

    let _ = writeln!(
        output,
        "{:<10} {:>12} {:>12} {:>12} {:>12} {:>10} {:>10} {:>10} {:>9} {:>10} {:>10}",
        "Period", "Revenue", "Op Income", "Net Income", "Op CF", "Shares", "EPS", "BPS", "Margin",
        "OCF/Share", "DPS"
    );
    output.push_str(&"-".repeat(width));
    output.push('\n');

    let money = |v: Option<f64>| or_missing(v, |v| format_financial_value(v, config));
    let per_share = |v: Option<f64>| or_missing(v, |v| format_per_share(v, config));

    for record in series.records() {
        let _ = writeln!(
            output,
            "{:<10} {:>12} {:>12} {:>12} {:>12} {:>10} {:>10} {:>10} {:>9} {:>10} {:>10}",
            config.format_date(record.period_end),
            money(record.revenue),
            money(record.operating_income),
            money(record.net_income),
            money(record.operating_cash_flow),
            or_missing(record.shares_outstanding, format_count),
            per_share(record.eps),
            per_share(record.bps),
            or_missing(record.operating_margin_pct, |v| format_percentage(v, 1)),
            per_share(record.operating_cash_flow_per_share),
            per_share(record.dividend_per_share),
        );
    }

    output.push_str(&"=".repeat(width));
    output.push('\n');

    if !series.warnings().is_empty() {
        let _ = writeln!(output, "Warnings:");
        for warning in series.warnings() {
            let _ = writeln!(output, "  {warning}");
        }
    }

    output
}
