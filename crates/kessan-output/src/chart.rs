//! Chart specifications for an external renderer.
//!
//! A [`ChartSpec`] is a shared x axis of period labels with named series on
//! a primary scale and, optionally, a secondary scale. Nothing here draws;
//! the specs serialize to JSON for whatever renderer sits downstream.

use crate::format::DisplayConfig;
use kessan_metrics::FinancialTimeseries;
use serde::{Deserialize, Serialize};

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    /// Grouped bars
    Bar,
    /// Line
    Line,
    /// Line filled down to zero
    Area,
}

/// One named series. `None` values are gaps, not zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    /// Legend name
    pub name: String,
    /// Drawing style
    pub kind: SeriesKind,
    /// One value per x label
    pub values: Vec<Option<f64>>,
}

impl NamedSeries {
    /// Create a series.
    pub fn new(name: impl Into<String>, kind: SeriesKind, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }
}

/// A y axis and the series plotted against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    /// Axis title
    pub title: String,
    /// Series on this axis
    pub series: Vec<NamedSeries>,
}

impl Axis {
    /// Create an axis.
    pub fn new(title: impl Into<String>, series: Vec<NamedSeries>) -> Self {
        Self {
            title: title.into(),
            series,
        }
    }
}

/// Everything a renderer needs for one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Chart title
    pub title: String,
    /// Period labels, shared by every series
    pub x: Vec<String>,
    /// Left axis
    pub primary: Axis,
    /// Right axis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Axis>,
}

impl ChartSpec {
    /// Every series on both axes.
    pub fn series(&self) -> impl Iterator<Item = &NamedSeries> {
        self.primary
            .series
            .iter()
            .chain(self.secondary.iter().flat_map(|axis| axis.series.iter()))
    }
}

fn x_axis(series: &FinancialTimeseries, config: &DisplayConfig) -> Vec<String> {
    config.format_dates(&series.period_ends())
}

/// Revenue, operating income and net income, with operating margin.
pub fn performance_chart(series: &FinancialTimeseries, config: &DisplayConfig) -> ChartSpec {
    ChartSpec {
        title: "Performance".to_string(),
        x: x_axis(series, config),
        primary: Axis::new(
            "Amount",
            vec![
                NamedSeries::new("Revenue", SeriesKind::Bar, series.revenue()),
                NamedSeries::new("Operating Income", SeriesKind::Bar, series.operating_income()),
                NamedSeries::new("Net Income", SeriesKind::Bar, series.net_income()),
            ],
        ),
        secondary: Some(Axis::new(
            "Operating Margin (%)",
            vec![NamedSeries::new(
                "Operating Margin",
                SeriesKind::Line,
                series.operating_margin_pct(),
            )],
        )),
    }
}

/// EPS, BPS and (when paid) DPS, with the share count.
pub fn per_share_chart(series: &FinancialTimeseries, config: &DisplayConfig) -> ChartSpec {
    let mut bars = vec![
        NamedSeries::new("EPS", SeriesKind::Bar, series.eps()),
        NamedSeries::new("BPS", SeriesKind::Bar, series.bps()),
    ];
    if series.has_dividends() {
        bars.push(NamedSeries::new("DPS", SeriesKind::Bar, series.dividend_per_share()));
    }

    ChartSpec {
        title: "Per-Share Value".to_string(),
        x: x_axis(series, config),
        primary: Axis::new("Amount", bars),
        secondary: Some(Axis::new(
            "Shares",
            vec![NamedSeries::new(
                "Shares Outstanding",
                SeriesKind::Area,
                series.shares_outstanding(),
            )],
        )),
    }
}

/// DPS with the payout ratio, or the share count alone when no dividends
/// were paid.
pub fn dividend_chart(series: &FinancialTimeseries, config: &DisplayConfig) -> ChartSpec {
    if !series.has_dividends() {
        return ChartSpec {
            title: "Shares Outstanding".to_string(),
            x: x_axis(series, config),
            primary: Axis::new(
                "Shares",
                vec![NamedSeries::new(
                    "Shares Outstanding",
                    SeriesKind::Bar,
                    series.shares_outstanding(),
                )],
            ),
            secondary: None,
        };
    }

    ChartSpec {
        title: "Dividends and Payout Ratio".to_string(),
        x: x_axis(series, config),
        primary: Axis::new(
            "Amount",
            vec![NamedSeries::new("DPS", SeriesKind::Bar, series.dividend_per_share())],
        ),
        secondary: Some(Axis::new(
            "Payout Ratio (%)",
            vec![NamedSeries::new(
                "Payout Ratio",
                SeriesKind::Line,
                series.payout_ratio_pct(),
            )],
        )),
    }
}

/// Operating income and operating cash flow, with their per-share values.
pub fn earning_power_chart(series: &FinancialTimeseries, config: &DisplayConfig) -> ChartSpec {
    ChartSpec {
        title: "Earning Power".to_string(),
        x: x_axis(series, config),
        primary: Axis::new(
            "Amount",
            vec![
                NamedSeries::new("Operating Income", SeriesKind::Bar, series.operating_income()),
                NamedSeries::new("Operating CF", SeriesKind::Bar, series.operating_cash_flow()),
            ],
        ),
        secondary: Some(Axis::new(
            "Per Share",
            vec![
                NamedSeries::new("EPS", SeriesKind::Line, series.eps()),
                NamedSeries::new(
                    "Operating CF per Share",
                    SeriesKind::Line,
                    series.operating_cash_flow_per_share(),
                ),
            ],
        )),
    }
}

/// Every chart, in page order.
pub fn all_charts(series: &FinancialTimeseries, config: &DisplayConfig) -> Vec<ChartSpec> {
    vec![
        performance_chart(series, config),
        per_share_chart(series, config),
        dividend_chart(series, config),
        earning_power_chart(series, config),
    ]
}
