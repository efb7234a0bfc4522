#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/kessan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chart;
pub mod export;
pub mod format;
pub mod summary;

pub use chart::{
    Axis, ChartSpec, NamedSeries, SeriesKind, all_charts, dividend_chart, earning_power_chart,
    per_share_chart, performance_chart,
};
pub use export::{ExportError, ExportFormat, Exporter};
pub use format::{CurrencyUnit, DisplayConfig, format_financial_value};
pub use summary::{LatestMetrics, series_table};
