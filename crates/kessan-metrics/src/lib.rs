#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/kessan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod align;
pub mod derive;
pub mod dividends;
pub mod error;
pub mod labels;
pub mod record;

pub use align::{AlignedRow, AlignedTable, Aligner, AlignmentPolicy};
pub use derive::{DerivationWarning, DerivedMetric, DerivedTable, WarningReason, derive};
pub use error::{MetricsError, MissingItem, Result};
pub use labels::{Extraction, LineItem};
pub use record::{AlignedPeriodRecord, FinancialTimeseries};
