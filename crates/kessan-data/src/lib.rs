#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/kessan/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod memory;
pub mod provider;
pub mod statement;
pub mod yahoo;

pub use config::ProviderConfig;
pub use error::{DataError, Result};
pub use memory::MemoryProvider;
pub use provider::{RawStatementSet, StatementProvider};
pub use statement::{
    DividendEvent, DividendSeries, Granularity, SharesOutstanding, StatementKind, StatementTable,
};
pub use yahoo::YahooProvider;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
