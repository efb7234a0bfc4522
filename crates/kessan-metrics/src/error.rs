//! Error types for alignment and derivation.

use kessan_data::StatementKind;
use std::fmt;
use thiserror::Error;

/// Result type for metrics operations.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// A required line item that no extraction strategy found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingItem {
    /// Statement the item was looked up in
    pub statement: StatementKind,
    /// Primary label of the item
    pub label: &'static str,
}

impl fmt::Display for MissingItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.label, self.statement)
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that abort a timeseries request.
///
/// None of these produce a partial series.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// A required statement or the share count is absent or empty
    #[error("incomplete financial data: missing {}", .tables.join(", "))]
    MissingTable {
        /// Every missing input, by name
        tables: Vec<String>,
    },

    /// Required rows are absent under every known label
    #[error("incomplete financial data: missing line items {}", join(.items))]
    MissingLineItem {
        /// Every missing item with its statement
        items: Vec<MissingItem>,
    },

    /// A metric could not be derived by any fallback
    #[error("insufficient data for {metric} (tried {})", .tried.join("; "))]
    InsufficientData {
        /// Metric name
        metric: &'static str,
        /// Description of each strategy that was tried
        tried: Vec<String>,
    },

    /// The statement calendars cannot be reconciled
    #[error("cannot align statements: {0}")]
    Alignment(String),

    /// DataFrame conversion error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_line_item_names_every_item() {
        let err = MetricsError::MissingLineItem {
            items: vec![
                MissingItem {
                    statement: StatementKind::Income,
                    label: "Net Income",
                },
                MissingItem {
                    statement: StatementKind::CashFlow,
                    label: "Operating Cash Flow",
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "incomplete financial data: missing line items 'Net Income' (income statement), \
             'Operating Cash Flow' (cash flow statement)"
        );
    }

    #[test]
    fn test_missing_table_message() {
        let err = MetricsError::MissingTable {
            tables: vec!["balance sheet".to_string(), "shares outstanding".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "incomplete financial data: missing balance sheet, shares outstanding"
        );
    }
}
