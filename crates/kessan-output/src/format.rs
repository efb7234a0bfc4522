//! Display formatting for financial values and dates.
//!
//! All presentation constants live in [`DisplayConfig`], which is passed
//! explicitly to every formatting call.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder for a value that is missing or undefined.
pub const MISSING: &str = "n/a";

/// Scale applied to currency amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyUnit {
    /// Pick K/M/B per value by magnitude.
    #[default]
    Auto,
    /// No scaling.
    Units,
    /// Thousands (K).
    Thousands,
    /// Millions (M).
    Millions,
    /// Billions (B).
    Billions,
}

impl CurrencyUnit {
    /// Divisor and suffix for `value`.
    pub fn scale(&self, value: f64) -> (f64, &'static str) {
        match self {
            Self::Units => (1.0, ""),
            Self::Thousands => (1e3, "K"),
            Self::Millions => (1e6, "M"),
            Self::Billions => (1e9, "B"),
            Self::Auto => {
                let magnitude = value.abs();
                if magnitude >= 1e9 {
                    (1e9, "B")
                } else if magnitude >= 1e6 {
                    (1e6, "M")
                } else if magnitude >= 1e3 {
                    (1e3, "K")
                } else {
                    (1.0, "")
                }
            }
        }
    }
}

impl fmt::Display for CurrencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Units => "units",
            Self::Thousands => "thousands",
            Self::Millions => "millions",
            Self::Billions => "billions",
        })
    }
}

impl FromStr for CurrencyUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "units" | "unit" | "1" => Ok(Self::Units),
            "thousands" | "k" => Ok(Self::Thousands),
            "millions" | "m" => Ok(Self::Millions),
            "billions" | "b" => Ok(Self::Billions),
            other => Err(format!("unknown currency unit '{other}'")),
        }
    }
}

/// Presentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Scale for currency amounts
    pub currency_unit: CurrencyUnit,
    /// Prefix for currency amounts
    pub currency_symbol: String,
    /// `chrono` format string for period labels
    pub date_format: String,
    /// Digits after the decimal point for scaled amounts
    pub decimals: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_unit: CurrencyUnit::Auto,
            currency_symbol: "$".to_string(),
            date_format: "%Y-%m".to_string(),
            decimals: 1,
        }
    }
}

impl DisplayConfig {
    /// Label for a period end.
    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format(&self.date_format).to_string()
    }

    /// Labels for a date axis.
    pub fn format_dates(&self, dates: &[NaiveDate]) -> Vec<String> {
        dates.iter().map(|d| self.format_date(*d)).collect()
    }
}

/// Format a currency amount, e.g. `$1.5B` or `-$230.0K`.
///
/// Unscaled values always get two decimals.
pub fn format_financial_value(value: f64, config: &DisplayConfig) -> String {
    let decimals_for = |suffix: &str| if suffix.is_empty() { 2 } else { config.decimals };
    let (divisor, suffix) = display_scale(config.currency_unit, value, decimals_for);
    let sign = if value < 0.0 { "-" } else { "" };
    let decimals = decimals_for(suffix);
    format!(
        "{sign}{}{:.decimals$}{suffix}",
        config.currency_symbol,
        value.abs() / divisor
    )
}

/// Format a per-share amount with two decimals.
pub fn format_per_share(value: f64, config: &DisplayConfig) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{}{:.2}", config.currency_symbol, value.abs())
}

/// Format a percentage, e.g. `12.5%`.
pub fn format_percentage(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}%")
}

/// Format a share count with K/M/B scaling and no currency symbol.
pub fn format_count(value: f64) -> String {
    let (divisor, suffix) =
        display_scale(CurrencyUnit::Auto, value, |s| if s.is_empty() { 0 } else { 2 });
    if suffix.is_empty() {
        format!("{value:.0}")
    } else {
        format!("{:.2}{suffix}", value / divisor)
    }
}

/// Like [`CurrencyUnit::scale`], but an automatic unit is chosen from the
/// value as printed, so `999_999.0` shows as `1.0M` and never `1000.0K`.
fn display_scale(
    unit: CurrencyUnit,
    value: f64,
    decimals_for: impl Fn(&str) -> usize,
) -> (f64, &'static str) {
    let (divisor, suffix) = unit.scale(value);
    if unit != CurrencyUnit::Auto {
        return (divisor, suffix);
    }
    let factor = 10f64.powi(i32::try_from(decimals_for(suffix)).unwrap_or(i32::MAX));
    let shown = (value.abs() / divisor * factor).round() / factor;
    if shown >= 1000.0 {
        unit.scale(shown * divisor)
    } else {
        (divisor, suffix)
    }
}

/// Apply `f` or fall back to [`MISSING`].
pub fn or_missing(value: Option<f64>, f: impl FnOnce(f64) -> String) -> String {
    value.map_or_else(|| MISSING.to_string(), f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1_500_000_000.0, "$1.5B")]
    #[case(2_340_000.0, "$2.3M")]
    #[case(-230_000.0, "-$230.0K")]
    #[case(999.5, "$999.50")]
    #[case(0.0, "$0.00")]
    #[case(999_999.0, "$1.0M")]
    #[case(-999_960.0, "-$1.0M")]
    #[case(999.999, "$1.0K")]
    #[case(999_949.0, "$999.9K")]
    fn test_format_auto(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_financial_value(value, &DisplayConfig::default()), expected);
    }

    #[test]
    fn test_format_fixed_unit() {
        let config = DisplayConfig {
            currency_unit: CurrencyUnit::Millions,
            decimals: 0,
            ..DisplayConfig::default()
        };
        assert_eq!(format_financial_value(94_930_000_000.0, &config), "$94930M");
    }

    #[test]
    fn test_format_date() {
        let config = DisplayConfig {
            date_format: "%Y/%m".to_string(),
            ..DisplayConfig::default()
        };
        let date = NaiveDate::from_ymd_opt(2023, 9, 30).unwrap();
        assert_eq!(config.format_date(date), "2023/09");
    }

    #[rstest]
    #[case("millions", CurrencyUnit::Millions)]
    #[case("K", CurrencyUnit::Thousands)]
    #[case("auto", CurrencyUnit::Auto)]
    fn test_currency_unit_from_str(#[case] input: &str, #[case] expected: CurrencyUnit) {
        assert_eq!(input.parse::<CurrencyUnit>().unwrap(), expected);
    }

    #[test]
    fn test_small_helpers() {
        assert_eq!(format_percentage(-12.345, 1), "-12.3%");
        assert_eq!(format_count(15_204_137_000.0), "15.20B");
        assert_eq!(format_count(950.0), "950");
        assert_eq!(format_count(999_996.0), "1.00M");
        assert_eq!(or_missing(None, |v| v.to_string()), MISSING);
        assert_eq!(format_per_share(-0.5, &DisplayConfig::default()), "-$0.50");
    }
}
