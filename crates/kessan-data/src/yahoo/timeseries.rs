//! Financial statements from the Yahoo Finance fundamentals-timeseries API.
//!
//! Each statement is requested as a list of field types prefixed with the
//! cadence (`quarterlyTotalRevenue`, `annualNetIncome`, ...). The response
//! carries one result per field; results are folded into a single
//! [`StatementTable`] whose row labels are the spaced field names
//! ("Total Revenue", "Net Income", ...).

use super::http::{RateLimiter, with_retry};
use crate::config::ProviderConfig;
use crate::error::{DataError, Result};
use crate::statement::{Granularity, StatementKind, StatementTable};
use chrono::{NaiveDate, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

const TIMESERIES_URL: &str =
    "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)";

/// Income statement fields requested from Yahoo.
pub const INCOME_FIELDS: &[&str] = &[
    "TotalRevenue",
    "OperatingRevenue",
    "GrossProfit",
    "OperatingIncome",
    "NetIncome",
    "NetIncomeCommonStockholders",
    "BasicEPS",
    "DilutedEPS",
    "BasicAverageShares",
    "DilutedAverageShares",
];

/// Balance sheet fields requested from Yahoo.
pub const BALANCE_FIELDS: &[&str] = &[
    "TotalAssets",
    "TotalLiabilitiesNetMinorityInterest",
    "StockholdersEquity",
    "CommonStockEquity",
    "OrdinarySharesNumber",
    "ShareIssued",
];

/// Cash-flow fields requested from Yahoo.
pub const CASH_FLOW_FIELDS: &[&str] = &[
    "OperatingCashFlow",
    "CashFlowFromContinuingOperatingActivities",
    "CapitalExpenditure",
    "FreeCashFlow",
    "CashDividendsPaid",
];

/// Field names requested for a statement.
pub const fn fields(kind: StatementKind) -> &'static [&'static str] {
    match kind {
        StatementKind::Income => INCOME_FIELDS,
        StatementKind::BalanceSheet => BALANCE_FIELDS,
        StatementKind::CashFlow => CASH_FLOW_FIELDS,
    }
}

const fn type_prefix(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Quarterly => "quarterly",
        Granularity::Annual => "annual",
    }
}

/// Turn a CamelCase field name into a spaced row label.
///
/// Acronyms stay together: `DilutedEPS` becomes "Diluted EPS" and
/// `EBITDAMargin` becomes "EBITDA Margin".
pub fn field_label(field: &str) -> String {
    let chars: Vec<char> = field.chars().collect();
    let mut label = String::with_capacity(field.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower)
            {
                label.push(' ');
            }
        }
        label.push(c);
    }
    label
}

#[derive(Debug, Deserialize)]
struct TimeseriesEnvelope {
    timeseries: TimeseriesBody,
}

#[derive(Debug, Deserialize)]
struct TimeseriesBody {
    #[serde(default)]
    result: Option<Vec<TimeseriesResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    meta: TimeseriesMeta,
    #[serde(flatten)]
    rest: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesMeta {
    #[serde(rename = "type", default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DataPoint {
    #[serde(rename = "asOfDate")]
    as_of_date: String,
    #[serde(rename = "reportedValue")]
    reported_value: Option<ReportedValue>,
}

#[derive(Debug, Deserialize)]
struct ReportedValue {
    raw: Option<f64>,
}

/// Parse a timeseries response body into a statement.
///
/// Fields whose type does not carry the cadence prefix are ignored, so an
/// annual request never picks up trailing-twelve-month rows. Null data
/// points and points without a reported value leave the cell empty while the
/// period is still recorded.
pub fn parse_timeseries(
    body: &str,
    kind: StatementKind,
    granularity: Granularity,
) -> Result<StatementTable> {
    let envelope: TimeseriesEnvelope = serde_json::from_str(body)?;
    if let Some(error) = envelope.timeseries.error.filter(|e| !e.is_null()) {
        return Err(DataError::YahooApi(error.to_string()));
    }

    let prefix = type_prefix(granularity);
    let mut table = StatementTable::new(kind);

    for result in envelope.timeseries.result.unwrap_or_default() {
        for series_type in &result.meta.types {
            let Some(field) = series_type.strip_prefix(prefix) else {
                continue;
            };
            let Some(points) = result.rest.get(series_type) else {
                continue;
            };
            let points: Vec<Option<DataPoint>> = serde_json::from_value(points.clone())?;
            let label = field_label(field);

            for point in points.into_iter().flatten() {
                let period_end = NaiveDate::parse_from_str(&point.as_of_date, "%Y-%m-%d")
                    .map_err(|e| {
                        DataError::Parse(format!("asOfDate '{}': {e}", point.as_of_date))
                    })?;
                match point.reported_value.and_then(|v| v.raw) {
                    Some(value) => table.insert(label.as_str(), period_end, value),
                    None => table.add_period(period_end),
                }
            }
        }
    }

    Ok(table)
}

/// HTTP client for the fundamentals-timeseries endpoint.
#[derive(Debug, Clone)]
pub struct TimeseriesClient {
    client: reqwest::Client,
    limiter: Arc<Mutex<RateLimiter>>,
    config: ProviderConfig,
}

impl TimeseriesClient {
    /// Build a client with the given settings.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            limiter: Arc::new(Mutex::new(RateLimiter::new(config.rate_limit_delay))),
            config,
        })
    }

    /// Fetch one statement. `Ok(None)` when Yahoo reports no periods.
    pub async fn fetch_statement(
        &self,
        ticker: &str,
        kind: StatementKind,
        granularity: Granularity,
    ) -> Result<Option<StatementTable>> {
        let url = format!("{TIMESERIES_URL}/{ticker}");
        let prefix = type_prefix(granularity);
        let types = fields(kind)
            .iter()
            .map(|field| format!("{prefix}{field}"))
            .collect::<Vec<_>>()
            .join(",");
        let period1 = self
            .config
            .history_start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();
        let period2 = Utc::now().timestamp();
        let query = [
            ("symbol", ticker.to_string()),
            ("type", types),
            ("period1", period1.to_string()),
            ("period2", period2.to_string()),
        ];

        let body = with_retry(&self.config, "timeseries", || self.get(&url, &query)).await?;
        let table = parse_timeseries(&body, kind, granularity)?;

        debug!(
            ticker,
            statement = %kind,
            %granularity,
            periods = table.len(),
            "parsed statement"
        );

        Ok((!table.is_empty()).then_some(table))
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        self.limiter.lock().await.wait().await;

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimit {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("TotalRevenue", "Total Revenue")]
    #[case("DilutedEPS", "Diluted EPS")]
    #[case("TotalLiabilitiesNetMinorityInterest", "Total Liabilities Net Minority Interest")]
    #[case("EBITDAMargin", "EBITDA Margin")]
    #[case("NetIncome", "Net Income")]
    fn test_field_label(#[case] field: &str, #[case] expected: &str) {
        assert_eq!(field_label(field), expected);
    }

    #[test]
    fn test_fields_cover_extraction_labels() {
        let labels: Vec<String> = INCOME_FIELDS.iter().map(|f| field_label(f)).collect();
        assert!(labels.iter().any(|l| l == "Total Revenue"));
        assert!(labels.iter().any(|l| l == "Operating Income"));

        let labels: Vec<String> = BALANCE_FIELDS.iter().map(|f| field_label(f)).collect();
        assert!(labels.iter().any(|l| l == "Stockholders Equity"));
        assert!(labels.iter().any(|l| l == "Ordinary Shares Number"));
    }

    #[test]
    fn test_error_payload() {
        let body = r#"{"timeseries":{"result":null,"error":{"code":"Not Found"}}}"#;
        let err = parse_timeseries(body, StatementKind::Income, Granularity::Quarterly).unwrap_err();
        assert!(matches!(err, DataError::YahooApi(_)));
    }

    #[test]
    fn test_empty_result() {
        let body = r#"{"timeseries":{"result":[],"error":null}}"#;
        let table = parse_timeseries(body, StatementKind::Income, Granularity::Annual).unwrap();
        assert!(table.is_empty());
    }
}
