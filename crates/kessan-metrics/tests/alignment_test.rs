//! Integration tests for statement alignment and metric derivation

use approx::assert_relative_eq;
use chrono::NaiveDate;
use kessan_data::{DividendSeries, Granularity, SharesOutstanding, StatementKind, StatementTable};
use kessan_metrics::{
    Aligner, AlignmentPolicy, DerivationWarning, DerivedMetric, FinancialTimeseries,
    MetricsError, WarningReason, derive,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn quarters() -> Vec<NaiveDate> {
    vec![date(2023, 3, 31), date(2023, 6, 30), date(2023, 9, 30), date(2023, 12, 31)]
}

fn row(values: [f64; 4]) -> Vec<(NaiveDate, f64)> {
    quarters().into_iter().zip(values).collect()
}

fn income() -> StatementTable {
    StatementTable::new(StatementKind::Income)
        .with_row("Total Revenue", row([100_000.0, 110_000.0, 120_000.0, 130_000.0]))
        .with_row("Operating Income", row([20_000.0, 22_000.0, 24_000.0, 26_000.0]))
        .with_row("Net Income", row([15_000.0, 16_500.0, 18_000.0, 19_500.0]))
}

fn balance() -> StatementTable {
    StatementTable::new(StatementKind::BalanceSheet)
        .with_row("Stockholders Equity", row([200_000.0, 210_000.0, 220_000.0, 230_000.0]))
}

fn cashflow() -> StatementTable {
    StatementTable::new(StatementKind::CashFlow)
        .with_row("Operating Cash Flow", row([25_000.0, 27_500.0, 30_000.0, 32_500.0]))
}

fn shares() -> SharesOutstanding {
    SharesOutstanding::Constant(1_000_000.0)
}

fn build(
    income: &StatementTable,
    balance: &StatementTable,
    cashflow: &StatementTable,
    shares: &SharesOutstanding,
    dividends: Option<&DividendSeries>,
) -> FinancialTimeseries {
    let aligned = Aligner::default()
        .align(Some(income), Some(balance), Some(cashflow), Some(shares))
        .unwrap();
    let derived = derive(aligned).with_dividends(dividends, Granularity::Quarterly);
    FinancialTimeseries::new("ACME", Granularity::Quarterly, derived)
}

#[test]
fn test_align_and_derive_is_deterministic() {
    let dividends = DividendSeries::from_events([(date(2023, 2, 15), 0.2), (date(2023, 8, 15), 0.2)]);
    let first = build(&income(), &balance(), &cashflow(), &shares(), Some(&dividends));
    let second = build(&income(), &balance(), &cashflow(), &shares(), Some(&dividends));

    assert_eq!(first, second);
    assert_eq!(
        format!("{:?}", first.records()),
        format!("{:?}", second.records())
    );
}

#[test]
fn test_columns_share_the_calendar() {
    let series = build(&income(), &balance(), &cashflow(), &shares(), None);
    let axis = series.period_ends();

    assert_eq!(axis, quarters());
    assert!(axis.windows(2).all(|w| w[0] < w[1]));
    for column in [
        series.revenue(),
        series.operating_income(),
        series.net_income(),
        series.operating_cash_flow(),
        series.book_value(),
        series.shares_outstanding(),
        series.eps(),
        series.bps(),
        series.operating_margin_pct(),
        series.operating_cash_flow_per_share(),
        series.dividend_per_share(),
        series.payout_ratio_pct(),
    ] {
        assert_eq!(column.len(), axis.len());
    }
}

#[test]
fn test_eps_identity() {
    let series = build(&income(), &balance(), &cashflow(), &shares(), None);
    for record in series.records() {
        assert_relative_eq!(
            record.eps.unwrap(),
            record.net_income.unwrap() / record.shares_outstanding.unwrap()
        );
    }
    assert_relative_eq!(series.records()[0].operating_margin_pct.unwrap(), 20.0);
    assert_relative_eq!(series.records()[0].bps.unwrap(), 0.2);
    assert_relative_eq!(series.records()[0].operating_cash_flow_per_share.unwrap(), 0.025);
    assert!(series.warnings().is_empty());
}

#[test]
fn test_margin_is_not_clamped() {
    let income = StatementTable::new(StatementKind::Income)
        .with_row("Total Revenue", row([1_000.0, 1_000.0, 1_000.0, 1_000.0]))
        .with_row("Operating Income", row([-3_000.0, 2_500.0, 0.0, 1_000.0]))
        .with_row("Net Income", row([1.0, 1.0, 1.0, 1.0]));
    let series = build(&income, &balance(), &cashflow(), &shares(), None);

    assert_eq!(
        series.operating_margin_pct(),
        vec![Some(-300.0), Some(250.0), Some(0.0), Some(100.0)]
    );
}

#[test]
fn test_missing_net_income_fails() {
    let income = StatementTable::new(StatementKind::Income)
        .with_row("Total Revenue", row([1.0, 1.0, 1.0, 1.0]))
        .with_row("Operating Income", row([1.0, 1.0, 1.0, 1.0]));

    let err = Aligner::default()
        .align(Some(&income), Some(&balance()), Some(&cashflow()), Some(&shares()))
        .unwrap_err();

    match &err {
        MetricsError::MissingLineItem { items } => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].label, "Net Income");
            assert_eq!(items[0].statement, StatementKind::Income);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("Net Income"));
    assert!(err.to_string().starts_with("incomplete financial data"));
}

#[test]
fn test_every_missing_table_is_reported() {
    let empty_cashflow = StatementTable::new(StatementKind::CashFlow);
    let err = Aligner::default()
        .align(Some(&income()), None, Some(&empty_cashflow), None)
        .unwrap_err();

    match err {
        MetricsError::MissingTable { tables } => assert_eq!(
            tables,
            vec!["balance sheet", "cash flow statement", "shares outstanding"]
        ),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_dividend_bucketing() {
    let two_quarters = [date(2023, 3, 31), date(2023, 6, 30)];
    let income = StatementTable::new(StatementKind::Income)
        .with_row("Total Revenue", two_quarters.map(|d| (d, 100.0)))
        .with_row("Operating Income", two_quarters.map(|d| (d, 10.0)))
        .with_row("Net Income", two_quarters.map(|d| (d, 5.0)));
    let balance = StatementTable::new(StatementKind::BalanceSheet)
        .with_row("Stockholders Equity", two_quarters.map(|d| (d, 50.0)));
    let cashflow = StatementTable::new(StatementKind::CashFlow)
        .with_row("Operating Cash Flow", two_quarters.map(|d| (d, 8.0)));
    let dividends = DividendSeries::from_events([
        (date(2023, 1, 15), 0.20),
        (date(2023, 2, 15), 0.20),
        (date(2023, 4, 15), 0.25),
    ]);

    let series = build(
        &income,
        &balance,
        &cashflow,
        &SharesOutstanding::Constant(10.0),
        Some(&dividends),
    );

    let dps = series.dividend_per_share();
    assert!(series.has_dividends());
    assert_relative_eq!(dps[0].unwrap(), 0.40);
    assert_relative_eq!(dps[1].unwrap(), 0.25);
    // eps = 0.5, so payout is dps / eps * 100
    assert_relative_eq!(series.payout_ratio_pct()[0].unwrap(), 80.0);
    assert_relative_eq!(series.payout_ratio_pct()[1].unwrap(), 50.0);
}

#[test]
fn test_no_dividends_are_omitted() {
    let series = build(&income(), &balance(), &cashflow(), &shares(), None);
    assert!(!series.has_dividends());
    assert!(series.dividend_per_share().iter().all(Option::is_none));

    let later = DividendSeries::from_events([(date(2025, 1, 10), 1.0)]);
    let series = build(&income(), &balance(), &cashflow(), &shares(), Some(&later));
    assert!(!series.has_dividends());
    assert!(series.payout_ratio_pct().iter().all(Option::is_none));
}

#[test]
fn test_book_value_fallback() {
    let balance = StatementTable::new(StatementKind::BalanceSheet)
        .with_row("Total Assets", row([500_000.0; 4]))
        .with_row("Total Liabilities", row([300_000.0; 4]));

    let series = build(&income(), &balance, &cashflow(), &shares(), None);
    for bps in series.bps() {
        assert_relative_eq!(bps.unwrap(), 0.2);
    }
}

#[test]
fn test_book_value_exhausted() {
    let balance = StatementTable::new(StatementKind::BalanceSheet)
        .with_row("Total Assets", row([500_000.0; 4]));

    let err = Aligner::default()
        .align(Some(&income()), Some(&balance), Some(&cashflow()), Some(&shares()))
        .unwrap_err();

    assert!(matches!(
        err,
        MetricsError::InsufficientData { metric: "book value", ref tried } if tried.len() == 5
    ));
}

#[test]
fn test_zero_shares_is_undefined() {
    let shares = SharesOutstanding::Series(
        [(date(2023, 3, 31), 0.0), (date(2023, 6, 30), 1_000_000.0)]
            .into_iter()
            .collect(),
    );
    let series = build(&income(), &balance(), &cashflow(), &shares, None);

    assert_eq!(series.eps()[0], None);
    assert!(series.eps()[1].is_some());
    assert!(series.warnings().contains(&DerivationWarning {
        period_end: date(2023, 3, 31),
        metric: DerivedMetric::Eps,
        reason: WarningReason::ZeroDenominator,
    }));
    assert!(
        series
            .warnings()
            .iter()
            .all(|w| w.period_end == date(2023, 3, 31))
    );
}

#[test]
fn test_zero_revenue_margin_is_undefined() {
    let income = StatementTable::new(StatementKind::Income)
        .with_row("Total Revenue", row([0.0, 1.0, 1.0, 1.0]))
        .with_row("Operating Income", row([5.0, 1.0, 1.0, 1.0]))
        .with_row("Net Income", row([1.0, 1.0, 1.0, 1.0]));
    let series = build(&income, &balance(), &cashflow(), &shares(), None);

    assert_eq!(series.operating_margin_pct()[0], None);
    assert_eq!(series.warnings().len(), 1);
    assert_eq!(series.warnings()[0].metric, DerivedMetric::OperatingMarginPct);
}

#[test]
fn test_forward_fill_never_looks_backward() {
    // Balance sheet starts one quarter after the income statement
    let balance = StatementTable::new(StatementKind::BalanceSheet).with_row(
        "Stockholders Equity",
        [(date(2023, 6, 30), 210_000.0), (date(2023, 12, 31), 230_000.0)],
    );
    let series = build(&income(), &balance, &cashflow(), &shares(), None);

    assert_eq!(
        series.book_value(),
        vec![None, Some(210_000.0), Some(210_000.0), Some(230_000.0)]
    );
    assert_eq!(series.bps()[0], None);
}

#[test]
fn test_cash_flow_is_not_carried_forward() {
    let cashflow = StatementTable::new(StatementKind::CashFlow)
        .with_row("Operating Cash Flow", [(date(2023, 3, 31), 25_000.0)]);
    let series = build(&income(), &balance(), &cashflow, &shares(), None);

    assert_eq!(
        series.operating_cash_flow(),
        vec![Some(25_000.0), None, None, None]
    );
}

#[test]
fn test_intersection_keeps_common_periods() {
    let balance = StatementTable::new(StatementKind::BalanceSheet).with_row(
        "Stockholders Equity",
        [(date(2023, 6, 30), 210_000.0), (date(2023, 12, 31), 230_000.0)],
    );
    let aligned = Aligner::new(AlignmentPolicy::Intersection)
        .align(Some(&income()), Some(&balance), Some(&cashflow()), Some(&shares()))
        .unwrap();

    assert_eq!(aligned.policy(), AlignmentPolicy::Intersection);
    let dates: Vec<_> = aligned.rows().iter().map(|r| r.period_end).collect();
    assert_eq!(dates, vec![date(2023, 6, 30), date(2023, 12, 31)]);
}

#[test]
fn test_intersection_without_overlap_fails() {
    let balance = StatementTable::new(StatementKind::BalanceSheet)
        .with_row("Stockholders Equity", [(date(2022, 12, 31), 1.0)]);
    let err = Aligner::new(AlignmentPolicy::Intersection)
        .align(Some(&income()), Some(&balance), Some(&cashflow()), Some(&shares()))
        .unwrap_err();

    assert!(matches!(err, MetricsError::Alignment(_)));
}

#[test]
fn test_to_dataframe() {
    let series = build(&income(), &balance(), &cashflow(), &shares(), None);
    let df = series.to_dataframe().unwrap();

    assert_eq!(df.height(), 4);
    assert_eq!(df.width(), kessan_metrics::record::COLUMNS.len());
    assert_eq!(
        df.column("period_end").unwrap().dtype(),
        &polars::prelude::DataType::Date
    );
}
