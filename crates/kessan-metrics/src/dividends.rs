//! Dividend-per-period alignment.
//!
//! Dividend events arrive on their own irregular calendar. They are summed
//! into calendar quarter-end or year-end buckets, then each statement period
//! takes the latest bucket ending at or before its period end.

use crate::derive::{DerivedMetric, DerivedTable, checked, ratio};
use chrono::{Datelike, Days, NaiveDate};
use kessan_data::statement::value_as_of;
use kessan_data::{DividendSeries, Granularity};
use std::collections::BTreeMap;
use tracing::debug;

/// Last day of the calendar quarter or year containing `date`.
pub fn bucket_end(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    let (month, day) = match granularity {
        Granularity::Annual => (12, 31),
        Granularity::Quarterly => match date.month() {
            1..=3 => (3, 31),
            4..=6 => (6, 30),
            7..=9 => (9, 30),
            _ => (12, 31),
        },
    };
    NaiveDate::from_ymd_opt(date.year(), month, day).unwrap_or(date)
}

/// Sum events into period buckets.
///
/// Every bucket between the first and last one that saw an event is present;
/// buckets without an event hold `0.0`.
pub fn bucket_dividends(
    dividends: &DividendSeries,
    granularity: Granularity,
) -> BTreeMap<NaiveDate, f64> {
    let mut buckets = BTreeMap::new();
    for event in dividends.events() {
        *buckets
            .entry(bucket_end(event.ex_date, granularity))
            .or_insert(0.0) += event.amount;
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return buckets;
    };
    let mut bucket = first;
    while bucket < last {
        let Some(next) = bucket.checked_add_days(Days::new(1)) else {
            break;
        };
        bucket = bucket_end(next, granularity);
        buckets.entry(bucket).or_insert(0.0);
    }
    buckets
}

/// Dividend per share for each calendar date, forward-filled from buckets.
///
/// Dates before the first bucket stay `None`.
pub fn align_dividends(
    dividends: &DividendSeries,
    granularity: Granularity,
    calendar: &[NaiveDate],
) -> Vec<Option<f64>> {
    let buckets = bucket_dividends(dividends, granularity);
    calendar
        .iter()
        .map(|date| value_as_of(&buckets, *date))
        .collect()
}

impl DerivedTable {
    /// Fold dividends onto the calendar and derive the payout ratio.
    ///
    /// Without dividends, or when no period receives a value, the dividend
    /// fields stay empty and `has_dividends` is false.
    pub fn with_dividends(
        mut self,
        dividends: Option<&DividendSeries>,
        granularity: Granularity,
    ) -> Self {
        let Some(dividends) = dividends.filter(|d| !d.is_empty()) else {
            self.has_dividends = false;
            return self;
        };

        let calendar: Vec<NaiveDate> = self.records.iter().map(|r| r.period_end).collect();
        let per_period = align_dividends(dividends, granularity, &calendar);
        if per_period.iter().all(Option::is_none) {
            debug!(
                events = dividends.len(),
                "no dividend falls on or before any reporting period"
            );
            self.has_dividends = false;
            return self;
        }

        for (record, dividend_per_share) in self.records.iter_mut().zip(per_period) {
            record.dividend_per_share = dividend_per_share;
            record.payout_ratio_pct = dividend_per_share.and_then(|dps| {
                checked(
                    ratio(Some(dps), record.eps, 100.0),
                    record.period_end,
                    DerivedMetric::PayoutRatioPct,
                    &mut self.warnings,
                )
            });
        }
        self.has_dividends = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kessan_data::statement::date_from_unix;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(date(2023, 1, 15), Granularity::Quarterly, date(2023, 3, 31))]
    #[case(date(2023, 4, 1), Granularity::Quarterly, date(2023, 6, 30))]
    #[case(date(2023, 9, 30), Granularity::Quarterly, date(2023, 9, 30))]
    #[case(date(2023, 11, 2), Granularity::Quarterly, date(2023, 12, 31))]
    #[case(date(2023, 2, 28), Granularity::Annual, date(2023, 12, 31))]
    fn test_bucket_end(
        #[case] input: NaiveDate,
        #[case] granularity: Granularity,
        #[case] expected: NaiveDate,
    ) {
        assert_eq!(bucket_end(input, granularity), expected);
    }

    #[test]
    fn test_events_in_one_quarter_are_summed() {
        let dividends = DividendSeries::from_events([
            (date(2023, 1, 15), 0.20),
            (date(2023, 2, 15), 0.20),
            (date(2023, 4, 15), 0.25),
        ]);

        let aligned = align_dividends(
            &dividends,
            Granularity::Quarterly,
            &[date(2023, 3, 31), date(2023, 6, 30)],
        );

        assert_eq!(aligned.len(), 2);
        assert_relative_eq!(aligned[0].unwrap(), 0.40);
        assert_relative_eq!(aligned[1].unwrap(), 0.25);
    }

    #[test]
    fn test_gap_quarters_are_zero() {
        let dividends =
            DividendSeries::from_events([(date(2023, 2, 1), 0.5), (date(2023, 11, 1), 0.5)]);
        let buckets = bucket_dividends(&dividends, Granularity::Quarterly);

        assert_eq!(
            buckets.into_iter().collect::<Vec<_>>(),
            vec![
                (date(2023, 3, 31), 0.5),
                (date(2023, 6, 30), 0.0),
                (date(2023, 9, 30), 0.0),
                (date(2023, 12, 31), 0.5),
            ]
        );
    }

    #[test]
    fn test_same_day_events_are_both_counted() {
        let dividends =
            DividendSeries::from_events([(date(2022, 6, 1), 0.10), (date(2022, 6, 1), 0.05)]);
        let aligned = align_dividends(&dividends, Granularity::Annual, &[date(2022, 12, 31)]);
        assert_relative_eq!(aligned[0].unwrap(), 0.15);
    }

    #[test]
    fn test_periods_before_first_bucket_stay_empty() {
        let dividends = DividendSeries::from_events([(date(2023, 5, 10), 0.3)]);
        let aligned = align_dividends(
            &dividends,
            Granularity::Quarterly,
            &[date(2022, 12, 31), date(2023, 3, 31), date(2023, 6, 30), date(2023, 9, 30)],
        );
        assert_eq!(aligned, vec![None, None, Some(0.3), Some(0.3)]);
    }

    #[test]
    fn test_exchange_local_ex_date_picks_its_quarter() {
        // 2023-04-01 09:00 at UTC+12, still March 31 in UTC
        let ex_date = date_from_unix(1_680_296_400, 12 * 3600).unwrap();
        let dividends = DividendSeries::from_events([(ex_date, 0.5)]);
        let buckets = bucket_dividends(&dividends, Granularity::Quarterly);

        assert_eq!(
            buckets.into_iter().collect::<Vec<_>>(),
            vec![(date(2023, 6, 30), 0.5)]
        );
    }

    #[test]
    fn test_fiscal_period_takes_latest_bucket() {
        let dividends = DividendSeries::from_events([(date(2023, 2, 10), 0.23)]);
        let aligned = align_dividends(&dividends, Granularity::Quarterly, &[date(2023, 4, 1)]);
        assert_eq!(aligned, vec![Some(0.23)]);
    }
}
