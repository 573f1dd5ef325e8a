//! Sales report series.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One point of the sales series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesPoint {
    /// Period start.
    pub time: NaiveDate,
    /// Sales value for the period.
    pub value: Decimal,
}

impl SalesPoint {
    fn ymd(year: i32, month: u32, value: i64) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|time| Self {
            time,
            value: Decimal::from(value),
        })
    }
}

/// Monthly series the report ships with until the backend exposes one.
#[must_use]
pub fn seeded_series() -> Vec<SalesPoint> {
    [
        (2023, 1, 100),
        (2023, 2, 200),
        (2023, 3, 150),
        (2023, 4, 400),
        (2023, 5, 300),
        (2023, 6, 250),
        (2023, 7, 350),
        (2024, 1, 450),
        (2024, 2, 500),
        (2024, 3, 550),
        (2024, 4, 600),
        (2024, 5, 650),
        (2024, 6, 700),
    ]
    .into_iter()
    .filter_map(|(year, month, value)| SalesPoint::ymd(year, month, value))
    .collect()
}

/// Aggregates shown above the chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesSummary {
    /// Sum of all values.
    pub total: Decimal,
    /// Mean value per point, rounded to cents. Zero for an empty series.
    pub average: Decimal,
    /// The point with the highest value (earliest wins ties).
    pub peak: Option<SalesPoint>,
    /// Totals per calendar year, ascending.
    pub by_year: BTreeMap<i32, Decimal>,
}

impl SalesSummary {
    /// Summarize a series.
    #[must_use]
    pub fn from_points(points: &[SalesPoint]) -> Self {
        let total: Decimal = points.iter().map(|p| p.value).sum();
        let average = if points.is_empty() {
            Decimal::ZERO
        } else {
            (total / Decimal::from(points.len())).round_dp(2)
        };

        let peak = points
            .iter()
            .copied()
            .reduce(|best, p| if p.value > best.value { p } else { best });

        let mut by_year = BTreeMap::new();
        for point in points {
            *by_year.entry(point.time.year()).or_insert(Decimal::ZERO) += point.value;
        }

        Self {
            total,
            average,
            peak,
            by_year,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_series_is_complete_and_sorted() {
        let series = seeded_series();
        assert_eq!(series.len(), 13);
        assert!(series.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[test]
    fn test_summary_of_seeded_series() {
        let summary = SalesSummary::from_points(&seeded_series());

        assert_eq!(summary.total, Decimal::from(5200));
        assert_eq!(summary.average, Decimal::new(40000, 2));
        let peak = summary.peak.unwrap();
        assert_eq!(peak.value, Decimal::from(700));
        assert_eq!(peak.time, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(summary.by_year.get(&2023), Some(&Decimal::from(1750)));
        assert_eq!(summary.by_year.get(&2024), Some(&Decimal::from(3450)));
    }

    #[test]
    fn test_summary_of_empty_series() {
        let summary = SalesSummary::from_points(&[]);
        assert_eq!(summary.total, Decimal::ZERO);
        assert_eq!(summary.average, Decimal::ZERO);
        assert!(summary.peak.is_none());
        assert!(summary.by_year.is_empty());
    }

    #[test]
    fn test_peak_prefers_earliest_on_tie() {
        let points = [
            SalesPoint::ymd(2024, 1, 5).unwrap(),
            SalesPoint::ymd(2024, 2, 5).unwrap(),
        ];
        let summary = SalesSummary::from_points(&points);
        assert_eq!(summary.peak.unwrap().time.month(), 1);
    }
}
