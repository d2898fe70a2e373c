//! Year-to-date, month-to-date and run-rate forecast arithmetic over monthly buckets.
//!
//! The cutoff is a 1-based month. A cutoff of 0 or below has no elapsed months,
//! so the average per month is defined as zero rather than dividing by zero.

use crate::aggregation::AggregateBucket;
use serde::{Deserialize, Serialize};

const MONTHS_PER_YEAR: i32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Metric {
    Revenue,
    Volume,
}

impl Metric {
    fn of(&self, bucket: &AggregateBucket) -> f64 {
        match self {
            Metric::Revenue => bucket.revenue,
            Metric::Volume => bucket.volume,
        }
    }
}

pub fn ytd(series: &[AggregateBucket], cutoff: i32, metric: Metric) -> f64 {
    series
        .iter()
        .filter(|b| b.month().is_some_and(|m| m as i32 <= cutoff))
        .map(|b| metric.of(b))
        .sum()
}

pub fn mtd(series: &[AggregateBucket], cutoff: i32, metric: Metric) -> f64 {
    series
        .iter()
        .find(|b| b.month().is_some_and(|m| m as i32 == cutoff))
        .map_or(0.0, |b| metric.of(b))
}

pub fn avg_per_month(ytd: f64, cutoff: i32) -> f64 {
    if cutoff > 0 {
        ytd / cutoff as f64
    } else {
        0.0
    }
}

/// `ytd + remaining_months * avg_per_month * (1 + adjustment_pct / 100)`
pub fn run_rate_forecast(ytd: f64, cutoff: i32, adjustment_pct: f64) -> f64 {
    let remaining = (MONTHS_PER_YEAR - cutoff.min(MONTHS_PER_YEAR)).max(0) as f64;
    let avg = avg_per_month(ytd, cutoff);
    ytd + remaining * avg * (1.0 + adjustment_pct / 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    pub current_ytd: f64,
    pub prior_ytd: f64,
    pub current_mtd: f64,
    pub prior_mtd: f64,
    /// Percent change of current over prior YTD; `None` when the prior YTD is zero.
    pub ytd_change_pct: Option<f64>,
    pub avg_per_month: f64,
    pub forecast: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodComparison {
    pub month_cutoff: i32,
    pub adjustment_pct: f64,
    pub revenue: MetricComparison,
    pub volume: MetricComparison,
}

pub struct ComparisonCalculator;

impl ComparisonCalculator {
    pub fn compare_metric(
        current: &[AggregateBucket],
        prior: &[AggregateBucket],
        cutoff: i32,
        adjustment_pct: f64,
        metric: Metric,
    ) -> MetricComparison {
        let current_ytd = ytd(current, cutoff, metric);
        let prior_ytd = ytd(prior, cutoff, metric);
        let ytd_change_pct = if prior_ytd != 0.0 {
            Some((current_ytd - prior_ytd) / prior_ytd * 100.0)
        } else {
            None
        };

        MetricComparison {
            current_ytd,
            prior_ytd,
            current_mtd: mtd(current, cutoff, metric),
            prior_mtd: mtd(prior, cutoff, metric),
            ytd_change_pct,
            avg_per_month: avg_per_month(current_ytd, cutoff),
            forecast: run_rate_forecast(current_ytd, cutoff, adjustment_pct),
        }
    }

    /// Compares two monthly series up to `cutoff` and projects the current one to year end.
    pub fn compare(
        current: &[AggregateBucket],
        prior: &[AggregateBucket],
        cutoff: i32,
        adjustment_pct: f64,
    ) -> PeriodComparison {
        PeriodComparison {
            month_cutoff: cutoff,
            adjustment_pct,
            revenue: Self::compare_metric(current, prior, cutoff, adjustment_pct, Metric::Revenue),
            volume: Self::compare_metric(current, prior, cutoff, adjustment_pct, Metric::Volume),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::BucketKey;

    fn monthly(values: &[(u32, f64)]) -> Vec<AggregateBucket> {
        values
            .iter()
            .map(|&(month, revenue)| AggregateBucket {
                key: BucketKey::Month(month),
                label: crate::seasonality::month_display_name(month).to_string(),
                revenue,
                volume: revenue / 10.0,
            })
            .collect()
    }

    #[test]
    fn test_reference_forecast() {
        assert_eq!(avg_per_month(1200.0, 6), 200.0);
        assert!((run_rate_forecast(1200.0, 6, 10.0) - 2520.0).abs() < 1e-9);
    }

    #[test]
    fn test_full_year_cutoff_collapses_to_ytd() {
        assert_eq!(run_rate_forecast(5000.0, 12, 25.0), 5000.0);
        assert_eq!(run_rate_forecast(5000.0, 14, 25.0), 5000.0);
    }

    #[test]
    fn test_non_positive_cutoff_does_not_divide() {
        assert_eq!(avg_per_month(900.0, 0), 0.0);
        assert_eq!(avg_per_month(900.0, -3), 0.0);
        assert_eq!(run_rate_forecast(0.0, 0, 10.0), 0.0);
    }

    #[test]
    fn test_ytd_and_mtd() {
        let series = monthly(&[(1, 100.0), (2, 200.0), (3, 300.0), (4, 400.0)]);
        assert_eq!(ytd(&series, 3, Metric::Revenue), 600.0);
        assert_eq!(ytd(&series, 3, Metric::Volume), 60.0);
        assert_eq!(mtd(&series, 3, Metric::Revenue), 300.0);
        assert_eq!(mtd(&series, 6, Metric::Revenue), 0.0);
        assert_eq!(ytd(&series, 0, Metric::Revenue), 0.0);
    }

    #[test]
    fn test_compare_periods() {
        let current = monthly(&[(1, 300.0), (2, 300.0), (3, 600.0)]);
        let prior = monthly(&[(1, 200.0), (2, 200.0), (3, 200.0), (4, 999.0)]);
        let comparison = ComparisonCalculator::compare(&current, &prior, 3, 0.0);

        let revenue = &comparison.revenue;
        assert_eq!(revenue.current_ytd, 1200.0);
        assert_eq!(revenue.prior_ytd, 600.0);
        assert_eq!(revenue.current_mtd, 600.0);
        assert_eq!(revenue.prior_mtd, 200.0);
        assert_eq!(revenue.ytd_change_pct, Some(100.0));
        assert_eq!(revenue.avg_per_month, 400.0);
        assert_eq!(revenue.forecast, 1200.0 + 9.0 * 400.0);

        assert_eq!(comparison.volume.current_ytd, 120.0);
    }

    #[test]
    fn test_compare_with_empty_prior() {
        let current = monthly(&[(1, 50.0)]);
        let comparison = ComparisonCalculator::compare(&current, &[], 1, 0.0);
        assert_eq!(comparison.revenue.prior_ytd, 0.0);
        assert_eq!(comparison.revenue.ytd_change_pct, None);
    }
}
