//! Stat card values
//!
//! A trailing bucket is often a zero-filled gap, so the "current" value of a
//! metric is the most recent non-zero reading rather than the last one.

use super::summary::{MetricField, SummaryTotals, TimelineBucket};

/// Most recent value that is neither zero nor NaN, or `0.0`
pub fn last_non_zero<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: DoubleEndedIterator,
{
    values
        .into_iter()
        .rev()
        .find(|v| *v != 0.0 && !v.is_nan())
        .unwrap_or(0.0)
}

/// Current value of one metric over a series
pub fn derive_display_stat(series: &[TimelineBucket], field: MetricField) -> f64 {
    last_non_zero(series.iter().map(|bucket| field.of_bucket(bucket)))
}

/// Current value of every metric over a series
pub fn display_stats(series: &[TimelineBucket]) -> SummaryTotals {
    SummaryTotals::from_fn(|field| derive_display_stat(series, field))
}
