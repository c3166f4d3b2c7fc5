//! Line chart series built from a timeline

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::summary::{MetricField, TimelineBucket};

/// Label used for buckets whose date cannot be parsed
pub const INVALID_DATE_LABEL: &str = "invalid date";

/// One plotted metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub field: MetricField,
    pub label: &'static str,
    pub values: Vec<f64>,
}

/// X-axis labels plus one dataset per metric
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

impl ChartSeries {
    pub fn from_timeline(timeline: &[TimelineBucket]) -> Self {
        let labels = timeline
            .iter()
            .map(|bucket| date_label(&bucket.date_value))
            .collect();

        let datasets = MetricField::ALL
            .into_iter()
            .map(|field| ChartDataset {
                field,
                label: field.label(),
                values: timeline.iter().map(|b| field.of_bucket(b)).collect(),
            })
            .collect();

        Self { labels, datasets }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn dataset(&self, field: MetricField) -> Option<&ChartDataset> {
        self.datasets.iter().find(|d| d.field == field)
    }
}

/// Render a calendar date as `YYYY-MM-DD`
fn date_label(raw: &str) -> String {
    parse_calendar_date(raw)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| INVALID_DATE_LABEL.to_string())
}

fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}
