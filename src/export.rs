//! Dashboard Export
//!
//! Serializes the current statistics and the full timeline of a dashboard
//! into a downloadable document.
//!
//! - JSON: pretty-printed document with metadata
//! - CSV: timeline rows only

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::session::GLOBAL_REGION;
use crate::timeline::{SummaryTotals, TimeWindow, TimelineBucket};

/// Label stamped on every export
pub const EXPORT_LABEL: &str = "OpenSound";

/// Output format of an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

/// One exported timeline row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub date: String,
    pub total_streams: f64,
    pub total_artists: f64,
    pub avg_popularity: f64,
    pub new_releases: f64,
}

impl From<&TimelineBucket> for ExportRow {
    fn from(bucket: &TimelineBucket) -> Self {
        Self {
            date: bucket.date_value.clone(),
            total_streams: bucket.total_streams,
            total_artists: bucket.total_artists,
            avg_popularity: bucket.avg_popularity,
            new_releases: bucket.new_releases,
        }
    }
}

/// Snapshot of a dashboard ready to be written out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDocument {
    pub label: String,
    pub genre_id: String,
    /// Region id, or `"global"`
    pub region: String,
    pub timeframe: TimeWindow,
    pub export_date: DateTime<Utc>,
    pub statistics: SummaryTotals,
    pub timeline: Vec<ExportRow>,
}

impl ExportDocument {
    pub fn new(
        genre_id: &str,
        region_id: Option<&str>,
        timeframe: TimeWindow,
        statistics: SummaryTotals,
        timeline: &[TimelineBucket],
    ) -> Self {
        Self {
            label: EXPORT_LABEL.to_string(),
            genre_id: genre_id.to_string(),
            region: region_id.unwrap_or(GLOBAL_REGION).to_string(),
            timeframe,
            export_date: Utc::now(),
            statistics,
            timeline: timeline.iter().map(ExportRow::from).collect(),
        }
    }

    /// Builder method: pin the export timestamp
    pub fn exported_at(mut self, export_date: DateTime<Utc>) -> Self {
        self.export_date = export_date;
        self
    }

    /// `opensound-analytics-{genre}-{timeframe}-{YYYY-MM-DD}.{ext}`
    ///
    /// Characters of the genre id other than ASCII alphanumerics, `-` and `_`
    /// become `_`, so the name never leaves the target directory.
    pub fn file_name(&self, format: ExportFormat) -> String {
        format!(
            "opensound-analytics-{}-{}-{}.{}",
            file_name_component(&self.genre_id),
            self.timeframe,
            self.export_date.format("%Y-%m-%d"),
            format.extension()
        )
    }

    pub fn render(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            ExportFormat::Csv => self.render_csv(),
        }
    }

    fn render_csv(&self) -> Result<String, ExportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if self.timeline.is_empty() {
            writer.write_record(["date", "total_streams", "total_artists", "avg_popularity", "new_releases"])?;
        }
        for row in &self.timeline {
            writer.serialize(row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExportError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| ExportError::Encoding(e.to_string()))
    }

    /// Write to `path`, creating parent directories as needed
    pub fn write_to(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, self.render(format)?)?;
        tracing::info!(path = %path.display(), rows = self.timeline.len(), "Export written");
        Ok(())
    }

    /// Write into `dir` under [`file_name`](Self::file_name)
    pub fn write_to_dir(&self, dir: &Path, format: ExportFormat) -> Result<PathBuf, ExportError> {
        let path = dir.join(self.file_name(format));
        self.write_to(&path, format)?;
        Ok(path)
    }
}

fn file_name_component(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Errors that can occur while writing an export
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Encoding error: {0}")]
    Encoding(String),
}
