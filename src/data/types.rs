//! Core data types decoded from the primary data API
//!
//! - `RawDataPoint`: one observation for a genre, region and calendar day
//! - `CalendarEntry` / `CalendarLookup`: calendar id to date string
//! - `Genre` and `Region`: selector entries
//! - `FilterId`: a selector id as typed by the user, compared numerically

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single observation from `/music-data`
///
/// Produced only by [`normalize_raw_point`](super::normalize_raw_point), so
/// every field is populated and every metric is finite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDataPoint {
    pub id_genre: i64,
    pub id_region: i64,
    pub id_calendar: i64,
    pub total_streams: f64,
    pub total_artists: f64,
    pub avg_popularity: f64,
    pub new_releases: f64,
}

impl RawDataPoint {
    /// Create a point with all metrics at zero
    pub fn new(id_genre: i64, id_region: i64, id_calendar: i64) -> Self {
        Self {
            id_genre,
            id_region,
            id_calendar,
            ..Default::default()
        }
    }

    /// Builder method: set streams
    pub fn streams(mut self, value: f64) -> Self {
        self.total_streams = value;
        self
    }

    /// Builder method: set artists
    pub fn artists(mut self, value: f64) -> Self {
        self.total_artists = value;
        self
    }

    /// Builder method: set popularity
    pub fn popularity(mut self, value: f64) -> Self {
        self.avg_popularity = value;
        self
    }

    /// Builder method: set new releases
    pub fn releases(mut self, value: f64) -> Self {
        self.new_releases = value;
        self
    }
}

/// One row of `/calendar`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub id: i64,
    pub date_value: String,
}

impl CalendarEntry {
    pub fn new(id: i64, date_value: impl Into<String>) -> Self {
        Self {
            id,
            date_value: date_value.into(),
        }
    }
}

/// Read-only map from calendar id to date string
#[derive(Debug, Clone, Default)]
pub struct CalendarLookup {
    dates: HashMap<i64, String>,
}

impl CalendarLookup {
    /// Build the lookup; a later entry with the same id replaces an earlier one
    pub fn from_entries(entries: impl IntoIterator<Item = CalendarEntry>) -> Self {
        let dates = entries
            .into_iter()
            .map(|entry| (entry.id, entry.date_value))
            .collect();
        Self { dates }
    }

    /// Date string for a calendar id, if known
    pub fn get(&self, id: i64) -> Option<&str> {
        self.dates.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl FromIterator<CalendarEntry> for CalendarLookup {
    fn from_iter<I: IntoIterator<Item = CalendarEntry>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

/// Music genre offered in the selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Region offered in the selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Region {
    /// Label used on stat cards: country first, then the region name
    pub fn display_name(&self) -> &str {
        match self.country.as_deref() {
            Some(country) if !country.is_empty() => country,
            _ => &self.name,
        }
    }
}

/// A genre or region id as selected by the user
///
/// Selector ids travel as strings. They are compared against the integer
/// foreign keys numerically: whitespace is ignored, an empty id means `0`
/// and anything non-numeric matches nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterId(Option<f64>);

impl FilterId {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self(Some(0.0));
        }
        Self(trimmed.parse::<f64>().ok().filter(|v| v.is_finite()))
    }

    /// Whether a foreign key equals this id
    pub fn matches(&self, id: i64) -> bool {
        self.0.map(|value| value == id as f64).unwrap_or(false)
    }
}
