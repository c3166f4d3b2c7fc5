//! Tolerant decoding of upstream payloads
//!
//! The data API has shipped several revisions: collections arrive either as
//! bare arrays or wrapped in an object, and data points spell their fields in
//! camelCase or snake_case. This module is the only place that knows about
//! those variations.

use serde::Deserialize;
use serde_json::Value;

use super::types::{CalendarEntry, Genre, RawDataPoint, Region};

/// Accepted response shapes for a collection endpoint
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Collection {
    /// `[ ... ]`
    Items(Vec<Value>),
    /// `{ "content": [ ... ] }`
    Content { content: Vec<Value> },
    /// `{ "data": [ ... ] }`
    Data { data: Vec<Value> },
}

impl Collection {
    /// Decode a response body, `None` if it matches none of the known shapes
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    pub fn into_items(self) -> Vec<Value> {
        match self {
            Collection::Items(items) => items,
            Collection::Content { content } => content,
            Collection::Data { data } => data,
        }
    }
}

/// Canonicalize one `/music-data` row
///
/// Each field is read from its camelCase key, then its snake_case key.
/// A spelling whose value is missing, null or not a finite number is skipped.
/// Fields with no usable spelling default to zero; this never fails.
pub fn normalize_raw_point(raw: &Value) -> RawDataPoint {
    RawDataPoint {
        id_genre: id_field(raw, &["idGenre", "id_genre"]),
        id_region: id_field(raw, &["idRegion", "id_region"]),
        id_calendar: id_field(raw, &["idCalendar", "id_calendar"]),
        total_streams: number_field(raw, &["totalStreams", "total_streams"]),
        total_artists: number_field(raw, &["totalArtists", "total_artists"]),
        avg_popularity: number_field(raw, &["avgPopularity", "avg_popularity"]),
        new_releases: number_field(raw, &["newReleases", "new_releases"]),
    }
}

/// Decode one `/calendar` row; rows without a usable id are dropped
pub fn normalize_calendar_entry(raw: &Value) -> Option<CalendarEntry> {
    let id = first_of(raw, &["id"], as_id)?;
    let date_value = first_of(raw, &["date_value", "dateValue"], as_text).unwrap_or_default();
    Some(CalendarEntry { id, date_value })
}

/// Decode one `/genre` row
pub fn normalize_genre(raw: &Value) -> Option<Genre> {
    let id = first_of(raw, &["id"], as_key)?;
    let kind = first_of(raw, &["type"], as_text);
    let name = first_of(raw, &["name"], as_text)
        .or_else(|| kind.clone())
        .unwrap_or_else(|| id.clone());
    Some(Genre { id, name, kind })
}

/// Decode one `/region` row
pub fn normalize_region(raw: &Value) -> Option<Region> {
    let id = first_of(raw, &["id"], as_key)?;
    let name = first_of(raw, &["name", "nom"], as_text).unwrap_or_else(|| id.clone());
    Some(Region {
        id,
        name,
        continent: first_of(raw, &["continent"], as_text),
        country: first_of(raw, &["country"], as_text),
    })
}

fn number_field(raw: &Value, keys: &[&str]) -> f64 {
    first_of(raw, keys, as_number).unwrap_or(0.0)
}

fn id_field(raw: &Value, keys: &[&str]) -> i64 {
    first_of(raw, keys, as_id).unwrap_or(0)
}

fn first_of<T>(raw: &Value, keys: &[&str], convert: fn(&Value) -> Option<T>) -> Option<T> {
    keys.iter().find_map(|key| raw.get(key).and_then(convert))
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn as_id(value: &Value) -> Option<i64> {
    as_number(value)
        .filter(|n| n.fract() == 0.0)
        .map(|n| n as i64)
}

fn as_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
