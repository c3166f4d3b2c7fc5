//! Upstream Clients
//!
//! HTTP clients for the two services the dashboard reads from:
//!
//! - **api**: Primary data API (genres, regions, music data, calendar)
//! - **etl**: ETL analytics API (top genres, top decades, correlation)
//!
//! The primary API sits behind the [`MusicDataSource`] trait so aggregation
//! can run against any source, including in-memory fixtures.

mod api;
mod error;
mod etl;

pub use api::{ApiClientConfig, MusicApiClient};
pub use error::ClientError;
pub use etl::{
    CorrelationResponse, Dataset, EtlClient, EtlClientConfig, EtlSnapshot, TopDecadesResponse,
    TopGenresResponse, DEFAULT_TOP_N,
};

use async_trait::async_trait;
use serde::Serialize;

use crate::data::{CalendarEntry, Genre, RawDataPoint, Region};

/// Read-only access to the primary data API
#[async_trait]
pub trait MusicDataSource: Send + Sync {
    /// All genres
    async fn genres(&self) -> Result<Vec<Genre>, ClientError>;

    /// All regions
    async fn regions(&self) -> Result<Vec<Region>, ClientError>;

    /// Music data points, optionally narrowed server side
    async fn music_data(
        &self,
        query: Option<&MusicDataQuery>,
    ) -> Result<Vec<RawDataPoint>, ClientError>;

    /// The calendar lookup table
    async fn calendar(&self) -> Result<Vec<CalendarEntry>, ClientError>;
}

/// Query parameters accepted by `/music-data`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MusicDataQuery {
    pub id_region: String,
    pub id_genre: String,
}

impl MusicDataQuery {
    pub fn new(genre_id: impl Into<String>, region_id: impl Into<String>) -> Self {
        Self {
            id_region: region_id.into(),
            id_genre: genre_id.into(),
        }
    }
}

/// Result of a fail-soft operation
///
/// A soft failure still carries a usable value (the documented zero state),
/// but keeps the error so callers can surface a non-blocking notice.
#[derive(Debug)]
pub enum Outcome<T> {
    Loaded(T),
    SoftFailure { fallback: T, error: ClientError },
}

impl<T> Outcome<T> {
    /// Keep the value on success, otherwise substitute `fallback()`
    pub fn from_result(result: Result<T, ClientError>, fallback: impl FnOnce() -> T) -> Self {
        match result {
            Ok(value) => Outcome::Loaded(value),
            Err(error) => Outcome::SoftFailure {
                fallback: fallback(),
                error,
            },
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Loaded(value) => value,
            Outcome::SoftFailure { fallback, .. } => fallback,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Loaded(value) => value,
            Outcome::SoftFailure { fallback, .. } => fallback,
        }
    }

    /// Split into the value and the error, if any
    pub fn into_parts(self) -> (T, Option<ClientError>) {
        match self {
            Outcome::Loaded(value) => (value, None),
            Outcome::SoftFailure { fallback, error } => (fallback, Some(error)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Outcome::Loaded(_))
    }

    pub fn is_soft_failure(&self) -> bool {
        matches!(self, Outcome::SoftFailure { .. })
    }

    pub fn error(&self) -> Option<&ClientError> {
        match self {
            Outcome::Loaded(_) => None,
            Outcome::SoftFailure { error, .. } => Some(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Loaded(value) => Outcome::Loaded(f(value)),
            Outcome::SoftFailure { fallback, error } => Outcome::SoftFailure {
                fallback: f(fallback),
                error,
            },
        }
    }
}

/// Join a base URL and an endpoint path with exactly one slash
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
