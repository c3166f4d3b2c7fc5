//! ETL Analytics Client
//!
//! Client for the Spotify ETL service, a separate host from the data API.
//! Every endpoint takes a `dataset` tag selecting the high- or
//! low-popularity partition of the source tracks.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::{join_url, ClientError};

/// Number of entries requested from the top-N endpoints by default
pub const DEFAULT_TOP_N: u32 = 5;

/// Popularity partition of the ETL source data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    #[default]
    High,
    Low,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::High => "high",
            Dataset::Low => "low",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Dataset::High),
            "low" => Ok(Dataset::Low),
            other => Err(format!("Unknown dataset: {} (expected high or low)", other)),
        }
    }
}

/// Configuration for the ETL client
#[derive(Debug, Clone)]
pub struct EtlClientConfig {
    /// Base URL (e.g., "http://localhost:8000")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for EtlClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

/// Response of `/spotify/top-genres`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopGenresResponse {
    /// Genre name to average popularity
    #[serde(default)]
    pub top_genres: HashMap<String, f64>,
    #[serde(default)]
    pub total_tracks_analyzed: u64,
}

impl TopGenresResponse {
    /// Genres by popularity, most popular first
    pub fn ranked(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self
            .top_genres
            .iter()
            .map(|(name, popularity)| (name.clone(), *popularity))
            .collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }
}

/// Response of `/spotify/top-decades`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopDecadesResponse {
    /// Decade (as a JSON object key) to average popularity
    #[serde(default)]
    pub top_decades: HashMap<String, f64>,
    #[serde(default)]
    pub total_tracks_analyzed: u64,
}

impl TopDecadesResponse {
    /// Decades by popularity, most popular first; non-numeric keys are skipped
    pub fn ranked(&self) -> Vec<(i32, f64)> {
        let mut entries: Vec<(i32, f64)> = self
            .top_decades
            .iter()
            .filter_map(|(decade, popularity)| {
                decade.trim().parse::<i32>().ok().map(|d| (d, *popularity))
            })
            .collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }
}

/// Response of `/spotify/duration-popularity-correlation`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResponse {
    pub correlation: f64,
    #[serde(default)]
    pub total_tracks_analyzed: u64,
}

/// Everything the ETL panel shows for one dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EtlSnapshot {
    pub dataset: Dataset,
    pub top_n: u32,
    pub top_genres: Vec<(String, f64)>,
    pub top_decades: Vec<(i32, f64)>,
    pub correlation: f64,
    pub total_tracks_analyzed: u64,
}

/// ETL analytics REST client
pub struct EtlClient {
    client: Client,
    config: EtlClientConfig,
}

impl EtlClient {
    pub fn new(config: EtlClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EtlClientConfig {
        &self.config
    }

    /// Average popularity of the `top_n` most popular genres
    pub async fn top_genres(
        &self,
        dataset: Dataset,
        top_n: u32,
    ) -> Result<TopGenresResponse, ClientError> {
        self.get_json(
            "/spotify/top-genres",
            &[("dataset", dataset.to_string()), ("top_n", top_n.to_string())],
        )
        .await
    }

    /// Average popularity of the `top_n` most popular decades
    pub async fn top_decades(
        &self,
        dataset: Dataset,
        top_n: u32,
    ) -> Result<TopDecadesResponse, ClientError> {
        self.get_json(
            "/spotify/top-decades",
            &[("dataset", dataset.to_string()), ("top_n", top_n.to_string())],
        )
        .await
    }

    /// Correlation between track duration and popularity
    pub async fn duration_popularity_correlation(
        &self,
        dataset: Dataset,
    ) -> Result<CorrelationResponse, ClientError> {
        self.get_json(
            "/spotify/duration-popularity-correlation",
            &[("dataset", dataset.to_string())],
        )
        .await
    }

    /// Fetch all three analyses concurrently
    pub async fn snapshot(&self, dataset: Dataset, top_n: u32) -> Result<EtlSnapshot, ClientError> {
        let (genres, decades, correlation) = tokio::try_join!(
            self.top_genres(dataset, top_n),
            self.top_decades(dataset, top_n),
            self.duration_popularity_correlation(dataset),
        )?;

        tracing::debug!(
            dataset = %dataset,
            genres = genres.top_genres.len(),
            decades = decades.top_decades.len(),
            "Fetched ETL snapshot"
        );

        Ok(EtlSnapshot {
            dataset,
            top_n,
            top_genres: genres.ranked(),
            top_decades: decades.ranked(),
            correlation: correlation.correlation,
            total_tracks_analyzed: correlation.total_tracks_analyzed,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = join_url(&self.config.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await.map_err(ClientError::from_transport)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dataset_parse() {
        assert_eq!("high".parse::<Dataset>().unwrap(), Dataset::High);
        assert_eq!(" LOW ".parse::<Dataset>().unwrap(), Dataset::Low);
        assert!("medium".parse::<Dataset>().is_err());
        assert_eq!(Dataset::default(), Dataset::High);
        assert_eq!(Dataset::Low.to_string(), "low");
    }

    #[test]
    fn test_top_genres_ranked() {
        let response: TopGenresResponse = serde_json::from_value(json!({
            "top_genres": { "pop": 71.2, "rock": 64.0, "k-pop": 71.2, "jazz": 80.5 },
            "total_tracks_analyzed": 1200
        }))
        .unwrap();

        let ranked = response.ranked();
        let names: Vec<&str> = ranked.iter().map(|(n, _)| n.as_str()).collect();

        assert_eq!(names, vec!["jazz", "k-pop", "pop", "rock"]);
        assert_eq!(response.total_tracks_analyzed, 1200);
    }

    #[test]
    fn test_top_decades_ranked() {
        let response: TopDecadesResponse = serde_json::from_value(json!({
            "top_decades": { "1980": 55.0, "2010": 70.0, "unknown": 99.0 },
            "total_tracks_analyzed": 300
        }))
        .unwrap();

        assert_eq!(response.ranked(), vec![(2010, 70.0), (1980, 55.0)]);
    }

    #[test]
    fn test_correlation_decodes() {
        let response: CorrelationResponse = serde_json::from_value(json!({
            "correlation": -0.12,
            "total_tracks_analyzed": 4000
        }))
        .unwrap();

        assert_eq!(response.correlation, -0.12);
        assert_eq!(response.total_tracks_analyzed, 4000);
    }

    #[tokio::test]
    async fn test_snapshot_propagates_transport_error() {
        let client = EtlClient::new(EtlClientConfig {
            base_url: "http://127.0.0.1:1".into(),
            request_timeout_ms: 2000,
        })
        .unwrap();

        assert!(client.snapshot(Dataset::High, DEFAULT_TOP_N).await.is_err());
    }
}
