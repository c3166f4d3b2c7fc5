//! Primary Data API Client
//!
//! reqwest client for the read-only music data API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::{join_url, ClientError, MusicDataQuery, MusicDataSource};
use crate::data::{
    normalize_calendar_entry, normalize_genre, normalize_raw_point, normalize_region,
    CalendarEntry, Collection, Genre, RawDataPoint, Region,
};

/// Configuration for the data API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL including the version prefix (e.g., "http://localhost:8081/api/v1")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081/api/v1".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

/// HTTP implementation of [`MusicDataSource`]
pub struct MusicApiClient {
    client: Client,
    config: ApiClientConfig,
}

impl MusicApiClient {
    pub fn new(config: ApiClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(concat!("opensound/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        join_url(&self.config.base_url, endpoint)
    }

    /// GET a collection endpoint and unwrap whichever shape it came in
    async fn get_collection<Q>(&self, endpoint: &str, query: Option<&Q>) -> Result<Vec<Value>, ClientError>
    where
        Q: Serialize + ?Sized + Sync,
    {
        let mut request = self.client.get(self.url(endpoint));
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = request.send().await.map_err(ClientError::from_transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await.map_err(ClientError::from_transport)?;

        let items = Collection::from_value(body)
            .map(Collection::into_items)
            .ok_or_else(|| ClientError::UnexpectedShape {
                endpoint: endpoint.to_string(),
            })?;

        tracing::debug!(endpoint, items = items.len(), "Fetched collection");
        Ok(items)
    }
}

#[async_trait]
impl MusicDataSource for MusicApiClient {
    async fn genres(&self) -> Result<Vec<Genre>, ClientError> {
        let items = self.get_collection::<()>("/genre", None).await?;
        Ok(decode_entries("/genre", &items, normalize_genre))
    }

    async fn regions(&self) -> Result<Vec<Region>, ClientError> {
        let items = self.get_collection::<()>("/region", None).await?;
        Ok(decode_entries("/region", &items, normalize_region))
    }

    async fn music_data(
        &self,
        query: Option<&MusicDataQuery>,
    ) -> Result<Vec<RawDataPoint>, ClientError> {
        let items = self.get_collection("/music-data", query).await?;
        Ok(items.iter().map(normalize_raw_point).collect())
    }

    async fn calendar(&self) -> Result<Vec<CalendarEntry>, ClientError> {
        let items = self.get_collection::<()>("/calendar", None).await?;
        Ok(decode_entries("/calendar", &items, normalize_calendar_entry))
    }
}

/// Decode rows, dropping the ones without a usable id
fn decode_entries<T>(endpoint: &str, items: &[Value], decode: fn(&Value) -> Option<T>) -> Vec<T> {
    let decoded: Vec<T> = items.iter().filter_map(decode).collect();

    let skipped = items.len() - decoded.len();
    if skipped > 0 {
        tracing::debug!(endpoint, skipped, "Skipped entries without an id");
    }

    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = ApiClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8081/api/v1");
        assert_eq!(config.request_timeout_ms, 10_000);
    }

    #[test]
    fn test_endpoint_urls() {
        let client = MusicApiClient::new(ApiClientConfig {
            base_url: "http://data.local/api/v1/".into(),
            request_timeout_ms: 1000,
        })
        .unwrap();

        assert_eq!(client.url("/music-data"), "http://data.local/api/v1/music-data");
        assert_eq!(client.url("calendar"), "http://data.local/api/v1/calendar");
    }

    #[test]
    fn test_decode_entries_skips_missing_ids() {
        let items = vec![
            json!({ "id": 1, "name": "Rock" }),
            json!({ "name": "No id" }),
            json!({ "id": 2, "type": "Jazz" }),
        ];

        let genres = decode_entries("/genre", &items, normalize_genre);

        assert_eq!(genres.len(), 2);
        assert_eq!(genres[1].name, "Jazz");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client = MusicApiClient::new(ApiClientConfig {
            base_url: "http://127.0.0.1:1/api/v1".into(),
            request_timeout_ms: 2000,
        })
        .unwrap();

        let err = client.calendar().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Unavailable(_) | ClientError::Timeout | ClientError::Request(_)
        ));
    }
}
