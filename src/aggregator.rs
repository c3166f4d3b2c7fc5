//! Timeline Aggregator
//!
//! Fetches music data and the calendar lookup from a [`MusicDataSource`]
//! concurrently, then hands both to the pure summary functions in
//! [`crate::timeline`].
//!
//! Every operation here is fail-soft: an upstream failure is logged and
//! reported as [`Outcome::SoftFailure`] carrying the empty state, never as
//! an `Err`.

use crate::client::{ClientError, MusicDataQuery, MusicDataSource, Outcome};
use crate::data::{CalendarLookup, Genre, RawDataPoint, Region};
use crate::timeline::{compute_global_summary, compute_region_summary, MusicSummary};

/// Fetch-and-summarize front end over a data source
pub struct TimelineAggregator<S> {
    source: S,
}

impl<S: MusicDataSource> TimelineAggregator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Genres for the selector, empty on failure
    pub async fn genres(&self) -> Outcome<Vec<Genre>> {
        let result = self.source.genres().await;
        log_soft_failure("genres", &result);
        Outcome::from_result(result, Vec::new)
    }

    /// Regions for the selector, empty on failure
    pub async fn regions(&self) -> Outcome<Vec<Region>> {
        let result = self.source.regions().await;
        log_soft_failure("regions", &result);
        Outcome::from_result(result, Vec::new)
    }

    /// Summary of one genre across every region
    pub async fn fetch_global_summary(&self, genre_id: &str) -> Outcome<MusicSummary> {
        let result = self.fetch_inputs(None).await;
        log_soft_failure("global summary", &result);

        Outcome::from_result(result, Default::default)
            .map(|(points, calendar)| compute_global_summary(genre_id, &points, &calendar))
    }

    /// Summary of one genre within one region
    ///
    /// Without both ids there is nothing to narrow by, so the empty summary is
    /// returned without contacting the source.
    pub async fn fetch_region_summary(
        &self,
        genre_id: Option<&str>,
        region_id: Option<&str>,
    ) -> Outcome<MusicSummary> {
        let (genre_id, region_id) = match (non_empty(genre_id), non_empty(region_id)) {
            (Some(genre), Some(region)) => (genre, region),
            _ => {
                tracing::debug!("Region summary requested without genre and region");
                return Outcome::Loaded(MusicSummary::default());
            }
        };

        let query = MusicDataQuery::new(genre_id, region_id);
        let result = self.fetch_inputs(Some(&query)).await;
        log_soft_failure("region summary", &result);

        // An empty input set summarizes to the all-zero summary
        Outcome::from_result(result, Default::default).map(|(points, calendar)| {
            compute_region_summary(genre_id, region_id, &points, &calendar)
        })
    }

    /// Music data and calendar, fetched side by side
    async fn fetch_inputs(
        &self,
        query: Option<&MusicDataQuery>,
    ) -> Result<(Vec<RawDataPoint>, CalendarLookup), ClientError> {
        let (points, calendar) =
            tokio::try_join!(self.source.music_data(query), self.source.calendar())?;

        Ok((points, CalendarLookup::from_entries(calendar)))
    }
}

fn non_empty(id: Option<&str>) -> Option<&str> {
    id.filter(|s| !s.is_empty())
}

fn log_soft_failure<T>(operation: &str, result: &Result<T, ClientError>) {
    if let Err(e) = result {
        tracing::warn!(operation, error = %e, "Upstream fetch failed, using empty result");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory data source shared by aggregator and session tests

    use super::*;
    use crate::data::CalendarEntry;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    pub struct StaticSource {
        pub genres: Vec<Genre>,
        pub regions: Vec<Region>,
        pub points: Vec<RawDataPoint>,
        pub calendar: Vec<CalendarEntry>,
        /// Fail every music data request
        pub fail_music_data: bool,
        /// Fail every calendar request
        pub fail_calendar: bool,
        /// Artificial latency of `/music-data` keyed by `id_genre`
        pub delays: HashMap<String, Duration>,
        pub music_data_calls: AtomicUsize,
        pub last_query: Mutex<Option<MusicDataQuery>>,
    }

    impl StaticSource {
        pub fn calls(&self) -> usize {
            self.music_data_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MusicDataSource for StaticSource {
        async fn genres(&self) -> Result<Vec<Genre>, ClientError> {
            Ok(self.genres.clone())
        }

        async fn regions(&self) -> Result<Vec<Region>, ClientError> {
            Ok(self.regions.clone())
        }

        async fn music_data(
            &self,
            query: Option<&MusicDataQuery>,
        ) -> Result<Vec<RawDataPoint>, ClientError> {
            self.music_data_calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut last) = self.last_query.lock() {
                *last = query.cloned();
            }

            let delay = query
                .and_then(|q| self.delays.get(&q.id_genre))
                .copied()
                .unwrap_or_default();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            if self.fail_music_data {
                return Err(ClientError::Api {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(self.points.clone())
        }

        async fn calendar(&self) -> Result<Vec<CalendarEntry>, ClientError> {
            if self.fail_calendar {
                return Err(ClientError::Timeout);
            }
            Ok(self.calendar.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StaticSource;
    use super::*;
    use crate::data::CalendarEntry;

    fn source() -> StaticSource {
        StaticSource {
            points: vec![
                RawDataPoint::new(1, 1, 10).streams(5.0).artists(4.0).popularity(50.0),
                RawDataPoint::new(1, 1, 10).streams(7.0).artists(2.0).popularity(30.0),
                RawDataPoint::new(1, 2, 11).streams(9.0).artists(1.0).popularity(10.0),
                RawDataPoint::new(2, 1, 11).streams(100.0),
            ],
            calendar: vec![CalendarEntry::new(10, "2024-01-01")],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_global_summary() {
        let aggregator = TimelineAggregator::new(source());

        let outcome = aggregator.fetch_global_summary("1").await;
        assert!(outcome.is_loaded());

        let summary = outcome.into_value();
        assert_eq!(summary.totals.total_streams, 21.0);
        assert_eq!(summary.totals.total_artists, 7.0);
        assert_eq!(summary.totals.avg_popularity, 90.0);

        // Calendar id 11 is unknown: counted in totals, absent from the timeline
        assert_eq!(summary.timeline.len(), 1);
        assert_eq!(summary.timeline[0].total_streams, 12.0);
    }

    #[tokio::test]
    async fn test_global_summary_fetches_unfiltered() {
        let aggregator = TimelineAggregator::new(source());
        aggregator.fetch_global_summary("1").await;

        let last = aggregator.source().last_query.lock().unwrap().clone();
        assert_eq!(last, None);
    }

    #[tokio::test]
    async fn test_region_summary() {
        let aggregator = TimelineAggregator::new(source());

        let summary = aggregator
            .fetch_region_summary(Some("1"), Some("1"))
            .await
            .into_value();

        assert_eq!(summary.totals.total_streams, 7.0);
        assert_eq!(summary.totals.total_artists, 4.0);
        assert_eq!(summary.totals.avg_popularity, 80.0);

        let last = aggregator.source().last_query.lock().unwrap().clone();
        assert_eq!(last, Some(MusicDataQuery::new("1", "1")));
    }

    #[tokio::test]
    async fn test_region_summary_requires_both_ids() {
        let aggregator = TimelineAggregator::new(source());

        for (genre, region) in [(None, Some("1")), (Some("1"), None), (Some(""), Some("1"))] {
            let outcome = aggregator.fetch_region_summary(genre, region).await;
            assert!(outcome.is_loaded());
            assert!(outcome.value().is_empty());
        }

        assert_eq!(aggregator.source().calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_soft() {
        let aggregator = TimelineAggregator::new(StaticSource {
            fail_music_data: true,
            ..source()
        });

        let outcome = aggregator.fetch_global_summary("1").await;
        assert!(outcome.is_soft_failure());
        assert!(outcome.value().is_empty());
        assert!(matches!(outcome.error(), Some(ClientError::Api { status: 500, .. })));

        let outcome = aggregator.fetch_region_summary(Some("1"), Some("1")).await;
        assert!(outcome.is_soft_failure());
        assert_eq!(*outcome.value(), MusicSummary::default());
    }

    #[tokio::test]
    async fn test_calendar_failure_is_soft() {
        let aggregator = TimelineAggregator::new(StaticSource {
            fail_calendar: true,
            ..source()
        });

        let outcome = aggregator.fetch_global_summary("1").await;
        assert!(outcome.is_soft_failure());
        assert!(matches!(outcome.error(), Some(ClientError::Timeout)));
        assert_eq!(*outcome.value(), MusicSummary::default());

        let outcome = aggregator.fetch_region_summary(Some("1"), Some("1")).await;
        assert!(outcome.is_soft_failure());
        assert_eq!(outcome.into_value(), MusicSummary::default());
    }

    #[tokio::test]
    async fn test_selectors() {
        let aggregator = TimelineAggregator::new(StaticSource {
            genres: vec![Genre {
                id: "1".into(),
                name: "Rock".into(),
                kind: None,
            }],
            ..Default::default()
        });

        let genres = aggregator.genres().await;
        assert!(genres.is_loaded());
        assert_eq!(genres.value().len(), 1);
        assert!(aggregator.regions().await.value().is_empty());
    }
}
