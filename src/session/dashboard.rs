//! Selection state and derived dashboard views

use serde::Serialize;
use tokio::sync::RwLock;

use super::sequencer::RequestSequencer;
use crate::aggregator::TimelineAggregator;
use crate::client::{MusicDataSource, Outcome};
use crate::data::Genre;
use crate::export::ExportDocument;
use crate::timeline::{
    apply_time_window, display_stats, ChartSeries, MusicSummary, SummaryTotals, TimeWindow,
    TimelineBucket,
};

/// Region selector value meaning "no region"
pub const GLOBAL_REGION: &str = "global";

/// What the user has picked in the selectors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub genre: Option<String>,
    pub region: Option<String>,
    pub window: TimeWindow,
}

impl Selection {
    pub fn genre(genre_id: impl Into<String>) -> Self {
        Self {
            genre: Some(genre_id.into()),
            ..Default::default()
        }
    }

    /// Builder method: narrow to a region; `"global"` or empty clears it
    pub fn region(mut self, region_id: impl Into<String>) -> Self {
        let region_id = region_id.into();
        self.region = if region_id.is_empty() || region_id == GLOBAL_REGION {
            None
        } else {
            Some(region_id)
        };
        self
    }

    /// Builder method: set the time window
    pub fn window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    pub fn is_global(&self) -> bool {
        self.region.is_none()
    }
}

/// Everything the dashboard renders for the current selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub selection: Selection,
    /// Totals as computed by the summary
    pub totals: SummaryTotals,
    /// Timeline restricted to the selected window
    pub timeline: Vec<TimelineBucket>,
    /// Stat card values: last non-zero reading per metric in the window
    pub stats: SummaryTotals,
    pub chart: ChartSeries,
    /// Non-blocking message when the summary is a fail-soft fallback
    pub notice: Option<String>,
}

#[derive(Debug, Default)]
struct SessionState {
    /// Most recently requested selection, possibly still in flight
    selection: Selection,
    loaded: Option<LoadedSummary>,
}

/// A committed summary together with the selection it was fetched for
#[derive(Debug)]
struct LoadedSummary {
    selection: Selection,
    summary: MusicSummary,
    notice: Option<String>,
}

impl LoadedSummary {
    fn windowed(&self) -> &[TimelineBucket] {
        apply_time_window(&self.summary.timeline, self.selection.window)
    }
}

impl SessionState {
    fn view(&self) -> Option<DashboardView> {
        let loaded = self.loaded.as_ref()?;
        let windowed = loaded.windowed();

        Some(DashboardView {
            selection: loaded.selection.clone(),
            totals: loaded.summary.totals,
            timeline: windowed.to_vec(),
            stats: display_stats(windowed),
            chart: ChartSeries::from_timeline(windowed),
            notice: loaded.notice.clone(),
        })
    }
}

/// One user's dashboard over a data source
pub struct DashboardSession<S> {
    aggregator: TimelineAggregator<S>,
    sequencer: RequestSequencer,
    state: RwLock<SessionState>,
}

impl<S: MusicDataSource> DashboardSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            aggregator: TimelineAggregator::new(source),
            sequencer: RequestSequencer::new(),
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn aggregator(&self) -> &TimelineAggregator<S> {
        &self.aggregator
    }

    pub async fn selection(&self) -> Selection {
        self.state.read().await.selection.clone()
    }

    /// View of the last committed summary
    ///
    /// While a newer selection is in flight this still describes the
    /// previous one; the view's `selection` always matches its data.
    pub async fn view(&self) -> Option<DashboardView> {
        self.state.read().await.view()
    }

    /// Load genres and pre-select the first one when nothing is selected
    pub async fn load_genres(&self) -> Outcome<Vec<Genre>> {
        let outcome = self.aggregator.genres().await;

        if let Some(first) = outcome.value().first() {
            let mut state = self.state.write().await;
            if state.selection.genre.is_none() {
                tracing::debug!(genre = %first.id, "Selecting first genre");
                state.selection.genre = Some(first.id.clone());
            }
        }

        outcome
    }

    /// Switch to `selection` and load its summary
    ///
    /// Returns `None` without fetching when no genre is selected, and `None`
    /// when a newer selection was applied while this one was in flight. In
    /// the latter case the result is dropped so it cannot overwrite the
    /// newer one.
    pub async fn apply(&self, selection: Selection) -> Option<DashboardView> {
        let ticket = {
            let mut state = self.state.write().await;
            state.selection = selection.clone();
            self.sequencer.begin()
        };

        let genre = selection.genre.as_deref()?;

        let outcome = match selection.region.as_deref() {
            Some(region) => {
                self.aggregator
                    .fetch_region_summary(Some(genre), Some(region))
                    .await
            }
            None => self.aggregator.fetch_global_summary(genre).await,
        };

        let mut state = self.state.write().await;
        if !self.sequencer.is_current(ticket) {
            tracing::debug!(
                ticket = ticket.id(),
                latest = self.sequencer.latest(),
                "Discarding stale summary"
            );
            return None;
        }

        let scope = if selection.is_global() { "global" } else { "region" };
        let (summary, error) = outcome.into_parts();
        state.loaded = Some(LoadedSummary {
            // Window changes made while in flight are kept
            selection: state.selection.clone(),
            summary,
            notice: error.map(|e| format!("Could not load {} data: {}", scope, e)),
        });

        state.view()
    }

    /// Re-apply the current selection
    pub async fn refresh(&self) -> Option<DashboardView> {
        let selection = self.selection().await;
        self.apply(selection).await
    }

    /// Change the time window; the loaded summary is re-sliced, not refetched
    pub async fn set_window(&self, window: TimeWindow) -> Option<DashboardView> {
        let mut state = self.state.write().await;
        state.selection.window = window;
        if let Some(loaded) = state.loaded.as_mut() {
            loaded.selection.window = window;
        }
        state.view()
    }

    /// Export of the committed data, `None` until a genre's summary is loaded
    pub async fn export(&self) -> Option<ExportDocument> {
        let state = self.state.read().await;
        let loaded = state.loaded.as_ref()?;
        let genre = loaded.selection.genre.as_deref()?;

        Some(ExportDocument::new(
            genre,
            loaded.selection.region.as_deref(),
            loaded.selection.window,
            display_stats(loaded.windowed()),
            &loaded.summary.timeline,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::testing::StaticSource;
    use crate::data::{CalendarEntry, RawDataPoint};
    use std::collections::HashMap;
    use std::time::Duration;

    fn source() -> StaticSource {
        let calendar: Vec<CalendarEntry> = (0..8)
            .map(|day| CalendarEntry::new(day, format!("2024-01-0{}", day + 1)))
            .collect();

        let mut points: Vec<RawDataPoint> = (0..8)
            .map(|day| RawDataPoint::new(1, 1, day).streams((day + 1) as f64))
            .collect();
        points.push(RawDataPoint::new(2, 1, 0).streams(1000.0));
        points.push(RawDataPoint::new(2, 3, 1).streams(50.0));

        StaticSource {
            genres: vec![
                Genre {
                    id: "1".into(),
                    name: "Rock".into(),
                    kind: None,
                },
                Genre {
                    id: "2".into(),
                    name: "Jazz".into(),
                    kind: None,
                },
            ],
            points,
            calendar,
            ..Default::default()
        }
    }

    #[test]
    fn test_selection_region_global() {
        assert!(Selection::genre("1").region(GLOBAL_REGION).is_global());
        assert!(Selection::genre("1").region("").is_global());
        assert_eq!(Selection::genre("1").region("4").region.as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn test_apply_global() {
        let session = DashboardSession::new(source());

        let view = session.apply(Selection::genre("1")).await.unwrap();

        assert_eq!(view.timeline.len(), 8);
        assert_eq!(view.totals.total_streams, 36.0);
        assert_eq!(view.stats.total_streams, 8.0);
        assert_eq!(view.chart.labels.len(), 8);
        assert!(view.notice.is_none());
    }

    #[tokio::test]
    async fn test_apply_without_genre_fetches_nothing() {
        let session = DashboardSession::new(source());

        assert!(session.apply(Selection::default()).await.is_none());
        assert_eq!(session.aggregator().source().calls(), 0);
    }

    #[tokio::test]
    async fn test_window_change_does_not_refetch() {
        let session = DashboardSession::new(source());
        session.apply(Selection::genre("1")).await.unwrap();

        let view = session.set_window(TimeWindow::Early).await.unwrap();

        // 8 buckets: early = first 2
        assert_eq!(view.timeline.len(), 2);
        assert_eq!(view.stats.total_streams, 2.0);
        assert_eq!(view.totals.total_streams, 36.0);
        assert_eq!(view.selection.window, TimeWindow::Early);
        assert_eq!(session.aggregator().source().calls(), 1);

        let view = session.set_window(TimeWindow::Decline).await.unwrap();
        assert_eq!(view.timeline.first().unwrap().date_value, "2024-01-07");
    }

    #[tokio::test]
    async fn test_region_selection_uses_region_summary() {
        let session = DashboardSession::new(source());

        let view = session
            .apply(Selection::genre("2").region("3"))
            .await
            .unwrap();

        assert_eq!(view.totals.total_streams, 50.0);
        assert_eq!(view.timeline.len(), 1);
    }

    #[tokio::test]
    async fn test_soft_failure_sets_notice() {
        let session = DashboardSession::new(StaticSource {
            fail_music_data: true,
            ..source()
        });

        let view = session.apply(Selection::genre("1")).await.unwrap();

        assert!(view.timeline.is_empty());
        assert_eq!(view.totals, SummaryTotals::default());
        assert!(view.notice.unwrap().starts_with("Could not load global data"));
    }

    #[tokio::test]
    async fn test_last_result_wins() {
        let mut delays = HashMap::new();
        delays.insert("1".to_string(), Duration::from_millis(150));
        let session = DashboardSession::new(StaticSource {
            delays,
            ..source()
        });

        // Genre 1 is slow and issued first, genre 2 is fast and issued second
        let (slow, fast) = tokio::join!(
            session.apply(Selection::genre("1").region("1")),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                session.apply(Selection::genre("2").region("1")).await
            }
        );

        assert!(slow.is_none());
        let fast = fast.unwrap();
        assert_eq!(fast.totals.total_streams, 1000.0);

        let current = session.view().await.unwrap();
        assert_eq!(current.selection.genre.as_deref(), Some("2"));
        assert_eq!(current.totals.total_streams, 1000.0);
    }

    #[tokio::test]
    async fn test_in_flight_selection_does_not_relabel_committed_data() {
        let mut delays = HashMap::new();
        delays.insert("2".to_string(), Duration::from_millis(200));
        let session = DashboardSession::new(StaticSource {
            delays,
            ..source()
        });

        let committed = session
            .apply(Selection::genre("1").region("1"))
            .await
            .unwrap();
        assert_eq!(committed.totals.total_streams, 8.0);

        let (fresh, (view, export)) = tokio::join!(
            session.apply(Selection::genre("2").region("1")),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                (session.view().await, session.export().await)
            }
        );

        // Requested, but not yet loaded
        assert_eq!(session.selection().await.genre.as_deref(), Some("2"));

        let view = view.unwrap();
        assert_eq!(view.selection.genre.as_deref(), Some("1"));
        assert_eq!(view.totals.total_streams, 8.0);

        let export = export.unwrap();
        assert_eq!(export.genre_id, "1");
        assert_eq!(export.region, "1");
        assert_eq!(export.statistics.total_streams, 8.0);

        let fresh = fresh.unwrap();
        assert_eq!(fresh.selection.genre.as_deref(), Some("2"));
        assert_eq!(fresh.totals.total_streams, 1000.0);
        assert_eq!(session.export().await.unwrap().genre_id, "2");
    }

    #[tokio::test]
    async fn test_window_change_in_flight_is_kept() {
        let mut delays = HashMap::new();
        delays.insert("1".to_string(), Duration::from_millis(100));
        let session = DashboardSession::new(StaticSource {
            delays,
            ..source()
        });

        let (view, _) = tokio::join!(session.apply(Selection::genre("1").region("1")), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            session.set_window(TimeWindow::Early).await
        });

        let view = view.unwrap();
        assert_eq!(view.selection.window, TimeWindow::Early);
        assert_eq!(view.timeline.len(), 2);
    }

    #[tokio::test]
    async fn test_load_genres_selects_first() {
        let session = DashboardSession::new(source());

        let genres = session.load_genres().await;
        assert_eq!(genres.value().len(), 2);
        assert_eq!(session.selection().await.genre.as_deref(), Some("1"));

        // An explicit choice is kept
        session.apply(Selection::genre("2")).await;
        session.load_genres().await;
        assert_eq!(session.selection().await.genre.as_deref(), Some("2"));

        let view = session.refresh().await.unwrap();
        assert_eq!(view.totals.total_streams, 1050.0);
    }

    #[tokio::test]
    async fn test_export_requires_loaded_summary() {
        let session = DashboardSession::new(source());
        assert!(session.export().await.is_none());

        session
            .apply(Selection::genre("1").window(TimeWindow::Early))
            .await
            .unwrap();

        let export = session.export().await.unwrap();
        assert_eq!(export.genre_id, "1");
        assert_eq!(export.region, "global");
        assert_eq!(export.timeframe, TimeWindow::Early);
        // Statistics follow the window, the exported timeline does not
        assert_eq!(export.statistics.total_streams, 2.0);
        assert_eq!(export.timeline.len(), 8);
    }
}
