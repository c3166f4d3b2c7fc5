//! # OpenSound
//!
//! Music streaming analytics - fetches aggregated streaming statistics from a
//! data API and an ETL analytics service and reshapes them for a dashboard.
//!
//! ## Features
//!
//! - **Tolerant decoding**: Accepts every known revision of the data API
//! - **Timeline aggregation**: Per-date buckets plus global and regional totals
//! - **Time windows**: Early, peak and decline slices of a timeline
//! - **Fail-soft fetching**: Upstream errors degrade to an empty summary
//! - **Last-result-wins sessions**: Stale responses never overwrite newer ones
//!
//! ## Modules
//!
//! - [`data`]: Upstream records and the decoding boundary
//! - [`timeline`]: Pure aggregation, windowing and stat derivation
//! - [`client`]: HTTP clients for the data API and the ETL service
//! - [`aggregator`]: Concurrent fetch + aggregation
//! - [`session`]: Dashboard selection state and request sequencing
//! - [`export`]: JSON / CSV export
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use opensound::client::{ApiClientConfig, MusicApiClient};
//! use opensound::session::{DashboardSession, Selection};
//! use opensound::timeline::TimeWindow;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MusicApiClient::new(ApiClientConfig::default())?;
//!     let session = DashboardSession::new(client);
//!
//!     let selection = Selection::genre("1").window(TimeWindow::Peak);
//!     if let Some(view) = session.apply(selection).await {
//!         println!("{} buckets, streams now {}", view.timeline.len(), view.stats.total_streams);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod client;
pub mod config;
pub mod data;
pub mod export;
pub mod session;
pub mod timeline;

// Re-export top-level types for convenience
pub use aggregator::TimelineAggregator;

pub use client::{
    ClientError, Dataset, EtlClient, EtlSnapshot, MusicApiClient, MusicDataQuery,
    MusicDataSource, Outcome,
};

pub use data::{normalize_raw_point, CalendarEntry, CalendarLookup, Genre, RawDataPoint, Region};

pub use timeline::{
    apply_time_window, compute_global_summary, compute_region_summary, derive_display_stat,
    resolve_date, MetricField, MusicSummary, SummaryTotals, TimeWindow, TimelineBucket,
};

pub use session::{DashboardSession, DashboardView, Selection};

pub use export::{ExportDocument, ExportError, ExportFormat};

pub use config::{Config, ConfigError, LogFormat, LoggingConfig};
