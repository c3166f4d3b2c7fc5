//! Timeline Aggregation
//!
//! Pure reshaping of already-fetched data:
//!
//! - **summary**: Group points by resolved date and reduce them to totals
//! - **window**: Slice a chronological series into named sub-ranges
//! - **stats**: Pick the current value shown on stat cards
//! - **chart**: Labels and value vectors for a line chart
//!
//! # Pipeline
//!
//! ```text
//! RawDataPoint[] + CalendarLookup → filter → { totals, timeline[] }
//!                                              │
//!                                   window → display stats / chart series
//! ```

pub mod chart;
pub mod stats;
pub mod summary;
pub mod window;

pub use chart::{ChartDataset, ChartSeries};
pub use stats::{derive_display_stat, display_stats, last_non_zero};
pub use summary::{
    compute_global_summary, compute_region_summary, resolve_date, MetricField, MusicSummary,
    Reduction, SummaryTotals, TimelineBucket, TotalsPolicy,
};
pub use window::{apply_time_window, TimeWindow};
