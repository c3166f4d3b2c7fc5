//! Date-bucketed summaries
//!
//! Two summary flavours exist and they reduce totals differently:
//!
//! | Field            | Global | Region |
//! |------------------|--------|--------|
//! | `total_streams`  | sum    | max    |
//! | `total_artists`  | sum    | max    |
//! | `avg_popularity` | sum    | sum    |
//! | `new_releases`   | sum    | sum    |
//!
//! Timeline buckets are always sums per date, in the order dates are first
//! seen among the filtered points.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::data::{CalendarLookup, FilterId, RawDataPoint};

/// The four metrics carried by every point and bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    TotalStreams,
    TotalArtists,
    AvgPopularity,
    NewReleases,
}

impl MetricField {
    pub const ALL: [MetricField; 4] = [
        MetricField::TotalStreams,
        MetricField::TotalArtists,
        MetricField::AvgPopularity,
        MetricField::NewReleases,
    ];

    /// Field name as it appears on a timeline bucket
    pub fn key(&self) -> &'static str {
        match self {
            MetricField::TotalStreams => "totalStreams",
            MetricField::TotalArtists => "totalArtists",
            MetricField::AvgPopularity => "avgPopularity",
            MetricField::NewReleases => "newReleases",
        }
    }

    /// Human-readable label for charts and tables
    pub fn label(&self) -> &'static str {
        match self {
            MetricField::TotalStreams => "Total streams",
            MetricField::TotalArtists => "Active artists",
            MetricField::AvgPopularity => "Popularity score",
            MetricField::NewReleases => "New releases",
        }
    }

    /// Look a field up by bucket key or snake_case name
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.key() == key || field.to_string() == key)
    }

    pub fn of_point(&self, point: &RawDataPoint) -> f64 {
        match self {
            MetricField::TotalStreams => point.total_streams,
            MetricField::TotalArtists => point.total_artists,
            MetricField::AvgPopularity => point.avg_popularity,
            MetricField::NewReleases => point.new_releases,
        }
    }

    pub fn of_bucket(&self, bucket: &TimelineBucket) -> f64 {
        match self {
            MetricField::TotalStreams => bucket.total_streams,
            MetricField::TotalArtists => bucket.total_artists,
            MetricField::AvgPopularity => bucket.avg_popularity,
            MetricField::NewReleases => bucket.new_releases,
        }
    }
}

impl std::fmt::Display for MetricField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricField::TotalStreams => write!(f, "total_streams"),
            MetricField::TotalArtists => write!(f, "total_artists"),
            MetricField::AvgPopularity => write!(f, "avg_popularity"),
            MetricField::NewReleases => write!(f, "new_releases"),
        }
    }
}

/// Metrics summed over all filtered points sharing one date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineBucket {
    pub date_value: String,
    pub total_streams: f64,
    pub total_artists: f64,
    pub avg_popularity: f64,
    pub new_releases: f64,
    /// Calendar id of the last point folded into this bucket
    pub id_calendar: i64,
}

impl TimelineBucket {
    fn empty(date_value: &str, id_calendar: i64) -> Self {
        Self {
            date_value: date_value.to_string(),
            id_calendar,
            ..Default::default()
        }
    }

    fn add(&mut self, point: &RawDataPoint) {
        self.total_streams += point.total_streams;
        self.total_artists += point.total_artists;
        self.avg_popularity += point.avg_popularity;
        self.new_releases += point.new_releases;
        self.id_calendar = point.id_calendar;
    }
}

/// Scalar rollup over a filtered set of points
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTotals {
    pub total_streams: f64,
    pub total_artists: f64,
    pub avg_popularity: f64,
    pub new_releases: f64,
}

impl SummaryTotals {
    /// Build totals by evaluating `f` once per metric
    pub fn from_fn(mut f: impl FnMut(MetricField) -> f64) -> Self {
        Self {
            total_streams: f(MetricField::TotalStreams),
            total_artists: f(MetricField::TotalArtists),
            avg_popularity: f(MetricField::AvgPopularity),
            new_releases: f(MetricField::NewReleases),
        }
    }

    pub fn get(&self, field: MetricField) -> f64 {
        match field {
            MetricField::TotalStreams => self.total_streams,
            MetricField::TotalArtists => self.total_artists,
            MetricField::AvgPopularity => self.avg_popularity,
            MetricField::NewReleases => self.new_releases,
        }
    }

    /// Reduce points field by field according to `policy`
    pub fn reduce(points: &[&RawDataPoint], policy: TotalsPolicy) -> Self {
        Self::from_fn(|field| {
            policy
                .reduction(field)
                .fold(points.iter().map(|p| field.of_point(p)))
        })
    }
}

/// `{ totals, timeline }` as handed to the dashboard
///
/// Serializes flat: the four totals sit next to `timeline`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicSummary {
    #[serde(flatten)]
    pub totals: SummaryTotals,
    pub timeline: Vec<TimelineBucket>,
}

impl MusicSummary {
    /// True for the all-zero state with no timeline
    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty() && self.totals == SummaryTotals::default()
    }
}

/// How a single metric is folded into a total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
    /// Largest single value, never below zero
    Max,
}

impl Reduction {
    pub fn fold(self, values: impl Iterator<Item = f64>) -> f64 {
        match self {
            Reduction::Sum => values.fold(0.0, |acc, v| acc + v),
            Reduction::Max => values.fold(0.0, f64::max),
        }
    }
}

/// Which summary flavour is being computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalsPolicy {
    Global,
    Region,
}

impl TotalsPolicy {
    pub fn reduction(self, field: MetricField) -> Reduction {
        match (self, field) {
            (TotalsPolicy::Region, MetricField::TotalStreams | MetricField::TotalArtists) => {
                Reduction::Max
            }
            _ => Reduction::Sum,
        }
    }
}

/// Date string for a point, empty when its calendar id is unknown
pub fn resolve_date<'a>(point: &RawDataPoint, calendar: &'a CalendarLookup) -> &'a str {
    calendar.get(point.id_calendar).unwrap_or("")
}

/// Summary of one genre across every region
pub fn compute_global_summary(
    genre_id: &str,
    points: &[RawDataPoint],
    calendar: &CalendarLookup,
) -> MusicSummary {
    let genre = FilterId::parse(genre_id);
    let filtered: Vec<&RawDataPoint> = points
        .iter()
        .filter(|p| genre.matches(p.id_genre))
        .collect();

    summarize(&filtered, calendar, TotalsPolicy::Global)
}

/// Summary of one genre within one region
pub fn compute_region_summary(
    genre_id: &str,
    region_id: &str,
    points: &[RawDataPoint],
    calendar: &CalendarLookup,
) -> MusicSummary {
    let genre = FilterId::parse(genre_id);
    let region = FilterId::parse(region_id);
    let filtered: Vec<&RawDataPoint> = points
        .iter()
        .filter(|p| genre.matches(p.id_genre) && region.matches(p.id_region))
        .collect();

    summarize(&filtered, calendar, TotalsPolicy::Region)
}

fn summarize(
    filtered: &[&RawDataPoint],
    calendar: &CalendarLookup,
    policy: TotalsPolicy,
) -> MusicSummary {
    let totals = SummaryTotals::reduce(filtered, policy);
    let timeline = build_timeline(filtered, calendar);

    tracing::debug!(
        points = filtered.len(),
        buckets = timeline.len(),
        policy = ?policy,
        "Summarized music data"
    );

    MusicSummary { totals, timeline }
}

/// Group points by resolved date, keeping first-seen order
fn build_timeline(points: &[&RawDataPoint], calendar: &CalendarLookup) -> Vec<TimelineBucket> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<TimelineBucket> = Vec::new();
    let mut unresolved = 0usize;

    for point in points {
        let date = resolve_date(point, calendar);
        if date.is_empty() {
            unresolved += 1;
            continue;
        }

        let slot = *index.entry(date).or_insert_with(|| {
            buckets.push(TimelineBucket::empty(date, point.id_calendar));
            buckets.len() - 1
        });
        buckets[slot].add(point);
    }

    if unresolved > 0 {
        tracing::debug!(unresolved, "Points without a calendar date left out of timeline");
    }

    buckets
}
