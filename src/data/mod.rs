//! Upstream Data Model
//!
//! Canonical records decoded from the primary data API:
//!
//! - **types**: RawDataPoint, CalendarEntry, CalendarLookup, Genre, Region
//! - **normalize**: The single decoding boundary for tolerant response shapes
//!
//! Every upstream payload passes through [`normalize`] before it reaches the
//! aggregation code, so the rest of the crate only sees canonical records.

pub mod normalize;
pub mod types;

pub use normalize::{
    normalize_calendar_entry, normalize_genre, normalize_raw_point, normalize_region, Collection,
};
pub use types::{CalendarEntry, CalendarLookup, FilterId, Genre, RawDataPoint, Region};
