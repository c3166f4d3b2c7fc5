//! Named time windows over a chronological series
//!
//! With `len` items:
//!
//! ```text
//! early    [0, ceil(len/4))
//! peak     [floor(3·len/8), floor(3·len/8) + ceil(len/4))   clipped to len
//! decline  [floor(3·len/4), len)
//! all      [0, len)
//! ```

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::ops::Range;
use std::str::FromStr;

/// Sub-range selector for a timeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    #[default]
    All,
    Early,
    Peak,
    Decline,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 4] = [
        TimeWindow::All,
        TimeWindow::Early,
        TimeWindow::Peak,
        TimeWindow::Decline,
    ];

    /// Parse a window tag; unrecognized tags select the whole series
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "early" => TimeWindow::Early,
            "peak" => TimeWindow::Peak,
            "decline" => TimeWindow::Decline,
            _ => TimeWindow::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::All => "all",
            TimeWindow::Early => "early",
            TimeWindow::Peak => "peak",
            TimeWindow::Decline => "decline",
        }
    }

    /// Index range selected from a series of `len` items
    pub fn bounds(&self, len: usize) -> Range<usize> {
        let quarter = len.div_ceil(4);
        match self {
            TimeWindow::All => 0..len,
            TimeWindow::Early => 0..quarter,
            TimeWindow::Peak => {
                let start = len * 3 / 8;
                start..(start + quarter).min(len)
            }
            TimeWindow::Decline => len * 3 / 4..len,
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Slice `series` to the items covered by `window`
pub fn apply_time_window<T>(series: &[T], window: TimeWindow) -> &[T] {
    &series[window.bounds(series.len())]
}
