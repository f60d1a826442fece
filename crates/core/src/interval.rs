//! Half-open interval algebra for busy-time arithmetic.
//!
//! Every span here is `[start, end)`: the end instant itself is free.
//! Intervals are ephemeral values produced and consumed within a single
//! availability computation; nothing in this module touches storage.

use chrono::{DateTime, Utc};

/// A half-open `[start, end)` span during which a person is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    /// Builds an interval, rejecting degenerate spans where `start >= end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Whole minutes covered by the span, truncating any sub-minute tail.
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_seconds() / 60
    }

    /// Intersects the span with `window`, returning `None` when the two
    /// are disjoint or the intersection is empty.
    pub fn clip(&self, window: &BusyInterval) -> Option<BusyInterval> {
        let start = self.start.max(window.start);
        let end = self.end.min(window.end);
        BusyInterval::new(start, end)
    }
}

/// Merges overlapping or exactly adjacent intervals into a minimal
/// start-ordered, non-overlapping sequence so no busy minute is counted
/// twice.
pub fn merge(mut intervals: Vec<BusyInterval>) -> Vec<BusyInterval> {
    if intervals.len() < 2 {
        return intervals;
    }
    intervals.sort_by_key(|iv| (iv.start, iv.end));

    let mut merged: Vec<BusyInterval> = Vec::with_capacity(intervals.len());
    for iv in intervals {
        match merged.last_mut() {
            // Half-open spans: [9, 10) and [10, 11) touch and coalesce.
            Some(prev) if iv.start <= prev.end => {
                prev.end = prev.end.max(iv.end);
            }
            _ => merged.push(iv),
        }
    }
    merged
}
