//! Bounded, timestamp-ordered retention buffer.

use std::collections::BTreeMap;

use poolwatch_types::TimeSeriesPoint;

use crate::TimeRange;

/// Default capacity: one point per minute for 24 hours.
pub const DEFAULT_MAX_POINTS: usize = 1440;

/// Ordered-by-timestamp sequence of points with a hard size limit.
///
/// Writing a point whose timestamp is already present replaces the stored
/// point. When the buffer grows past `max_size` the oldest timestamps are
/// evicted, regardless of how recently they were read.
#[derive(Debug, Clone)]
pub struct RetentionBuffer {
    max_size: usize,
    points: BTreeMap<u64, TimeSeriesPoint>,
}

impl Default for RetentionBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POINTS)
    }
}

impl RetentionBuffer {
    /// Create an empty buffer holding at most `max_size` points (minimum 1).
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
            points: BTreeMap::new(),
        }
    }

    /// Insert a point, collapsing duplicates and evicting the oldest
    /// entries beyond the limit.
    ///
    /// Returns the number of evicted points.
    pub fn insert(&mut self, point: TimeSeriesPoint) -> usize {
        self.points.insert(point.timestamp_ms, point);

        let mut evicted = 0;
        while self.points.len() > self.max_size {
            self.points.pop_first();
            evicted += 1;
        }
        evicted
    }

    /// Points within `range` (inclusive), timestamp-ascending.
    pub fn range(&self, range: TimeRange) -> Vec<TimeSeriesPoint> {
        if range.is_empty() {
            return Vec::new();
        }
        self.points
            .range(range.start_ms..=range.end_ms)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn latest(&self) -> Option<&TimeSeriesPoint> {
        self.points.last_key_value().map(|(_, p)| p)
    }

    pub fn oldest(&self) -> Option<&TimeSeriesPoint> {
        self.points.first_key_value().map(|(_, p)| p)
    }

    /// Iterate over all points, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TimeSeriesPoint> {
        self.points.values()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
