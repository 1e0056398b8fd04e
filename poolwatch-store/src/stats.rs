//! Time ranges and aggregate statistics over stored points.

use std::time::Duration;

use poolwatch_types::{PointField, TimeSeriesPoint};
use serde::{Deserialize, Serialize};

/// Inclusive range of Unix millisecond timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl TimeRange {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Every representable timestamp.
    pub fn all() -> Self {
        Self::new(0, u64::MAX)
    }

    /// Points younger than `window` as of `now_ms`.
    ///
    /// A point exactly `window` old is excluded, so hourly points queried
    /// with a 5 hour window yield five points.
    pub fn last(window: Duration, now_ms: u64) -> Self {
        let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        let start_ms = now_ms.saturating_sub(window_ms).saturating_add(1);
        Self::new(start_ms.min(now_ms), now_ms)
    }

    pub fn contains(&self, timestamp_ms: u64) -> bool {
        self.start_ms <= timestamp_ms && timestamp_ms <= self.end_ms
    }

    pub fn is_empty(&self) -> bool {
        self.start_ms > self.end_ms
    }
}

/// Aggregates over the non-null values of one field.
///
/// An empty filtered set yields the "no data" shape: `count == 0` and every
/// aggregate `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldStatistics {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    /// Value of the newest point that has one.
    pub latest: Option<f64>,
}

impl FieldStatistics {
    pub fn no_data() -> Self {
        Self::default()
    }

    pub fn has_data(&self) -> bool {
        self.count > 0
    }

    /// Compute over `points`, which must be timestamp-ascending.
    pub fn compute(points: &[TimeSeriesPoint], field: PointField) -> Self {
        let values: Vec<f64> = points.iter().filter_map(|p| p.value(field)).collect();

        let Some(&latest) = values.last() else {
            return Self::no_data();
        };

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = values.iter().sum::<f64>() / values.len() as f64;

        Self {
            count: values.len(),
            min: Some(min),
            max: Some(max),
            avg: Some(avg),
            latest: Some(latest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water(ts: u64, temp: Option<f64>) -> TimeSeriesPoint {
        TimeSeriesPoint {
            water_temp: temp,
            ..TimeSeriesPoint::at(ts)
        }
    }

    #[test]
    fn last_window_excludes_boundary() {
        let range = TimeRange::last(Duration::from_millis(100), 1_000);
        assert_eq!(range, TimeRange::new(901, 1_000));
        assert!(!range.contains(900));
        assert!(range.contains(1_000));
    }

    #[test]
    fn last_window_saturates_near_epoch() {
        let range = TimeRange::last(Duration::from_secs(3600), 10);
        assert_eq!(range.start_ms, 1);
        assert_eq!(range.end_ms, 10);

        let zero = TimeRange::last(Duration::ZERO, 10);
        assert_eq!(zero, TimeRange::new(10, 10));
    }

    #[test]
    fn statistics_skip_null_values() {
        let points = vec![
            water(1, Some(80.0)),
            water(2, None),
            water(3, Some(84.0)),
            water(4, None),
        ];

        let stats = FieldStatistics::compute(&points, PointField::WaterTemp);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.min, Some(80.0));
        assert_eq!(stats.max, Some(84.0));
        assert_eq!(stats.avg, Some(82.0));
        assert_eq!(stats.latest, Some(84.0));
    }

    #[test]
    fn statistics_without_values_is_no_data() {
        let points = vec![water(1, None)];
        let stats = FieldStatistics::compute(&points, PointField::WaterTemp);
        assert_eq!(stats, FieldStatistics::no_data());
        assert!(!stats.has_data());

        assert!(!FieldStatistics::compute(&[], PointField::AirTemp).has_data());
    }

    #[test]
    fn boolean_fields_average_as_duty_cycle() {
        let points: Vec<TimeSeriesPoint> = [true, true, false, true]
            .iter()
            .enumerate()
            .map(|(i, on)| TimeSeriesPoint {
                filter_on: Some(*on),
                ..TimeSeriesPoint::at(i as u64)
            })
            .collect();

        let stats = FieldStatistics::compute(&points, PointField::FilterOn);
        assert_eq!(stats.avg, Some(0.75));
        assert_eq!(stats.latest, Some(1.0));
    }
}
