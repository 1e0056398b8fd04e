//! Snapshot - every metric group from one collection cycle.

use crate::{
    ChlorinatorMetrics, DashboardMetrics, Endpoint, FilterMetrics, HeaterMetrics, LightsMetrics,
    MetricGroup, SchedulesMetrics, SchemaVersion,
};

/// The union of all metric groups collected in one cycle, stamped with one
/// timestamp.
///
/// Snapshots are assembled once by the collector and never mutated
/// afterwards; consumers receive them by shared reference or clone.
///
/// # Example
///
/// ```rust
/// use poolwatch_types::{Endpoint, FilterMetrics, MetricGroup, Snapshot};
///
/// let snapshot = Snapshot::assemble(
///     1_703_160_000_000,
///     vec![
///         MetricGroup::Filter(FilterMetrics { pump_on: Some(true), ..Default::default() }),
///         MetricGroup::failed(Endpoint::Heater, "timed out"),
///     ],
/// );
///
/// assert_eq!(snapshot.filter.pump_on, Some(true));
/// assert_eq!(snapshot.groups_with_errors(), vec![Endpoint::Heater]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Snapshot {
    /// Schema version for forward compatibility.
    pub version: SchemaVersion,

    /// Unix timestamp in milliseconds assigned by the collector.
    pub timestamp_ms: u64,

    pub dashboard: DashboardMetrics,
    pub filter: FilterMetrics,
    pub chlorinator: ChlorinatorMetrics,
    pub heater: HeaterMetrics,
    pub lights: LightsMetrics,
    pub schedules: SchedulesMetrics,
}

impl Snapshot {
    /// Assemble a snapshot from collected groups.
    ///
    /// Groups not present keep their empty shape. If a group appears more
    /// than once the last one wins.
    pub fn assemble(timestamp_ms: u64, groups: impl IntoIterator<Item = MetricGroup>) -> Self {
        let mut snapshot = Snapshot {
            version: SchemaVersion::current(),
            timestamp_ms,
            ..Default::default()
        };

        for group in groups {
            match group {
                MetricGroup::Dashboard(m) => snapshot.dashboard = m,
                MetricGroup::Filter(m) => snapshot.filter = m,
                MetricGroup::Chlorinator(m) => snapshot.chlorinator = m,
                MetricGroup::Heater(m) => snapshot.heater = m,
                MetricGroup::Lights(m) => snapshot.lights = m,
                MetricGroup::Schedules(m) => snapshot.schedules = m,
            }
        }

        snapshot
    }

    /// The error recorded for one group, if its collection failed.
    pub fn error_for(&self, endpoint: Endpoint) -> Option<&str> {
        match endpoint {
            Endpoint::Dashboard => self.dashboard.error.as_deref(),
            Endpoint::Filter => self.filter.error.as_deref(),
            Endpoint::Chlorinator => self.chlorinator.error.as_deref(),
            Endpoint::Heater => self.heater.error.as_deref(),
            Endpoint::Lights => self.lights.error.as_deref(),
            Endpoint::Schedules => self.schedules.error.as_deref(),
        }
    }

    /// Endpoints whose group carries an error, in collection order.
    pub fn groups_with_errors(&self) -> Vec<Endpoint> {
        Endpoint::ALL
            .into_iter()
            .filter(|e| self.error_for(*e).is_some())
            .collect()
    }

    /// Number of groups collected without error.
    pub fn populated_count(&self) -> usize {
        Endpoint::ALL.len() - self.groups_with_errors().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_places_each_group() {
        let snapshot = Snapshot::assemble(
            1_703_160_000_000,
            vec![
                MetricGroup::Dashboard(DashboardMetrics {
                    water_temp: Some(82.0),
                    ..Default::default()
                }),
                MetricGroup::Lights(LightsMetrics {
                    on: Some(false),
                    ..Default::default()
                }),
            ],
        );

        assert_eq!(snapshot.timestamp_ms, 1_703_160_000_000);
        assert_eq!(snapshot.dashboard.water_temp, Some(82.0));
        assert_eq!(snapshot.lights.on, Some(false));
        assert_eq!(snapshot.heater, HeaterMetrics::default());
        assert!(snapshot.version.is_compatible());
    }

    #[test]
    fn partial_failures_are_counted() {
        let groups: Vec<MetricGroup> = Endpoint::ALL
            .into_iter()
            .map(|e| {
                if e == Endpoint::Lights {
                    MetricGroup::failed(e, "connection refused")
                } else {
                    MetricGroup::empty(e)
                }
            })
            .collect();

        let snapshot = Snapshot::assemble(1, groups);
        assert_eq!(snapshot.groups_with_errors(), vec![Endpoint::Lights]);
        assert_eq!(snapshot.error_for(Endpoint::Lights), Some("connection refused"));
        assert_eq!(snapshot.populated_count(), 5);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_with_camel_case_fields() {
        let snapshot = Snapshot::assemble(
            42,
            vec![MetricGroup::Chlorinator(ChlorinatorMetrics {
                salt_instant: Some(3100.0),
                ..Default::default()
            })],
        );

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["timestampMs"], 42);
        assert_eq!(json["chlorinator"]["saltInstant"], 3100.0);
        assert!(json["chlorinator"].get("error").is_none());

        let parsed: Snapshot = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
