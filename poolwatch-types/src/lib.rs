//! # poolwatch-types
//!
//! Core types for pool controller telemetry. This crate defines the data
//! model shared by the collector, the time-series store and any consumer
//! reading collected data.
//!
//! ## Overview
//!
//! - **Metric groups**: one structured record per panel page ([`DashboardMetrics`],
//!   [`FilterMetrics`], [`ChlorinatorMetrics`], [`HeaterMetrics`], [`LightsMetrics`],
//!   [`SchedulesMetrics`]). Every field is nullable; a group that could not be
//!   collected carries an `error` string instead of data.
//! - **[`Snapshot`]**: all groups from one collection cycle under one timestamp.
//! - **[`TimeSeriesPoint`]**: the flattened, fixed-schema scalar view of a snapshot
//!   that gets persisted and queried.
//! - **[`StateChangeEvent`]**: a discrete on/off transition of a monitored field.
//!
//! Null fields mean "unknown", never zero.
//!
//! ## Features
//!
//! - `serde`: serialization of every public type via serde
//!
//! ## Example
//!
//! ```rust
//! use poolwatch_types::{ChlorinatorMetrics, MetricGroup, Snapshot, TimeSeriesPoint};
//!
//! let chlorinator = ChlorinatorMetrics {
//!     salt_instant: Some(3200.0),
//!     ..Default::default()
//! };
//!
//! let snapshot = Snapshot::assemble(1_703_160_000_000, vec![MetricGroup::Chlorinator(chlorinator)]);
//! let point = TimeSeriesPoint::from_snapshot(&snapshot);
//!
//! assert_eq!(point.salt_instant, Some(3200.0));
//! assert_eq!(point.water_temp, None);
//! ```

mod credentials;
mod endpoint;
mod event;
mod groups;
mod point;
mod snapshot;
mod version;

pub use credentials::*;
pub use endpoint::*;
pub use event::*;
pub use groups::*;
pub use point::*;
pub use snapshot::*;
pub use version::*;

/// Current schema version.
///
/// Increment this when making breaking changes to the point or snapshot format.
pub const SCHEMA_VERSION: u32 = 1;

/// Get current timestamp in milliseconds since Unix epoch.
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
