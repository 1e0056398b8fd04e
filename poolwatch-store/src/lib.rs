//! # poolwatch-store
//!
//! Storage side of the pool telemetry pipeline.
//!
//! - **[`TimeSeriesStore`]**: bounded, timestamp-ordered in-memory buffer of
//!   [`TimeSeriesPoint`]s that mirrors writes to an optional
//!   [`PersistentStore`] and degrades to memory-only when it is unavailable
//! - **[`StateChangeDetector`]**: edge-triggered detection of on/off transitions
//! - **[`AnnotationSink`]**: destinations for the resulting events
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use poolwatch_store::{InMemoryPersistentStore, TimeRange, TimeSeriesStore};
//! use poolwatch_types::{current_timestamp_ms, PointField, TimeSeriesPoint};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = TimeSeriesStore::builder()
//!         .max_points(1440)
//!         .persistent(Arc::new(InMemoryPersistentStore::new()))
//!         .persist_timeout(Duration::from_secs(2))
//!         .build();
//!
//!     store.write(TimeSeriesPoint::at(current_timestamp_ms())).await;
//!
//!     let day = TimeRange::last(Duration::from_secs(86_400), current_timestamp_ms());
//!     let stats = store.statistics(PointField::SaltInstant, day).await;
//!     println!("salt readings in the last day: {}", stats.count);
//! }
//! ```

mod annotation;
mod buffer;
mod detector;
mod persist;
mod stats;
mod store;

pub use annotation::{AnnotationError, AnnotationSink, ChannelSink, LogSink};
pub use buffer::{RetentionBuffer, DEFAULT_MAX_POINTS};
pub use detector::StateChangeDetector;
pub use persist::{InMemoryPersistentStore, PersistenceError, PersistentStore};
pub use stats::{FieldStatistics, TimeRange};
pub use store::{TimeSeriesStore, TimeSeriesStoreBuilder, DEFAULT_PERSIST_TIMEOUT};

// Re-export types for convenience
pub use poolwatch_types::{PointField, StateChangeEvent, TimeSeriesPoint};
