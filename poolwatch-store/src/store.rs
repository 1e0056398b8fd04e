//! The time series store facade.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use poolwatch_types::{PointField, TimeSeriesPoint};
use tracing::{debug, warn};

use crate::buffer::{RetentionBuffer, DEFAULT_MAX_POINTS};
use crate::persist::{PersistenceError, PersistentStore};
use crate::{FieldStatistics, TimeRange};

/// Default bound on any single call to the persistent store.
pub const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(2);

/// Dual-sink time series store.
///
/// Every write lands in the in-memory [`RetentionBuffer`] synchronously and
/// is then mirrored to the optional [`PersistentStore`] under a bounded
/// timeout. Reads prefer the persistent store and fall back to the buffer
/// when it is unreachable or has nothing for the range.
///
/// One writer and many readers may share the store through an `Arc`.
///
/// # Example
///
/// ```rust
/// use poolwatch_store::{TimeRange, TimeSeriesStore};
/// use poolwatch_types::{PointField, TimeSeriesPoint};
///
/// # tokio_test_block_on(async {
/// let store = TimeSeriesStore::builder().max_points(60).build();
///
/// let point = TimeSeriesPoint { water_temp: Some(81.5), ..TimeSeriesPoint::at(1_000) };
/// let persisted = store.write(point).await;
/// assert!(!persisted); // no persistent store configured
///
/// let stats = store.statistics(PointField::WaterTemp, TimeRange::all()).await;
/// assert_eq!(stats.latest, Some(81.5));
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug)]
pub struct TimeSeriesStore {
    buffer: RwLock<RetentionBuffer>,
    persistent: Option<Arc<dyn PersistentStore>>,
    persist_timeout: Duration,
}

impl Default for TimeSeriesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSeriesStore {
    /// Memory-only store with the default 1440 point retention.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TimeSeriesStoreBuilder {
        TimeSeriesStoreBuilder::new()
    }

    /// Write a point.
    ///
    /// The in-memory write always happens. Returns whether the mirrored
    /// write to the persistent store succeeded; `false` when none is
    /// configured.
    pub async fn write(&self, point: TimeSeriesPoint) -> bool {
        let evicted = self.buffer.write().insert(point.clone());
        if evicted > 0 {
            debug!(evicted, "retention buffer evicted oldest points");
        }

        let Some(persistent) = &self.persistent else {
            return false;
        };

        let result = match tokio::time::timeout(self.persist_timeout, persistent.store(&point)).await
        {
            Ok(result) => result,
            Err(_) => Err(PersistenceError::Timeout),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    timestamp_ms = point.timestamp_ms,
                    "persistent write failed, keeping point in memory only: {}", e
                );
                false
            }
        }
    }

    /// Points within `range`, timestamp-ascending.
    pub async fn query(&self, range: TimeRange) -> Vec<TimeSeriesPoint> {
        if let Some(mut points) = self.query_persistent(range).await {
            points.sort_by_key(|p| p.timestamp_ms);
            // The database may hold several rows per timestamp; collapse them
            // the same way the buffer does, keeping the last written.
            points.reverse();
            points.dedup_by_key(|p| p.timestamp_ms);
            points.reverse();
            return points;
        }
        self.buffer.read().range(range)
    }

    /// Non-empty persistent result, or `None` to fall back to memory.
    async fn query_persistent(&self, range: TimeRange) -> Option<Vec<TimeSeriesPoint>> {
        let persistent = self.persistent.as_ref()?;

        match tokio::time::timeout(self.persist_timeout, persistent.query(range)).await {
            Ok(Ok(points)) if !points.is_empty() => Some(points),
            Ok(Ok(_)) => {
                debug!(?range, "persistent store returned no points, using memory");
                None
            }
            Ok(Err(e)) => {
                warn!("persistent query failed, using memory: {}", e);
                None
            }
            Err(_) => {
                warn!("persistent query timed out, using memory");
                None
            }
        }
    }

    /// The newest point in memory.
    pub fn latest(&self) -> Option<TimeSeriesPoint> {
        self.buffer.read().latest().cloned()
    }

    /// Aggregates of one field over `range`.
    pub async fn statistics(&self, field: PointField, range: TimeRange) -> FieldStatistics {
        let points = self.query(range).await;
        FieldStatistics::compute(&points, field)
    }

    /// Like [`statistics`](Self::statistics) but addressed by field name.
    ///
    /// Unknown names yield the "no data" shape.
    pub async fn statistics_by_name(&self, field_name: &str, range: TimeRange) -> FieldStatistics {
        match field_name.parse::<PointField>() {
            Ok(field) => self.statistics(field, range).await,
            Err(e) => {
                debug!("{}", e);
                FieldStatistics::no_data()
            }
        }
    }

    /// Number of points currently held in memory.
    pub fn len(&self) -> usize {
        self.buffer.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.read().is_empty()
    }

    pub fn max_points(&self) -> usize {
        self.buffer.read().max_size()
    }

    pub fn has_persistent_store(&self) -> bool {
        self.persistent.is_some()
    }

    /// Drop every in-memory point. The persistent store is untouched.
    pub fn clear(&self) {
        self.buffer.write().clear();
    }
}

/// Builder for [`TimeSeriesStore`].
#[derive(Debug, Default)]
pub struct TimeSeriesStoreBuilder {
    max_points: Option<usize>,
    persistent: Option<Arc<dyn PersistentStore>>,
    persist_timeout: Option<Duration>,
}

impl TimeSeriesStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retention limit of the in-memory buffer (default: 1440).
    pub fn max_points(mut self, max_points: usize) -> Self {
        self.max_points = Some(max_points);
        self
    }

    /// Mirror writes to, and prefer reads from, this store.
    pub fn persistent(mut self, store: Arc<dyn PersistentStore>) -> Self {
        self.persistent = Some(store);
        self
    }

    /// Bound on each persistent store call (default: 2 seconds).
    pub fn persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> TimeSeriesStore {
        TimeSeriesStore {
            buffer: RwLock::new(RetentionBuffer::new(
                self.max_points.unwrap_or(DEFAULT_MAX_POINTS),
            )),
            persistent: self.persistent,
            persist_timeout: self.persist_timeout.unwrap_or(DEFAULT_PERSIST_TIMEOUT),
        }
    }
}
