//! Persistent time series database seam.

use async_trait::async_trait;
use parking_lot::Mutex;
use poolwatch_types::TimeSeriesPoint;
use thiserror::Error;

use crate::TimeRange;

/// Errors from the external time series database.
///
/// All of these degrade the store to memory-only for the failed call.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The store could not be reached.
    #[error("persistent store unavailable: {0}")]
    Unavailable(String),

    /// The store did not answer within the configured bound.
    #[error("persistent store timed out")]
    Timeout,

    /// The store answered with data that could not be decoded.
    #[error("persistent store returned invalid data: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Corrupt(err.to_string())
    }
}

/// A durable time series database keyed by timestamp.
///
/// Implementations are best-effort collaborators: callers bound every call
/// with a timeout and never let a failure reach the collection path.
#[async_trait]
pub trait PersistentStore: Send + Sync + std::fmt::Debug {
    /// Store one point.
    async fn store(&self, point: &TimeSeriesPoint) -> Result<(), PersistenceError>;

    /// Points within `range`. Ordering is not required.
    async fn query(&self, range: TimeRange) -> Result<Vec<TimeSeriesPoint>, PersistenceError>;
}

/// Unbounded in-process [`PersistentStore`], useful as a stand-in database.
///
/// `set_available(false)` makes every call fail with
/// [`PersistenceError::Unavailable`].
#[derive(Debug)]
pub struct InMemoryPersistentStore {
    points: Mutex<Vec<TimeSeriesPoint>>,
    available: Mutex<bool>,
}

impl Default for InMemoryPersistentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPersistentStore {
    pub fn new() -> Self {
        Self {
            points: Mutex::new(Vec::new()),
            available: Mutex::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        *self.available.lock() = available;
    }

    /// Number of stored points, duplicates included.
    pub fn len(&self) -> usize {
        self.points.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.lock().is_empty()
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if *self.available.lock() {
            Ok(())
        } else {
            Err(PersistenceError::Unavailable("store offline".to_string()))
        }
    }
}

#[async_trait]
impl PersistentStore for InMemoryPersistentStore {
    async fn store(&self, point: &TimeSeriesPoint) -> Result<(), PersistenceError> {
        self.check()?;
        self.points.lock().push(point.clone());
        Ok(())
    }

    async fn query(&self, range: TimeRange) -> Result<Vec<TimeSeriesPoint>, PersistenceError> {
        self.check()?;
        Ok(self
            .points
            .lock()
            .iter()
            .filter(|p| range.contains(p.timestamp_ms))
            .cloned()
            .collect())
    }
}
