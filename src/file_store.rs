//! JSON-lines persistent store.
//!
//! Appends one versioned [`TimeSeriesPoint`] per line. Range queries scan
//! the whole file, so the file is compacted down to the newest
//! `max_lines` points once it grows to twice that.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use poolwatch_store::{PersistenceError, PersistentStore, TimeRange};
use poolwatch_types::{SchemaVersion, TimeSeriesPoint};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Serialize, Deserialize)]
struct Line {
    v: SchemaVersion,
    #[serde(flatten)]
    point: TimeSeriesPoint,
}

#[derive(Debug, Default)]
struct Parsed {
    points: Vec<TimeSeriesPoint>,
    unreadable: usize,
    incompatible: usize,
}

fn parse(content: &str) -> Parsed {
    let mut parsed = Parsed::default();
    for raw in content.lines().filter(|l| !l.trim().is_empty()) {
        match serde_json::from_str::<Line>(raw) {
            Ok(line) if line.v.is_compatible() => parsed.points.push(line.point),
            Ok(_) => parsed.incompatible += 1,
            Err(_) => parsed.unreadable += 1,
        }
    }
    parsed
}

#[derive(Debug)]
pub struct JsonlStore {
    path: PathBuf,
    max_lines: Option<usize>,
    /// Lines in the file, counted on first write. Held across appends so
    /// lines never interleave.
    lines: Mutex<Option<usize>>,
}

impl JsonlStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_lines: None,
            lines: Mutex::new(None),
        }
    }

    /// Keep roughly the newest `max_lines` points on disk.
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = Some(max_lines.max(1));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Option<String>, PersistenceError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrite the file with the newest `keep` readable points.
    async fn compact(&self, keep: usize) -> Result<usize, PersistenceError> {
        let content = self.read().await?.unwrap_or_default();
        let mut points = parse(&content).points;
        points.sort_by_key(|p| p.timestamp_ms);
        let start = points.len().saturating_sub(keep);

        let mut out = String::new();
        for point in points.drain(start..) {
            out.push_str(&serde_json::to_string(&Line {
                v: SchemaVersion::current(),
                point,
            })?);
            out.push('\n');
        }
        let kept = out.lines().count();

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        tokio::fs::write(&tmp, out).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), kept, "Compacted point log");
        Ok(kept)
    }
}

#[async_trait]
impl PersistentStore for JsonlStore {
    async fn store(&self, point: &TimeSeriesPoint) -> Result<(), PersistenceError> {
        let mut line = serde_json::to_string(&Line {
            v: SchemaVersion::current(),
            point: point.clone(),
        })?;
        line.push('\n');

        let mut lines = self.lines.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let count = match *lines {
            Some(count) => count,
            None => self.read().await?.map_or(0, |c| c.lines().count()),
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        drop(file);

        let mut count = count + 1;
        if let Some(max) = self.max_lines {
            if count >= max * 2 {
                count = self.compact(max).await?;
            }
        }
        *lines = Some(count);
        Ok(())
    }

    async fn query(&self, range: TimeRange) -> Result<Vec<TimeSeriesPoint>, PersistenceError> {
        let Some(content) = self.read().await? else {
            return Ok(Vec::new());
        };

        let parsed = parse(&content);
        if parsed.unreadable > 0 || parsed.incompatible > 0 {
            warn!(
                path = %self.path.display(),
                unreadable = parsed.unreadable,
                incompatible = parsed.incompatible,
                "Skipped lines in point log"
            );
        }
        Ok(parsed
            .points
            .into_iter()
            .filter(|p| range.contains(p.timestamp_ms))
            .collect())
    }
}
