//! Collection cycle orchestration.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::Mutex;
use poolwatch_store::{AnnotationSink, StateChangeDetector, TimeSeriesStore};
use poolwatch_types::{
    current_timestamp_ms, Endpoint, MetricGroup, Snapshot, StateChangeEvent, TimeSeriesPoint,
};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{CollectError, FetchError};
use crate::extract::extract;
use crate::retry::{with_retry, RetryPolicy};
use crate::session::{RawDocument, Session};

/// Edge detection bound to one boolean reading of a snapshot.
#[derive(Clone)]
pub struct StateWatch {
    detector: StateChangeDetector,
    read: fn(&Snapshot) -> Option<bool>,
}

impl StateWatch {
    pub fn new(
        field_name: impl Into<String>,
        category: impl Into<String>,
        read: fn(&Snapshot) -> Option<bool>,
    ) -> Self {
        Self {
            detector: StateChangeDetector::new(field_name, category),
            read,
        }
    }

    /// Watches for the pump, heater, lights and chlorinator.
    pub fn defaults() -> Vec<StateWatch> {
        vec![
            StateWatch::new("filterOn", "pump", |s| s.filter.pump_on),
            StateWatch::new("heaterOn", "heater", |s| s.heater.enabled),
            StateWatch::new("lightsOn", "lights", |s| s.lights.on),
            StateWatch::new("chlorinatorOn", "chlorinator", |s| s.chlorinator.enabled),
        ]
    }

    pub fn field_name(&self) -> &str {
        self.detector.field_name()
    }

    /// Null readings are unknown and leave the detector untouched.
    fn observe(&mut self, snapshot: &Snapshot) -> Option<StateChangeEvent> {
        let value = (self.read)(snapshot)?;
        self.detector.observe(value, snapshot.timestamp_ms)
    }
}

impl std::fmt::Debug for StateWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateWatch")
            .field("detector", &self.detector)
            .finish_non_exhaustive()
    }
}

/// Outcome of one [`Collector::run_cycle`].
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub snapshot: Snapshot,
    /// Whether the point reached the persistent store.
    pub persisted: bool,
    pub events: Vec<StateChangeEvent>,
}

/// Drives collection cycles against one panel session.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use poolwatch_collector::{Collector, ReqwestTransport, Session, SessionConfig};
/// use poolwatch_store::{LogSink, TimeSeriesStore};
/// use poolwatch_types::Credentials;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let transport = ReqwestTransport::new(Duration::from_secs(10))?;
///     let session = Session::new(
///         SessionConfig::new("http://192.168.1.40"),
///         Credentials::new("admin", "secret"),
///         Arc::new(transport),
///     );
///
///     let collector = Collector::builder(Arc::new(session))
///         .store(Arc::new(TimeSeriesStore::new()))
///         .annotations(Arc::new(LogSink))
///         .build();
///
///     let report = collector.run_cycle().await?;
///     println!("water: {:?}", report.snapshot.dashboard.water_temp);
///
///     collector.shutdown();
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Collector {
    session: Arc<Session>,
    targets: Vec<(Endpoint, String)>,
    retry: RetryPolicy,
    store: Option<Arc<TimeSeriesStore>>,
    annotations: Option<Arc<dyn AnnotationSink>>,
    watches: Mutex<Vec<StateWatch>>,
}

impl Collector {
    pub fn builder(session: Arc<Session>) -> CollectorBuilder {
        CollectorBuilder::new(session)
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn store(&self) -> Option<&Arc<TimeSeriesStore>> {
        self.store.as_ref()
    }

    /// Collect one snapshot of every configured group.
    ///
    /// Fails only if the session cannot be authenticated. A group that
    /// cannot be fetched after retries carries its error, the rest are
    /// unaffected.
    pub async fn collect_snapshot(&self) -> Result<Snapshot, CollectError> {
        if !self.session.is_valid() {
            if let Err(err) = self.session.authenticate().await {
                error!(error = %err, "Authentication failed, skipping cycle");
                return Err(err.into());
            }
        }

        let started = Instant::now();
        let groups = join_all(
            self.targets
                .iter()
                .map(|(endpoint, path)| self.collect_group(*endpoint, path)),
        )
        .await;

        let failed = groups.iter().filter(|g| g.has_error()).count();
        let snapshot = Snapshot::assemble(current_timestamp_ms(), groups);

        info!(
            groups = self.targets.len(),
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Collected snapshot"
        );
        Ok(snapshot)
    }

    async fn collect_group(&self, endpoint: Endpoint, path: &str) -> MetricGroup {
        match self.fetch(endpoint, path).await {
            Ok(doc) => {
                debug!(endpoint = %endpoint, fetched_at_ms = doc.fetched_at_ms, "Extracting");
                extract(endpoint, &doc.markup)
            }
            Err(err) => {
                warn!(endpoint = %endpoint, error = %err, "Group collection failed");
                MetricGroup::failed(endpoint, err.to_string())
            }
        }
    }

    /// Fetch with retries; an expired session is re-authenticated once.
    async fn fetch(&self, endpoint: Endpoint, path: &str) -> Result<RawDocument, FetchError> {
        let session = &self.session;
        let retry = &self.retry;
        let attempt = move || {
            with_retry(retry, move |n| {
                debug!(endpoint = %endpoint, attempt = n, "Fetching");
                session.fetch(endpoint, path)
            })
        };

        match attempt().await {
            Err(FetchError::SessionExpired | FetchError::NotAuthenticated) => {
                debug!(endpoint = %endpoint, "Re-authenticating");
                self.session.authenticate().await.map_err(FetchError::Reauth)?;
                attempt().await
            }
            other => other,
        }
    }

    /// Collect a snapshot and hand it off to the store and state watches.
    pub async fn run_cycle(&self) -> Result<CycleReport, CollectError> {
        let snapshot = self.collect_snapshot().await?;

        let persisted = match &self.store {
            Some(store) => store.write(TimeSeriesPoint::from_snapshot(&snapshot)).await,
            None => false,
        };

        let events = self.detect(&snapshot);
        self.forward(&events);

        Ok(CycleReport {
            snapshot,
            persisted,
            events,
        })
    }

    fn detect(&self, snapshot: &Snapshot) -> Vec<StateChangeEvent> {
        let events: Vec<_> = self
            .watches
            .lock()
            .iter_mut()
            .filter_map(|watch| watch.observe(snapshot))
            .collect();

        for event in &events {
            info!(category = %event.category, "State change: {}", event.describe());
        }
        events
    }

    /// Deliver events on a spawned task so a slow sink never delays collection.
    fn forward(&self, events: &[StateChangeEvent]) {
        let Some(sink) = &self.annotations else {
            return;
        };
        if events.is_empty() {
            return;
        }

        let sink = Arc::clone(sink);
        let events = events.to_vec();
        tokio::spawn(async move {
            for event in events {
                let field = event.field_name.clone();
                if let Err(err) = sink.record(event).await {
                    warn!(field = %field, error = %err, "Failed to record state change");
                }
            }
        });
    }

    /// Forget all watch state; the next reading of each field sets a baseline.
    pub fn reset_watches(&self) {
        let mut watches = self.watches.lock();
        for watch in watches.iter_mut() {
            watch.detector.reset();
        }
    }

    /// Release the panel session.
    pub fn shutdown(&self) {
        self.session.cleanup();
        info!("Collector shut down");
    }
}

/// Builder for [`Collector`].
#[derive(Debug)]
pub struct CollectorBuilder {
    session: Arc<Session>,
    endpoints: Vec<Endpoint>,
    paths: BTreeMap<Endpoint, String>,
    retry: RetryPolicy,
    store: Option<Arc<TimeSeriesStore>>,
    annotations: Option<Arc<dyn AnnotationSink>>,
    watches: Option<Vec<StateWatch>>,
}

impl CollectorBuilder {
    fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            endpoints: Endpoint::ALL.to_vec(),
            paths: BTreeMap::new(),
            retry: RetryPolicy::default(),
            store: None,
            annotations: None,
            watches: None,
        }
    }

    /// Collect only these groups (default: all).
    pub fn endpoints(mut self, endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        self.endpoints = endpoints.into_iter().collect();
        self
    }

    /// Override the page path for one group.
    pub fn path(mut self, endpoint: Endpoint, path: impl Into<String>) -> Self {
        self.paths.insert(endpoint, path.into());
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn store(mut self, store: Arc<TimeSeriesStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn annotations(mut self, sink: Arc<dyn AnnotationSink>) -> Self {
        self.annotations = Some(sink);
        self
    }

    /// Add a state watch. The first call replaces [`StateWatch::defaults`].
    pub fn watch(mut self, watch: StateWatch) -> Self {
        self.watches.get_or_insert_with(Vec::new).push(watch);
        self
    }

    pub fn build(self) -> Collector {
        let mut endpoints = self.endpoints;
        endpoints.sort();
        endpoints.dedup();

        let targets = endpoints
            .into_iter()
            .map(|endpoint| {
                let path = self
                    .paths
                    .get(&endpoint)
                    .cloned()
                    .unwrap_or_else(|| endpoint.default_path().to_string());
                (endpoint, path)
            })
            .collect();

        Collector {
            session: self.session,
            targets,
            retry: self.retry,
            store: self.store,
            annotations: self.annotations,
            watches: Mutex::new(self.watches.unwrap_or_else(StateWatch::defaults)),
        }
    }
}
