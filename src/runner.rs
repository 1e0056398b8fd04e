//! Collector wiring and the periodic collection loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use poolwatch_collector::{Collector, CycleReport, ReqwestTransport, Session, Transport};
use poolwatch_store::{LogSink, TimeSeriesStore};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::file_store::JsonlStore;
use crate::settings::Settings;

/// Build the collector described by `settings`, talking to the panel over HTTP.
pub fn build_collector(settings: &Settings) -> Result<Collector> {
    let transport = ReqwestTransport::new(settings.request_timeout())
        .context("Failed to build HTTP client")?;
    build_collector_with(settings, Arc::new(transport))
}

/// Same as [`build_collector`] with a caller-supplied transport.
pub fn build_collector_with(settings: &Settings, transport: Arc<dyn Transport>) -> Result<Collector> {
    let session = Session::new(settings.session_config(), settings.credentials(), transport);

    let mut store = TimeSeriesStore::builder()
        .max_points(settings.retention.max_points)
        .persist_timeout(settings.persist_timeout());
    if let Some(path) = &settings.storage.path {
        info!(path = %path.display(), "Mirroring points to JSON-lines file");
        let file = JsonlStore::new(path).with_max_lines(settings.retention.max_points);
        store = store.persistent(Arc::new(file));
    }

    let mut builder = Collector::builder(Arc::new(session))
        .endpoints(settings.endpoints()?)
        .retry(settings.retry_policy())
        .store(Arc::new(store.build()))
        .annotations(Arc::new(LogSink));
    for (endpoint, path) in settings.path_overrides()? {
        builder = builder.path(endpoint, path);
    }

    Ok(builder.build())
}

/// Totals for one run of [`run_until`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub failed: u64,
}

/// Run a collection cycle every `period` until `shutdown` resolves, then
/// release the session.
///
/// Cycles run one at a time, so a slow cycle delays the next tick instead of
/// overlapping it; missed ticks are skipped. A failed cycle is logged and
/// the loop carries on.
pub async fn run_until<F>(collector: &Collector, period: Duration, shutdown: F) -> RunSummary
where
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut summary = RunSummary::default();
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            _ = ticker.tick() => {
                summary.cycles += 1;
                match collector.run_cycle().await {
                    Ok(report) => log_report(&report),
                    Err(err) => {
                        summary.failed += 1;
                        warn!(error = %err, "Collection cycle failed, retrying next interval");
                    }
                }
            }
        }
    }

    collector.shutdown();
    summary
}

fn log_report(report: &CycleReport) {
    let snapshot = &report.snapshot;
    let failed: Vec<_> = snapshot
        .groups_with_errors()
        .iter()
        .map(|e| e.name())
        .collect();

    info!(
        timestamp_ms = snapshot.timestamp_ms,
        water_temp = ?snapshot.dashboard.water_temp,
        salt = ?snapshot.chlorinator.salt_instant,
        pump_on = ?snapshot.filter.pump_on,
        persisted = report.persisted,
        events = report.events.len(),
        failed = ?failed,
        "Cycle complete"
    );
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
pub async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use poolwatch_collector::{FetchError, HttpResponse, SessionState};

    use super::*;

    /// Accepts any login and serves the same filter page everywhere.
    #[derive(Debug, Default)]
    struct StaticPanel {
        reject_logins: bool,
        page_gets: AtomicUsize,
    }

    #[async_trait]
    impl Transport for StaticPanel {
        async fn get(&self, url: &str, _cookie: Option<&str>) -> Result<HttpResponse, FetchError> {
            if url.ends_with("/login") {
                return Ok(HttpResponse::ok("<form><input name=\"username\"></form>"));
            }
            self.page_gets.fetch_add(1, Ordering::SeqCst);
            Ok(HttpResponse::ok("<span id=\"pumpStatus\">Running</span>"))
        }

        async fn post_form(
            &self,
            _url: &str,
            _form: &[(&str, &str)],
            _cookie: Option<&str>,
        ) -> Result<HttpResponse, FetchError> {
            if self.reject_logins {
                return Ok(HttpResponse {
                    status: 401,
                    ..Default::default()
                });
            }
            Ok(HttpResponse {
                status: 302,
                set_cookies: vec!["sid=1".to_string()],
                location: Some("/".to_string()),
                body: String::new(),
            })
        }
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.remote.username = "admin".to_string();
        settings.remote.password = "secret".to_string();
        settings.collection.endpoints = vec!["filter".to_string()];
        settings
    }

    #[tokio::test(start_paused = true)]
    async fn runs_a_cycle_per_interval_until_shutdown() {
        let panel = Arc::new(StaticPanel::default());
        let collector = build_collector_with(&settings(), panel.clone()).unwrap();

        let period = Duration::from_secs(300);
        // Ticks at 0, 5, 10, 15 and 20 minutes.
        let shutdown = tokio::time::sleep(Duration::from_secs(22 * 60));
        let summary = run_until(&collector, period, shutdown).await;

        assert_eq!(summary, RunSummary { cycles: 5, failed: 0 });
        assert_eq!(panel.page_gets.load(Ordering::SeqCst), 5);
        assert_eq!(collector.session().handshakes(), 1);
        assert_eq!(collector.session().state(), SessionState::Unauthenticated);

        let store = collector.store().unwrap();
        assert_eq!(store.latest().unwrap().filter_on, Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn auth_failures_do_not_stop_the_loop() {
        let panel = Arc::new(StaticPanel {
            reject_logins: true,
            ..Default::default()
        });
        let collector = build_collector_with(&settings(), panel.clone()).unwrap();

        let shutdown = tokio::time::sleep(Duration::from_secs(11 * 60));
        let summary = run_until(&collector, Duration::from_secs(300), shutdown).await;

        assert_eq!(summary, RunSummary { cycles: 3, failed: 3 });
        assert_eq!(panel.page_gets.load(Ordering::SeqCst), 0);
        assert_eq!(collector.session().handshakes(), 3);
    }

    #[test]
    fn file_storage_is_wired_when_configured() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut settings = settings();
        settings.storage.path = Some(dir.path().join("points.jsonl"));

        let collector = build_collector_with(&settings, Arc::new(StaticPanel::default())).unwrap();
        assert!(collector.store().unwrap().has_persistent_store());
    }
}
