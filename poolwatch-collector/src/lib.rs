//! # poolwatch-collector
//!
//! Collects metric snapshots from a pool controller's browser-only web panel.
//!
//! - **[`Session`]**: form login, cookie replay, staleness and expiry
//!   detection, with single-flight authentication
//! - **[`extract`]**: pure functions turning one page into one metric group
//!   through ordered fallback locators
//! - **[`Collector`]**: concurrent fetch and extract of every group with
//!   per-group retry and failure isolation, then hand-off to the store and
//!   state watches
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use poolwatch_collector::{Collector, ReqwestTransport, Session, SessionConfig};
//! use poolwatch_types::Credentials;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::new(
//!         SessionConfig::new("http://192.168.1.40"),
//!         Credentials::new("admin", "secret"),
//!         Arc::new(ReqwestTransport::new(Duration::from_secs(10))?),
//!     );
//!     let collector = Collector::builder(Arc::new(session)).build();
//!
//!     let snapshot = collector.collect_snapshot().await?;
//!     println!("{} groups collected cleanly", snapshot.populated_count());
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod cookies;
pub mod error;
pub mod extract;
pub mod markup;
pub mod retry;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use collector::{Collector, CollectorBuilder, CycleReport, StateWatch};
pub use error::{AuthError, CollectError, FetchError};
pub use retry::{with_retry, RetryPolicy};
pub use session::{RawDocument, Session, SessionConfig, SessionState, DEFAULT_STALENESS};
pub use transport::{HttpResponse, ReqwestTransport, Transport, DEFAULT_REQUEST_TIMEOUT};

// Re-export types for convenience
pub use poolwatch_types::{Credentials, Endpoint, MetricGroup, Snapshot};
