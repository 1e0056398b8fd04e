//! # poolwatch
//!
//! Collection daemon for a pool controller that only exposes a browser
//! panel. Every interval it logs in (when needed), scrapes each page into a
//! metric group, appends one point to the time series and reports equipment
//! state changes.
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────────┐   ┌──────────────┐
//! │ settings │──▶│  runner   │──▶│  Collector   │──▶│ TimeSeries-  │
//! │ (config) │   │ (interval)│   │ (session +   │   │ Store ──▶    │
//! └──────────┘   └───────────┘   │  extractors) │   │ JsonlStore   │
//!                                └──────┬───────┘   └──────────────┘
//!                                       ▼
//!                              StateChange events ──▶ LogSink
//! ```
//!
//! - **[`settings`]**: TOML file plus `POOLWATCH_*` environment overlay
//! - **[`runner`]**: builds the [`Collector`] and drives it on an interval
//! - **[`file_store`]**: JSON-lines [`PersistentStore`](poolwatch_store::PersistentStore)

pub mod file_store;
pub mod runner;
pub mod settings;

pub use file_store::JsonlStore;
pub use runner::{build_collector, build_collector_with, run_until, RunSummary};
pub use settings::Settings;

pub use poolwatch_collector::Collector;
pub use poolwatch_store::TimeSeriesStore;
pub use poolwatch_types::{Snapshot, TimeSeriesPoint};
