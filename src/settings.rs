//! Daemon settings.
//!
//! Loaded from an optional TOML file overlaid with `POOLWATCH_*`
//! environment variables, using `__` between nested keys:
//!
//! ```toml
//! [remote]
//! base_url = "http://192.168.1.40"
//! username = "admin"
//! password = "secret"
//!
//! [remote.paths]
//! chlorinator = "/equipment/salt"
//!
//! [collection]
//! interval_secs = 300
//!
//! [storage]
//! path = "/var/lib/poolwatch/points.jsonl"
//! ```
//!
//! `POOLWATCH_REMOTE__PASSWORD=secret` keeps the secret out of the file.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use poolwatch_collector::{RetryPolicy, SessionConfig};
use poolwatch_types::{Credentials, Endpoint};
use serde::Deserialize;

const ENV_PREFIX: &str = "POOLWATCH";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub remote: RemoteSettings,
    pub collection: CollectionSettings,
    pub retention: RetentionSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub login_path: String,
    /// Page path overrides keyed by group name.
    pub paths: BTreeMap<String, String>,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            username: String::new(),
            password: String::new(),
            login_path: "/login".to_string(),
            paths: BTreeMap::new(),
        }
    }
}

impl fmt::Debug for RemoteSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSettings")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("login_path", &self.login_path)
            .field("paths", &self.paths)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectionSettings {
    pub interval_secs: u64,
    pub request_timeout_secs: u64,
    pub staleness_mins: u64,
    /// Groups to collect, by name. Empty means all.
    pub endpoints: Vec<String>,
    pub retry: RetrySettings,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            request_timeout_secs: 10,
            staleness_mins: 30,
            endpoints: Vec::new(),
            retry: RetrySettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetentionSettings {
    pub max_points: usize,
    pub persist_timeout_ms: u64,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            max_points: poolwatch_store::DEFAULT_MAX_POINTS,
            persist_timeout_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// JSON-lines file mirroring every point. Memory only when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `POOLWATCH_` followed by the nested key path joined with `__`.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

impl Settings {
    /// Load from `path` (if given) and the environment, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        Self::build(builder.add_source(environment()))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Settings = builder
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let base = &self.remote.base_url;
        ensure!(
            base.starts_with("http://") || base.starts_with("https://"),
            "remote.base_url must be an http(s) URL, got {:?}",
            base
        );
        ensure!(self.collection.interval_secs > 0, "collection.interval_secs must be positive");
        ensure!(
            self.collection.request_timeout_secs > 0,
            "collection.request_timeout_secs must be positive"
        );
        ensure!(self.collection.retry.max_attempts >= 1, "collection.retry.max_attempts must be at least 1");
        ensure!(
            self.collection.retry.multiplier >= 1.0,
            "collection.retry.multiplier must be at least 1.0"
        );
        ensure!(self.retention.max_points > 0, "retention.max_points must be positive");

        self.endpoints()?;
        self.path_overrides()?;
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.remote.username, &self.remote.password)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(&self.remote.base_url)
            .with_login_path(&self.remote.login_path)
            .with_staleness(Duration::from_secs(self.collection.staleness_mins * 60))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let retry = &self.collection.retry;
        RetryPolicy {
            max_attempts: retry.max_attempts,
            base_delay: Duration::from_millis(retry.base_delay_ms),
            multiplier: retry.multiplier,
            ..RetryPolicy::default()
        }
    }

    /// Groups to collect, in collection order.
    pub fn endpoints(&self) -> Result<Vec<Endpoint>> {
        if self.collection.endpoints.is_empty() {
            return Ok(Endpoint::ALL.to_vec());
        }
        self.collection
            .endpoints
            .iter()
            .map(|name| {
                name.parse::<Endpoint>()
                    .map_err(|e| anyhow::anyhow!("collection.endpoints: {}", e))
            })
            .collect()
    }

    pub fn path_overrides(&self) -> Result<Vec<(Endpoint, String)>> {
        self.remote
            .paths
            .iter()
            .map(|(name, path)| {
                let endpoint = name
                    .parse::<Endpoint>()
                    .map_err(|e| anyhow::anyhow!("remote.paths: {}", e))?;
                Ok((endpoint, path.clone()))
            })
            .collect()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.collection.interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.collection.request_timeout_secs)
    }

    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.retention.persist_timeout_ms)
    }
}
