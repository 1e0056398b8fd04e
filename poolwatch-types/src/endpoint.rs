//! Metric group endpoints on the remote panel.

use std::fmt;
use std::str::FromStr;

/// One page of the controller panel, each yielding one metric group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Endpoint {
    Dashboard,
    Filter,
    Chlorinator,
    Heater,
    Lights,
    Schedules,
}

impl Endpoint {
    /// All endpoints in collection order.
    pub const ALL: [Endpoint; 6] = [
        Endpoint::Dashboard,
        Endpoint::Filter,
        Endpoint::Chlorinator,
        Endpoint::Heater,
        Endpoint::Lights,
        Endpoint::Schedules,
    ];

    /// Stable lowercase name, used in logs and configuration keys.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Dashboard => "dashboard",
            Endpoint::Filter => "filter",
            Endpoint::Chlorinator => "chlorinator",
            Endpoint::Heater => "heater",
            Endpoint::Lights => "lights",
            Endpoint::Schedules => "schedules",
        }
    }

    /// Default path of the page relative to the panel base URL.
    pub fn default_path(&self) -> &'static str {
        match self {
            Endpoint::Dashboard => "/dashboard",
            Endpoint::Filter => "/equipment/filter",
            Endpoint::Chlorinator => "/equipment/chlorinator",
            Endpoint::Heater => "/equipment/heater",
            Endpoint::Lights => "/equipment/lights",
            Endpoint::Schedules => "/schedules",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown endpoint '{}'", s))
    }
}
