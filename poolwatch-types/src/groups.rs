//! Metric group records, one per panel page.
//!
//! Each record has a fixed schema of nullable fields. `Default` is the
//! documented "empty" shape: every field null, no error.

use crate::Endpoint;

/// Headline readings shown on the panel's landing page.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct DashboardMetrics {
    pub air_temp: Option<f64>,
    pub water_temp: Option<f64>,
    pub spa_temp: Option<f64>,
    pub salt_level: Option<f64>,
    pub system_status: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

/// Filter pump state.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct FilterMetrics {
    pub pump_on: Option<bool>,
    pub speed_percent: Option<f64>,
    pub mode: Option<String>,
    pub valve_position: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

/// Salt chlorinator readings.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct ChlorinatorMetrics {
    pub enabled: Option<bool>,
    /// Instantaneous salt reading, ppm.
    pub salt_instant: Option<f64>,
    /// Rolling average salt reading, ppm.
    pub salt_average: Option<f64>,
    pub output_percent: Option<f64>,
    pub cell_temp: Option<f64>,
    pub status: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

/// Heater state.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct HeaterMetrics {
    pub enabled: Option<bool>,
    pub set_point: Option<f64>,
    pub current_temp: Option<f64>,
    pub mode: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

/// Pool light state.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct LightsMetrics {
    pub on: Option<bool>,
    pub brightness_percent: Option<f64>,
    pub show: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

/// One row of the controller's schedule table.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct ScheduleEntry {
    pub name: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub days: Option<String>,
    pub enabled: Option<bool>,
}

/// Programmed equipment schedules.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct SchedulesMetrics {
    pub entries: Vec<ScheduleEntry>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

/// A metric group tagged by the endpoint it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricGroup {
    Dashboard(DashboardMetrics),
    Filter(FilterMetrics),
    Chlorinator(ChlorinatorMetrics),
    Heater(HeaterMetrics),
    Lights(LightsMetrics),
    Schedules(SchedulesMetrics),
}

impl MetricGroup {
    /// The empty shape for an endpoint: all fields null, no error.
    pub fn empty(endpoint: Endpoint) -> Self {
        match endpoint {
            Endpoint::Dashboard => MetricGroup::Dashboard(DashboardMetrics::default()),
            Endpoint::Filter => MetricGroup::Filter(FilterMetrics::default()),
            Endpoint::Chlorinator => MetricGroup::Chlorinator(ChlorinatorMetrics::default()),
            Endpoint::Heater => MetricGroup::Heater(HeaterMetrics::default()),
            Endpoint::Lights => MetricGroup::Lights(LightsMetrics::default()),
            Endpoint::Schedules => MetricGroup::Schedules(SchedulesMetrics::default()),
        }
    }

    /// A group whose collection failed: all data null, `error` set.
    pub fn failed(endpoint: Endpoint, error: impl Into<String>) -> Self {
        let mut group = Self::empty(endpoint);
        *group.error_slot() = Some(error.into());
        group
    }

    pub fn endpoint(&self) -> Endpoint {
        match self {
            MetricGroup::Dashboard(_) => Endpoint::Dashboard,
            MetricGroup::Filter(_) => Endpoint::Filter,
            MetricGroup::Chlorinator(_) => Endpoint::Chlorinator,
            MetricGroup::Heater(_) => Endpoint::Heater,
            MetricGroup::Lights(_) => Endpoint::Lights,
            MetricGroup::Schedules(_) => Endpoint::Schedules,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            MetricGroup::Dashboard(m) => m.error.as_deref(),
            MetricGroup::Filter(m) => m.error.as_deref(),
            MetricGroup::Chlorinator(m) => m.error.as_deref(),
            MetricGroup::Heater(m) => m.error.as_deref(),
            MetricGroup::Lights(m) => m.error.as_deref(),
            MetricGroup::Schedules(m) => m.error.as_deref(),
        }
    }

    pub fn has_error(&self) -> bool {
        self.error().is_some()
    }

    fn error_slot(&mut self) -> &mut Option<String> {
        match self {
            MetricGroup::Dashboard(m) => &mut m.error,
            MetricGroup::Filter(m) => &mut m.error,
            MetricGroup::Chlorinator(m) => &mut m.error,
            MetricGroup::Heater(m) => &mut m.error,
            MetricGroup::Lights(m) => &mut m.error,
            MetricGroup::Schedules(m) => &mut m.error,
        }
    }
}
