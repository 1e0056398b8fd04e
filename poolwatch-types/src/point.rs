//! Flattened time series view of a snapshot.

use std::fmt;
use std::str::FromStr;

use crate::Snapshot;

/// Timestamp plus the fixed set of scalar fields that get persisted and
/// queried.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct TimeSeriesPoint {
    pub timestamp_ms: u64,
    pub air_temp: Option<f64>,
    pub water_temp: Option<f64>,
    pub spa_temp: Option<f64>,
    pub salt_instant: Option<f64>,
    pub salt_average: Option<f64>,
    pub chlorinator_output: Option<f64>,
    pub cell_temp: Option<f64>,
    pub filter_speed: Option<f64>,
    pub filter_on: Option<bool>,
    pub heater_on: Option<bool>,
    pub heater_set_point: Option<f64>,
    pub lights_on: Option<bool>,
}

impl TimeSeriesPoint {
    /// An all-null point at `timestamp_ms`.
    pub fn at(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            ..Default::default()
        }
    }

    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            timestamp_ms: snapshot.timestamp_ms,
            air_temp: snapshot.dashboard.air_temp,
            // The filter page has no temperature, so the heater's sensor is
            // the fallback when the dashboard misses it.
            water_temp: snapshot
                .dashboard
                .water_temp
                .or(snapshot.heater.current_temp),
            spa_temp: snapshot.dashboard.spa_temp,
            salt_instant: snapshot
                .chlorinator
                .salt_instant
                .or(snapshot.dashboard.salt_level),
            salt_average: snapshot.chlorinator.salt_average,
            chlorinator_output: snapshot.chlorinator.output_percent,
            cell_temp: snapshot.chlorinator.cell_temp,
            filter_speed: snapshot.filter.speed_percent,
            filter_on: snapshot.filter.pump_on,
            heater_on: snapshot.heater.enabled,
            heater_set_point: snapshot.heater.set_point,
            lights_on: snapshot.lights.on,
        }
    }

    /// Numeric value of a field; booleans read as `1.0` / `0.0`.
    pub fn value(&self, field: PointField) -> Option<f64> {
        let flag = |b: Option<bool>| b.map(|on| if on { 1.0 } else { 0.0 });
        match field {
            PointField::AirTemp => self.air_temp,
            PointField::WaterTemp => self.water_temp,
            PointField::SpaTemp => self.spa_temp,
            PointField::SaltInstant => self.salt_instant,
            PointField::SaltAverage => self.salt_average,
            PointField::ChlorinatorOutput => self.chlorinator_output,
            PointField::CellTemp => self.cell_temp,
            PointField::FilterSpeed => self.filter_speed,
            PointField::FilterOn => flag(self.filter_on),
            PointField::HeaterOn => flag(self.heater_on),
            PointField::HeaterSetPoint => self.heater_set_point,
            PointField::LightsOn => flag(self.lights_on),
        }
    }
}

/// Names of the scalar fields of a [`TimeSeriesPoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointField {
    AirTemp,
    WaterTemp,
    SpaTemp,
    SaltInstant,
    SaltAverage,
    ChlorinatorOutput,
    CellTemp,
    FilterSpeed,
    FilterOn,
    HeaterOn,
    HeaterSetPoint,
    LightsOn,
}

impl PointField {
    pub const ALL: [PointField; 12] = [
        PointField::AirTemp,
        PointField::WaterTemp,
        PointField::SpaTemp,
        PointField::SaltInstant,
        PointField::SaltAverage,
        PointField::ChlorinatorOutput,
        PointField::CellTemp,
        PointField::FilterSpeed,
        PointField::FilterOn,
        PointField::HeaterOn,
        PointField::HeaterSetPoint,
        PointField::LightsOn,
    ];

    /// The camelCase name used in serialized points and queries.
    pub fn name(&self) -> &'static str {
        match self {
            PointField::AirTemp => "airTemp",
            PointField::WaterTemp => "waterTemp",
            PointField::SpaTemp => "spaTemp",
            PointField::SaltInstant => "saltInstant",
            PointField::SaltAverage => "saltAverage",
            PointField::ChlorinatorOutput => "chlorinatorOutput",
            PointField::CellTemp => "cellTemp",
            PointField::FilterSpeed => "filterSpeed",
            PointField::FilterOn => "filterOn",
            PointField::HeaterOn => "heaterOn",
            PointField::HeaterSetPoint => "heaterSetPoint",
            PointField::LightsOn => "lightsOn",
        }
    }
}

impl fmt::Display for PointField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PointField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PointField::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("unknown field '{}'", s))
    }
}
