//! Field locator chains and extractors for the single-value pages.

use poolwatch_types::{
    ChlorinatorMetrics, DashboardMetrics, FilterMetrics, HeaterMetrics, LightsMetrics,
};

use super::locate::Locator::{self, Class, DataField, Id, Label};
use super::{number, status, text};

const AIR_TEMP: &[Locator] = &[
    Id("airTemp"),
    DataField("air-temp"),
    Class("air-temp"),
    Label("Air Temp"),
    Label("Air"),
];
const WATER_TEMP: &[Locator] = &[
    Id("poolTemp"),
    Id("waterTemp"),
    DataField("water-temp"),
    Class("pool-temp"),
    Label("Pool Temp"),
    Label("Water Temp"),
];
const SPA_TEMP: &[Locator] = &[
    Id("spaTemp"),
    DataField("spa-temp"),
    Class("spa-temp"),
    Label("Spa Temp"),
];
const SALT_LEVEL: &[Locator] = &[
    Id("saltLevel"),
    DataField("salt-level"),
    Class("salt-level"),
    Label("Salt Level"),
    Label("Salt"),
];
const SYSTEM_STATUS: &[Locator] = &[
    Id("systemStatus"),
    DataField("system-status"),
    Class("system-status"),
    Label("System Status"),
    Label("Status"),
];

pub fn extract_dashboard(doc: &str) -> DashboardMetrics {
    DashboardMetrics {
        air_temp: number(doc, AIR_TEMP),
        water_temp: number(doc, WATER_TEMP),
        spa_temp: number(doc, SPA_TEMP),
        salt_level: number(doc, SALT_LEVEL),
        system_status: text(doc, SYSTEM_STATUS),
        error: None,
    }
}

const PUMP_STATUS: &[Locator] = &[
    Id("pumpStatus"),
    DataField("pump-status"),
    Class("pump-status"),
    Label("Pump Status"),
    Label("Filter Pump"),
    Label("Pump"),
];
const PUMP_SPEED: &[Locator] = &[
    Id("pumpSpeed"),
    DataField("pump-speed"),
    Class("pump-speed"),
    Label("Pump Speed"),
    Label("Speed"),
];
const FILTER_MODE: &[Locator] = &[
    Id("filterMode"),
    DataField("filter-mode"),
    Class("filter-mode"),
    Label("Mode"),
];
const VALVE_POSITION: &[Locator] = &[
    Id("valvePosition"),
    DataField("valve-position"),
    Label("Valve Position"),
    Label("Valve"),
];

pub fn extract_filter(doc: &str) -> FilterMetrics {
    FilterMetrics {
        pump_on: status(doc, PUMP_STATUS),
        speed_percent: number(doc, PUMP_SPEED),
        mode: text(doc, FILTER_MODE),
        valve_position: text(doc, VALVE_POSITION),
        error: None,
    }
}

const CHLORINATOR_ENABLED: &[Locator] = &[
    Id("chlorinatorStatus"),
    DataField("chlorinator-status"),
    Class("chlorinator-status"),
    Label("Chlorinator"),
    Label("Status"),
];
const SALT_INSTANT: &[Locator] = &[
    Id("saltInstant"),
    DataField("salt-instant"),
    Class("salt-instant"),
    Label("Instant Salt"),
    Label("Salt Level"),
];
const SALT_AVERAGE: &[Locator] = &[
    Id("saltAverage"),
    DataField("salt-average"),
    Class("salt-average"),
    Label("Average Salt"),
];
const CHLORINATOR_OUTPUT: &[Locator] = &[
    Id("chlorinatorOutput"),
    DataField("output-percent"),
    Class("chlorinator-output"),
    Label("Output"),
];
const CELL_TEMP: &[Locator] = &[
    Id("cellTemp"),
    DataField("cell-temp"),
    Class("cell-temp"),
    Label("Cell Temp"),
];
const CHLORINATOR_MESSAGE: &[Locator] = &[
    Id("chlorinatorMessage"),
    DataField("chlorinator-message"),
    Class("chlorinator-message"),
    Label("Status"),
];

pub fn extract_chlorinator(doc: &str) -> ChlorinatorMetrics {
    ChlorinatorMetrics {
        enabled: status(doc, CHLORINATOR_ENABLED),
        salt_instant: number(doc, SALT_INSTANT),
        salt_average: number(doc, SALT_AVERAGE),
        output_percent: number(doc, CHLORINATOR_OUTPUT),
        cell_temp: number(doc, CELL_TEMP),
        status: text(doc, CHLORINATOR_MESSAGE),
        error: None,
    }
}

const HEATER_STATUS: &[Locator] = &[
    Id("heaterStatus"),
    DataField("heater-status"),
    Class("heater-status"),
    Label("Heater Status"),
    Label("Heater"),
];
const SET_POINT: &[Locator] = &[
    Id("setPoint"),
    DataField("set-point"),
    Class("set-point"),
    Label("Set Point"),
    Label("Setpoint"),
];
const CURRENT_TEMP: &[Locator] = &[
    Id("currentTemp"),
    DataField("current-temp"),
    Class("current-temp"),
    Label("Current Temp"),
    Label("Water Temp"),
];
const HEAT_MODE: &[Locator] = &[
    Id("heaterMode"),
    DataField("heater-mode"),
    Class("heater-mode"),
    Label("Heat Mode"),
    Label("Mode"),
];

pub fn extract_heater(doc: &str) -> HeaterMetrics {
    HeaterMetrics {
        enabled: status(doc, HEATER_STATUS),
        set_point: number(doc, SET_POINT),
        current_temp: number(doc, CURRENT_TEMP),
        mode: text(doc, HEAT_MODE),
        error: None,
    }
}

const LIGHT_STATUS: &[Locator] = &[
    Id("lightStatus"),
    DataField("light-status"),
    Class("light-status"),
    Label("Lights"),
    Label("Light"),
];
const BRIGHTNESS: &[Locator] = &[
    Id("brightness"),
    DataField("brightness"),
    Class("brightness"),
    Label("Brightness"),
];
const LIGHT_SHOW: &[Locator] = &[
    Id("lightShow"),
    DataField("light-show"),
    Class("light-show"),
    Label("Show"),
    Label("Color"),
];

pub fn extract_lights(doc: &str) -> LightsMetrics {
    LightsMetrics {
        on: status(doc, LIGHT_STATUS),
        brightness_percent: number(doc, BRIGHTNESS),
        show: text(doc, LIGHT_SHOW),
        error: None,
    }
}
