//! State change events.

/// A transition of a monitored boolean field, e.g. the filter pump turning off.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct StateChangeEvent {
    pub timestamp_ms: u64,
    pub field_name: String,
    pub previous_value: bool,
    pub new_value: bool,
    /// Grouping used by annotation consumers ("pump", "heater", ...).
    pub category: String,
}

impl StateChangeEvent {
    /// Short human-readable description, e.g. `filterOn: on -> off`.
    pub fn describe(&self) -> String {
        let word = |v: bool| if v { "on" } else { "off" };
        format!(
            "{}: {} -> {}",
            self.field_name,
            word(self.previous_value),
            word(self.new_value)
        )
    }
}
