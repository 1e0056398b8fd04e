//! Edge-triggered state change detection for boolean readings.

use poolwatch_types::StateChangeEvent;

/// Turns a stream of boolean readings for one field into discrete events.
///
/// The first observation only establishes the current state. After that an
/// event is emitted exactly when the reading differs from the current state.
///
/// # Example
///
/// ```rust
/// use poolwatch_store::StateChangeDetector;
///
/// let mut pump = StateChangeDetector::new("filterOn", "pump");
///
/// assert!(pump.observe(true, 0).is_none());
/// assert!(pump.observe(true, 60_000).is_none());
///
/// let event = pump.observe(false, 120_000).unwrap();
/// assert!(event.previous_value);
/// assert!(!event.new_value);
/// ```
#[derive(Debug, Clone)]
pub struct StateChangeDetector {
    field_name: String,
    category: String,
    current: Option<bool>,
    last_change_ms: Option<u64>,
}

impl StateChangeDetector {
    pub fn new(field_name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            category: category.into(),
            current: None,
            last_change_ms: None,
        }
    }

    /// Feed one reading taken at `timestamp_ms`.
    pub fn observe(&mut self, value: bool, timestamp_ms: u64) -> Option<StateChangeEvent> {
        let previous = self.current.replace(value)?;
        if previous == value {
            return None;
        }

        self.last_change_ms = Some(timestamp_ms);
        Some(StateChangeEvent {
            timestamp_ms,
            field_name: self.field_name.clone(),
            previous_value: previous,
            new_value: value,
            category: self.category.clone(),
        })
    }

    /// Forget the current state; the next observation is treated as the first.
    pub fn reset(&mut self) {
        self.current = None;
        self.last_change_ms = None;
    }

    pub fn current(&self) -> Option<bool> {
        self.current
    }

    pub fn last_change_ms(&self) -> Option<u64> {
        self.last_change_ms
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn category(&self) -> &str {
        &self.category
    }
}
