//! Schedule table extraction.

use poolwatch_types::{ScheduleEntry, SchedulesMetrics};

use super::classify::classify;
use super::locate::is_placeholder;
use crate::markup::{tables, Table};

/// A table is the schedule table if any header cell contains one of these
/// words.
const HEADER_KEYWORDS: &[&str] = &[
    "name", "schedule", "program", "start", "end", "stop", "days", "enabled", "status",
];

// Column positions of the fixed record.
const NAME: usize = 0;
const START: usize = 1;
const END: usize = 2;
const DAYS: usize = 3;
const ENABLED: usize = 4;

pub fn extract_schedules(doc: &str) -> SchedulesMetrics {
    let Some(table) = tables(doc).into_iter().find(is_schedule_table) else {
        return SchedulesMetrics::default();
    };

    SchedulesMetrics {
        entries: table.rows.iter().filter_map(|row| entry(row)).collect(),
        error: None,
    }
}

fn is_schedule_table(table: &Table) -> bool {
    table.headers.iter().any(|header| {
        header
            .to_ascii_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| HEADER_KEYWORDS.contains(&word))
    })
}

fn entry(row: &[String]) -> Option<ScheduleEntry> {
    let cell = |i: usize| {
        row.get(i)
            .map(|c| c.trim())
            .filter(|c| !is_placeholder(c))
            .map(str::to_string)
    };

    Some(ScheduleEntry {
        name: cell(NAME)?,
        start_time: cell(START)?,
        end_time: cell(END),
        days: cell(DAYS),
        enabled: cell(ENABLED).and_then(|c| classify(&c).as_bool()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <table class="nav"><tr><td>Home</td><td>Schedules</td></tr></table>
        <table id="schedules">
          <tr><th>Program</th><th>Start Time</th><th>End Time</th><th>Days</th><th>Status</th></tr>
          <tr><td>Filter</td><td>08:00</td><td>16:00</td><td>Daily</td><td>Enabled</td></tr>
          <tr><td>Spa Heat</td><td>18:30</td><td>--</td><td>Sat, Sun</td><td>Disabled</td></tr>
          <tr><td></td><td>06:00</td><td>07:00</td><td>Mon</td><td>Enabled</td></tr>
          <tr><td>Cleaner</td><td>--</td><td>10:00</td><td>Tue</td><td>Enabled</td></tr>
          <tr><td>Lights</td><td>20:00</td></tr>
        </table>"#;

    #[test]
    fn picks_table_by_header_keywords() {
        let m = extract_schedules(PAGE);
        let names: Vec<_> = m.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Filter", "Spa Heat", "Lights"]);
    }

    #[test]
    fn maps_columns_positionally() {
        let m = extract_schedules(PAGE);

        let filter = &m.entries[0];
        assert_eq!(filter.start_time, "08:00");
        assert_eq!(filter.end_time.as_deref(), Some("16:00"));
        assert_eq!(filter.days.as_deref(), Some("Daily"));
        assert_eq!(filter.enabled, Some(true));

        let spa = &m.entries[1];
        assert_eq!(spa.end_time, None);
        assert_eq!(spa.enabled, Some(false));

        let lights = &m.entries[2];
        assert_eq!(lights.end_time, None);
        assert_eq!(lights.days, None);
        assert_eq!(lights.enabled, None);
    }

    #[test]
    fn no_matching_table_is_empty() {
        let doc = "<table><tr><th>Pump</th><th>Speed</th></tr><tr><td>1</td><td>2</td></tr></table>";
        assert_eq!(extract_schedules(doc), SchedulesMetrics::default());
        assert_eq!(extract_schedules(""), SchedulesMetrics::default());
    }
}
