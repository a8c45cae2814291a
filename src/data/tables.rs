//! Read-only historical tables loaded once at startup: academic calendar,
//! game days, daily weather, occupancy history, and enforcement history.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use time::{Date, PrimitiveDateTime};

/// The five recognized academic calendar event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum EventType {
    #[serde(rename = "Dead_Week")]
    DeadWeek,
    #[serde(rename = "Finals_Week")]
    FinalsWeek,
    #[serde(rename = "Spring_Break")]
    SpringBreak,
    #[serde(rename = "Thanksgiving_Break")]
    ThanksgivingBreak,
    #[serde(rename = "Winter_Break")]
    WinterBreak,
}

#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub event_type: EventType,
    pub start: Date,
    pub end: Date,
}

#[derive(Debug, Default)]
pub struct CalendarTable {
    events: Vec<CalendarEvent>,
}

impl CalendarTable {
    pub fn new(events: Vec<CalendarEvent>) -> Self {
        Self { events }
    }

    /// True when `date` falls inside any interval of the given category,
    /// inclusive on both ends.
    pub fn is_active(&self, event_type: EventType, date: Date) -> bool {
        self.events
            .iter()
            .any(|e| e.event_type == event_type && e.start <= date && date <= e.end)
    }
}

#[derive(Debug, Default)]
pub struct GameDays {
    dates: HashSet<Date>,
}

impl GameDays {
    pub fn new(dates: impl IntoIterator<Item = Date>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    pub fn is_game_day(&self, date: Date) -> bool {
        self.dates.contains(&date)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherDay {
    pub temp_mean_f: f64,
    pub precipitation_inches: f64,
    pub is_rainy: bool,
    pub is_snowy: bool,
    pub is_cold: bool,
    pub is_hot: bool,
    pub is_windy: bool,
}

impl WeatherDay {
    /// Neutral profile used when a date has no weather row.
    pub fn neutral() -> Self {
        Self {
            temp_mean_f: 50.0,
            precipitation_inches: 0.0,
            is_rainy: false,
            is_snowy: false,
            is_cold: false,
            is_hot: false,
            is_windy: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct WeatherTable {
    days: HashMap<Date, WeatherDay>,
}

impl WeatherTable {
    pub fn new(days: HashMap<Date, WeatherDay>) -> Self {
        Self { days }
    }

    pub fn lookup(&self, date: Date) -> Option<&WeatherDay> {
        self.days.get(&date)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// One hour-of-day occupancy observation. Only used in aggregate form, never
/// as an exact-timestamp lookup.
#[derive(Debug, Clone, Copy)]
pub struct OccupancyRecord {
    pub hour: u8,
    pub day_of_week: u8,
    pub occupancy: f64,
}

#[derive(Debug, Default)]
pub struct OccupancyHistory {
    by_zone: HashMap<String, Vec<OccupancyRecord>>,
}

impl OccupancyHistory {
    pub fn from_rows(rows: impl IntoIterator<Item = (String, OccupancyRecord)>) -> Self {
        let mut by_zone: HashMap<String, Vec<OccupancyRecord>> = HashMap::new();
        for (zone, record) in rows {
            by_zone.entry(zone).or_default().push(record);
        }
        Self { by_zone }
    }

    pub fn zone_rows(&self, zone: &str) -> &[OccupancyRecord] {
        self.by_zone.get(zone).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn zone_count(&self) -> usize {
        self.by_zone.len()
    }
}

/// One hourly enforcement observation for a zone-or-lot key.
#[derive(Debug, Clone)]
pub struct EnforcementRecord {
    pub timestamp: PrimitiveDateTime,
    pub day_of_week: u8,
    pub hour: u8,
    pub tickets_issued: u32,
    pub lpr_scans: f64,
    pub amp_sessions: f64,
    pub unpaid_estimate: f64,
}

impl EnforcementRecord {
    pub fn has_ticket(&self) -> bool {
        self.tickets_issued > 0
    }
}

/// Enforcement history grouped by lookup key, each group sorted by timestamp
/// for exact-lag lookups. The cross-key median enforcement rate backing the
/// high-risk indicator is fixed at build time; the tables never change while
/// serving.
#[derive(Debug, Default)]
pub struct EnforcementHistory {
    by_key: HashMap<String, Vec<EnforcementRecord>>,
    median_key_enforcement: f64,
}

impl EnforcementHistory {
    pub fn from_rows(rows: impl IntoIterator<Item = (String, EnforcementRecord)>) -> Self {
        let mut by_key: HashMap<String, Vec<EnforcementRecord>> = HashMap::new();
        for (key, record) in rows {
            by_key.entry(key).or_default().push(record);
        }
        for records in by_key.values_mut() {
            records.sort_by_key(|r| r.timestamp);
        }

        let mut rates: Vec<f64> = by_key
            .values()
            .map(|records| mean_ticket_rate(records))
            .collect();
        rates.sort_by(|a, b| a.total_cmp(b));
        let median_key_enforcement = if rates.is_empty() {
            0.0
        } else {
            quantile_linear(&rates, 0.5)
        };

        Self {
            by_key,
            median_key_enforcement,
        }
    }

    /// Rows for a zone-or-lot key, sorted by timestamp ascending; empty for
    /// unknown keys.
    pub fn key_rows(&self, key: &str) -> &[EnforcementRecord] {
        self.by_key.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Row at an exact timestamp, if one exists for the key.
    pub fn row_at(&self, key: &str, timestamp: PrimitiveDateTime) -> Option<&EnforcementRecord> {
        let rows = self.key_rows(key);
        rows.binary_search_by_key(&timestamp, |r| r.timestamp)
            .ok()
            .map(|idx| &rows[idx])
    }

    /// Median, across all keys, of each key's (tickets_issued > 0) rate.
    pub fn median_key_enforcement(&self) -> f64 {
        self.median_key_enforcement
    }

    pub fn key_count(&self) -> usize {
        self.by_key.len()
    }
}

pub fn mean_ticket_rate(records: &[EnforcementRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let hits = records.iter().filter(|r| r.has_ticket()).count();
    hits as f64 / records.len() as f64
}

/// Linear-interpolation quantile over sorted values, matching the pandas
/// default. `values` must be non-empty and ascending.
pub fn quantile_linear(values: &[f64], q: f64) -> f64 {
    debug_assert!(!values.is_empty());
    if values.len() == 1 {
        return values[0];
    }
    let pos = q.clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return values[lo];
    }
    values[lo] + (values[hi] - values[lo]) * (pos - lo as f64)
}
