//! Dataset loading. The serving tables arrive as one JSON bundle produced by
//! the offline pipeline; CSV wrangling happens there, not here.

use crate::data::capacity::{CapacityError, CapacityMap, LotSpec};
use crate::data::tables::{
    CalendarEvent, CalendarTable, EnforcementHistory, EnforcementRecord, EventType, GameDays,
    OccupancyHistory, OccupancyRecord, WeatherDay, WeatherTable,
};
use crate::timefmt;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid dataset: {0}")]
    Invalid(String),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
}

#[derive(Debug, Deserialize)]
struct DatasetFile {
    calendar: Vec<CalendarRow>,
    games: Vec<String>,
    weather: Vec<WeatherRow>,
    occupancy_history: Vec<OccupancyRow>,
    enforcement_history: Vec<EnforcementRow>,
    lots: Vec<LotRow>,
    #[serde(default)]
    instrumented_capacities: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct CalendarRow {
    event_type: EventType,
    start_date: String,
    end_date: String,
}

#[derive(Debug, Deserialize)]
struct WeatherRow {
    date: String,
    temp_mean_f: f64,
    precipitation_inches: f64,
    #[serde(default)]
    is_rainy: bool,
    #[serde(default)]
    is_snowy: bool,
    #[serde(default)]
    is_cold: bool,
    #[serde(default)]
    is_hot: bool,
    #[serde(default)]
    is_windy: bool,
}

#[derive(Debug, Deserialize)]
struct OccupancyRow {
    zone: String,
    hour: u8,
    day_of_week: u8,
    occupancy: f64,
}

#[derive(Debug, Deserialize)]
struct EnforcementRow {
    key: String,
    timestamp: String,
    tickets_issued: u32,
    #[serde(default)]
    lpr_scans: f64,
    #[serde(default)]
    amp_sessions: f64,
    #[serde(default)]
    unpaid_estimate: f64,
}

#[derive(Debug, Deserialize)]
struct LotRow {
    number: u32,
    zone_name: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    zone_type: String,
    capacity: f64,
    #[serde(default)]
    instrumented_zones: Vec<String>,
}

/// Everything the service reads at runtime, assembled once.
#[derive(Debug)]
pub struct Dataset {
    pub calendar: CalendarTable,
    pub games: GameDays,
    pub weather: WeatherTable,
    pub occupancy_history: OccupancyHistory,
    pub enforcement_history: EnforcementHistory,
    pub capacities: CapacityMap,
}

pub fn load_dataset_from_path(path: impl AsRef<Path>) -> Result<Dataset, DatasetError> {
    let contents = std::fs::read_to_string(path)?;
    let file: DatasetFile = serde_json::from_str(&contents)?;
    build_dataset(file)
}

fn build_dataset(file: DatasetFile) -> Result<Dataset, DatasetError> {
    let mut events = Vec::with_capacity(file.calendar.len());
    for row in file.calendar {
        events.push(CalendarEvent {
            event_type: row.event_type,
            start: parse_date(&row.start_date)?,
            end: parse_date(&row.end_date)?,
        });
    }

    let mut game_dates = Vec::with_capacity(file.games.len());
    for date in &file.games {
        game_dates.push(parse_date(date)?);
    }

    let mut weather_days = HashMap::with_capacity(file.weather.len());
    for row in file.weather {
        weather_days.insert(
            parse_date(&row.date)?,
            WeatherDay {
                temp_mean_f: row.temp_mean_f,
                precipitation_inches: row.precipitation_inches,
                is_rainy: row.is_rainy,
                is_snowy: row.is_snowy,
                is_cold: row.is_cold,
                is_hot: row.is_hot,
                is_windy: row.is_windy,
            },
        );
    }

    let mut occupancy_rows = Vec::with_capacity(file.occupancy_history.len());
    for row in file.occupancy_history {
        if row.hour >= 24 || row.day_of_week >= 7 {
            return Err(DatasetError::Invalid(format!(
                "occupancy row for zone '{}' has hour {} / day_of_week {}",
                row.zone, row.hour, row.day_of_week
            )));
        }
        occupancy_rows.push((
            row.zone,
            OccupancyRecord {
                hour: row.hour,
                day_of_week: row.day_of_week,
                occupancy: row.occupancy,
            },
        ));
    }

    let mut enforcement_rows = Vec::with_capacity(file.enforcement_history.len());
    for row in file.enforcement_history {
        let timestamp = timefmt::parse_datetime(&row.timestamp).map_err(|e| {
            DatasetError::Invalid(format!(
                "enforcement row for key '{}' has bad timestamp '{}': {e}",
                row.key, row.timestamp
            ))
        })?;
        enforcement_rows.push((
            row.key,
            EnforcementRecord {
                timestamp,
                day_of_week: timestamp.weekday().number_days_from_monday(),
                hour: timestamp.hour(),
                tickets_issued: row.tickets_issued,
                lpr_scans: row.lpr_scans,
                amp_sessions: row.amp_sessions,
                unpaid_estimate: row.unpaid_estimate,
            },
        ));
    }

    let specs = file
        .lots
        .into_iter()
        .map(|row| LotSpec {
            number: row.number,
            zone_name: row.zone_name,
            location: row.location,
            zone_type: row.zone_type,
            capacity: row.capacity,
            instrumented_zones: row.instrumented_zones,
        })
        .collect();
    let capacities = CapacityMap::build(specs, &file.instrumented_capacities)?;

    Ok(Dataset {
        calendar: CalendarTable::new(events),
        games: GameDays::new(game_dates),
        weather: WeatherTable::new(weather_days),
        occupancy_history: OccupancyHistory::from_rows(occupancy_rows),
        enforcement_history: EnforcementHistory::from_rows(enforcement_rows),
        capacities,
    })
}

fn parse_date(input: &str) -> Result<time::Date, DatasetError> {
    timefmt::parse_date(input)
        .map_err(|e| DatasetError::Invalid(format!("bad date '{input}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "calendar": [
            {"event_type": "Spring_Break", "start_date": "2026-03-14", "end_date": "2026-03-22"}
        ],
        "games": ["2026-09-05"],
        "weather": [
            {"date": "2026-04-03", "temp_mean_f": 61.0, "precipitation_inches": 0.1, "is_rainy": true}
        ],
        "occupancy_history": [
            {"zone": "North A", "hour": 10, "day_of_week": 2, "occupancy": 38.5}
        ],
        "enforcement_history": [
            {"key": "North", "timestamp": "2026-04-03T10:00:00", "tickets_issued": 1,
             "lpr_scans": 12.0, "amp_sessions": 8.0, "unpaid_estimate": 3.0}
        ],
        "lots": [
            {"number": 1, "zone_name": "North", "location": "North Garage", "zone_type": "Paid",
             "capacity": 50.0, "instrumented_zones": ["North A"]}
        ],
        "instrumented_capacities": {"North A": 45.0}
    }"#;

    #[test]
    fn minimal_dataset_builds_all_tables() -> Result<(), DatasetError> {
        let file: DatasetFile = serde_json::from_str(MINIMAL)?;
        let dataset = build_dataset(file)?;

        assert_eq!(dataset.occupancy_history.zone_rows("North A").len(), 1);
        assert_eq!(dataset.enforcement_history.key_rows("North").len(), 1);
        assert_eq!(dataset.capacities.zone_capacity("North"), Some(50.0));
        assert!(dataset.games.is_game_day(
            crate::timefmt::parse_date("2026-09-05").expect("date")
        ));
        Ok(())
    }

    #[test]
    fn derived_dow_and_hour_come_from_the_timestamp() -> Result<(), DatasetError> {
        let file: DatasetFile = serde_json::from_str(MINIMAL)?;
        let dataset = build_dataset(file)?;

        // 2026-04-03 is a Friday.
        let row = &dataset.enforcement_history.key_rows("North")[0];
        assert_eq!(row.day_of_week, 4);
        assert_eq!(row.hour, 10);
        Ok(())
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let broken = MINIMAL.replace("2026-04-03T10:00:00", "04/03/2026 10am");
        let file: DatasetFile = serde_json::from_str(&broken).expect("parse json");
        assert!(matches!(build_dataset(file), Err(DatasetError::Invalid(_))));
    }

    #[test]
    fn out_of_range_hour_is_rejected() {
        let broken = MINIMAL.replace("\"hour\": 10", "\"hour\": 24");
        let file: DatasetFile = serde_json::from_str(&broken).expect("parse json");
        assert!(matches!(build_dataset(file), Err(DatasetError::Invalid(_))));
    }

    #[test]
    fn missing_dataset_file_returns_read_error() {
        let result = load_dataset_from_path("/definitely/not/here.json");
        assert!(matches!(result, Err(DatasetError::Read(_))));
    }
}
