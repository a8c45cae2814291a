//! Feature construction: turning a `(zone-or-lot key, timestamp)` pair into
//! the numeric vector the predictors were trained on.

use crate::data::capacity::CapacityMap;
use crate::data::tables::{
    CalendarTable, EnforcementHistory, EventType, GameDays, OccupancyHistory, WeatherDay,
    WeatherTable,
};
use crate::model::ZoneEncoder;
use time::PrimitiveDateTime;

pub mod enforcement_lags;
pub mod occupancy_lags;

/// Capacity fed to the models when the key is unknown to the capacity map.
pub const UNKNOWN_ZONE_CAPACITY: f64 = 100.0;

/// Ordered mapping of named numeric fields. Every schema field must resolve;
/// missing names default to 0.0 when the row is materialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    fields: Vec<(&'static str, f64)>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn insert(&mut self, name: &'static str, value: f64) {
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// Materializes the vector in the order a model's schema dictates,
    /// default-filling absent fields with 0.0.
    pub fn to_row(&self, schema: &[String]) -> Vec<f64> {
        schema
            .iter()
            .map(|name| self.get(name).unwrap_or(0.0))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Fixed time-of-day buckets. The integer codes come from the fitted label
/// encoding and are alphabetical, not chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
    LateNight,
}

impl TimeOfDay {
    pub fn from_hour(hour: u8) -> Self {
        match hour {
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=21 => Self::Evening,
            22..=23 => Self::Night,
            _ => Self::LateNight,
        }
    }

    pub fn code(self) -> f64 {
        match self {
            Self::Afternoon => 0.0,
            Self::Evening => 1.0,
            Self::LateNight => 2.0,
            Self::Morning => 3.0,
            Self::Night => 4.0,
        }
    }
}

/// Assembles feature vectors from the read-only tables. Borrowed out of
/// `ServiceState` per request; holds no mutable state.
#[derive(Debug, Clone, Copy)]
pub struct FeatureBuilder<'a> {
    calendar: &'a CalendarTable,
    games: &'a GameDays,
    weather: &'a WeatherTable,
    capacities: &'a CapacityMap,
    occupancy_history: &'a OccupancyHistory,
    enforcement_history: &'a EnforcementHistory,
    encoder: &'a ZoneEncoder,
}

impl<'a> FeatureBuilder<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        calendar: &'a CalendarTable,
        games: &'a GameDays,
        weather: &'a WeatherTable,
        capacities: &'a CapacityMap,
        occupancy_history: &'a OccupancyHistory,
        enforcement_history: &'a EnforcementHistory,
        encoder: &'a ZoneEncoder,
    ) -> Self {
        Self {
            calendar,
            games,
            weather,
            capacities,
            occupancy_history,
            enforcement_history,
            encoder,
        }
    }

    /// Builds the full feature vector for a zone-or-lot key at a timestamp.
    pub fn build(&self, key: &str, dt: PrimitiveDateTime) -> FeatureVector {
        let mut features = FeatureVector::new();
        let date = dt.date();
        let day_of_week = dt.weekday().number_days_from_monday();

        features.insert("hour", f64::from(dt.hour()));
        features.insert("day_of_week", f64::from(day_of_week));
        features.insert("month", f64::from(u8::from(dt.month())));
        features.insert("year", f64::from(dt.year()));
        features.insert("is_weekend", flag(day_of_week >= 5));
        features.insert("time_of_day_code", TimeOfDay::from_hour(dt.hour()).code());

        features.insert("is_game_day", flag(self.games.is_game_day(date)));

        let spring = self.calendar.is_active(EventType::SpringBreak, date);
        let thanksgiving = self.calendar.is_active(EventType::ThanksgivingBreak, date);
        let winter = self.calendar.is_active(EventType::WinterBreak, date);
        features.insert(
            "is_dead_week",
            flag(self.calendar.is_active(EventType::DeadWeek, date)),
        );
        features.insert(
            "is_finals_week",
            flag(self.calendar.is_active(EventType::FinalsWeek, date)),
        );
        features.insert("is_spring_break", flag(spring));
        features.insert("is_thanksgiving_break", flag(thanksgiving));
        features.insert("is_winter_break", flag(winter));
        features.insert("is_any_break", flag(spring || thanksgiving || winter));

        let neutral = WeatherDay::neutral();
        let weather = self.weather.lookup(date).unwrap_or(&neutral);
        features.insert("temp_mean_f", weather.temp_mean_f);
        features.insert("precipitation_inches", weather.precipitation_inches);
        features.insert("is_rainy", flag(weather.is_rainy));
        features.insert("is_snowy", flag(weather.is_snowy));
        features.insert("is_cold", flag(weather.is_cold));
        features.insert("is_hot", flag(weather.is_hot));
        features.insert("is_windy", flag(weather.is_windy));

        features.insert(
            "max_capacity",
            self.capacities
                .zone_capacity(key)
                .unwrap_or(UNKNOWN_ZONE_CAPACITY),
        );

        // Unseen categories encode to 0 rather than failing.
        features.insert(
            "zone_encoded",
            self.encoder.encode(key).map(|c| c as f64).unwrap_or(0.0),
        );

        occupancy_lags::compute(self.occupancy_history, key, dt).apply(&mut features);
        enforcement_lags::lag_features(self.enforcement_history, key, dt).apply(&mut features);
        enforcement_lags::risk_features(self.enforcement_history, key, dt).apply(&mut features);

        features
    }
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}
