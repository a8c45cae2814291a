//! Occupancy lag/rolling statistics.
//!
//! These are hour-of-day aggregates over the zone's entire history, not
//! lookups of a specific past timestamp: `lag_24` is the long-run average at
//! the current hour, and `lag_1` the long-run average one hour earlier. The
//! occupancy model was trained against exactly these aggregates, so the
//! semantics are load-bearing.

use crate::data::tables::{OccupancyHistory, OccupancyRecord};
use crate::features::FeatureVector;
use time::PrimitiveDateTime;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OccupancyLagFeatures {
    pub lag_1: f64,
    pub lag_24: f64,
    pub rolling_3: f64,
    pub rolling_24: f64,
    pub dow_hour_avg: f64,
}

impl OccupancyLagFeatures {
    pub fn apply(&self, features: &mut FeatureVector) {
        features.insert("occupancy_lag_1", self.lag_1);
        features.insert("occupancy_lag_24", self.lag_24);
        features.insert("occupancy_rolling_3", self.rolling_3);
        features.insert("occupancy_rolling_24", self.rolling_24);
        features.insert("occupancy_dow_hour_avg", self.dow_hour_avg);
    }
}

/// All statistics default to 0.0 when the zone has no history.
pub fn compute(history: &OccupancyHistory, zone: &str, dt: PrimitiveDateTime) -> OccupancyLagFeatures {
    let rows = history.zone_rows(zone);
    if rows.is_empty() {
        return OccupancyLagFeatures::default();
    }

    let hour = dt.hour();
    let day_of_week = dt.weekday().number_days_from_monday();
    let prev_hour = (hour + 23) % 24;
    let rolling_hours = [(hour + 23) % 24, (hour + 22) % 24, (hour + 21) % 24];

    let lag_1 = mean_where(rows, |r| r.hour == prev_hour).unwrap_or(0.0);
    let lag_24 = mean_where(rows, |r| r.hour == hour).unwrap_or(0.0);
    let rolling_3 = mean_where(rows, |r| rolling_hours.contains(&r.hour)).unwrap_or(0.0);
    let rolling_24 = mean_where(rows, |_| true).unwrap_or(0.0);
    let dow_hour_avg =
        mean_where(rows, |r| r.day_of_week == day_of_week && r.hour == hour).unwrap_or(lag_24);

    OccupancyLagFeatures {
        lag_1,
        lag_24,
        rolling_3,
        rolling_24,
        dow_hour_avg,
    }
}

fn mean_where(rows: &[OccupancyRecord], pred: impl Fn(&OccupancyRecord) -> bool) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for row in rows.iter().filter(|r| pred(r)) {
        sum += row.occupancy;
        count += 1;
    }
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn row(hour: u8, day_of_week: u8, occupancy: f64) -> (String, OccupancyRecord) {
        (
            "North".to_string(),
            OccupancyRecord {
                hour,
                day_of_week,
                occupancy,
            },
        )
    }

    #[test]
    fn empty_history_defaults_everything_to_zero() {
        let history = OccupancyHistory::default();
        let features = compute(&history, "North", datetime!(2026-04-03 10:00:00));
        assert_eq!(features, OccupancyLagFeatures::default());
    }

    #[test]
    fn lags_are_hour_of_day_averages() {
        let history = OccupancyHistory::from_rows(vec![
            row(9, 0, 10.0),
            row(9, 1, 30.0),
            row(10, 0, 50.0),
        ]);
        // Friday 10:00.
        let features = compute(&history, "North", datetime!(2026-04-03 10:00:00));

        assert_eq!(features.lag_1, 20.0); // mean at hour 9
        assert_eq!(features.lag_24, 50.0); // mean at hour 10
        assert_eq!(features.rolling_24, 30.0); // mean over all rows
    }

    #[test]
    fn lag_1_wraps_around_midnight() {
        let history = OccupancyHistory::from_rows(vec![row(23, 0, 8.0), row(0, 0, 2.0)]);
        let features = compute(&history, "North", datetime!(2026-04-03 00:00:00));
        assert_eq!(features.lag_1, 8.0);
    }

    #[test]
    fn rolling_3_covers_previous_three_hours() {
        let history = OccupancyHistory::from_rows(vec![
            row(7, 0, 10.0),
            row(8, 0, 20.0),
            row(9, 0, 30.0),
            row(10, 0, 99.0), // current hour, excluded
            row(6, 0, 99.0),  // four hours back, excluded
        ]);
        let features = compute(&history, "North", datetime!(2026-04-03 10:00:00));
        assert_eq!(features.rolling_3, 20.0);
    }

    #[test]
    fn dow_hour_avg_prefers_exact_match() {
        // 2026-04-03 is a Friday (dow 4).
        let history = OccupancyHistory::from_rows(vec![row(10, 4, 40.0), row(10, 0, 80.0)]);
        let features = compute(&history, "North", datetime!(2026-04-03 10:00:00));
        assert_eq!(features.dow_hour_avg, 40.0);
    }

    #[test]
    fn dow_hour_avg_falls_back_to_lag_24() {
        let history = OccupancyHistory::from_rows(vec![row(10, 0, 80.0)]);
        // Friday: no dow-4 rows at hour 10.
        let features = compute(&history, "North", datetime!(2026-04-03 10:00:00));
        assert_eq!(features.dow_hour_avg, features.lag_24);
        assert_eq!(features.dow_hour_avg, 80.0);
    }

    #[test]
    fn other_zones_history_is_ignored() {
        let history = OccupancyHistory::from_rows(vec![(
            "South".to_string(),
            OccupancyRecord {
                hour: 10,
                day_of_week: 4,
                occupancy: 70.0,
            },
        )]);
        let features = compute(&history, "North", datetime!(2026-04-03 10:00:00));
        assert_eq!(features, OccupancyLagFeatures::default());
    }
}
