//! Occupancy prediction: instrumented model calls where the sensor network
//! covers a lot, a deterministic time-pattern heuristic everywhere else, and
//! zone-level aggregation over member lots.

use crate::data::capacity::Lot;
use crate::error::RequestError;
use crate::state::ServiceState;
use serde::Serialize;
use time::PrimitiveDateTime;
use tracing::warn;

/// Five-tier availability bucket derived from percent-full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityLevel {
    Excellent,
    Good,
    Moderate,
    Low,
    VeryLow,
    Unknown,
}

impl AvailabilityLevel {
    pub fn from_occupancy(occupancy: f64, capacity: f64) -> Self {
        if capacity <= 0.0 {
            return Self::Unknown;
        }
        let percent_full = occupancy / capacity * 100.0;
        if percent_full >= 95.0 {
            Self::VeryLow
        } else if percent_full >= 80.0 {
            Self::Low
        } else if percent_full >= 60.0 {
            Self::Moderate
        } else if percent_full >= 40.0 {
            Self::Good
        } else {
            Self::Excellent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Moderate => "MODERATE",
            Self::Low => "LOW",
            Self::VeryLow => "VERY_LOW",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Where an occupancy figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancySource {
    Instrumented,
    TimePattern,
    CapacityOnly,
}

#[derive(Debug, Clone)]
pub struct OccupancyPrediction {
    pub occupancy: f64,
    pub capacity: f64,
    pub available_spaces: f64,
    pub percent_full: f64,
    pub level: AvailabilityLevel,
    pub source: Option<OccupancySource>,
}

impl OccupancyPrediction {
    fn from_raw(occupancy: f64, capacity: f64, source: Option<OccupancySource>) -> Self {
        let percent_full = if capacity > 0.0 {
            occupancy / capacity * 100.0
        } else {
            0.0
        };
        Self {
            occupancy,
            capacity,
            available_spaces: (capacity - occupancy).max(0.0),
            percent_full,
            level: AvailabilityLevel::from_occupancy(occupancy, capacity),
            source,
        }
    }
}

/// Per-lot outcome inside a zone aggregate. Failures still count the lot's
/// capacity; they just contribute no occupancy.
#[derive(Debug, Clone, Copy, PartialEq)]
enum LotOutcome {
    Predicted(f64),
    Heuristic(f64),
    Failed,
}

impl LotOutcome {
    fn occupancy(self) -> f64 {
        match self {
            Self::Predicted(v) | Self::Heuristic(v) => v,
            Self::Failed => 0.0,
        }
    }
}

/// Zone-level occupancy: aggregates member lots for aggregate zone labels,
/// or scores the zone directly when it is a leaf category the model was
/// trained on.
pub fn predict_zone_occupancy(
    state: &ServiceState,
    zone: &str,
    dt: PrimitiveDateTime,
) -> Result<OccupancyPrediction, RequestError> {
    let bundle = state
        .occupancy
        .as_ref()
        .ok_or(RequestError::ModelDisabled("occupancy"))?;
    let builder = state.feature_builder();

    if state.capacities.is_aggregate_zone(zone) {
        let mut total_occupancy = 0.0;
        let mut total_capacity = 0.0;
        for lot in state.capacities.zone_lots(zone) {
            let outcome = if lot.has_instrumented_coverage() && lot.is_paid_hourly() {
                let sub_zone = lot.instrumented_zone.as_deref().unwrap_or(&lot.zone_name);
                let features = builder.build(sub_zone, dt);
                match bundle.predictor.predict(&features) {
                    Ok(value) => LotOutcome::Predicted(value.clamp(0.0, lot.capacity)),
                    Err(e) => {
                        warn!(lot = lot.number, error = %e, "lot occupancy prediction failed");
                        LotOutcome::Failed
                    }
                }
            } else {
                LotOutcome::Heuristic(time_pattern_estimate(lot, dt))
            };
            total_occupancy += outcome.occupancy();
            total_capacity += lot.capacity;
        }
        return Ok(OccupancyPrediction::from_raw(
            total_occupancy,
            total_capacity,
            None,
        ));
    }

    // The feature layer substitutes a nominal capacity for unknown zones;
    // the response does not. A zone the map has never heard of reports
    // capacity 0 and an UNKNOWN availability level.
    let capacity = state.capacities.zone_capacity(zone).unwrap_or(0.0);
    let features = builder.build(zone, dt);
    let (occupancy, source) = match bundle.predictor.predict(&features) {
        Ok(value) => (value.clamp(0.0, capacity), OccupancySource::Instrumented),
        Err(e) => {
            warn!(zone, error = %e, "zone occupancy prediction failed");
            (0.0, OccupancySource::CapacityOnly)
        }
    };
    Ok(OccupancyPrediction::from_raw(
        occupancy,
        capacity,
        Some(source),
    ))
}

/// Single-lot detail for the lot endpoint.
#[derive(Debug, Clone)]
pub struct LotDetail {
    pub lot: Lot,
    pub occupancy: Option<OccupancyPrediction>,
}

/// Lot-level occupancy: the instrumented path when the lot qualifies and the
/// model is loaded, otherwise the time-pattern heuristic. Unlike the zone
/// aggregate, an instrumented failure here falls back to the heuristic so the
/// caller still gets a usable estimate.
pub fn predict_lot_detail(
    state: &ServiceState,
    lot_number: u32,
    dt: PrimitiveDateTime,
) -> Result<LotDetail, RequestError> {
    let lot = state
        .capacities
        .lot(lot_number)
        .ok_or(RequestError::UnknownLot(lot_number))?;
    if lot.is_restricted() {
        return Err(RequestError::RestrictedLot {
            number: lot.number,
            zone_type: lot.zone_type.clone(),
        });
    }

    let instrumented = if lot.has_instrumented_coverage() && lot.is_paid_hourly() {
        state.occupancy.as_ref().and_then(|bundle| {
            let sub_zone = lot.instrumented_zone.as_deref().unwrap_or(&lot.zone_name);
            let features = state.feature_builder().build(sub_zone, dt);
            match bundle.predictor.predict(&features) {
                Ok(value) => Some(value.clamp(0.0, lot.capacity)),
                Err(e) => {
                    warn!(lot = lot.number, error = %e, "lot occupancy prediction failed");
                    None
                }
            }
        })
    } else {
        None
    };

    let occupancy = match instrumented {
        Some(value) => Some(OccupancyPrediction::from_raw(
            value,
            lot.capacity,
            Some(OccupancySource::Instrumented),
        )),
        None if lot.capacity > 0.0 => Some(OccupancyPrediction::from_raw(
            time_pattern_estimate(lot, dt).clamp(0.0, lot.capacity),
            lot.capacity,
            Some(OccupancySource::TimePattern),
        )),
        None => None,
    };

    Ok(LotDetail {
        lot: lot.clone(),
        occupancy,
    })
}

/// Deterministic fallback estimate from fixed campus usage patterns, keyed by
/// session period, weekday/weekend, and hour bucket.
pub fn time_pattern_estimate(lot: &Lot, dt: PrimitiveDateTime) -> f64 {
    let month = u8::from(dt.month());
    let day = dt.day();
    let hour = dt.hour();
    let weekend = dt.weekday().number_days_from_monday() >= 5;

    let summer = month == 6 || month == 7 || (month == 8 && day < 20);
    let winter_break = (month == 12 && day > 15) || (month == 1 && day < 10);
    let spring_break = month == 3 && (10..=20).contains(&day);
    let in_session = !(summer || winter_break || spring_break);

    let mut rate = if !in_session {
        if weekend {
            0.02
        } else if (8..=17).contains(&hour) {
            0.05
        } else {
            0.01
        }
    } else if weekend {
        if (9..=17).contains(&hour) { 0.20 } else { 0.10 }
    } else if (8..=17).contains(&hour) {
        0.55
    } else if hour == 7 || hour == 18 || hour == 19 {
        0.35
    } else {
        0.15
    };

    if lot.is_paid_type() {
        rate *= 0.8;
    }
    lot.capacity * rate
}
