//! Multi-hour enforcement risk: one classifier call per hour of the window,
//! compounded under an independence assumption into the probability of at
//! least one ticket.

use crate::error::RequestError;
use crate::model::RiskLevel;
use crate::state::ServiceState;
use time::{Duration, PrimitiveDateTime};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyRisk {
    pub timestamp: PrimitiveDateTime,
    pub probability: f64,
}

#[derive(Debug, Clone)]
pub struct RiskAssessment {
    /// Probability of at least one ticket over the whole window.
    pub probability: f64,
    pub level: RiskLevel,
    pub message: String,
    pub hourly: Vec<HourlyRisk>,
    /// The single worst hour; ties go to the earliest.
    pub peak: HourlyRisk,
    pub duration_hours: u32,
}

/// Scores each hour of the window and compounds the clamped probabilities as
/// `1 − Π(1 − p_i)`. Hourly independence is a stated simplification, not a
/// property of enforcement patrols. A failed hour is logged and skipped; the
/// request only fails when every hour fails.
pub fn assess_enforcement_risk(
    state: &ServiceState,
    key: &str,
    dt: PrimitiveDateTime,
    duration_hours: u32,
) -> Result<RiskAssessment, RequestError> {
    if duration_hours == 0 {
        return Err(RequestError::InvalidDuration);
    }
    let bundle = state
        .enforcement
        .as_ref()
        .ok_or(RequestError::ModelDisabled("enforcement"))?;
    let builder = state.feature_builder();

    let mut hourly = Vec::with_capacity(duration_hours as usize);
    for offset in 0..duration_hours {
        let hour_dt = dt + Duration::hours(i64::from(offset));
        let features = builder.build(key, hour_dt);
        match bundle.predictor.predict(&features) {
            Ok(p) => hourly.push(HourlyRisk {
                timestamp: hour_dt,
                probability: p.clamp(0.0, 1.0),
            }),
            Err(e) => {
                warn!(key, offset, error = %e, "hourly enforcement prediction failed");
            }
        }
    }
    if hourly.is_empty() {
        return Err(RequestError::AllHoursFailed);
    }

    let survive: f64 = hourly.iter().map(|h| 1.0 - h.probability).product();
    let probability = (1.0 - survive).clamp(0.0, 1.0);

    let peak = hourly
        .iter()
        .copied()
        .reduce(|best, h| if h.probability > best.probability { h } else { best })
        .unwrap_or(hourly[0]);

    let level = bundle.thresholds.level(probability);
    Ok(RiskAssessment {
        probability,
        level,
        message: bundle.messages.for_level(level).to_string(),
        hourly,
        peak,
        duration_hours,
    })
}
