//! Combined recommendation score over availability and enforcement risk.
//!
//! Fixed score tables, not a learned model: availability sets the base,
//! predicted ticket risk subtracts a penalty. When only one predictor is
//! loaded the score falls back to a single-axis table.

use crate::error::RequestError;
use crate::model::RiskLevel;
use crate::prediction::occupancy::{AvailabilityLevel, OccupancyPrediction, predict_zone_occupancy};
use crate::prediction::risk::{RiskAssessment, assess_enforcement_risk};
use crate::state::ServiceState;
use time::PrimitiveDateTime;

#[derive(Debug, Clone)]
pub struct Recommendation {
    pub score: u32,
    pub text: &'static str,
    pub should_park: bool,
}

impl Recommendation {
    fn from_score(score: u32, text: &'static str) -> Self {
        Self {
            score,
            text,
            should_park: score >= 50,
        }
    }
}

#[derive(Debug)]
pub struct RecommendReport {
    pub occupancy: Option<OccupancyPrediction>,
    pub risk: Option<RiskAssessment>,
    pub recommendation: Recommendation,
}

fn availability_base(level: AvailabilityLevel) -> u32 {
    match level {
        AvailabilityLevel::Excellent => 100,
        AvailabilityLevel::Good => 80,
        AvailabilityLevel::Moderate => 60,
        AvailabilityLevel::Low => 40,
        AvailabilityLevel::VeryLow => 20,
        AvailabilityLevel::Unknown => 50,
    }
}

fn risk_penalty(level: RiskLevel) -> u32 {
    match level {
        RiskLevel::VeryLow => 0,
        RiskLevel::Low => 10,
        RiskLevel::Moderate => 25,
        RiskLevel::High => 50,
        RiskLevel::VeryHigh => 70,
        RiskLevel::Unknown => 25,
    }
}

fn combined(availability: AvailabilityLevel, risk: RiskLevel) -> Recommendation {
    let score = availability_base(availability).saturating_sub(risk_penalty(risk));
    let text = if score >= 80 {
        "EXCELLENT CHOICE - Good availability and low ticket risk"
    } else if score >= 60 {
        "GOOD OPTION - Decent availability, acceptable risk"
    } else if score >= 40 {
        "RISKY - Limited availability or moderate ticket risk"
    } else if score >= 20 {
        "NOT RECOMMENDED - Poor availability or high ticket risk"
    } else {
        "AVOID - Very poor availability and/or very high ticket risk"
    };
    Recommendation::from_score(score, text)
}

fn availability_only(availability: AvailabilityLevel) -> Recommendation {
    let score = availability_base(availability);
    let text = if score >= 80 {
        "EXCELLENT AVAILABILITY - Plenty of spaces likely available"
    } else if score >= 60 {
        "GOOD AVAILABILITY - Should find parking with moderate search"
    } else if score >= 40 {
        "LIMITED AVAILABILITY - May take some time to find parking"
    } else {
        "LOW AVAILABILITY - Very limited parking expected"
    };
    Recommendation::from_score(score, text)
}

fn risk_only(risk: RiskLevel) -> Recommendation {
    let score = match risk {
        RiskLevel::VeryLow => 100,
        RiskLevel::Low => 75,
        RiskLevel::Moderate => 50,
        RiskLevel::High => 25,
        RiskLevel::VeryHigh => 0,
        RiskLevel::Unknown => 50,
    };
    let text = if score >= 75 {
        "LOW TICKET RISK - Safe to park here"
    } else if score >= 50 {
        "MODERATE TICKET RISK - Exercise caution"
    } else if score >= 25 {
        "HIGH TICKET RISK - Consider alternative parking"
    } else {
        "VERY HIGH TICKET RISK - Not recommended"
    };
    Recommendation::from_score(score, text)
}

/// Full recommendation for a zone over a parking window. Runs whichever
/// predictors are loaded and scores on what it gets.
pub fn recommend(
    state: &ServiceState,
    zone: &str,
    dt: PrimitiveDateTime,
    duration_hours: u32,
) -> Result<RecommendReport, RequestError> {
    if duration_hours == 0 {
        return Err(RequestError::InvalidDuration);
    }
    if !state.occupancy_enabled() && !state.enforcement_enabled() {
        return Err(RequestError::NoModels);
    }

    let occupancy = if state.occupancy_enabled() {
        Some(predict_zone_occupancy(state, zone, dt)?)
    } else {
        None
    };
    let risk = if state.enforcement_enabled() {
        Some(assess_enforcement_risk(state, zone, dt, duration_hours)?)
    } else {
        None
    };

    let recommendation = match (&occupancy, &risk) {
        (Some(occ), Some(risk)) => combined(occ.level, risk.level),
        (Some(occ), None) => availability_only(occ.level),
        (None, Some(risk)) => risk_only(risk.level),
        (None, None) => unreachable!("at least one model is enabled"),
    };

    Ok(RecommendReport {
        occupancy,
        risk,
        recommendation,
    })
}
