//! Prediction pipeline: occupancy aggregation, multi-hour enforcement risk,
//! and the combined recommendation score.

pub mod occupancy;
pub mod recommend;
pub mod risk;

pub use occupancy::{
    AvailabilityLevel, LotDetail, OccupancyPrediction, OccupancySource, predict_lot_detail,
    predict_zone_occupancy, time_pattern_estimate,
};
pub use recommend::{RecommendReport, Recommendation, recommend};
pub use risk::{HourlyRisk, RiskAssessment, assess_enforcement_risk};
