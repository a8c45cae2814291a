//! Request and response bodies for the prediction API.
//!
//! Request fields are all optional so missing-field validation happens in the
//! handlers with explicit error codes instead of serde rejection.

use crate::data::capacity::Lot;
use crate::model::ModelMetadata;
use crate::prediction::{OccupancyPrediction, OccupancySource, RiskAssessment};
use crate::timefmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct OccupancyRequest {
    pub zone: Option<String>,
    pub datetime: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RiskRequest {
    pub zone: Option<String>,
    pub datetime: Option<String>,
    pub duration_hours: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub zone: Option<String>,
    pub datetime: Option<String>,
    pub duration_hours: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LotRequest {
    pub lot_number: Option<u32>,
    pub datetime: Option<String>,
    pub parking_duration_hours: Option<u32>,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    MissingField,
    InvalidTimestamp,
    InvalidDuration,
    ModelDisabled,
    UnknownZone,
    UnknownLot,
    RestrictedLot,
    PredictionFailed,
    InternalError,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ApiErrorResponse {
    pub error_code: ApiErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Ko,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub occupancy_model: bool,
    pub enforcement_model: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ModelInfoBlock {
    pub model_type: String,
    pub feature_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_date: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub performance: serde_json::Value,
}

impl ModelInfoBlock {
    pub fn from_metadata(metadata: &ModelMetadata) -> Self {
        Self {
            model_type: metadata.model_type.clone(),
            feature_count: metadata.feature_count,
            training_date: metadata.training_date.clone(),
            performance: metadata.performance.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ModelsResponse {
    pub occupancy_enabled: bool,
    pub enforcement_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<ModelInfoBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enforcement: Option<ModelInfoBlock>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct OccupancyBlock {
    pub occupancy_count: f64,
    pub available_spaces: f64,
    pub capacity: f64,
    pub percent_full: f64,
    pub availability_level: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<OccupancySource>,
}

impl OccupancyBlock {
    pub fn from_prediction(prediction: &OccupancyPrediction) -> Self {
        Self {
            occupancy_count: round1(prediction.occupancy),
            available_spaces: round1(prediction.available_spaces),
            capacity: prediction.capacity,
            percent_full: round1(prediction.percent_full),
            availability_level: prediction.level.as_str(),
            source: prediction.source,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HourlyRiskEntry {
    pub timestamp: String,
    pub risk_percentage: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RiskBlock {
    pub probability: f64,
    pub percentage: f64,
    pub level: &'static str,
    pub message: String,
    pub duration_hours: u32,
    pub hourly_risks: Vec<HourlyRiskEntry>,
    pub peak_risk_time: String,
}

impl RiskBlock {
    pub fn from_assessment(assessment: &RiskAssessment) -> Self {
        let hourly_risks = assessment
            .hourly
            .iter()
            .map(|h| HourlyRiskEntry {
                timestamp: timefmt::format_datetime(h.timestamp).unwrap_or_default(),
                risk_percentage: round2(h.probability * 100.0),
            })
            .collect();
        Self {
            probability: round4(assessment.probability),
            percentage: round1(assessment.probability * 100.0),
            level: assessment.level.as_str(),
            message: assessment.message.clone(),
            duration_hours: assessment.duration_hours,
            hourly_risks,
            peak_risk_time: timefmt::format_clock(assessment.peak.timestamp).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RecommendationBlock {
    pub score: u32,
    pub recommendation: &'static str,
    pub should_park: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct OccupancySuccessResponse {
    pub zone: String,
    pub datetime: String,
    pub occupancy: OccupancyBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfoBlock>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RiskSuccessResponse {
    pub zone: String,
    pub datetime: String,
    pub risk: RiskBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfoBlock>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RecommendSuccessResponse {
    pub zone: String,
    pub datetime: String,
    pub duration_hours: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<OccupancyBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskBlock>,
    pub recommendation: RecommendationBlock,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LotSummary {
    pub lot_number: u32,
    pub zone_name: String,
    pub location: String,
    pub zone_type: String,
    pub capacity: f64,
    pub instrumented: bool,
}

impl LotSummary {
    pub fn from_lot(lot: &Lot) -> Self {
        Self {
            lot_number: lot.number,
            zone_name: lot.zone_name.clone(),
            location: lot.location.clone(),
            zone_type: lot.zone_type.clone(),
            capacity: lot.capacity,
            instrumented: lot.has_instrumented_coverage(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LotPredictResponse {
    pub lot: LotSummary,
    pub datetime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<OccupancyBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskBlock>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ZoneSummary {
    pub name: String,
    pub capacity: f64,
    pub lot_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ZonesResponse {
    pub zones: Vec<ZoneSummary>,
    pub count: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ZoneDetailResponse {
    pub zone: String,
    pub capacity: f64,
    pub lots: Vec<LotSummary>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LotsResponse {
    pub lots: Vec<LotSummary>,
    pub count: usize,
    pub timestamp: String,
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::AvailabilityLevel;
    use serde_json::json;

    #[test]
    fn error_response_uses_screaming_snake_case_code() {
        let response = ApiErrorResponse {
            error_code: ApiErrorCode::RestrictedLot,
            error_message: "lot 7 is restricted to ADA Only".to_string(),
            timestamp: "2026-04-03T10:00:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize error response");
        assert_eq!(
            value,
            json!({
                "error_code": "RESTRICTED_LOT",
                "error_message": "lot 7 is restricted to ADA Only",
                "timestamp": "2026-04-03T10:00:00Z"
            })
        );
    }

    #[test]
    fn occupancy_block_rounds_and_omits_missing_source() {
        let block = OccupancyBlock::from_prediction(&OccupancyPrediction {
            occupancy: 53.248,
            capacity: 80.0,
            available_spaces: 26.752,
            percent_full: 66.56,
            level: AvailabilityLevel::Moderate,
            source: None,
        });

        let value = serde_json::to_value(block).expect("serialize occupancy block");
        assert_eq!(
            value,
            json!({
                "occupancy_count": 53.2,
                "available_spaces": 26.8,
                "capacity": 80.0,
                "percent_full": 66.6,
                "availability_level": "MODERATE"
            })
        );
    }

    #[test]
    fn source_serializes_in_snake_case() {
        let value = serde_json::to_value(OccupancySource::TimePattern).expect("serialize source");
        assert_eq!(value, json!("time_pattern"));
    }

    #[test]
    fn health_status_serializes_lowercase() {
        let response = HealthResponse {
            status: HealthStatus::Degraded,
            occupancy_model: true,
            enforcement_model: false,
            timestamp: "2026-04-03T10:00:00Z".to_string(),
        };
        let value = serde_json::to_value(response).expect("serialize health response");
        assert_eq!(value["status"], json!("degraded"));
    }

    #[test]
    fn rounding_helpers_round_half_away_from_zero() {
        assert_eq!(round1(66.56), 66.6);
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round4(0.35199999), 0.352);
    }
}
