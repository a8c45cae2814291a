use crate::api::responses::{
    ApiErrorCode, ApiErrorResponse, HealthResponse, HealthStatus, LotPredictResponse, LotRequest, LotSummary, LotsResponse, ModelInfoBlock, ModelsResponse, OccupancyBlock,
    OccupancyRequest, OccupancySuccessResponse, RecommendRequest, RecommendSuccessResponse,
    RecommendationBlock, RiskBlock, RiskRequest, RiskSuccessResponse, ZoneDetailResponse,
    ZoneSummary, ZonesResponse,
};
use crate::error::RequestError;
use crate::prediction::{
    assess_enforcement_risk, predict_lot_detail, predict_zone_occupancy, recommend,
};
use crate::state::ServiceState;
use crate::timefmt;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::sync::Arc;
use time::{OffsetDateTime, PrimitiveDateTime};
use time::format_description::well_known::Rfc3339;
use tracing::error;

pub enum ApiResponse<T> {
    Success(T),
    Error {
        status: StatusCode,
        body: ApiErrorResponse,
    },
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

fn now_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|err| {
            error!(error = %err, "Failed to format response timestamp");
            "1970-01-01T00:00:00Z".to_string()
        })
}

fn request_error<T>(err: &RequestError) -> ApiResponse<T> {
    let (status, error_code) = match err {
        RequestError::MissingField(_) => (StatusCode::BAD_REQUEST, ApiErrorCode::MissingField),
        RequestError::InvalidTimestamp { .. } => {
            (StatusCode::BAD_REQUEST, ApiErrorCode::InvalidTimestamp)
        }
        RequestError::InvalidDuration => (StatusCode::BAD_REQUEST, ApiErrorCode::InvalidDuration),
        RequestError::ModelDisabled(_) | RequestError::NoModels => {
            (StatusCode::SERVICE_UNAVAILABLE, ApiErrorCode::ModelDisabled)
        }
        RequestError::UnknownLot(_) => (StatusCode::NOT_FOUND, ApiErrorCode::UnknownLot),
        RequestError::RestrictedLot { .. } => (StatusCode::FORBIDDEN, ApiErrorCode::RestrictedLot),
        RequestError::AllHoursFailed => {
            (StatusCode::INTERNAL_SERVER_ERROR, ApiErrorCode::PredictionFailed)
        }
    };
    ApiResponse::Error {
        status,
        body: ApiErrorResponse {
            error_code,
            error_message: err.to_string(),
            timestamp: now_timestamp(),
        },
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, RequestError> {
    value.ok_or(RequestError::MissingField(field))
}

fn parse_request_datetime(raw: &str) -> Result<PrimitiveDateTime, RequestError> {
    timefmt::parse_datetime(raw).map_err(|_| RequestError::InvalidTimestamp {
        value: raw.to_string(),
    })
}

pub async fn get_health(State(state): State<Arc<ServiceState>>) -> impl IntoResponse {
    let body = build_health_response(&state);
    let status = match body.status {
        HealthStatus::Ko => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Ok | HealthStatus::Degraded => StatusCode::OK,
    };
    (status, Json(body))
}

pub fn build_health_response(state: &ServiceState) -> HealthResponse {
    let occupancy = state.occupancy_enabled();
    let enforcement = state.enforcement_enabled();
    let status = match (occupancy, enforcement) {
        (true, true) => HealthStatus::Ok,
        (false, false) => HealthStatus::Ko,
        _ => HealthStatus::Degraded,
    };
    HealthResponse {
        status,
        occupancy_model: occupancy,
        enforcement_model: enforcement,
        timestamp: now_timestamp(),
    }
}

pub async fn get_models(State(state): State<Arc<ServiceState>>) -> impl IntoResponse {
    Json(build_models_response(&state))
}

pub fn build_models_response(state: &ServiceState) -> ModelsResponse {
    ModelsResponse {
        occupancy_enabled: state.occupancy_enabled(),
        enforcement_enabled: state.enforcement_enabled(),
        occupancy: state
            .occupancy
            .as_ref()
            .map(|b| ModelInfoBlock::from_metadata(&b.metadata)),
        enforcement: state
            .enforcement
            .as_ref()
            .map(|b| ModelInfoBlock::from_metadata(&b.metadata)),
        timestamp: now_timestamp(),
    }
}

pub async fn get_zones(State(state): State<Arc<ServiceState>>) -> impl IntoResponse {
    Json(build_zones_response(&state))
}

pub fn build_zones_response(state: &ServiceState) -> ZonesResponse {
    let zones: Vec<ZoneSummary> = state
        .capacities
        .recommendable_zones()
        .into_iter()
        .map(|name| ZoneSummary {
            name: name.to_string(),
            capacity: state.capacities.zone_capacity(name).unwrap_or(0.0),
            lot_count: state.capacities.lots_for_label(name),
        })
        .collect();
    let count = zones.len();
    ZonesResponse {
        zones,
        count,
        timestamp: now_timestamp(),
    }
}

pub async fn get_zone(
    State(state): State<Arc<ServiceState>>,
    Path(zone): Path<String>,
) -> impl IntoResponse {
    build_zone_detail_response(&state, &zone)
}

pub fn build_zone_detail_response(
    state: &ServiceState,
    zone: &str,
) -> ApiResponse<ZoneDetailResponse> {
    let Some(capacity) = state.capacities.zone_capacity(zone) else {
        return ApiResponse::Error {
            status: StatusCode::NOT_FOUND,
            body: ApiErrorResponse {
                error_code: ApiErrorCode::UnknownZone,
                error_message: format!("zone '{zone}' not found"),
                timestamp: now_timestamp(),
            },
        };
    };
    let lots: Vec<LotSummary> = state
        .capacities
        .lots()
        .iter()
        .filter(|lot| lot.zone_name == zone || lot.instrumented_zone.as_deref() == Some(zone))
        .map(LotSummary::from_lot)
        .collect();
    ApiResponse::Success(ZoneDetailResponse {
        zone: zone.to_string(),
        capacity,
        lots,
        timestamp: now_timestamp(),
    })
}

pub async fn get_lots(State(state): State<Arc<ServiceState>>) -> impl IntoResponse {
    Json(build_lots_response(&state))
}

pub fn build_lots_response(state: &ServiceState) -> LotsResponse {
    let lots: Vec<LotSummary> = state
        .capacities
        .lots()
        .iter()
        .filter(|lot| !lot.is_restricted())
        .map(LotSummary::from_lot)
        .collect();
    let count = lots.len();
    LotsResponse {
        lots,
        count,
        timestamp: now_timestamp(),
    }
}

pub async fn post_occupancy(
    State(state): State<Arc<ServiceState>>,
    Json(request): Json<OccupancyRequest>,
) -> impl IntoResponse {
    build_occupancy_response(&state, &request)
}

pub fn build_occupancy_response(
    state: &ServiceState,
    request: &OccupancyRequest,
) -> ApiResponse<OccupancySuccessResponse> {
    let result = (|| {
        let zone = required(request.zone.as_deref(), "zone")?;
        let raw_dt = required(request.datetime.as_deref(), "datetime")?;
        let dt = parse_request_datetime(raw_dt)?;
        let prediction = predict_zone_occupancy(state, zone, dt)?;
        Ok::<_, RequestError>((zone, raw_dt, prediction))
    })();

    match result {
        Ok((zone, raw_dt, prediction)) => ApiResponse::Success(OccupancySuccessResponse {
            zone: zone.to_string(),
            datetime: raw_dt.to_string(),
            occupancy: OccupancyBlock::from_prediction(&prediction),
            model_info: state
                .occupancy
                .as_ref()
                .map(|b| ModelInfoBlock::from_metadata(&b.metadata)),
            timestamp: now_timestamp(),
        }),
        Err(err) => request_error(&err),
    }
}

pub async fn post_risk(
    State(state): State<Arc<ServiceState>>,
    Json(request): Json<RiskRequest>,
) -> impl IntoResponse {
    build_risk_response(&state, &request)
}

pub fn build_risk_response(
    state: &ServiceState,
    request: &RiskRequest,
) -> ApiResponse<RiskSuccessResponse> {
    let result = (|| {
        let zone = required(request.zone.as_deref(), "zone")?;
        let raw_dt = required(request.datetime.as_deref(), "datetime")?;
        let dt = parse_request_datetime(raw_dt)?;
        let duration = request.duration_hours.unwrap_or(1);
        let assessment = assess_enforcement_risk(state, zone, dt, duration)?;
        Ok::<_, RequestError>((zone, raw_dt, assessment))
    })();

    match result {
        Ok((zone, raw_dt, assessment)) => ApiResponse::Success(RiskSuccessResponse {
            zone: zone.to_string(),
            datetime: raw_dt.to_string(),
            risk: RiskBlock::from_assessment(&assessment),
            model_info: state
                .enforcement
                .as_ref()
                .map(|b| ModelInfoBlock::from_metadata(&b.metadata)),
            timestamp: now_timestamp(),
        }),
        Err(err) => request_error(&err),
    }
}

pub async fn post_recommend(
    State(state): State<Arc<ServiceState>>,
    Json(request): Json<RecommendRequest>,
) -> impl IntoResponse {
    build_recommend_response(&state, &request)
}

pub fn build_recommend_response(
    state: &ServiceState,
    request: &RecommendRequest,
) -> ApiResponse<RecommendSuccessResponse> {
    let result = (|| {
        let zone = required(request.zone.as_deref(), "zone")?;
        let raw_dt = required(request.datetime.as_deref(), "datetime")?;
        let dt = parse_request_datetime(raw_dt)?;
        let duration = request.duration_hours.unwrap_or(1);
        let report = recommend(state, zone, dt, duration)?;
        Ok::<_, RequestError>((zone, raw_dt, duration, report))
    })();

    match result {
        Ok((zone, raw_dt, duration, report)) => ApiResponse::Success(RecommendSuccessResponse {
            zone: zone.to_string(),
            datetime: raw_dt.to_string(),
            duration_hours: duration,
            occupancy: report.occupancy.as_ref().map(OccupancyBlock::from_prediction),
            risk: report.risk.as_ref().map(RiskBlock::from_assessment),
            recommendation: RecommendationBlock {
                score: report.recommendation.score,
                recommendation: report.recommendation.text,
                should_park: report.recommendation.should_park,
            },
            timestamp: now_timestamp(),
        }),
        Err(err) => request_error(&err),
    }
}

pub async fn post_lot_predict(
    State(state): State<Arc<ServiceState>>,
    Json(request): Json<LotRequest>,
) -> impl IntoResponse {
    build_lot_predict_response(&state, &request)
}

pub fn build_lot_predict_response(
    state: &ServiceState,
    request: &LotRequest,
) -> ApiResponse<LotPredictResponse> {
    let result = (|| {
        let lot_number = required(request.lot_number, "lot_number")?;
        let raw_dt = required(request.datetime.as_deref(), "datetime")?;
        let dt = parse_request_datetime(raw_dt)?;
        let duration = request.parking_duration_hours.unwrap_or(1);
        if duration == 0 {
            return Err(RequestError::InvalidDuration);
        }

        let detail = predict_lot_detail(state, lot_number, dt)?;
        let risk = if state.enforcement_enabled() {
            Some(assess_enforcement_risk(
                state,
                &detail.lot.zone_name,
                dt,
                duration,
            )?)
        } else {
            None
        };
        Ok::<_, RequestError>((raw_dt, detail, risk))
    })();

    match result {
        Ok((raw_dt, detail, risk)) => ApiResponse::Success(LotPredictResponse {
            lot: LotSummary::from_lot(&detail.lot),
            datetime: raw_dt.to_string(),
            occupancy: detail.occupancy.as_ref().map(OccupancyBlock::from_prediction),
            risk: risk.as_ref().map(RiskBlock::from_assessment),
            timestamp: now_timestamp(),
        }),
        Err(err) => request_error(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::data::capacity::{CapacityMap, LotSpec};
    use crate::data::tables::{
        CalendarTable, EnforcementHistory, GameDays, OccupancyHistory, WeatherTable,
    };
    use crate::model::mock::FixedPredictor;
    use crate::model::{
        EnforcementBundle, ModelMetadata, OccupancyBundle, RiskMessages, RiskThresholds,
    };
    use std::collections::HashMap;

    fn metadata(kind: &str) -> ModelMetadata {
        ModelMetadata {
            model_type: kind.to_string(),
            performance: serde_json::Value::Null,
            training_date: Some("2026-01-15".to_string()),
            feature_count: 3,
        }
    }

    fn test_state(occupancy: Option<f64>, enforcement: Option<f64>) -> ServiceState {
        let specs = vec![
            LotSpec {
                number: 1,
                zone_name: "North".to_string(),
                location: "North Garage".to_string(),
                zone_type: "Paid".to_string(),
                capacity: 50.0,
                instrumented_zones: vec!["North A".to_string()],
            },
            LotSpec {
                number: 7,
                zone_name: "Fleet".to_string(),
                location: "Service Yard".to_string(),
                zone_type: "University Vehicles".to_string(),
                capacity: 10.0,
                instrumented_zones: Vec::new(),
            },
        ];
        let instrumented = HashMap::from([("North A".to_string(), 45.0)]);
        let dataset = Dataset {
            calendar: CalendarTable::default(),
            games: GameDays::default(),
            weather: WeatherTable::default(),
            occupancy_history: OccupancyHistory::default(),
            enforcement_history: EnforcementHistory::default(),
            capacities: CapacityMap::build(specs, &instrumented).expect("capacity map"),
        };

        let occupancy = occupancy.map(|v| OccupancyBundle {
            predictor: Box::new(FixedPredictor(v)),
            metadata: metadata("linear_regression"),
            zone_classes: vec!["North A".to_string()],
        });
        let enforcement = enforcement.map(|v| EnforcementBundle {
            predictor: Box::new(FixedPredictor(v)),
            metadata: metadata("logistic_regression"),
            thresholds: RiskThresholds {
                very_low: 0.05,
                low: 0.15,
                moderate: 0.30,
                high: 0.50,
            },
            messages: RiskMessages {
                very_low: "very low".to_string(),
                low: "low".to_string(),
                moderate: "moderate".to_string(),
                high: "high".to_string(),
                very_high: "very high".to_string(),
            },
            zone_classes: vec!["North".to_string()],
        });
        ServiceState::new(dataset, occupancy, enforcement)
    }

    fn occupancy_request(zone: Option<&str>, datetime: Option<&str>) -> OccupancyRequest {
        OccupancyRequest {
            zone: zone.map(str::to_string),
            datetime: datetime.map(str::to_string),
        }
    }

    #[test]
    fn occupancy_success_echoes_request_fields() {
        let state = test_state(Some(20.0), None);
        let response = build_occupancy_response(
            &state,
            &occupancy_request(Some("North A"), Some("2026-04-03T10:00:00")),
        );
        match response {
            ApiResponse::Success(body) => {
                assert_eq!(body.zone, "North A");
                assert_eq!(body.datetime, "2026-04-03T10:00:00");
                // 20 of 50 spaces -> exactly 40% full.
                assert_eq!(body.occupancy.occupancy_count, 20.0);
                assert_eq!(body.occupancy.availability_level, "GOOD");
                assert_eq!(
                    body.model_info.expect("model info").model_type,
                    "linear_regression"
                );
            }
            ApiResponse::Error { .. } => panic!("expected success"),
        }
    }

    #[test]
    fn missing_zone_is_a_bad_request() {
        let state = test_state(Some(20.0), None);
        let response =
            build_occupancy_response(&state, &occupancy_request(None, Some("2026-04-03T10:00:00")));
        match response {
            ApiResponse::Error { status, body } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body.error_code, ApiErrorCode::MissingField);
            }
            ApiResponse::Success(_) => panic!("expected error"),
        }
    }

    #[test]
    fn malformed_datetime_is_a_bad_request() {
        let state = test_state(Some(20.0), None);
        let response =
            build_occupancy_response(&state, &occupancy_request(Some("North A"), Some("today")));
        match response {
            ApiResponse::Error { status, body } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(body.error_code, ApiErrorCode::InvalidTimestamp);
            }
            ApiResponse::Success(_) => panic!("expected error"),
        }
    }

    #[test]
    fn disabled_occupancy_model_is_service_unavailable() {
        let state = test_state(None, Some(0.1));
        let response = build_occupancy_response(
            &state,
            &occupancy_request(Some("North A"), Some("2026-04-03T10:00:00")),
        );
        match response {
            ApiResponse::Error { status, body } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body.error_code, ApiErrorCode::ModelDisabled);
            }
            ApiResponse::Success(_) => panic!("expected error"),
        }
    }

    #[test]
    fn risk_response_carries_hourly_breakdown() {
        let state = test_state(None, Some(0.1));
        let response = build_risk_response(
            &state,
            &RiskRequest {
                zone: Some("North".to_string()),
                datetime: Some("2026-04-03T10:00:00".to_string()),
                duration_hours: Some(3),
            },
        );
        match response {
            ApiResponse::Success(body) => {
                assert_eq!(body.risk.duration_hours, 3);
                assert_eq!(body.risk.hourly_risks.len(), 3);
                assert!((body.risk.probability - 0.271).abs() < 1e-9);
                assert_eq!(body.risk.level, "MODERATE");
            }
            ApiResponse::Error { .. } => panic!("expected success"),
        }
    }

    #[test]
    fn restricted_lot_is_forbidden() {
        let state = test_state(Some(20.0), Some(0.1));
        let response = build_lot_predict_response(
            &state,
            &LotRequest {
                lot_number: Some(7),
                datetime: Some("2026-04-03T10:00:00".to_string()),
                parking_duration_hours: None,
            },
        );
        match response {
            ApiResponse::Error { status, body } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(body.error_code, ApiErrorCode::RestrictedLot);
            }
            ApiResponse::Success(_) => panic!("expected error"),
        }
    }

    #[test]
    fn lot_predict_reports_source_and_risk() {
        let state = test_state(Some(40.0), Some(0.02));
        let response = build_lot_predict_response(
            &state,
            &LotRequest {
                lot_number: Some(1),
                datetime: Some("2026-04-03T10:00:00".to_string()),
                parking_duration_hours: Some(1),
            },
        );
        match response {
            ApiResponse::Success(body) => {
                let occupancy = body.occupancy.expect("occupancy block");
                assert_eq!(occupancy.occupancy_count, 40.0);
                let risk = body.risk.expect("risk block");
                assert_eq!(risk.level, "VERY_LOW");
                assert_eq!(risk.peak_risk_time, "10:00 AM");
            }
            ApiResponse::Error { .. } => panic!("expected success"),
        }
    }

    #[test]
    fn recommend_combines_both_axes() {
        let state = test_state(Some(10.0), Some(0.02));
        let response = build_recommend_response(
            &state,
            &RecommendRequest {
                zone: Some("North".to_string()),
                datetime: Some("2026-04-03T10:00:00".to_string()),
                duration_hours: Some(2),
            },
        );
        match response {
            ApiResponse::Success(body) => {
                assert!(body.occupancy.is_some());
                assert!(body.risk.is_some());
                assert!(body.recommendation.should_park);
            }
            ApiResponse::Error { .. } => panic!("expected success"),
        }
    }

    #[test]
    fn omitted_duration_defaults_to_one_hour() {
        let state = test_state(Some(10.0), Some(0.1));

        let response = build_recommend_response(
            &state,
            &RecommendRequest {
                zone: Some("North".to_string()),
                datetime: Some("2026-04-03T10:00:00".to_string()),
                duration_hours: None,
            },
        );
        match response {
            ApiResponse::Success(body) => {
                assert_eq!(body.duration_hours, 1);
                // Single hour, so no compounding: probability stays 0.1.
                let risk = body.risk.expect("risk block");
                assert_eq!(risk.duration_hours, 1);
                assert_eq!(risk.hourly_risks.len(), 1);
                assert!((risk.probability - 0.1).abs() < 1e-9);
            }
            ApiResponse::Error { .. } => panic!("expected success"),
        }

        let response = build_lot_predict_response(
            &state,
            &LotRequest {
                lot_number: Some(1),
                datetime: Some("2026-04-03T10:00:00".to_string()),
                parking_duration_hours: None,
            },
        );
        match response {
            ApiResponse::Success(body) => {
                assert_eq!(body.risk.expect("risk block").duration_hours, 1);
            }
            ApiResponse::Error { .. } => panic!("expected success"),
        }
    }

    #[test]
    fn zone_listing_excludes_restricted_labels() {
        let state = test_state(None, None);
        let zones = build_zones_response(&state);
        assert!(zones.zones.iter().any(|z| z.name == "North"));
        assert!(zones.zones.iter().all(|z| z.name != "Fleet"));

        let lots = build_lots_response(&state);
        assert_eq!(lots.count, 1);
        assert_eq!(lots.lots[0].lot_number, 1);
    }

    #[test]
    fn unknown_zone_detail_is_not_found() {
        let state = test_state(None, None);
        match build_zone_detail_response(&state, "Nowhere") {
            ApiResponse::Error { status, body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body.error_code, ApiErrorCode::UnknownZone);
            }
            ApiResponse::Success(_) => panic!("expected error"),
        }
    }

    #[test]
    fn health_reflects_loaded_models() {
        assert_eq!(
            build_health_response(&test_state(Some(1.0), Some(0.1))).status,
            HealthStatus::Ok
        );
        assert_eq!(
            build_health_response(&test_state(Some(1.0), None)).status,
            HealthStatus::Degraded
        );
        assert_eq!(
            build_health_response(&test_state(None, None)).status,
            HealthStatus::Ko
        );
    }
}
