use crate::state::ServiceState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

pub mod handlers;
pub mod responses;

pub fn router(state: Arc<ServiceState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::get_health))
        .route("/api/models", get(handlers::get_models))
        .route("/api/zones", get(handlers::get_zones))
        .route("/api/zones/{zone}", get(handlers::get_zone))
        .route("/api/lots", get(handlers::get_lots))
        .route("/api/occupancy/predict", post(handlers::post_occupancy))
        .route("/api/enforcement/risk", post(handlers::post_risk))
        .route("/api/parking/recommend", post(handlers::post_recommend))
        .route("/api/lots/predict", post(handlers::post_lot_predict))
        .with_state(state)
}
