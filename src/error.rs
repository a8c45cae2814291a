use thiserror::Error;

/// Request-level failures surfaced to the serving layer.
///
/// Everything else degrades in place: historical gaps fall back to documented
/// defaults and per-lot / per-hour predictor failures are absorbed by the
/// aggregators.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid datetime '{value}': expected YYYY-MM-DDTHH:MM:SS")]
    InvalidTimestamp { value: String },
    #[error("duration_hours must be at least 1")]
    InvalidDuration,
    #[error("{0} model is disabled")]
    ModelDisabled(&'static str),
    #[error("lot {0} not found")]
    UnknownLot(u32),
    #[error("lot {number} is restricted to {zone_type}")]
    RestrictedLot { number: u32, zone_type: String },
    #[error("enforcement prediction failed for every hour of the requested window")]
    AllHoursFailed,
    #[error("all prediction models are disabled")]
    NoModels,
}
