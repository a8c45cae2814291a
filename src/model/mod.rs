//! Pretrained model loading and the `Predictor` trait.
//!
//! Models are exported offline as JSON artifacts carrying their feature
//! schema and fitted parameters. The service never trains anything; it loads
//! the artifacts at startup and scores feature vectors against them. The
//! `model` field in the artifact selects the implementation.

use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub mod linear;
pub mod logistic;
pub mod mock;

use linear::LinearModel;
use logistic::LogisticModel;

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("model produced a non-finite value")]
    NonFinite,
    #[error("prediction failed: {0}")]
    Failed(String),
}

/// A loaded model that scores one feature vector at a time.
///
/// Implement this trait to add new model kinds. The implementation is
/// selected via the `model` field in the artifact file.
pub trait Predictor: Send + Sync + std::fmt::Debug {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError>;
}

/// Maps zone names to the integer codes the models were trained with. The
/// class list is part of the artifact; unknown zones encode as None and the
/// caller substitutes a neutral 0.
#[derive(Debug, Clone, Default)]
pub struct ZoneEncoder {
    classes: Vec<String>,
}

impl ZoneEncoder {
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    pub fn encode(&self, zone: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == zone)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "VERY_LOW",
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
            RiskLevel::VeryHigh => "VERY_HIGH",
            RiskLevel::Unknown => "UNKNOWN",
        }
    }
}

/// Probability cut points between risk bands, exported with the classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskThresholds {
    pub very_low: f64,
    pub low: f64,
    pub moderate: f64,
    pub high: f64,
}

impl RiskThresholds {
    pub fn level(&self, probability: f64) -> RiskLevel {
        if probability < self.very_low {
            RiskLevel::VeryLow
        } else if probability < self.low {
            RiskLevel::Low
        } else if probability < self.moderate {
            RiskLevel::Moderate
        } else if probability < self.high {
            RiskLevel::High
        } else {
            RiskLevel::VeryHigh
        }
    }
}

const UNKNOWN_RISK_MESSAGE: &str = "Risk level could not be determined";

/// Advisory text per risk band, exported alongside the thresholds.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskMessages {
    pub very_low: String,
    pub low: String,
    pub moderate: String,
    pub high: String,
    pub very_high: String,
}

impl RiskMessages {
    pub fn for_level(&self, level: RiskLevel) -> &str {
        match level {
            RiskLevel::VeryLow => &self.very_low,
            RiskLevel::Low => &self.low,
            RiskLevel::Moderate => &self.moderate,
            RiskLevel::High => &self.high,
            RiskLevel::VeryHigh => &self.very_high,
            RiskLevel::Unknown => UNKNOWN_RISK_MESSAGE,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ModelFile {
    pub model: String,
    #[serde(default)]
    pub model_type: String,
    pub features: Vec<String>,
    pub params: serde_json::Value,
    #[serde(default)]
    pub zone_classes: Vec<String>,
    #[serde(default)]
    pub performance: serde_json::Value,
    pub training_date: Option<String>,
    pub risk_thresholds: Option<RiskThresholds>,
    pub risk_messages: Option<RiskMessages>,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse model file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid model: {0}")]
    Invalid(String),
}

/// Descriptive fields surfaced through the models endpoint.
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    pub model_type: String,
    pub performance: serde_json::Value,
    pub training_date: Option<String>,
    pub feature_count: usize,
}

impl ModelMetadata {
    fn from_file(file: &ModelFile) -> Self {
        Self {
            model_type: file.model_type.clone(),
            performance: file.performance.clone(),
            training_date: file.training_date.clone(),
            feature_count: file.features.len(),
        }
    }
}

/// The occupancy regressor plus everything the service needs to describe it.
#[derive(Debug)]
pub struct OccupancyBundle {
    pub predictor: Box<dyn Predictor>,
    pub metadata: ModelMetadata,
    pub zone_classes: Vec<String>,
}

/// The enforcement classifier with its risk bands and advisory messages.
#[derive(Debug)]
pub struct EnforcementBundle {
    pub predictor: Box<dyn Predictor>,
    pub metadata: ModelMetadata,
    pub thresholds: RiskThresholds,
    pub messages: RiskMessages,
    pub zone_classes: Vec<String>,
}

// Model factory
pub fn create_predictor(file: &ModelFile) -> Result<Box<dyn Predictor>, ModelError> {
    match file.model.as_str() {
        "linear" => Ok(Box::new(LinearModel::from_file(file)?)),
        "logistic" => Ok(Box::new(LogisticModel::from_file(file)?)),
        other => Err(ModelError::Invalid(format!("unknown model: {other}"))),
    }
}

fn read_model_file(path: impl AsRef<Path>) -> Result<ModelFile, ModelError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

pub fn load_occupancy_bundle(path: impl AsRef<Path>) -> Result<OccupancyBundle, ModelError> {
    let file = read_model_file(path)?;
    let predictor = create_predictor(&file)?;
    Ok(OccupancyBundle {
        metadata: ModelMetadata::from_file(&file),
        zone_classes: file.zone_classes,
        predictor,
    })
}

pub fn load_enforcement_bundle(path: impl AsRef<Path>) -> Result<EnforcementBundle, ModelError> {
    let file = read_model_file(path)?;
    let predictor = create_predictor(&file)?;
    let thresholds = file
        .risk_thresholds
        .clone()
        .ok_or_else(|| ModelError::Invalid("missing risk_thresholds".to_string()))?;
    let messages = file
        .risk_messages
        .clone()
        .ok_or_else(|| ModelError::Invalid("missing risk_messages".to_string()))?;
    Ok(EnforcementBundle {
        metadata: ModelMetadata::from_file(&file),
        thresholds,
        messages,
        zone_classes: file.zone_classes,
        predictor,
    })
}
