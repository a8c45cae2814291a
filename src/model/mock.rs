//! Scripted predictors for tests. Kept out of `#[cfg(test)]` so integration
//! tests can build a full service around them.

use crate::features::FeatureVector;
use crate::model::{PredictionError, Predictor};
use std::collections::{HashMap, HashSet};

/// Always returns the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedPredictor(pub f64);

impl Predictor for FixedPredictor {
    fn predict(&self, _features: &FeatureVector) -> Result<f64, PredictionError> {
        Ok(self.0)
    }
}

/// Returns a per-hour scripted value, reading the `hour` feature.
#[derive(Debug, Clone, Default)]
pub struct HourKeyedPredictor {
    pub by_hour: HashMap<u8, f64>,
    pub default: f64,
}

impl HourKeyedPredictor {
    pub fn new(pairs: impl IntoIterator<Item = (u8, f64)>, default: f64) -> Self {
        Self {
            by_hour: pairs.into_iter().collect(),
            default,
        }
    }
}

impl Predictor for HourKeyedPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        let hour = features.get("hour").unwrap_or(0.0) as u8;
        Ok(self.by_hour.get(&hour).copied().unwrap_or(self.default))
    }
}

/// Always fails.
#[derive(Debug, Clone, Copy)]
pub struct FailingPredictor;

impl Predictor for FailingPredictor {
    fn predict(&self, _features: &FeatureVector) -> Result<f64, PredictionError> {
        Err(PredictionError::Failed("scripted failure".to_string()))
    }
}

/// Returns a per-zone scripted value keyed on the `zone_encoded` feature,
/// optionally failing for chosen codes.
#[derive(Debug, Clone, Default)]
pub struct ZoneCodePredictor {
    pub values: HashMap<usize, f64>,
    pub failing: HashSet<usize>,
}

impl ZoneCodePredictor {
    pub fn new(values: impl IntoIterator<Item = (usize, f64)>) -> Self {
        Self {
            values: values.into_iter().collect(),
            failing: HashSet::new(),
        }
    }

    pub fn failing_for(mut self, code: usize) -> Self {
        self.failing.insert(code);
        self
    }
}

impl Predictor for ZoneCodePredictor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        let code = features.get("zone_encoded").unwrap_or(0.0) as usize;
        if self.failing.contains(&code) {
            return Err(PredictionError::Failed(format!(
                "scripted failure for zone code {code}"
            )));
        }
        Ok(self.values.get(&code).copied().unwrap_or(0.0))
    }
}
