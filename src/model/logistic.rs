//! Logistic regression artifact: sigmoid over a linear score, yielding a
//! probability in (0, 1).

use crate::features::FeatureVector;
use crate::model::linear::LinearModel;
use crate::model::{ModelError, ModelFile, PredictionError, Predictor};

#[derive(Debug)]
pub struct LogisticModel {
    linear: LinearModel,
}

impl LogisticModel {
    pub fn from_file(file: &ModelFile) -> Result<Self, ModelError> {
        Ok(Self {
            linear: LinearModel::from_file(file)?,
        })
    }
}

impl Predictor for LogisticModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        let z = self.linear.score(features);
        let probability = 1.0 / (1.0 + (-z).exp());
        if !probability.is_finite() {
            return Err(PredictionError::NonFinite);
        }
        Ok(probability)
    }
}
