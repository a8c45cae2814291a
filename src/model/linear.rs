//! Linear regression artifact: `score = bias + Σ weight_i * feature_i`.

use crate::features::FeatureVector;
use crate::model::{ModelError, ModelFile, PredictionError, Predictor};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct LinearParams {
    pub bias: f64,
    pub weights: HashMap<String, f64>,
}

/// Fitted linear model with its feature schema. Weights are stored in schema
/// order so scoring is a plain dot product over `to_row`.
#[derive(Debug)]
pub struct LinearModel {
    schema: Vec<String>,
    bias: f64,
    weights: Vec<f64>,
}

impl LinearModel {
    pub fn new(schema: Vec<String>, params: LinearParams) -> Result<Self, ModelError> {
        for name in params.weights.keys() {
            if !schema.iter().any(|field| field == name) {
                return Err(ModelError::Invalid(format!(
                    "weight '{name}' names a field missing from the feature schema"
                )));
            }
        }
        let weights = schema
            .iter()
            .map(|field| params.weights.get(field).copied().unwrap_or(0.0))
            .collect();
        Ok(Self {
            schema,
            bias: params.bias,
            weights,
        })
    }

    pub fn from_file(file: &ModelFile) -> Result<Self, ModelError> {
        let params: LinearParams = serde_json::from_value(file.params.clone())?;
        Self::new(file.features.clone(), params)
    }

    pub(crate) fn score(&self, features: &FeatureVector) -> f64 {
        let row = features.to_row(&self.schema);
        self.bias
            + row
                .iter()
                .zip(&self.weights)
                .map(|(x, w)| x * w)
                .sum::<f64>()
    }
}

impl Predictor for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        let value = self.score(features);
        if !value.is_finite() {
            return Err(PredictionError::NonFinite);
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<String> {
        vec!["hour".to_string(), "is_weekend".to_string()]
    }

    fn weights(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn score_is_bias_plus_dot_product() {
        let model = LinearModel::new(
            schema(),
            LinearParams {
                bias: 10.0,
                weights: weights(&[("hour", 2.0), ("is_weekend", -5.0)]),
            },
        )
        .expect("valid model");

        let mut features = FeatureVector::new();
        features.insert("hour", 9.0);
        features.insert("is_weekend", 1.0);

        assert_eq!(model.predict(&features).expect("finite"), 23.0);
    }

    #[test]
    fn missing_features_default_to_zero() {
        let model = LinearModel::new(
            schema(),
            LinearParams {
                bias: 3.0,
                weights: weights(&[("hour", 2.0)]),
            },
        )
        .expect("valid model");

        let features = FeatureVector::new();
        assert_eq!(model.predict(&features).expect("finite"), 3.0);
    }

    #[test]
    fn weights_outside_the_schema_are_rejected() {
        let result = LinearModel::new(
            schema(),
            LinearParams {
                bias: 0.0,
                weights: weights(&[("not_a_feature", 1.0)]),
            },
        );
        assert!(matches!(result, Err(ModelError::Invalid(_))));
    }

    #[test]
    fn non_finite_scores_are_errors() {
        let model = LinearModel::new(
            schema(),
            LinearParams {
                bias: f64::NAN,
                weights: HashMap::new(),
            },
        )
        .expect("valid model");

        let features = FeatureVector::new();
        assert!(matches!(
            model.predict(&features),
            Err(PredictionError::NonFinite)
        ));
    }
}
