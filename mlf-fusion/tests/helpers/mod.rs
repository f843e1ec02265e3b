//! Test Helper Utilities
//!
//! Stub component predictors and fusion resource builders

#![allow(dead_code)]

use anyhow::anyhow;
use mlf_fusion::{
    ComponentHandle, ComponentModels, InputData, LocalPredictor, Prediction, PredictionValue,
    ResolvedInput,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Regression component returning a fixed value
pub struct FixedValue(pub f64);

impl LocalPredictor for FixedValue {
    fn predict(&self, _input: &ResolvedInput) -> anyhow::Result<Prediction> {
        Ok(Prediction {
            prediction: PredictionValue::Number(self.0),
            confidence: None,
        })
    }
}

/// Classification component returning a fixed distribution
pub struct FixedDistribution {
    pub probabilities: HashMap<String, f64>,
    pub calls: AtomicUsize,
}

impl FixedDistribution {
    pub fn new(pairs: &[(&str, f64)]) -> Self {
        Self {
            probabilities: pairs.iter().map(|(c, p)| (c.to_string(), *p)).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl LocalPredictor for FixedDistribution {
    fn predict(&self, _input: &ResolvedInput) -> anyhow::Result<Prediction> {
        let (label, probability) = self
            .probabilities
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .ok_or_else(|| anyhow!("empty distribution"))?;
        Ok(Prediction {
            prediction: PredictionValue::Label(label.clone()),
            confidence: Some(*probability),
        })
    }

    fn predict_probability(&self, _input: &ResolvedInput) -> anyhow::Result<HashMap<String, f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.probabilities.clone())
    }
}

/// Regression component that scales one numeric input field
pub struct LinearOnField {
    pub field_id: String,
    pub slope: f64,
}

impl LocalPredictor for LinearOnField {
    fn predict(&self, input: &ResolvedInput) -> anyhow::Result<Prediction> {
        let x = input
            .get(&self.field_id)
            .and_then(Value::as_f64)
            .ok_or_else(|| anyhow!("missing input field {}", self.field_id))?;
        Ok(Prediction {
            prediction: PredictionValue::Number(self.slope * x),
            confidence: None,
        })
    }
}

/// Component that always fails
pub struct Failing;

impl LocalPredictor for Failing {
    fn predict(&self, _input: &ResolvedInput) -> anyhow::Result<Prediction> {
        Err(anyhow!("tree walk failed"))
    }

    fn predict_probability(&self, _input: &ResolvedInput) -> anyhow::Result<HashMap<String, f64>> {
        Err(anyhow!("tree walk failed"))
    }
}

/// Shared handle for a stub predictor
pub fn handle<P: LocalPredictor + 'static>(predictor: P) -> ComponentHandle {
    Arc::new(predictor)
}

/// Handle map from `(id, predictor)` pairs
pub fn handles(entries: Vec<(&str, ComponentHandle)>) -> ComponentModels {
    entries
        .into_iter()
        .map(|(id, model)| (id.to_string(), model))
        .collect()
}

/// Finished classification fusion over the given classes
pub fn classification_resource(classes: &[&str], models: Value) -> Value {
    let categories: Vec<Value> = classes.iter().map(|c| json!([c, 10])).collect();
    json!({
        "resource": "fusion/5af06df94e17277501000011",
        "object": {
            "resource": "fusion/5af06df94e17277501000011",
            "status": {"code": 5, "message": "The fusion has been created"},
            "objective_fields": ["000004"],
            "models": models,
            "fusion": {
                "fields": {
                    "000000": {"name": "petal length", "optype": "numeric"},
                    "000001": {"name": "petal width", "optype": "numeric"},
                    "000004": {
                        "name": "species",
                        "optype": "categorical",
                        "summary": {"categories": categories}
                    }
                }
            }
        }
    })
}

/// Finished regression fusion predicting field `000002`
pub fn regression_resource(models: Value) -> Value {
    json!({
        "status": {"code": 5},
        "objective_fields": ["000002"],
        "fusion": {
            "models": models,
            "fields": {
                "000000": {"name": "x", "optype": "numeric"},
                "000002": {
                    "name": "y",
                    "optype": "numeric",
                    "summary": {"bins": [[12.5, 4], [17.5, 6]]}
                }
            }
        }
    })
}

/// Input record from `(key, value)` pairs
pub fn input(pairs: &[(&str, Value)]) -> InputData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
