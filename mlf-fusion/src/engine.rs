//! Fusion engine - combines component predictions into one fused prediction
//!
//! Regression: weighted mean of the components' numeric predictions.
//! Classification: weighted mean of the components' probability vectors,
//! projected onto the fusion's sorted class names; the predicted class is the
//! most probable one, earliest class name on ties.
//!
//! Each call is stateless; the descriptor and component handles are
//! read-only, so one `Fusion` can serve concurrent predictions.

use crate::aggregation::{argmax_first, project_onto_classes, weighted_mean, weighted_mean_vectors};
use crate::component::{ComponentModels, FusionComponent, Prediction, PredictionValue};
use crate::descriptor::FusionDescriptor;
use crate::error::{FusionError, Result};
use mlf_common::config::PredictionOptions;
use mlf_common::{InputData, ModelFields, ResolvedInput};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Probability of one class in expanded output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassProbability {
    pub prediction: String,
    pub probability: f64,
}

/// Fused probability distribution over the fusion's class names
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProbabilityOutput {
    /// One `{prediction, probability}` record per class, in class order
    Expanded(Vec<ClassProbability>),
    /// Bare probabilities in class order
    Compact(Vec<f64>),
}

impl ProbabilityOutput {
    /// Probabilities in class order, whatever the format
    pub fn probabilities(&self) -> Vec<f64> {
        match self {
            ProbabilityOutput::Expanded(records) => {
                records.iter().map(|r| r.probability).collect()
            }
            ProbabilityOutput::Compact(values) => values.clone(),
        }
    }
}

/// Local fusion predictor
#[derive(Debug, Clone)]
pub struct Fusion {
    descriptor: FusionDescriptor,
    model_fields: ModelFields,
}

impl Fusion {
    /// Construct from a fusion resource and its component handles
    ///
    /// Fails without producing a fusion if the resource is not finished,
    /// is malformed, or references a component that cannot be tagged or
    /// has no handle.
    pub fn new(resource: &Value, models: &ComponentModels) -> Result<Self> {
        let descriptor = FusionDescriptor::from_resource(resource, models)?;
        Ok(Self::from_descriptor(descriptor))
    }

    pub fn from_descriptor(descriptor: FusionDescriptor) -> Self {
        let model_fields = ModelFields::new(
            descriptor.fields().clone(),
            Some(descriptor.objective_id().to_string()),
            descriptor.missing_numerics(),
        );
        Self {
            descriptor,
            model_fields,
        }
    }

    pub fn descriptor(&self) -> &FusionDescriptor {
        &self.descriptor
    }

    pub fn model_fields(&self) -> &ModelFields {
        &self.model_fields
    }

    /// Best point prediction for one input record
    ///
    /// Regression fusions return the fused value without confidence;
    /// classification fusions return the winning class and its fused
    /// probability.
    pub fn predict(&self, input: &InputData, by_name: bool) -> Result<Prediction> {
        let resolved = self.model_fields.resolve(input, by_name)?;

        if self.descriptor.is_regression() {
            let value = self.fused_regression(&resolved)?;
            debug!("Fused regression prediction: {}", value);
            return Ok(Prediction {
                prediction: PredictionValue::Number(value),
                confidence: None,
            });
        }

        let probabilities = self.fused_probabilities(&resolved)?;
        let class_names = self.descriptor.class_names();
        let best = argmax_first(&probabilities).ok_or_else(|| {
            FusionError::InvalidComponentOutput {
                model_id: self.component_ids(),
                reason: "no finite fused probability".to_string(),
            }
        })?;

        debug!(
            "Fused classification prediction: {} ({:.4})",
            class_names[best], probabilities[best]
        );
        Ok(Prediction {
            prediction: PredictionValue::Label(class_names[best].clone()),
            confidence: Some(probabilities[best]),
        })
    }

    /// Fused probability for every class name
    pub fn predict_probability(
        &self,
        input: &InputData,
        by_name: bool,
        compact: bool,
    ) -> Result<ProbabilityOutput> {
        if self.descriptor.is_regression() {
            return Err(FusionError::UnsupportedForRegression);
        }

        let resolved = self.model_fields.resolve(input, by_name)?;
        let probabilities = self.fused_probabilities(&resolved)?;

        if compact {
            return Ok(ProbabilityOutput::Compact(probabilities));
        }

        Ok(ProbabilityOutput::Expanded(
            self.descriptor
                .class_names()
                .iter()
                .zip(probabilities)
                .map(|(class, probability)| ClassProbability {
                    prediction: class.clone(),
                    probability,
                })
                .collect(),
        ))
    }

    pub fn predict_with(&self, input: &InputData, options: &PredictionOptions) -> Result<Prediction> {
        self.predict(input, options.by_name)
    }

    pub fn predict_probability_with(
        &self,
        input: &InputData,
        options: &PredictionOptions,
    ) -> Result<ProbabilityOutput> {
        self.predict_probability(input, options.by_name, options.compact)
    }

    fn component_ids(&self) -> String {
        self.descriptor
            .components()
            .iter()
            .map(|component| component.id.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn fused_regression(&self, input: &ResolvedInput) -> Result<f64> {
        let values = self
            .descriptor
            .components()
            .iter()
            .map(|component| -> Result<(f64, f64)> {
                let prediction = component_predict(component, input)?;
                let value = prediction.prediction.as_f64().ok_or_else(|| {
                    FusionError::InvalidComponentOutput {
                        model_id: component.id.clone(),
                        reason: format!("expected a number, got '{}'", prediction.prediction),
                    }
                })?;
                Ok((value, component.effective_weight()))
            })
            .collect::<Result<Vec<_>>>()?;

        weighted_mean(&values).ok_or_else(|| {
            FusionError::MalformedResource("component weights sum to zero".to_string())
        })
    }

    fn fused_probabilities(&self, input: &ResolvedInput) -> Result<Vec<f64>> {
        let class_names = self.descriptor.class_names();

        let vectors = self
            .descriptor
            .components()
            .iter()
            .map(|component| -> Result<(Vec<f64>, f64)> {
                let probabilities = component.model.predict_probability(input).map_err(|source| {
                    FusionError::Component {
                        model_id: component.id.clone(),
                        source,
                    }
                })?;
                debug!("Component {} probabilities: {:?}", component.id, probabilities);
                let projected = project_onto_classes(&probabilities, class_names).ok_or_else(|| {
                    FusionError::InvalidComponentOutput {
                        model_id: component.id.clone(),
                        reason: "no finite probability mass on the fusion's classes".to_string(),
                    }
                })?;
                Ok((projected, component.effective_weight()))
            })
            .collect::<Result<Vec<_>>>()?;

        weighted_mean_vectors(&vectors, class_names.len()).ok_or_else(|| {
            FusionError::MalformedResource("component weights sum to zero".to_string())
        })
    }
}

fn component_predict(component: &FusionComponent, input: &ResolvedInput) -> Result<Prediction> {
    component
        .model
        .predict(input)
        .map_err(|source| FusionError::Component {
            model_id: component.id.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_output_serialization() {
        let expanded = ProbabilityOutput::Expanded(vec![ClassProbability {
            prediction: "a".to_string(),
            probability: 0.25,
        }]);
        assert_eq!(
            serde_json::to_value(&expanded).unwrap(),
            serde_json::json!([{"prediction": "a", "probability": 0.25}])
        );

        let compact = ProbabilityOutput::Compact(vec![0.25, 0.75]);
        assert_eq!(
            serde_json::to_value(&compact).unwrap(),
            serde_json::json!([0.25, 0.75])
        );
        assert_eq!(compact.probabilities(), vec![0.25, 0.75]);
    }

    #[test]
    fn test_fusion_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Fusion>();
    }
}
