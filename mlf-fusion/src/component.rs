//! Component models of a fusion
//!
//! Each component is an already-built local predictor of one of four kinds.
//! The kind is recorded from the component's resource id when the fusion is
//! constructed and never inspected again at prediction time.

use mlf_common::ResolvedInput;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Kind of a component model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Model,
    Ensemble,
    LogisticRegression,
    Deepnet,
}

impl ComponentKind {
    /// Substring tokens checked against resource ids, in precedence order
    const TOKENS: [(&'static str, ComponentKind); 4] = [
        ("model", ComponentKind::Model),
        ("ensemble", ComponentKind::Ensemble),
        ("logisticregression", ComponentKind::LogisticRegression),
        ("deepnet", ComponentKind::Deepnet),
    ];

    /// Kind of the first token contained in `resource_id`
    pub fn from_resource_id(resource_id: &str) -> Option<Self> {
        Self::TOKENS
            .iter()
            .find(|(token, _)| resource_id.contains(token))
            .map(|(_, kind)| *kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Model => "model",
            ComponentKind::Ensemble => "ensemble",
            ComponentKind::LogisticRegression => "logisticregression",
            ComponentKind::Deepnet => "deepnet",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point prediction value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionValue {
    Number(f64),
    Label(String),
}

impl PredictionValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PredictionValue::Number(n) => Some(*n),
            PredictionValue::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            PredictionValue::Label(label) => Some(label),
            PredictionValue::Number(_) => None,
        }
    }
}

impl fmt::Display for PredictionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionValue::Number(n) => write!(f, "{}", n),
            PredictionValue::Label(label) => f.write_str(label),
        }
    }
}

/// Point prediction with optional confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: PredictionValue,
    pub confidence: Option<f64>,
}

/// Local prediction contract shared by every component kind
///
/// Implementations must be safe to call concurrently; any per-call cache
/// has to be synchronized by the implementation itself.
pub trait LocalPredictor: Send + Sync {
    /// Point prediction for an already-resolved input
    fn predict(&self, input: &ResolvedInput) -> anyhow::Result<Prediction>;

    /// Class name → probability for an already-resolved input
    ///
    /// Regression-only predictors keep the default, which fails.
    fn predict_probability(&self, _input: &ResolvedInput) -> anyhow::Result<HashMap<String, f64>> {
        anyhow::bail!("probability predictions are not supported by this model")
    }
}

/// Shared handle to a component predictor
pub type ComponentHandle = Arc<dyn LocalPredictor>;

/// Component handles keyed by resource id, supplied by the caller
pub type ComponentModels = HashMap<String, ComponentHandle>;

/// One component of a fusion: handle, kind tag and optional weight
#[derive(Clone)]
pub struct FusionComponent {
    pub id: String,
    pub kind: ComponentKind,
    pub weight: Option<f64>,
    pub model: ComponentHandle,
}

impl FusionComponent {
    /// Weight used in aggregation (1 when the fusion declares none)
    pub fn effective_weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}

impl fmt::Debug for FusionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FusionComponent")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}
