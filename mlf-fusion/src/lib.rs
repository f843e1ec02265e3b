//! # MLF Fusion
//!
//! Local predictions for fusions: meta-models that combine the predictions
//! of several independently trained component models (decision trees,
//! ensembles, logistic regressions, deep nets) into one fused prediction.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mlf_fusion::{ComponentModels, Fusion};
//! use std::collections::HashMap;
//!
//! # fn load_resource() -> serde_json::Value { unimplemented!() }
//! # fn load_components() -> ComponentModels { unimplemented!() }
//! let resource = load_resource();
//! let models = load_components();
//! let fusion = Fusion::new(&resource, &models)?;
//!
//! let mut input = HashMap::new();
//! input.insert("petal length".to_string(), serde_json::json!(3));
//! input.insert("petal width".to_string(), serde_json::json!(1));
//!
//! let prediction = fusion.predict(&input, true)?;
//! let distribution = fusion.predict_probability(&input, true, false)?;
//! # Ok::<(), mlf_fusion::FusionError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! raw input → ModelFields (resolve) → components (predict) → aggregation → fused result
//! ```

pub mod aggregation;
pub mod component;
pub mod descriptor;
pub mod engine;
pub mod error;

pub use component::{
    ComponentHandle, ComponentKind, ComponentModels, FusionComponent, LocalPredictor, Prediction,
    PredictionValue,
};
pub use descriptor::FusionDescriptor;
pub use engine::{ClassProbability, Fusion, ProbabilityOutput};
pub use error::{FusionError, Result};
pub use mlf_common::{InputData, ResolvedInput};
