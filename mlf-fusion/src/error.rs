//! Error types for fusion construction and prediction

use thiserror::Error;

/// Fusion result type
pub type Result<T> = std::result::Result<T, FusionError>;

/// Fusion error type
///
/// Construction errors are fatal: no partially built fusion is returned.
/// Prediction errors abort the whole fused prediction.
#[derive(Debug, Error)]
pub enum FusionError {
    /// Resource status is not FINISHED (or the status block is absent)
    #[error("The fusion isn't finished yet (status code {code:?})")]
    NotReady { code: Option<i64> },

    /// Required keys missing or of the wrong shape
    #[error("Malformed fusion resource: {0}")]
    MalformedResource(String),

    /// Component id matches no known model kind
    #[error("Unknown component kind for id '{0}'")]
    UnknownComponentKind(String),

    /// No component handle supplied for a referenced id
    #[error("No component model supplied for '{0}'")]
    MissingComponent(String),

    /// Input key matches no field
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Probability vector requested from a regression fusion
    #[error("Probability predictions are not available for regression fusions")]
    UnsupportedForRegression,

    /// Input rejected by field resolution
    #[error("Invalid input: {0}")]
    Input(#[source] mlf_common::Error),

    /// A component model failed to predict
    #[error("Component '{model_id}' failed: {source}")]
    Component {
        model_id: String,
        #[source]
        source: anyhow::Error,
    },

    /// A component model returned output the fusion cannot combine
    #[error("Component '{model_id}' returned unusable output: {reason}")]
    InvalidComponentOutput { model_id: String, reason: String },
}

impl From<mlf_common::Error> for FusionError {
    fn from(err: mlf_common::Error) -> Self {
        match err {
            mlf_common::Error::UnknownField(key) => FusionError::UnknownField(key),
            mlf_common::Error::Json(e) => FusionError::MalformedResource(e.to_string()),
            other => FusionError::Input(other),
        }
    }
}
