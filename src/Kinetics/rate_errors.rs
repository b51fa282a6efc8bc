use thiserror::Error;

/// error types for rate law construction, validation and evaluator linkage
#[derive(Debug, Error)]
pub enum RateError {
    /// malformed, type-mismatched or missing configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// rate law violates a physical or policy invariant
    #[error("Invalid rate in reaction '{equation}': {message}")]
    Validation { equation: String, message: String },
    /// slot-dependent operation on a rate law that is not linked to an evaluator
    #[error("Linkage error: {0}")]
    Linkage(String),
    #[error("Failed to parse configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

impl RateError {
    pub fn config(msg: impl Into<String>) -> Self {
        RateError::Configuration(msg.into())
    }
}
