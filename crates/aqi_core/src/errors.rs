//! Error types for the AQI core

use thiserror::Error;

/// Errors produced while turning a request into an AQI estimate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AqiError {
    /// The requested city has no one-hot column in the schema
    #[error("City not supported: {city}")]
    UnsupportedCity { city: String },

    /// A calendar field could not be read as an integer
    #[error("Invalid value for '{field}': {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// The predictor failed or produced a non-finite score
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    /// Schema or model could not be loaded or do not fit together
    #[error("Initialization failed: {0}")]
    Initialization(String),
}

impl AqiError {
    /// True for errors the caller can fix by changing the request
    pub fn is_client_error(&self) -> bool {
        matches!(self, AqiError::UnsupportedCity { .. })
    }
}

/// Result type for AQI core operations
pub type Result<T> = std::result::Result<T, AqiError>;
