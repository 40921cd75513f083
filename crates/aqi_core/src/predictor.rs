//! Narrow seam between the encoder and whatever regression model scores the
//! feature vector.

use thiserror::Error;

/// Failure reported by a predictor implementation
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct PredictionError(String);

impl PredictionError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self(message.into())
    }
}

/// A trained regression model: one feature vector in, one scalar out.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64, PredictionError>;

    /// Minimum feature vector length the model needs, if known
    fn min_features(&self) -> Option<usize> {
        None
    }

    /// Stable identifier of the loaded artifact (e.g. a content hash)
    fn fingerprint(&self) -> Option<String> {
        None
    }
}

impl<F> Predictor for F
where
    F: Fn(&[f64]) -> Result<f64, PredictionError> + Send + Sync,
{
    fn predict(&self, features: &[f64]) -> Result<f64, PredictionError> {
        self(features)
    }
}
