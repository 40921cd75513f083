//! Immutable inference context shared by every request.

use crate::category::{categorize, round_aqi, AqiCategory, Palette};
use crate::errors::{AqiError, Result};
use crate::features::{encode, PredictionRequest};
use crate::predictor::Predictor;
use crate::schema::FeatureSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Categorized AQI estimate returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiResult {
    /// Predicted AQI rounded to two decimals
    pub aqi: f64,
    pub category: AqiCategory,
    pub color: String,
    pub city: String,
}

/// Schema, predictor and palette, loaded once and read concurrently.
#[derive(Clone)]
pub struct InferenceContext {
    schema: Arc<FeatureSchema>,
    predictor: Arc<dyn Predictor>,
    palette: Palette,
}

impl fmt::Debug for InferenceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceContext")
            .field("features", &self.schema.len())
            .field("cities", &self.schema.cities().len())
            .field("model", &self.predictor.fingerprint())
            .finish()
    }
}

impl InferenceContext {
    /// Bundle a schema and predictor.
    ///
    /// Fails when the predictor needs more features than the schema
    /// provides.
    pub fn new(
        schema: FeatureSchema,
        predictor: Arc<dyn Predictor>,
        palette: Palette,
    ) -> Result<Self> {
        if let Some(required) = predictor.min_features() {
            if required > schema.len() {
                return Err(AqiError::Initialization(format!(
                    "model expects {required} features but the schema has {}",
                    schema.len()
                )));
            }
        }

        Ok(Self {
            schema: Arc::new(schema),
            predictor,
            palette,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn model_fingerprint(&self) -> Option<String> {
        self.predictor.fingerprint()
    }

    /// Raw model score for a request
    pub fn score(&self, request: &PredictionRequest) -> Result<f64> {
        let features = encode(&self.schema, request)?;
        let score = self
            .predictor
            .predict(&features)
            .map_err(|e| AqiError::PredictionFailed(e.to_string()))?;

        if !score.is_finite() {
            return Err(AqiError::PredictionFailed(format!(
                "model returned a non-finite score ({score})"
            )));
        }
        Ok(score)
    }

    /// Encode, predict and categorize one request
    pub fn estimate(&self, request: &PredictionRequest) -> Result<AqiResult> {
        let score = self.score(request)?;
        let category = categorize(score);

        debug!(city = %request.city, score, %category, "AQI estimated");

        Ok(AqiResult {
            aqi: round_aqi(score),
            category,
            color: self.palette.color(category).to_string(),
            city: request.city.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::PredictionError;

    fn schema() -> FeatureSchema {
        FeatureSchema::with_default_keys(["Month", "Date_", "Year", "City_Delhi", "City_Mumbai"])
            .unwrap()
    }

    fn constant(score: f64) -> Arc<dyn Predictor> {
        Arc::new(move |_: &[f64]| -> std::result::Result<f64, PredictionError> { Ok(score) })
    }

    #[test]
    fn estimate_poor() {
        let ctx = InferenceContext::new(schema(), constant(275.4), Palette::default()).unwrap();
        let result = ctx.estimate(&PredictionRequest::new("Delhi", 6, 1, 2023)).unwrap();
        assert_eq!(result.category, AqiCategory::Poor);
        assert_eq!(result.aqi, 275.4);
        assert_eq!(result.color, "#ff8c42");
        assert_eq!(result.city, "Delhi");
    }

    #[test]
    fn estimate_boundary_good() {
        let ctx = InferenceContext::new(schema(), constant(50.0), Palette::default()).unwrap();
        let result = ctx.estimate(&PredictionRequest::new("Mumbai", 1, 1, 2024)).unwrap();
        assert_eq!(result.category, AqiCategory::Good);
        assert_eq!(result.aqi, 50.0);
    }

    #[test]
    fn categorizes_before_rounding() {
        let ctx = InferenceContext::new(schema(), constant(50.004), Palette::default()).unwrap();
        let result = ctx.estimate(&PredictionRequest::new("Delhi", 1, 1, 2024)).unwrap();
        assert_eq!(result.aqi, 50.0);
        assert_eq!(result.category, AqiCategory::Satisfactory);
    }

    #[test]
    fn predictor_sees_encoded_vector() {
        let echo: Arc<dyn Predictor> =
            Arc::new(|features: &[f64]| -> std::result::Result<f64, PredictionError> {
                assert_eq!(features, &[6.0, 1.0, 2023.0, 1.0, 0.0]);
                Ok(1.0)
            });
        let ctx = InferenceContext::new(schema(), echo, Palette::default()).unwrap();
        ctx.estimate(&PredictionRequest::new("Delhi", 6, 1, 2023)).unwrap();
    }

    #[test]
    fn predictor_failure_propagates() {
        let failing: Arc<dyn Predictor> =
            Arc::new(|_: &[f64]| -> std::result::Result<f64, PredictionError> {
                Err(PredictionError::new("model crashed"))
            });
        let ctx = InferenceContext::new(schema(), failing, Palette::default()).unwrap();
        let err = ctx.estimate(&PredictionRequest::new("Delhi", 6, 1, 2023)).unwrap_err();
        assert_eq!(err, AqiError::PredictionFailed("model crashed".to_string()));
    }

    #[test]
    fn non_finite_score_is_a_failure() {
        let ctx = InferenceContext::new(schema(), constant(f64::NAN), Palette::default()).unwrap();
        assert!(matches!(
            ctx.estimate(&PredictionRequest::new("Delhi", 6, 1, 2023)),
            Err(AqiError::PredictionFailed(_))
        ));
    }

    #[test]
    fn unsupported_city_skips_prediction() {
        let never: Arc<dyn Predictor> =
            Arc::new(|_: &[f64]| -> std::result::Result<f64, PredictionError> {
                panic!("predictor must not run for unsupported cities")
            });
        let ctx = InferenceContext::new(schema(), never, Palette::default()).unwrap();
        assert!(matches!(
            ctx.estimate(&PredictionRequest::new("Chennai", 6, 1, 2023)),
            Err(AqiError::UnsupportedCity { .. })
        ));
    }

    #[test]
    fn rejects_model_wider_than_schema() {
        use crate::gbdt::{Model, Node, Tree};

        let tree = Tree::new(
            vec![
                Node::internal(0, 7, 0.5, 1, 2),
                Node::leaf(1, 10.0),
                Node::leaf(2, 20.0),
            ],
            1.0,
        );
        let model: Arc<dyn Predictor> = Arc::new(Model::new(vec![tree], 0.0));
        let err = InferenceContext::new(schema(), model, Palette::default()).unwrap_err();
        assert!(matches!(err, AqiError::Initialization(_)));
    }
}
