//! Startup artifact loading and shared handler state

use aqi_core::{AqiError, InferenceContext, Model, Predictor};
use aqi_core::{FeatureKeys, FeatureSchema};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::config::ServiceConfig;
use crate::metrics::MetricsCollector;

pub type SharedState = Arc<AppState>;

/// What was learned about the schema artifact at startup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaSummary {
    pub path: String,
    pub features: usize,
    pub cities: usize,
}

/// What was learned about the model artifact at startup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub path: String,
    /// Unknown for predictors supplied in memory
    pub trees: Option<usize>,
    pub fingerprint: Option<String>,
}

/// Per-artifact load outcome; errors are kept as display strings
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactReport {
    pub schema: Result<SchemaSummary, String>,
    pub model: Result<ModelSummary, String>,
}

impl ArtifactReport {
    /// First failure, schema before model
    pub fn first_error(&self) -> Option<&str> {
        self.schema
            .as_ref()
            .err()
            .or_else(|| self.model.as_ref().err())
            .map(String::as_str)
    }
}

/// Result of loading both artifacts
#[derive(Debug)]
pub struct LoadedArtifacts {
    pub context: Option<InferenceContext>,
    pub report: ArtifactReport,
}

impl LoadedArtifacts {
    /// Fail with the first recorded error when nothing usable was loaded
    pub fn require(self) -> Result<Self, AqiError> {
        if self.context.is_some() {
            return Ok(self);
        }
        let reason = self
            .report
            .first_error()
            .unwrap_or("artifacts not loaded")
            .to_string();
        Err(AqiError::Initialization(reason))
    }
}

/// Load schema and model from the configured paths.
///
/// Never fails: each problem is logged and recorded in the report.
pub fn load_artifacts(config: &ServiceConfig) -> LoadedArtifacts {
    let schema = load_schema(&config.schema_path, config.features.clone());
    let model = load_model(&config.model_path);

    let mut report = ArtifactReport {
        schema: schema.as_ref().map(|(s, _)| s.clone()).map_err(String::clone),
        model: model.as_ref().map(|(s, _)| s.clone()).map_err(String::clone),
    };

    let context = match (schema, model) {
        (Ok((_, schema)), Ok((_, model))) => {
            let predictor: Arc<dyn Predictor> = Arc::new(model);
            match InferenceContext::new(schema, predictor, config.palette.clone()) {
                Ok(context) => Some(context),
                Err(err) => {
                    error!(error = %err, "schema and model do not fit together");
                    report.model = Err(init_reason(err));
                    None
                }
            }
        }
        _ => None,
    };

    LoadedArtifacts { context, report }
}

fn load_schema(
    path: &Path,
    keys: FeatureKeys,
) -> Result<(SchemaSummary, FeatureSchema), String> {
    match FeatureSchema::load_json(path, keys) {
        Ok(schema) => {
            let summary = SchemaSummary {
                path: path.display().to_string(),
                features: schema.len(),
                cities: schema.cities().len(),
            };
            info!(
                path = %path.display(),
                features = summary.features,
                cities = summary.cities,
                "feature schema loaded"
            );
            Ok((summary, schema))
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to load feature schema");
            Err(init_reason(err))
        }
    }
}

/// Bare reason; `AqiError::Initialization` adds its own prefix when re-raised
fn init_reason(err: AqiError) -> String {
    match err {
        AqiError::Initialization(reason) => reason,
        other => other.to_string(),
    }
}

fn load_model(path: &Path) -> Result<(ModelSummary, Model), String> {
    match Model::load_json(path) {
        Ok(model) => {
            let summary = ModelSummary {
                path: path.display().to_string(),
                trees: Some(model.num_trees()),
                fingerprint: model.fingerprint(),
            };
            info!(
                path = %path.display(),
                trees = model.num_trees(),
                hash = summary.fingerprint.as_deref().unwrap_or("-"),
                "model loaded"
            );
            Ok((summary, model))
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to load model");
            Err(format!("failed to load model {}: {err}", path.display()))
        }
    }
}

/// State shared by every handler
#[derive(Debug)]
pub struct AppState {
    inference: Option<InferenceContext>,
    report: ArtifactReport,
    metrics: MetricsCollector,
    start_time: Instant,
}

impl AppState {
    pub fn new(artifacts: LoadedArtifacts) -> Self {
        Self {
            inference: artifacts.context,
            report: artifacts.report,
            metrics: MetricsCollector::new(),
            start_time: Instant::now(),
        }
    }

    /// Ready state around an already built context
    pub fn from_context(context: InferenceContext) -> Self {
        let schema = context.schema();
        let report = ArtifactReport {
            schema: Ok(SchemaSummary {
                path: "<memory>".to_string(),
                features: schema.len(),
                cities: schema.cities().len(),
            }),
            model: Ok(ModelSummary {
                path: "<memory>".to_string(),
                trees: None,
                fingerprint: context.model_fingerprint(),
            }),
        };
        Self::new(LoadedArtifacts {
            context: Some(context),
            report,
        })
    }

    /// Inference context, or the reason it is unavailable
    pub fn inference(&self) -> Result<&InferenceContext, AqiError> {
        self.inference.as_ref().ok_or_else(|| {
            AqiError::Initialization(
                self.report
                    .first_error()
                    .unwrap_or("artifacts not loaded")
                    .to_string(),
            )
        })
    }

    pub fn is_ready(&self) -> bool {
        self.inference.is_some()
    }

    pub fn report(&self) -> &ArtifactReport {
        &self.report
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}
