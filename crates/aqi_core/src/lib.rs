//! AQI forecasting core
//!
//! Turns a `{city, month, day, year}` request into a categorized AQI
//! estimate using a pre-trained regression model.
//!
//! Modules:
//! - `schema`: Feature column names and the lookups derived from them
//! - `features`: Request parsing and one-hot feature encoding
//! - `predictor`: Trait seam for the regression model
//! - `gbdt`: Tree-ensemble model format and evaluator
//! - `category`: AQI severity bands and display palette
//! - `context`: Immutable bundle that runs the full pipeline
//! - `serde_canon`: Canonical JSON and artifact fingerprints

pub mod category;
pub mod context;
pub mod errors;
pub mod features;
pub mod gbdt;
pub mod predictor;
pub mod schema;
pub mod serde_canon;

pub use category::{categorize, round_aqi, AqiCategory, Palette};
pub use context::{AqiResult, InferenceContext};
pub use errors::{AqiError, Result};
pub use features::{encode, CalendarValue, FeatureVector, PredictionRequest};
pub use gbdt::{Model, ModelError};
pub use predictor::{PredictionError, Predictor};
pub use schema::{CalendarField, CityIndex, FeatureKeys, FeatureSchema};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
