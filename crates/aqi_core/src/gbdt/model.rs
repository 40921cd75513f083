//! Tree-ensemble regression model
//!
//! Implements a JSON-serialized tree ensemble with:
//! - Sum (boosting) or mean (random forest) aggregation
//! - Canonical JSON serialization
//! - Blake3 model hashing

use super::tree::{TraversalError, Tree};
use crate::predictor::{PredictionError, Predictor};
use crate::serde_canon::{hash_canonical_hex, to_canonical_json, CanonicalError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Model errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Canonical serialization error: {0}")]
    CanonicalError(#[from] CanonicalError),

    #[error("Tree {tree} could not be evaluated: {source}")]
    Traversal { tree: usize, source: TraversalError },
}

/// Current model format version
pub const FORMAT_VERSION: u32 = 1;

/// How per-tree outputs combine into one prediction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Gradient boosting: outputs are added
    #[default]
    Sum,
    /// Random forest: outputs are averaged
    Mean,
}

/// Tree-ensemble regression model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    /// Model format version (always 1 for now)
    pub version: u32,

    #[serde(default)]
    pub aggregation: Aggregation,

    /// Constant added to the aggregated tree output
    #[serde(default)]
    pub base_score: f64,

    /// Expected feature vector length, when the exporter recorded it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_features: Option<usize>,

    /// Decision trees in the ensemble
    pub trees: Vec<Tree>,
}

impl Model {
    /// Create a boosting-style model
    pub fn new(trees: Vec<Tree>, base_score: f64) -> Self {
        Self {
            version: FORMAT_VERSION,
            aggregation: Aggregation::Sum,
            base_score,
            num_features: None,
            trees,
        }
    }

    /// Create a forest-style model whose trees are averaged
    pub fn forest(trees: Vec<Tree>) -> Self {
        Self {
            aggregation: Aggregation::Mean,
            ..Self::new(trees, 0.0)
        }
    }

    pub fn with_num_features(mut self, num_features: usize) -> Self {
        self.num_features = Some(num_features);
        self
    }

    /// Validate model structure
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.version != FORMAT_VERSION {
            return Err(ModelError::ValidationFailed(format!(
                "Unsupported model version: {}",
                self.version
            )));
        }

        if self.trees.is_empty() {
            return Err(ModelError::ValidationFailed(
                "Model contains no trees".to_string(),
            ));
        }

        if !self.base_score.is_finite() {
            return Err(ModelError::ValidationFailed(format!(
                "Invalid base_score: {}",
                self.base_score
            )));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| {
                ModelError::ValidationFailed(format!("Tree {} validation failed: {}", i, e))
            })?;
        }

        if let (Some(declared), Some(max_idx)) = (self.num_features, self.max_feature_index()) {
            if max_idx >= declared {
                return Err(ModelError::ValidationFailed(format!(
                    "Trees reference feature {max_idx} but num_features is {declared}"
                )));
            }
        }

        Ok(())
    }

    /// Evaluate the ensemble on a feature vector
    ///
    /// Algorithm:
    /// 1. For each tree, traverse to find the leaf value
    /// 2. Accumulate `leaf_value * tree.weight`
    /// 3. Divide by the tree count for `Mean` aggregation
    /// 4. Add `base_score`
    pub fn score(&self, features: &[f64]) -> Result<f64, ModelError> {
        let mut sum = 0.0;

        for (i, tree) in self.trees.iter().enumerate() {
            let leaf_value = tree
                .evaluate(features)
                .map_err(|source| ModelError::Traversal { tree: i, source })?;
            sum += leaf_value * tree.weight;
        }

        if self.aggregation == Aggregation::Mean && !self.trees.is_empty() {
            sum /= self.trees.len() as f64;
        }

        Ok(self.base_score + sum)
    }

    /// Largest feature index any tree splits on
    pub fn max_feature_index(&self) -> Option<usize> {
        self.trees.iter().filter_map(Tree::max_feature_index).max()
    }

    /// Serialize model to canonical JSON (sorted keys, no whitespace)
    pub fn to_canonical_json(&self) -> Result<String, ModelError> {
        Ok(to_canonical_json(self)?)
    }

    /// Compute model hash as hex string
    pub fn hash_hex(&self) -> Result<String, ModelError> {
        Ok(hash_canonical_hex(self)?)
    }

    /// Save model to JSON file with canonical serialization
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let json = self.to_canonical_json()?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a model from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let json = fs::read_to_string(path)?;
        let model: Model = serde_json::from_str(&json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Predictor for Model {
    fn predict(&self, features: &[f64]) -> Result<f64, PredictionError> {
        self.score(features)
            .map_err(|e| PredictionError::new(e.to_string()))
    }

    fn min_features(&self) -> Option<usize> {
        self.num_features
            .or_else(|| self.max_feature_index().map(|idx| idx + 1))
    }

    fn fingerprint(&self) -> Option<String> {
        self.hash_hex().ok()
    }
}
