//! Tree-ensemble regression model
//!
//! Pure-Rust evaluator for exported decision-tree ensembles (gradient
//! boosting or random forest) stored as JSON.
//!
//! # Model Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "aggregation": "sum",
//!   "base_score": 0.0,
//!   "num_features": 5,
//!   "trees": [
//!     {
//!       "nodes": [
//!         {"id":0,"left":1,"right":2,"feature_idx":0,"threshold":6.5,"leaf":null},
//!         {"id":1,"left":-1,"right":-1,"feature_idx":-1,"threshold":0.0,"leaf":80.0},
//!         {"id":2,"left":-1,"right":-1,"feature_idx":-1,"threshold":0.0,"leaf":120.0}
//!       ],
//!       "weight": 1.0
//!     }
//!   ]
//! }
//! ```
//!
//! `aggregation` is `"sum"` for boosted ensembles and `"mean"` for forests.
//!
//! # Usage
//!
//! ```rust
//! use aqi_core::gbdt::{Model, Node, Tree};
//!
//! let tree = Tree::new(
//!     vec![
//!         Node::internal(0, 0, 6.5, 1, 2),
//!         Node::leaf(1, 80.0),
//!         Node::leaf(2, 120.0),
//!     ],
//!     1.0,
//! );
//!
//! let model = Model::new(vec![tree], 0.0);
//! assert_eq!(model.score(&[6.0]).unwrap(), 80.0);
//! let hash = model.hash_hex().unwrap();
//! assert_eq!(hash.len(), 64);
//! ```

pub mod model;
pub mod tree;

pub use model::{Aggregation, Model, ModelError, FORMAT_VERSION};
pub use tree::{Node, TraversalError, Tree};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::predictor::Predictor;

    fn forest() -> Model {
        let month_split = Tree::new(
            vec![
                Node::internal(0, 0, 6.5, 1, 2),
                Node::leaf(1, 180.0),
                Node::leaf(2, 90.0),
            ],
            1.0,
        );
        let city_split = Tree::new(
            vec![
                Node::internal(0, 3, 0.5, 1, 2),
                Node::leaf(1, 100.0),
                Node::leaf(2, 300.0),
            ],
            1.0,
        );
        Model::forest(vec![month_split, city_split]).with_num_features(5)
    }

    #[test]
    fn test_forest_through_predictor_trait() {
        let model = forest();
        let predictor: &dyn Predictor = &model;

        // month 6, Delhi one-hot set
        let score = predictor.predict(&[6.0, 1.0, 2023.0, 1.0, 0.0]).unwrap();
        assert_eq!(score, 240.0);

        // month 11, Mumbai
        let score = predictor.predict(&[11.0, 1.0, 2023.0, 0.0, 1.0]).unwrap();
        assert_eq!(score, 95.0);
    }

    #[test]
    fn test_predictor_error_is_reported() {
        let model = forest();
        let err = Predictor::predict(&model, &[6.0]).unwrap_err();
        assert!(err.to_string().contains("Tree 1"));
    }

    #[test]
    fn test_fingerprint_matches_hash() {
        let model = forest();
        assert_eq!(model.fingerprint(), Some(model.hash_hex().unwrap()));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{
            "version": 1,
            "trees": [{"nodes": [{"id":0,"left":-1,"right":-1,"feature":-1,"threshold":0,"leaf":42.0}]}]
        }"#;
        let model: Model = serde_json::from_str(json).unwrap();
        assert_eq!(model.aggregation, Aggregation::Sum);
        assert_eq!(model.base_score, 0.0);
        assert!(model.validate().is_ok());
        assert_eq!(model.score(&[]).unwrap(), 42.0);
    }

    #[test]
    fn test_canonical_json_roundtrip_preserves_predictions() {
        let original = forest();
        let json = original.to_canonical_json().unwrap();
        let restored: Model = serde_json::from_str(&json).unwrap();

        assert_eq!(original, restored);
        let features = [3.0, 14.0, 2022.0, 0.0, 1.0];
        assert_eq!(
            original.score(&features).unwrap(),
            restored.score(&features).unwrap()
        );
    }
}
