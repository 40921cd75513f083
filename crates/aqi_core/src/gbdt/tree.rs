//! Decision tree structures for ensemble regression
//!
//! Nodes live in a flat array; node 0 is the root and children are
//! referenced by index.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes:
/// - `feature_idx >= 0`: index into the feature vector
/// - `left` and `right` point to child node indices
/// - `leaf` is `None`
///
/// For leaf nodes:
/// - `feature_idx == -1`
/// - `leaf` contains the regression value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Node ID (informational, not used in traversal)
    pub id: i32,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    #[serde(rename = "feature_idx", alias = "feature")]
    pub feature_idx: i32,

    /// Split threshold; samples with `feature <= threshold` go left
    pub threshold: f64,

    /// Leaf value (Some for leaf nodes, None for internal nodes)
    pub leaf: Option<f64>,
}

impl Node {
    /// Create a new internal (split) node
    pub fn internal(id: i32, feature_idx: i32, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    /// Create a new leaf node
    pub fn leaf(id: i32, value: f64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }

    pub fn leaf_value(&self) -> Option<f64> {
        self.leaf
    }
}

/// Reasons a traversal could not reach a leaf
#[derive(Debug, Clone, PartialEq)]
pub enum TraversalError {
    EmptyTree,
    FeatureOutOfRange { node: usize, feature_idx: i32, len: usize },
    BrokenLink { node: usize, child: i32 },
    Cycle,
}

impl std::fmt::Display for TraversalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraversalError::EmptyTree => write!(f, "tree has no nodes"),
            TraversalError::FeatureOutOfRange {
                node,
                feature_idx,
                len,
            } => write!(
                f,
                "node {node} splits on feature {feature_idx} but the vector has {len} entries"
            ),
            TraversalError::BrokenLink { node, child } => {
                write!(f, "node {node} points to missing child {child}")
            }
            TraversalError::Cycle => write!(f, "traversal did not terminate"),
        }
    }
}

impl std::error::Error for TraversalError {}

/// A single regression tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,

    /// Tree weight for ensemble aggregation
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Tree {
    pub fn new(nodes: Vec<Node>, weight: f64) -> Self {
        Self { nodes, weight }
    }

    /// Walk from the root to a leaf and return its value.
    ///
    /// Goes left when `feature <= threshold`.
    pub fn evaluate(&self, features: &[f64]) -> Result<f64, TraversalError> {
        if self.nodes.is_empty() {
            return Err(TraversalError::EmptyTree);
        }

        let mut idx = 0usize;
        // A valid path never visits more nodes than the tree holds.
        for _ in 0..=self.nodes.len() {
            let node = &self.nodes[idx];

            if node.is_leaf() {
                return Ok(node.leaf_value().unwrap_or(0.0));
            }

            let feature_value = usize::try_from(node.feature_idx)
                .ok()
                .and_then(|i| features.get(i))
                .copied()
                .ok_or(TraversalError::FeatureOutOfRange {
                    node: idx,
                    feature_idx: node.feature_idx,
                    len: features.len(),
                })?;

            let child = if feature_value <= node.threshold {
                node.left
            } else {
                node.right
            };

            idx = usize::try_from(child)
                .ok()
                .filter(|&c| c < self.nodes.len())
                .ok_or(TraversalError::BrokenLink { node: idx, child })?;
        }

        Err(TraversalError::Cycle)
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Largest feature index referenced by any split, if the tree has splits
    pub fn max_feature_index(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter(|n| !n.is_leaf())
            .filter_map(|n| usize::try_from(n.feature_idx).ok())
            .max()
    }

    /// Validate tree structure
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        if !self.weight.is_finite() {
            return Err(format!("Tree weight is not finite: {}", self.weight));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if !node.is_leaf() {
                if node.left < 0 || node.left as usize >= self.nodes.len() {
                    return Err(format!("Node {} has invalid left child: {}", i, node.left));
                }

                if node.right < 0 || node.right as usize >= self.nodes.len() {
                    return Err(format!(
                        "Node {} has invalid right child: {}",
                        i, node.right
                    ));
                }

                if node.feature_idx < 0 {
                    return Err(format!(
                        "Internal node {} has invalid feature index: {}",
                        i, node.feature_idx
                    ));
                }

                if !node.threshold.is_finite() {
                    return Err(format!("Node {i} has a non-finite threshold"));
                }
            } else {
                match node.leaf {
                    None => return Err(format!("Leaf node {i} has no leaf value")),
                    Some(value) if !value.is_finite() => {
                        return Err(format!("Leaf node {i} has a non-finite value"))
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(())
    }
}
