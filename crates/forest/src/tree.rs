//! Decision tree structures for forest inference
//!
//! Trees are stored as flat node arrays. Node 0 is the root and every child
//! index is greater than its parent's, so traversal always terminates.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes:
/// - `feature_idx >= 0`: index into feature vector
/// - `left` and `right` point to child node indices
/// - `leaf` is `None`
///
/// For leaf nodes:
/// - `feature_idx == -1`, `left == right == -1`
/// - `leaf` holds the class probability distribution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Node ID (equal to its index in the node array)
    pub id: i32,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    pub feature_idx: i32,

    /// Samples with `feature <= threshold` go left
    pub threshold: f64,

    /// Class probabilities (Some for leaf nodes, None for internal nodes)
    pub leaf: Option<Vec<f64>>,
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
    pub fn leaf(id: i32, distribution: Vec<f64>) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(distribution),
        }
    }

    /// Check if this node is a leaf
    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }
}

/// A single classification tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Walk the tree and return the class distribution of the reached leaf.
    ///
    /// Returns `None` if the tree is empty or a link points outside the
    /// node array.
    pub fn predict_proba(&self, features: &[f64]) -> Option<&[f64]> {
        let mut idx = 0usize;

        // A valid tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..self.nodes.len() {
            let node = self.nodes.get(idx)?;

            if node.is_leaf() {
                return node.leaf.as_deref();
            }

            let value = *features.get(node.feature_idx as usize)?;
            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };

            idx = usize::try_from(next).ok()?;
        }

        None
    }

    /// Check structural invariants against the expected class and feature counts
    pub fn validate(&self, n_classes: usize, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        let len = self.nodes.len() as i32;
        for (i, node) in self.nodes.iter().enumerate() {
            let idx = i as i32;
            if node.id != idx {
                return Err(format!("node {i} has id {}", node.id));
            }

            match &node.leaf {
                Some(distribution) => {
                    if distribution.len() != n_classes {
                        return Err(format!(
                            "leaf {i} has {} class probabilities, expected {n_classes}",
                            distribution.len()
                        ));
                    }
                    if distribution.iter().any(|p| !(0.0..=1.0).contains(p)) {
                        return Err(format!("leaf {i} has a probability outside [0, 1]"));
                    }
                    let total: f64 = distribution.iter().sum();
                    if (total - 1.0).abs() > 1e-9 {
                        return Err(format!("leaf {i} probabilities sum to {total}"));
                    }
                }
                None => {
                    if node.feature_idx < 0 || node.feature_idx as usize >= n_features {
                        return Err(format!(
                            "node {i} splits on feature {} (model has {n_features})",
                            node.feature_idx
                        ));
                    }
                    if !node.threshold.is_finite() {
                        return Err(format!("node {i} has a non-finite threshold"));
                    }
                    for child in [node.left, node.right] {
                        if child <= idx || child >= len {
                            return Err(format!("node {i} has invalid child index {child}"));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Length of the longest root-to-leaf path, in edges
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        let mut max_depth = 0;

        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                max_depth = max_depth.max(depths[i]);
                continue;
            }
            let child_depth = depths[i] + 1;
            for child in [node.left, node.right] {
                if let Some(slot) = usize::try_from(child).ok().and_then(|c| depths.get_mut(c)) {
                    *slot = child_depth;
                }
            }
        }

        max_depth
    }
}
