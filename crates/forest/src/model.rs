//! Random-forest classifier model
//!
//! A forest is an ordered list of classification trees whose leaf class
//! distributions are averaged at inference time. Predictions are pure
//! functions of the model and the input, so the same model always gives the
//! same answer.

use serde::{Deserialize, Serialize};

use crate::errors::{ForestError, Result};
use crate::serialization::{hash_canonical_hex, to_canonical_json};
use crate::tree::Tree;

/// Model schema version (bumped when the node layout changes)
pub const MODEL_VERSION: i32 = 1;

/// Hyperparameters used to grow a forest
///
/// Stored inside the model so an artifact records how it was produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingParams {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Maximum tree depth (`None` grows until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs before it may be split
    pub min_samples_split: usize,
    /// Minimum samples on each side of a split
    pub min_samples_leaf: usize,
    /// Features evaluated per split (`None` = floor(sqrt(n_features)))
    pub max_features: Option<usize>,
    /// Bootstrap-sample the training rows for each tree
    pub bootstrap: bool,
    /// Master seed for bootstrap and feature sampling
    pub seed: i64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl TrainingParams {
    /// Features to evaluate per split for a dataset with `n_features` columns
    pub fn resolved_max_features(&self, n_features: usize) -> usize {
        let k = self
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().floor() as usize);
        k.clamp(1, n_features.max(1))
    }
}

/// Random-forest classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestModel {
    /// Model schema version
    pub version: i32,

    /// Expected feature vector length
    pub n_features: usize,

    /// Class names indexed by class id
    pub class_names: Vec<String>,

    /// Feature names in vector order
    pub feature_names: Vec<String>,

    /// Parameters the forest was trained with
    pub params: TrainingParams,

    /// Trees in the ensemble
    pub trees: Vec<Tree>,
}

impl ForestModel {
    pub fn new(
        trees: Vec<Tree>,
        class_names: Vec<String>,
        feature_names: Vec<String>,
        params: TrainingParams,
    ) -> Self {
        Self {
            version: MODEL_VERSION,
            n_features: feature_names.len(),
            class_names,
            feature_names,
            params,
            trees,
        }
    }

    /// Number of target classes
    pub fn n_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Get number of trees in the model
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Validate model structure
    pub fn validate(&self) -> Result<()> {
        if self.version != MODEL_VERSION {
            return Err(ForestError::ValidationFailed(format!(
                "Unsupported model version: {}",
                self.version
            )));
        }

        if self.class_names.is_empty() {
            return Err(ForestError::ValidationFailed(
                "model has no classes".to_string(),
            ));
        }

        if self.n_features == 0 || self.feature_names.len() != self.n_features {
            return Err(ForestError::ValidationFailed(format!(
                "model declares {} features but names {}",
                self.n_features,
                self.feature_names.len()
            )));
        }

        if self.trees.is_empty() {
            return Err(ForestError::ValidationFailed(
                "model has no trees".to_string(),
            ));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_classes(), self.n_features).map_err(|e| {
                ForestError::ValidationFailed(format!("Tree {} validation failed: {}", i, e))
            })?;
        }

        Ok(())
    }

    /// Check that the model matches an expected feature count and class list
    pub fn check_shape(&self, n_features: usize, class_names: &[&str]) -> Result<()> {
        if self.n_features != n_features {
            return Err(ForestError::ValidationFailed(format!(
                "model expects {} features, service requires {}",
                self.n_features, n_features
            )));
        }

        if self.class_names.len() != class_names.len()
            || self
                .class_names
                .iter()
                .zip(class_names)
                .any(|(have, want)| have != want)
        {
            return Err(ForestError::ValidationFailed(format!(
                "model classes {:?} do not match {:?}",
                self.class_names, class_names
            )));
        }

        Ok(())
    }

    /// Class probability distribution for one feature vector
    ///
    /// The mean of every tree's leaf distribution; sums to 1.
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != self.n_features {
            return Err(ForestError::FeatureCount {
                expected: self.n_features,
                actual: features.len(),
            });
        }

        if self.trees.is_empty() {
            return Err(ForestError::ValidationFailed(
                "model has no trees".to_string(),
            ));
        }

        let mut totals = vec![0.0f64; self.n_classes()];
        for (i, tree) in self.trees.iter().enumerate() {
            let distribution = tree
                .predict_proba(features)
                .filter(|d| d.len() == totals.len())
                .ok_or(ForestError::MalformedTree(i))?;

            for (total, p) in totals.iter_mut().zip(distribution) {
                *total += p;
            }
        }

        let n_trees = self.trees.len() as f64;
        for total in &mut totals {
            *total /= n_trees;
        }

        Ok(totals)
    }

    /// Most probable class id (ties resolve to the lowest id)
    pub fn predict(&self, features: &[f64]) -> Result<usize> {
        Ok(self.predict_with_proba(features)?.0)
    }

    /// Predicted class id together with the distribution it came from
    pub fn predict_with_proba(&self, features: &[f64]) -> Result<(usize, Vec<f64>)> {
        let proba = self.predict_proba(features)?;
        Ok((argmax(&proba), proba))
    }

    /// Predict a class id for every row
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<usize>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    /// Name of a class id
    pub fn class_name(&self, class_idx: usize) -> Option<&str> {
        self.class_names.get(class_idx).map(String::as_str)
    }

    /// Serialize model to canonical JSON (sorted keys, no whitespace)
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(to_canonical_json(self)?)
    }

    /// Compute model hash as hex string
    pub fn hash_hex(&self) -> Result<String> {
        Ok(hash_canonical_hex(self)?)
    }
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;

    fn create_test_model() -> ForestModel {
        let tree1 = Tree::new(vec![
            Node::internal(0, 0, 5.0, 1, 2),
            Node::leaf(1, vec![1.0, 0.0, 0.0]),
            Node::leaf(2, vec![0.0, 0.5, 0.5]),
        ]);
        let tree2 = Tree::new(vec![
            Node::internal(0, 1, 1.0, 1, 2),
            Node::leaf(1, vec![0.0, 1.0, 0.0]),
            Node::leaf(2, vec![0.0, 0.0, 1.0]),
        ]);

        ForestModel::new(
            vec![tree1, tree2],
            vec!["class_0".into(), "class_1".into(), "class_2".into()],
            vec!["a".into(), "b".into()],
            TrainingParams::default(),
        )
    }

    #[test]
    fn test_model_creation() {
        let model = create_test_model();
        assert_eq!(model.version, MODEL_VERSION);
        assert_eq!(model.n_features, 2);
        assert_eq!(model.n_classes(), 3);
        assert_eq!(model.num_trees(), 2);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_predict_proba_averages_trees() {
        let model = create_test_model();

        let proba = model.predict_proba(&[3.0, 0.5]).unwrap();
        assert_eq!(proba, vec![0.5, 0.5, 0.0]);

        let proba = model.predict_proba(&[7.0, 2.0]).unwrap();
        assert_eq!(proba, vec![0.0, 0.25, 0.75]);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_predict_ties_pick_lowest_class() {
        let model = create_test_model();
        assert_eq!(model.predict(&[3.0, 0.5]).unwrap(), 0);
        assert_eq!(model.predict(&[7.0, 2.0]).unwrap(), 2);
        assert_eq!(model.predict_batch(&[vec![3.0, 0.5], vec![7.0, 2.0]]).unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_wrong_feature_count() {
        let model = create_test_model();
        match model.predict_proba(&[1.0]) {
            Err(ForestError::FeatureCount { expected, actual }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_tree_is_an_error() {
        let mut model = create_test_model();
        model.trees[1].nodes[0].right = 9;
        assert!(matches!(
            model.predict_proba(&[7.0, 2.0]),
            Err(ForestError::MalformedTree(1))
        ));
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_model_validation() {
        let mut invalid = create_test_model();
        invalid.version = 999;
        assert!(invalid.validate().is_err());

        let mut invalid = create_test_model();
        invalid.trees.clear();
        assert!(invalid.validate().is_err());

        let mut invalid = create_test_model();
        invalid.feature_names.pop();
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_check_shape() {
        let model = create_test_model();
        assert!(model.check_shape(2, &["class_0", "class_1", "class_2"]).is_ok());
        assert!(model.check_shape(13, &["class_0", "class_1", "class_2"]).is_err());
        assert!(model.check_shape(2, &["class_0", "class_1"]).is_err());
        assert!(model.check_shape(2, &["x", "class_1", "class_2"]).is_err());
    }

    #[test]
    fn test_hash_deterministic() {
        let hash1 = create_test_model().hash_hex().unwrap();
        let hash2 = create_test_model().hash_hex().unwrap();
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);

        let mut changed = create_test_model();
        changed.trees[0].nodes[0].threshold = 5.5;
        assert_ne!(hash1, changed.hash_hex().unwrap());
    }

    #[test]
    fn test_canonical_json() {
        let json = create_test_model().to_canonical_json().unwrap();
        let parsed: ForestModel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, create_test_model());
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_resolved_max_features() {
        let params = TrainingParams::default();
        assert_eq!(params.resolved_max_features(13), 3);
        assert_eq!(params.resolved_max_features(1), 1);

        let params = TrainingParams {
            max_features: Some(50),
            ..TrainingParams::default()
        };
        assert_eq!(params.resolved_max_features(13), 13);
    }
}
