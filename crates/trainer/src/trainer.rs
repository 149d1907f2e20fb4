//! Random-forest trainer
//!
//! Grows `n_trees` CART trees, each on its own bootstrap sample with its own
//! RNG stream derived from the master seed. Trees are grown in parallel, but
//! because every tree owns its stream the result does not depend on thread
//! scheduling.

use rayon::prelude::*;
use tracing::{debug, info};
use wine_forest::{ForestModel, Tree};

use crate::cart::{CartBuilder, TreeConfig};
use crate::dataset::Dataset;
use crate::deterministic::{mix_seed, LcgRng};
use crate::errors::TrainerError;

pub use wine_forest::TrainingParams;

/// Random-forest trainer
pub struct ForestTrainer {
    params: TrainingParams,
}

impl ForestTrainer {
    pub fn new(params: TrainingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Train a forest on the given dataset
    pub fn train(&self, dataset: &Dataset) -> Result<ForestModel, TrainerError> {
        if dataset.is_empty() {
            return Err(TrainerError::Dataset("dataset is empty".to_string()));
        }
        if self.params.n_trees == 0 {
            return Err(TrainerError::Training("n_trees must be at least 1".to_string()));
        }

        let n_classes = dataset.n_classes();
        if n_classes < 2 {
            return Err(TrainerError::Dataset(format!(
                "need at least 2 classes, found {n_classes}"
            )));
        }

        let tree_config = TreeConfig {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split.max(2),
            min_samples_leaf: self.params.min_samples_leaf.max(1),
            max_features: self.params.resolved_max_features(dataset.feature_count),
        };

        info!(
            "Growing {} trees on {} samples ({} features, {} classes, max_features={})",
            self.params.n_trees,
            dataset.len(),
            dataset.feature_count,
            n_classes,
            tree_config.max_features
        );

        let builder = CartBuilder::new(&dataset.features, &dataset.targets, n_classes, tree_config);

        let trees: Vec<Tree> = (0..self.params.n_trees)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = LcgRng::new(mix_seed(self.params.seed, tree_idx as u64));
                let sample = if self.params.bootstrap {
                    rng.bootstrap(dataset.len())
                } else {
                    (0..dataset.len()).collect()
                };

                let tree = builder.build(&sample, &mut rng);
                debug!(
                    "Tree {}/{}: {} nodes, depth {}, {} leaves",
                    tree_idx + 1,
                    self.params.n_trees,
                    tree.nodes.len(),
                    tree.depth(),
                    tree.leaf_count()
                );
                tree
            })
            .collect();

        let model = ForestModel::new(
            trees,
            dataset.class_names(),
            dataset.feature_names.clone(),
            self.params.clone(),
        );

        model
            .validate()
            .map_err(|err| TrainerError::Training(err.to_string()))?;

        Ok(model)
    }
}
