//! Wine Trainer - Deterministic offline random-forest trainer
//!
//! Fits the Wine classifier, scores it on a held-out split and writes the
//! model artifact served by `wine-api`.

pub mod cart;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod metrics;
pub mod pipeline;
pub mod trainer;

use std::path::Path;
use wine_forest::ForestModel;

pub use dataset::Dataset;
pub use deterministic::{LcgRng, SplitTieBreaker};
pub use errors::TrainerError;
pub use metrics::{ClassMetrics, ClassificationReport};
pub use pipeline::{save_and_verify, train_and_evaluate, TrainingOutcome};
pub use trainer::{ForestTrainer, TrainingParams};

/// Train a deterministic model directly from a CSV file using the provided parameters.
pub fn train_model_from_csv(path: &Path, params: TrainingParams) -> Result<ForestModel, TrainerError> {
    let dataset = Dataset::from_csv(path).map_err(|err| TrainerError::Dataset(err.to_string()))?;
    ForestTrainer::new(params).train(&dataset)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
