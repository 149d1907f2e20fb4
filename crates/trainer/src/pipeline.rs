//! Train, evaluate, persist, verify
//!
//! The steps the `train` binary runs, exposed as functions so they can be
//! exercised in tests without going through the CLI.

use std::path::Path;
use tracing::{info, warn};
use wine_forest::artifact::{self, ModelArtifact};
use wine_forest::ForestModel;

use crate::dataset::Dataset;
use crate::errors::TrainerError;
use crate::metrics::ClassificationReport;
use crate::trainer::{ForestTrainer, TrainingParams};

/// Fitted model together with its held-out evaluation
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: ForestModel,
    pub report: ClassificationReport,
    pub train_len: usize,
    pub test_len: usize,
}

/// Split `dataset`, fit on the train half and score on the test half
///
/// The split uses the same seed as the forest, so one seed pins down the
/// whole run.
pub fn train_and_evaluate(
    dataset: &Dataset,
    params: TrainingParams,
    test_size: f64,
) -> Result<TrainingOutcome, TrainerError> {
    let (train, test) = dataset
        .stratified_split(test_size, params.seed)
        .map_err(|err| TrainerError::Dataset(err.to_string()))?;

    info!(
        "Split {} samples into {} train / {} test (test classes {:?})",
        dataset.len(),
        train.len(),
        test.len(),
        test.class_counts()
    );

    let model = ForestTrainer::new(params).train(&train)?;

    let predictions = model
        .predict_batch(&test.features)
        .map_err(|err| TrainerError::Training(err.to_string()))?;
    let report = ClassificationReport::compute(&test.targets, &predictions, &model.class_names);

    info!("Held-out accuracy: {:.4}", report.accuracy);

    Ok(TrainingOutcome {
        model,
        report,
        train_len: train.len(),
        test_len: test.len(),
    })
}

/// Save `model` to `path`, then reload it and predict `probe`
///
/// An existing artifact is replaced; its hash is logged first and, with
/// `backup`, it is copied to `<path>.bak`. Returns the saved artifact and the
/// class name the reloaded model gives `probe`.
pub fn save_and_verify(
    model: ForestModel,
    path: &Path,
    backup: bool,
    probe: &[f64],
) -> Result<(ModelArtifact, String), TrainerError> {
    if let Some(previous) = artifact::existing_model_hash(path) {
        warn!("Replacing existing model at {} (hash {})", path.display(), previous);
    }
    if backup {
        artifact::backup_existing(path)?;
    }

    let saved = artifact::save_model(model, path)?;
    info!("Saved model to {} (hash {})", path.display(), saved.model_hash);

    let reloaded = ModelArtifact::load(path)?;
    if reloaded.model_hash != saved.model_hash {
        return Err(TrainerError::Verification(format!(
            "reloaded hash {} differs from saved hash {}",
            reloaded.model_hash, saved.model_hash
        )));
    }

    let class_idx = reloaded
        .model
        .predict(probe)
        .map_err(|err| TrainerError::Verification(err.to_string()))?;
    let class_name = reloaded
        .model
        .class_name(class_idx)
        .ok_or_else(|| TrainerError::Verification(format!("unknown class id {class_idx}")))?
        .to_string();

    info!("Reloaded model predicts {} for the probe sample", class_name);
    Ok((saved, class_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quick_params() -> TrainingParams {
        TrainingParams {
            n_trees: 10,
            ..TrainingParams::default()
        }
    }

    #[test]
    fn test_train_and_evaluate_wine() -> anyhow::Result<()> {
        let dataset = Dataset::wine()?;
        let outcome = train_and_evaluate(&dataset, quick_params(), 0.2)?;

        assert_eq!(outcome.train_len, 142);
        assert_eq!(outcome.test_len, 36);
        assert_eq!(outcome.report.total, 36);
        assert_eq!(outcome.model.num_trees(), 10);
        assert!(outcome.report.accuracy > 0.8);

        Ok(())
    }

    #[test]
    fn test_save_and_verify_replaces_and_backs_up() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("modelo.pkl");
        let dataset = Dataset::wine()?;

        let first = ForestTrainer::new(quick_params()).train(&dataset)?;
        let (saved, class_name) = save_and_verify(first, &path, false, &dataset.features[0])?;
        assert_eq!(class_name, "class_0");
        assert!(!dir.path().join("modelo.pkl.bak").exists());

        let second_params = TrainingParams {
            seed: 7,
            ..quick_params()
        };
        let second = ForestTrainer::new(second_params).train(&dataset)?;
        let (resaved, _) = save_and_verify(second, &path, true, &dataset.features[0])?;

        let backup = ModelArtifact::load(dir.path().join("modelo.pkl.bak"))?;
        assert_eq!(backup.model_hash, saved.model_hash);
        assert_eq!(ModelArtifact::load(&path)?.model_hash, resaved.model_hash);

        Ok(())
    }
}
