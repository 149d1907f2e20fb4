use thiserror::Error;
use wine_forest::ArtifactError;

/// Errors returned by the deterministic trainer.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("training error: {0}")]
    Training(String),

    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("verification failed: {0}")]
    Verification(String),
}
