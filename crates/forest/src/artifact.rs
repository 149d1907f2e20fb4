//! Versioned on-disk model artifact
//!
//! The artifact is the canonical JSON form of [`ModelArtifact`]: a format
//! version, a creation timestamp, the BLAKE3 hash of the model and the model
//! itself. Loading checks the version before decoding the model and verifies
//! the hash afterwards, so truncated or edited files are rejected.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::errors::ForestError;
use crate::model::ForestModel;
use crate::serialization::to_canonical_json;

/// Current artifact format version
pub const FORMAT_VERSION: u32 = 1;

/// Default artifact location, relative to the working directory
pub const DEFAULT_ARTIFACT_PATH: &str = "modelo.pkl";

/// Artifact errors
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("model artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("artifact format version {found} is not supported (expected {expected})")]
    IncompatibleVersion { found: u64, expected: u32 },

    #[error("artifact is missing its format version")]
    MissingVersion,

    #[error("model hash mismatch: artifact says {expected}, content hashes to {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("invalid model: {0}")]
    InvalidModel(#[from] ForestError),

    #[error("failed to persist artifact: {0}")]
    Persist(String),
}

/// Serialized model plus integrity metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelArtifact {
    /// Artifact format version
    pub format_version: u32,

    /// Unix timestamp (seconds) of artifact creation
    pub created_at: u64,

    /// BLAKE3 hash (hex) of the model's canonical JSON
    pub model_hash: String,

    /// The trained model
    pub model: ForestModel,
}

impl ModelArtifact {
    /// Wrap a validated model, stamping it with its hash and the current time
    pub fn new(model: ForestModel) -> Result<Self, ArtifactError> {
        model.validate()?;
        let model_hash = model.hash_hex()?;

        Ok(Self {
            format_version: FORMAT_VERSION,
            created_at: chrono::Utc::now().timestamp().max(0) as u64,
            model_hash,
            model,
        })
    }

    /// Canonical JSON bytes of the artifact
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        Ok(to_canonical_json(self)?.into_bytes())
    }

    /// Decode and verify an artifact
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;

        let found = value
            .get("format_version")
            .and_then(serde_json::Value::as_u64)
            .ok_or(ArtifactError::MissingVersion)?;
        if found != u64::from(FORMAT_VERSION) {
            return Err(ArtifactError::IncompatibleVersion {
                found,
                expected: FORMAT_VERSION,
            });
        }

        let artifact: ModelArtifact = serde_json::from_value(value)?;
        artifact.verify()?;
        Ok(artifact)
    }

    /// Check the stored hash against the model content and validate the model
    pub fn verify(&self) -> Result<(), ArtifactError> {
        let actual = self.model.hash_hex()?;
        if actual != self.model_hash {
            return Err(ArtifactError::HashMismatch {
                expected: self.model_hash.clone(),
                actual,
            });
        }

        self.model.validate()?;
        Ok(())
    }

    /// Write the artifact to `path`, replacing any existing file
    ///
    /// The content goes to a temporary file in the destination directory
    /// first and is renamed into place, so readers never see a partial file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path)
            .map_err(|err| ArtifactError::Persist(err.error.to_string()))?;

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Read and verify an artifact from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ArtifactError::NotFound(path.to_path_buf()));
        }

        let bytes = fs::read(path)?;
        Self::from_slice(&bytes)
    }

    pub fn into_model(self) -> ForestModel {
        self.model
    }
}

/// Wrap `model` in an artifact and save it to `path`
pub fn save_model<P: AsRef<Path>>(model: ForestModel, path: P) -> Result<ModelArtifact, ArtifactError> {
    let artifact = ModelArtifact::new(model)?;
    artifact.save(path)?;
    Ok(artifact)
}

/// Load and verify the model stored at `path`
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<ForestModel, ArtifactError> {
    Ok(ModelArtifact::load(path)?.into_model())
}

/// Hash recorded in an existing artifact, if the file is readable
pub fn existing_model_hash<P: AsRef<Path>>(path: P) -> Option<String> {
    let bytes = fs::read(path).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    value
        .get("model_hash")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
}

/// Copy an existing artifact to `<path>.bak`
///
/// Returns the backup path, or `None` when there is nothing to back up.
pub fn backup_existing<P: AsRef<Path>>(path: P) -> Result<Option<PathBuf>, ArtifactError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let mut backup = path.as_os_str().to_owned();
    backup.push(".bak");
    let backup = PathBuf::from(backup);

    fs::copy(path, &backup)?;
    info!("Backed up {} to {}", path.display(), backup.display());
    Ok(Some(backup))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrainingParams;
    use crate::tree::{Node, Tree};
    use tempfile::TempDir;

    fn create_test_model() -> ForestModel {
        let tree = Tree::new(vec![
            Node::internal(0, 0, 0.1 + 0.2, 1, 2),
            Node::leaf(1, vec![2.0 / 3.0, 1.0 / 3.0]),
            Node::leaf(2, vec![0.0, 1.0]),
        ]);

        ForestModel::new(
            vec![tree],
            vec!["class_0".into(), "class_1".into()],
            vec!["x".into()],
            TrainingParams::default(),
        )
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.pkl");

        let saved = save_model(create_test_model(), &path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();

        assert_eq!(saved, loaded);
        assert_eq!(loaded.format_version, FORMAT_VERSION);
        assert_eq!(loaded.model_hash, create_test_model().hash_hex().unwrap());
    }

    #[test]
    fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.pkl");
        fs::write(&path, b"old contents").unwrap();

        save_model(create_test_model(), &path).unwrap();
        assert!(load_model(&path).is_ok());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_model(dir.path().join("absent.pkl")).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound(_)));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.pkl");
        fs::write(&path, b"\x80\x04\x95not json").unwrap();

        assert!(matches!(load_model(&path).unwrap_err(), ArtifactError::Json(_)));
    }

    #[test]
    fn test_incompatible_version() {
        let artifact = ModelArtifact::new(create_test_model()).unwrap();
        let mut value = serde_json::to_value(&artifact).unwrap();
        value["format_version"] = serde_json::json!(7);
        let bytes = serde_json::to_vec(&value).unwrap();

        match ModelArtifact::from_slice(&bytes).unwrap_err() {
            ArtifactError::IncompatibleVersion { found, expected } => {
                assert_eq!(found, 7);
                assert_eq!(expected, FORMAT_VERSION);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_tampered_model_fails_hash_check() {
        let mut artifact = ModelArtifact::new(create_test_model()).unwrap();
        artifact.model.trees[0].nodes[0].threshold = 99.0;
        let bytes = artifact.to_bytes().unwrap();

        assert!(matches!(
            ModelArtifact::from_slice(&bytes).unwrap_err(),
            ArtifactError::HashMismatch { .. }
        ));
    }

    #[test]
    fn test_backup_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.pkl");

        assert!(backup_existing(&path).unwrap().is_none());

        let saved = save_model(create_test_model(), &path).unwrap();
        let backup = backup_existing(&path).unwrap().unwrap();
        assert_eq!(backup, dir.path().join("model.pkl.bak"));
        assert_eq!(existing_model_hash(&backup), Some(saved.model_hash));
    }
}
