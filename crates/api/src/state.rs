//! Process-wide state shared by all handlers

use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use wine_forest::{artifact, ForestModel, CLASS_NAMES, FEATURE_COUNT};

use crate::config::ServerConfig;

/// Whether a usable model was loaded at startup
#[derive(Debug, Clone)]
pub enum ModelState {
    Loaded(Arc<ForestModel>),
    Unavailable { reason: String },
}

impl ModelState {
    /// Load the artifact at `path` and check it fits the service's
    /// 13-feature, 3-class contract. Failures are logged, never fatal.
    pub fn load(path: &Path) -> Self {
        let result = artifact::load_model(path).map_err(|err| err.to_string()).and_then(|model| {
            model
                .check_shape(FEATURE_COUNT, &CLASS_NAMES)
                .map(|()| model)
                .map_err(|err| format!("incompatible model: {err}"))
        });

        match result {
            Ok(model) => {
                info!(
                    "Model loaded from {} ({} trees)",
                    path.display(),
                    model.num_trees()
                );
                Self::Loaded(Arc::new(model))
            }
            Err(reason) => {
                error!("Failed to load model from {}: {}", path.display(), reason);
                Self::Unavailable { reason }
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn model(&self) -> Option<&Arc<ForestModel>> {
        match self {
            Self::Loaded(model) => Some(model),
            Self::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug)]
pub struct AppState {
    pub config: ServerConfig,
    pub model: ModelState,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: ServerConfig, model: ModelState) -> Self {
        Self { config, model }
    }
}
