//! Wine Forest - random-forest model shared by the trainer and the API
//!
//! Holds the decision tree and forest types, the fixed Wine schema
//! (13 features, 3 classes), canonical JSON helpers and the versioned
//! on-disk model artifact.

pub mod artifact;
pub mod errors;
pub mod model;
pub mod serialization;
pub mod tree;

pub use artifact::{ArtifactError, ModelArtifact, DEFAULT_ARTIFACT_PATH, FORMAT_VERSION};
pub use errors::ForestError;
pub use model::{ForestModel, TrainingParams, MODEL_VERSION};
pub use tree::{Node, Tree};

/// Number of measurements in a Wine feature vector.
pub const FEATURE_COUNT: usize = 13;

/// Target class names, indexed by class id.
pub const CLASS_NAMES: [&str; 3] = ["class_0", "class_1", "class_2"];

/// Wine attribute names in feature-vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "alcohol",
    "malic_acid",
    "ash",
    "alcalinity_of_ash",
    "magnesium",
    "total_phenols",
    "flavanoids",
    "nonflavanoid_phenols",
    "proanthocyanins",
    "color_intensity",
    "hue",
    "od280/od315_of_diluted_wines",
    "proline",
];

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
