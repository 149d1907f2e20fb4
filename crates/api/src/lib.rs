//! Wine API - HTTP prediction service
//!
//! Serves the random-forest artifact written by `train` over three JSON
//! endpoints: `GET /`, `GET /health` and `POST /predict`.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod server;
pub mod state;
pub mod validation;

pub use config::{ConfigError, ServerConfig};
pub use errors::ApiError;
pub use server::{bind_listener, build_router, start_server};
pub use state::{AppState, ModelState, SharedState};
pub use validation::{parse_features, FeatureVector};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
