//! Error responses
//!
//! Every failure a handler can produce maps to a status code and a JSON
//! body here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;
use wine_forest::FEATURE_COUNT;

/// A valid request body, returned with 400 responses
pub const EXAMPLE_FEATURES: [f64; FEATURE_COUNT] = [
    14.23, 1.71, 2.43, 15.6, 127.0, 2.8, 3.06, 0.28, 2.29, 5.64, 1.04, 3.92, 1065.0,
];

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("model unavailable")]
    ModelUnavailable,

    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("invalid request: a JSON object with a 'features' key is required")]
    MissingFeatures,

    #[error("'features' must be an array")]
    FeaturesNotArray { received_type: &'static str },

    #[error("exactly {} features are required, received {received}", FEATURE_COUNT)]
    WrongFeatureCount { received: usize },

    #[error("all features must be numeric")]
    NonNumericFeatures { received: Value },

    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ModelUnavailable | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self) -> Value {
        let error = self.to_string();
        match self {
            Self::ModelUnavailable => json!({ "error": error }),
            Self::InvalidJson(_) | Self::MissingFeatures => json!({
                "error": error,
                "example": { "features": EXAMPLE_FEATURES },
            }),
            Self::FeaturesNotArray { received_type } => json!({
                "error": error,
                "received_type": received_type,
            }),
            Self::WrongFeatureCount { received } => json!({
                "error": error,
                "expected": FEATURE_COUNT,
                "received": received,
            }),
            Self::NonNumericFeatures { received } => json!({
                "error": error,
                "received": received,
            }),
            Self::Internal(details) => json!({
                "error": error,
                "details": details,
            }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
