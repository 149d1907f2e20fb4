use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::info;

use crate::errors::{ApiError, EXAMPLE_FEATURES};
use crate::state::SharedState;
use crate::validation::parse_features;

/// Paths served by the router, in the order they are advertised
pub const ENDPOINTS: [&str; 3] = ["/", "/predict", "/health"];

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub message: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
    pub example_request: ExampleRequest,
}

#[derive(Debug, Serialize)]
pub struct ExampleRequest {
    pub url: &'static str,
    pub method: &'static str,
    pub body: Value,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub timestamp: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: String,
    pub prediction_index: usize,
    /// Probability per class name
    pub confidence: BTreeMap<String, f64>,
    pub input_features: Vec<Value>,
}

pub async fn handle_welcome() -> Json<WelcomeResponse> {
    let endpoints = BTreeMap::from([
        ("/", "GET - welcome message and API description"),
        ("/health", "GET - service health check"),
        ("/predict", "POST - predict the wine class from 13 features"),
    ]);

    Json(WelcomeResponse {
        message: "Wine Classifier API ready",
        description: "REST API for wine classification with a random forest",
        version: env!("CARGO_PKG_VERSION"),
        endpoints,
        example_request: ExampleRequest {
            url: "/predict",
            method: "POST",
            body: json!({ "features": EXAMPLE_FEATURES }),
        },
    })
}

pub async fn handle_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.model.is_loaded(),
        timestamp: "ready",
    })
}

pub async fn handle_predict(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ApiError> {
    let model = state.model.model().ok_or(ApiError::ModelUnavailable)?;
    let features = parse_features(&body)?;

    let (prediction_index, proba) = model
        .predict_with_proba(&features.values)
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let prediction = model
        .class_name(prediction_index)
        .ok_or_else(|| ApiError::Internal(format!("no class name for index {prediction_index}")))?
        .to_string();

    let confidence = model
        .class_names
        .iter()
        .cloned()
        .zip(proba.iter().copied())
        .collect();

    info!(
        "Prediction: {} (index {}) for {} features",
        prediction,
        prediction_index,
        features.values.len()
    );

    Ok(Json(PredictionResponse {
        prediction,
        prediction_index,
        confidence,
        input_features: features.original,
    }))
}

pub async fn handle_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "endpoint not found",
            "available_endpoints": ENDPOINTS,
        })),
    )
        .into_response()
}

pub async fn handle_method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": "method not allowed",
            "hint": "use GET for '/' and '/health', POST for '/predict'",
        })),
    )
        .into_response()
}
