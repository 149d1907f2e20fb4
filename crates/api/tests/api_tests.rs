//! Router-level tests for the prediction service

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;
use tower::ServiceExt;
use wine_api::{build_router, AppState, ModelState, ServerConfig};
use wine_forest::{artifact, ForestModel, CLASS_NAMES};
use wine_trainer::{Dataset, ForestTrainer, TrainingParams};

const SAMPLE: [f64; 13] = [
    14.23, 1.71, 2.43, 15.6, 127.0, 2.8, 3.06, 0.28, 2.29, 5.64, 1.04, 3.92, 1065.0,
];

fn wine_model() -> Arc<ForestModel> {
    static MODEL: OnceLock<Arc<ForestModel>> = OnceLock::new();
    MODEL
        .get_or_init(|| {
            let dataset = Dataset::wine().unwrap();
            let params = TrainingParams {
                n_trees: 20,
                ..TrainingParams::default()
            };
            Arc::new(ForestTrainer::new(params).train(&dataset).unwrap())
        })
        .clone()
}

fn app_with(model: ModelState) -> Router {
    build_router(Arc::new(AppState::new(ServerConfig::default(), model)))
}

fn loaded_app() -> Router {
    app_with(ModelState::Loaded(wine_model()))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(body)
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

async fn predict(app: Router, payload: Value) -> (StatusCode, Value) {
    send(app, Method::POST, "/predict", Some(payload.to_string())).await
}

#[tokio::test]
async fn test_welcome() {
    let (status, body) = send(loaded_app(), Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
    assert!(body["description"].is_string());
    assert!(body["version"].is_string());
    for path in ["/", "/health", "/predict"] {
        assert!(body["endpoints"][path].is_string(), "missing endpoint {path}");
    }
    assert_eq!(body["example_request"]["url"], "/predict");
    assert_eq!(body["example_request"]["method"], "POST");
    assert_eq!(
        body["example_request"]["body"]["features"].as_array().unwrap().len(),
        13
    );
}

#[tokio::test]
async fn test_health_with_model() {
    let (status, body) = send(loaded_app(), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "status": "healthy", "model_loaded": true, "timestamp": "ready" })
    );
}

#[tokio::test]
async fn test_health_when_artifact_absent_or_corrupt() {
    let dir = TempDir::new().unwrap();

    let missing = ModelState::load(&dir.path().join("modelo.pkl"));
    assert!(!missing.is_loaded());
    let (status, body) = send(app_with(missing), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], false);

    let corrupt_path = dir.path().join("corrupt.pkl");
    std::fs::write(&corrupt_path, b"\x80\x04not a model").unwrap();
    let corrupt = ModelState::load(&corrupt_path);
    assert!(!corrupt.is_loaded());
    let (status, body) = send(app_with(corrupt), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn test_model_loaded_from_artifact() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("modelo.pkl");
    artifact::save_model((*wine_model()).clone(), &path).unwrap();

    let state = ModelState::load(&path);
    assert!(state.is_loaded());

    let (status, body) = predict(app_with(state), json!({ "features": SAMPLE })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "class_0");
}

#[test]
fn test_incompatible_model_is_unavailable() {
    let dataset = Dataset {
        features: vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.1, 0.9], vec![0.9, 0.1]],
        targets: vec![0, 1, 0, 1],
        feature_count: 2,
        feature_names: vec!["a".into(), "b".into()],
    };
    let params = TrainingParams {
        n_trees: 2,
        ..TrainingParams::default()
    };
    let model = ForestTrainer::new(params).train(&dataset).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("modelo.pkl");
    artifact::save_model(model, &path).unwrap();

    assert!(!ModelState::load(&path).is_loaded());
}

#[tokio::test]
async fn test_valid_prediction() {
    let (status, body) = predict(loaded_app(), json!({ "features": SAMPLE })).await;

    assert_eq!(status, StatusCode::OK);
    assert!(CLASS_NAMES.contains(&body["prediction"].as_str().unwrap()));
    let index = body["prediction_index"].as_u64().unwrap();
    assert!(index <= 2);
    assert_eq!(body["prediction"], CLASS_NAMES[index as usize]);

    let confidence = body["confidence"].as_object().unwrap();
    assert_eq!(confidence.len(), 3);
    let mut total = 0.0;
    for name in CLASS_NAMES {
        let p = confidence[name].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&p));
        total += p;
    }
    assert!((total - 1.0).abs() < 1e-6);

    assert_eq!(body["input_features"], json!(SAMPLE));
    assert_eq!(body["prediction"], "class_0");
}

#[tokio::test]
async fn test_numeric_strings_are_accepted_and_echoed() {
    let mut features: Vec<Value> = SAMPLE.iter().map(|v| json!(v)).collect();
    features[0] = json!("14.23");
    features[4] = json!(" 127 ");

    let (status, body) = predict(loaded_app(), json!({ "features": features.clone() })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["input_features"], Value::Array(features));
}

#[tokio::test]
async fn test_missing_features() {
    let bodies = [
        None,
        Some("not json".to_string()),
        Some("{}".to_string()),
        Some(json!({ "data": SAMPLE }).to_string()),
    ];

    for body in bodies {
        let (status, response) = send(loaded_app(), Method::POST, "/predict", body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert!(response["error"].is_string());
        assert_eq!(response["example"]["features"].as_array().unwrap().len(), 13);
    }
}

#[tokio::test]
async fn test_out_of_range_number_reports_invalid_json() {
    let body = format!("{{\"features\": [1e999{}]}}", ", 1.0".repeat(12));
    let (status, response) = send(loaded_app(), Method::POST, "/predict", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = response["error"].as_str().unwrap();
    assert!(error.starts_with("request body is not valid JSON"), "{error}");
    assert_eq!(response["example"]["features"].as_array().unwrap().len(), 13);
}

#[tokio::test]
async fn test_features_wrong_type() {
    let cases = [
        (json!("14.23,1.71"), "string"),
        (json!(42), "number"),
        (json!({ "alcohol": 14.23 }), "object"),
    ];

    for (features, expected) in cases {
        let (status, body) = predict(loaded_app(), json!({ "features": features })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["received_type"], expected);
    }
}

#[tokio::test]
async fn test_wrong_feature_count() {
    let (status, body) = predict(loaded_app(), json!({ "features": &SAMPLE[..12] })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("13"));
    assert!(error.contains("12"));
    assert_eq!(body["expected"], 13);
    assert_eq!(body["received"], 12);
}

#[tokio::test]
async fn test_non_numeric_feature() {
    let mut features: Vec<Value> = SAMPLE.iter().map(|v| json!(v)).collect();
    features[7] = json!("abc");

    let (status, body) = predict(loaded_app(), json!({ "features": features.clone() })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(body["received"], Value::Array(features));
}

#[tokio::test]
async fn test_predict_without_model() {
    let app = app_with(ModelState::Unavailable {
        reason: "missing".to_string(),
    });
    let (status, body) = predict(app, json!({ "features": SAMPLE })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "model unavailable" }));
}

#[tokio::test]
async fn test_unknown_endpoint() {
    let (status, body) = send(loaded_app(), Method::GET, "/nonexistent", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["available_endpoints"], json!(["/", "/predict", "/health"]));
}

#[tokio::test]
async fn test_wrong_method() {
    let cases = [
        (Method::DELETE, "/predict"),
        (Method::GET, "/predict"),
        (Method::POST, "/"),
        (Method::PUT, "/health"),
    ];

    for (method, uri) in cases {
        let (status, body) = send(loaded_app(), method.clone(), uri, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
        assert_eq!(body["error"], "method not allowed");
        assert!(body["hint"].as_str().unwrap().contains("POST"));
    }
}
