//! Request validation for `/predict`

use serde_json::Value;
use wine_forest::FEATURE_COUNT;

use crate::errors::ApiError;

/// A prediction request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub values: Vec<f64>,
    /// The `features` array exactly as the client sent it
    pub original: Vec<Value>,
}

/// Parse a raw `/predict` body into a feature vector
///
/// Checks run in order and the first failure wins: valid JSON, an object with
/// a `features` key, `features` is an array, it has 13 elements, every element
/// converts to a number.
pub fn parse_features(body: &[u8]) -> Result<FeatureVector, ApiError> {
    let payload: Value =
        serde_json::from_slice(body).map_err(|err| ApiError::InvalidJson(err.to_string()))?;

    let features = payload
        .as_object()
        .and_then(|object| object.get("features"))
        .ok_or(ApiError::MissingFeatures)?;

    let items = features.as_array().ok_or(ApiError::FeaturesNotArray {
        received_type: json_type_name(features),
    })?;

    if items.len() != FEATURE_COUNT {
        return Err(ApiError::WrongFeatureCount {
            received: items.len(),
        });
    }

    let values = items
        .iter()
        .map(to_number)
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| ApiError::NonNumericFeatures {
            received: features.clone(),
        })?;

    Ok(FeatureVector {
        values,
        original: items.clone(),
    })
}

/// Numbers pass through, booleans become 1/0, strings are parsed after
/// trimming. Everything else is rejected.
fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
