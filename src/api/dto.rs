//! REST API request/response data transfer objects

use serde::Serialize;

/// Predict response
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: String,
    pub confidence: f32,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
    pub model: String,
    pub labels: Vec<String>,
    pub uptime_seconds: u64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            code: Some(code.to_string()),
        }
    }

    /// Error body carrying only a message
    pub fn message(error: &str) -> Self {
        Self {
            error: error.to_string(),
            code: None,
        }
    }
}
