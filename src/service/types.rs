//! Service layer types

use crate::engine::Label;

/// An image received in a request
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// Classification of one image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: Label,
    pub confidence: f32,
}

/// Health check result
#[derive(Debug, Clone)]
pub struct HealthResult {
    pub healthy: bool,
    pub version: String,
    pub model: String,
    pub labels: Vec<String>,
}
