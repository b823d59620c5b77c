//! Axum REST API handlers

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::engine::Classifier;
use crate::error::PredictError;
use crate::service::{ClassifyService, UploadedImage};

use super::dto::*;

/// Application state shared across handlers
pub struct AppState<C: Classifier> {
    pub service: Arc<ClassifyService<C>>,
    pub max_upload_bytes: usize,
    pub start_time: Instant,
}

/// Create the REST API router
pub fn create_rest_router<C: Classifier + 'static>(state: Arc<AppState<C>>) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/predict", post(predict_handler::<C>))
        .route("/health", get(health_handler::<C>))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Classify the image in the `file` field
async fn predict_handler<C: Classifier + 'static>(
    State(state): State<Arc<AppState<C>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, (StatusCode, Json<ErrorResponse>)> {
    let upload = read_upload(multipart).await.map_err(error_response)?;

    let prediction = state.service.classify(&upload).await.map_err(error_response)?;

    Ok(Json(PredictResponse {
        prediction: prediction.label.as_str().to_string(),
        confidence: prediction.confidence,
    }))
}

/// Extract the `file` field; other fields are ignored
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadedImage, PredictError> {
    // A body that is not multipart at all carries no file either
    let mut multipart = multipart.map_err(|rejection| {
        warn!("Request body is not multipart: {}", rejection);
        PredictError::MissingFile
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(multipart_error)?
            .to_vec();

        return Ok(UploadedImage { filename, data });
    }

    Err(PredictError::MissingFile)
}

/// Keep the body limit apart from parse failures
fn multipart_error(e: MultipartError) -> PredictError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PredictError::PayloadTooLarge(e.body_text())
    } else {
        PredictError::Multipart(e.body_text())
    }
}

fn error_response(err: PredictError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        PredictError::MissingFile => {
            warn!("No file received");
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::message("No file provided")))
        }
        err @ PredictError::PayloadTooLarge(_) => {
            warn!("Rejected upload: {}", err);
            (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ErrorResponse::new(&err.to_string(), err.code())),
            )
        }
        err if err.is_client_error() => {
            warn!("Rejected upload: {}", err);
            (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(&err.to_string(), err.code())))
        }
        err => {
            error!("Prediction failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(&err.to_string(), err.code())),
            )
        }
    }
}

/// Health check
async fn health_handler<C: Classifier + 'static>(
    State(state): State<Arc<AppState<C>>>,
) -> Json<HealthResponse> {
    let health = state.service.health();

    Json(HealthResponse {
        healthy: health.healthy,
        version: health.version,
        model: health.model,
        labels: health.labels,
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
