//! Classify Service - Core business logic
//!
//! Orchestrates scratch storage, preprocessing and model inference.

use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use tracing::info;

use crate::config::PreprocessConfig;
use crate::engine::{labels, load_tensor, Classifier, Label};
use crate::error::PredictError;
use crate::storage::ScratchStore;

use super::types::*;

/// Fresh/rotten classification service
pub struct ClassifyService<C: Classifier> {
    classifier: Arc<C>,
    scratch: ScratchStore,
    preprocess: PreprocessConfig,
}

impl<C: Classifier + 'static> ClassifyService<C> {
    /// Create a new classify service
    pub fn new(classifier: Arc<C>, scratch: ScratchStore, preprocess: PreprocessConfig) -> Self {
        Self {
            classifier,
            scratch,
            preprocess,
        }
    }

    pub fn scratch(&self) -> &ScratchStore {
        &self.scratch
    }

    /// Classify an uploaded image
    pub async fn classify(&self, upload: &UploadedImage) -> Result<Prediction, PredictError> {
        let start = Instant::now();

        let scratch_file = self
            .scratch
            .persist(&upload.data, upload.filename.as_deref())
            .await
            .map_err(PredictError::Scratch)?;

        // The scratch file moves into the blocking task and is removed when
        // it finishes, whatever the outcome
        let classifier = self.classifier.clone();
        let preprocess = self.preprocess.clone();
        let scores = tokio::task::spawn_blocking(move || -> Result<Vec<f32>, PredictError> {
            let tensor = load_tensor(scratch_file.path(), &preprocess)?;
            drop(scratch_file);
            classifier.predict(&tensor).map_err(PredictError::Inference)
        })
        .await
        .map_err(|e| PredictError::Inference(anyhow!("inference task failed: {}", e)))??;

        let (label, confidence) = labels::select(&scores).ok_or_else(|| {
            PredictError::Inference(anyhow!(
                "expected {} class scores, model returned {:?}",
                Label::ALL.len(),
                scores
            ))
        })?;

        info!(
            "Predicted {} ({:.3}) for {} in {}ms",
            label,
            confidence,
            upload.filename.as_deref().unwrap_or("<unnamed>"),
            start.elapsed().as_millis()
        );

        Ok(Prediction { label, confidence })
    }

    /// Get service health status
    pub fn health(&self) -> HealthResult {
        HealthResult {
            healthy: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
            model: self.classifier.name().to_string(),
            labels: Label::ALL.iter().map(|l| l.as_str().to_string()).collect(),
        }
    }
}
