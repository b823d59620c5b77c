//! Model Store
//!
//! The trained classifier is loaded once at startup and stays read-only for
//! the rest of the process. Handlers only see it through [`Classifier`].

use std::path::Path;
use std::time::Instant;

use anyhow::{bail, ensure, Context, Result};
use ndarray::Array4;
use openvino::{CompiledModel, Core, ElementType, Shape, Tensor};
use parking_lot::Mutex;
use tracing::{debug, info};

/// A loaded classifier producing one score per class
pub trait Classifier: Send + Sync {
    /// Identifier of the loaded artifact
    fn name(&self) -> &str;

    /// Run a single inference on an NHWC input tensor
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>>;
}

/// OpenVINO-backed classifier compiled for a single device
pub struct OpenVinoClassifier {
    name: String,
    compiled: Mutex<CompiledModel>,
}

impl OpenVinoClassifier {
    /// Read and compile the model artifact (ONNX or OpenVINO IR)
    pub fn load(path: &Path, device: &str) -> Result<Self> {
        ensure!(path.is_file(), "model artifact not found: {}", path.display());
        let path_str = path
            .to_str()
            .with_context(|| format!("model path is not valid UTF-8: {}", path.display()))?;

        info!("Loading model from {} on {}", path_str, device);
        let start = Instant::now();

        let mut core = Core::new().context("failed to initialize OpenVINO runtime")?;
        let model = core
            .read_model_from_file(path_str, "")
            .with_context(|| format!("failed to read model {}", path_str))?;
        let compiled = core
            .compile_model(&model, device.into())
            .with_context(|| format!("failed to compile model for device {}", device))?;

        info!("Model loaded in {:?}", start.elapsed());

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path_str.to_string());

        Ok(Self {
            name,
            compiled: Mutex::new(compiled),
        })
    }
}

impl Classifier for OpenVinoClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
        // Each call gets its own request; only its creation needs the lock
        let mut request = self.compiled.lock().create_infer_request()?;

        let dims: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let input_shape = Shape::new(&dims)?;
        let mut tensor = Tensor::new(ElementType::F32, &input_shape)?;

        let raw = tensor.get_raw_data_mut()?;
        ensure!(
            raw.len() == input.len() * std::mem::size_of::<f32>(),
            "input tensor holds {} bytes, expected {}",
            raw.len(),
            input.len() * std::mem::size_of::<f32>()
        );
        for (dst, value) in raw.chunks_exact_mut(4).zip(input.iter()) {
            dst.copy_from_slice(&value.to_ne_bytes());
        }

        request.set_input_tensor(&tensor)?;
        request.infer()?;

        let output = request.get_output_tensor()?;
        let output_len = output.get_shape()?.get_dimensions().iter().product::<i64>() as usize;
        let raw = output.get_raw_data()?;
        if raw.len() < output_len * std::mem::size_of::<f32>() {
            bail!("output tensor shorter than its shape ({} bytes)", raw.len());
        }

        let scores: Vec<f32> = raw
            .chunks_exact(4)
            .take(output_len)
            .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        debug!("Model raw output: {:?}", scores);
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_artifact_fails_to_load() {
        let dir = tempdir().unwrap();
        let result = OpenVinoClassifier::load(&dir.path().join("missing.onnx"), "CPU");
        let err = result.err().unwrap();
        assert!(err.to_string().contains("model artifact not found"));
    }

    #[test]
    fn test_classifier_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<OpenVinoClassifier>();
    }

    #[test]
    fn test_directory_is_not_an_artifact() {
        let dir = tempdir().unwrap();
        assert!(OpenVinoClassifier::load(dir.path(), "CPU").is_err());
    }
}
