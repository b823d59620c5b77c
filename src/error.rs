//! Error types for the prediction pipeline.

use thiserror::Error;

use crate::engine::PreprocessError;

/// Failure of a single prediction request.
///
/// Variants split into client-caused failures, reported as 4xx, and
/// server-side failures, reported as 5xx.
#[derive(Error, Debug)]
pub enum PredictError {
    /// The request carried no `file` field.
    #[error("No file provided")]
    MissingFile,

    /// The multipart body could not be parsed.
    #[error("malformed multipart body: {0}")]
    Multipart(String),

    /// The request body exceeded the configured upload limit.
    #[error("upload too large: {0}")]
    PayloadTooLarge(String),

    /// Writing the upload to scratch storage failed.
    #[error("scratch storage: {0}")]
    Scratch(#[source] std::io::Error),

    /// The upload could not be turned into an input tensor.
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    /// The model failed or produced an unusable output.
    #[error("inference failed: {0:#}")]
    Inference(anyhow::Error),
}

impl PredictError {
    /// Whether the failure was caused by the request itself
    pub fn is_client_error(&self) -> bool {
        match self {
            PredictError::MissingFile | PredictError::Multipart(_) => true,
            PredictError::PayloadTooLarge(_) => true,
            PredictError::Preprocess(PreprocessError::Decode(_)) => true,
            PredictError::Preprocess(PreprocessError::Io(_)) => false,
            PredictError::Scratch(_) | PredictError::Inference(_) => false,
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            PredictError::MissingFile => "MISSING_FILE",
            PredictError::Multipart(_) => "MULTIPART_ERROR",
            PredictError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            PredictError::Scratch(_) => "SCRATCH_IO_ERROR",
            PredictError::Preprocess(PreprocessError::Decode(_)) => "INVALID_IMAGE",
            PredictError::Preprocess(PreprocessError::Io(_)) => "SCRATCH_IO_ERROR",
            PredictError::Inference(_) => "INFERENCE_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_message() {
        assert_eq!(PredictError::MissingFile.to_string(), "No file provided");
        assert!(PredictError::MissingFile.is_client_error());
    }

    #[test]
    fn test_classification() {
        let decode = PredictError::Preprocess(PreprocessError::Decode(
            image::ImageError::Unsupported(image::error::UnsupportedError::from_format_and_kind(
                image::error::ImageFormatHint::Unknown,
                image::error::UnsupportedErrorKind::Format(image::error::ImageFormatHint::Unknown),
            )),
        ));
        assert!(decode.is_client_error());
        assert_eq!(decode.code(), "INVALID_IMAGE");

        let io = PredictError::Preprocess(PreprocessError::Io(std::io::Error::other("gone")));
        assert!(!io.is_client_error());

        let inference = PredictError::Inference(anyhow::anyhow!("device lost"));
        assert!(!inference.is_client_error());
        assert_eq!(inference.code(), "INFERENCE_FAILED");
        assert_eq!(inference.to_string(), "inference failed: device lost");

        assert!(PredictError::Multipart("eof".into()).is_client_error());

        let too_large = PredictError::PayloadTooLarge("length limit exceeded".into());
        assert!(too_large.is_client_error());
        assert_eq!(too_large.code(), "PAYLOAD_TOO_LARGE");
        assert!(!PredictError::Scratch(std::io::Error::other("full")).is_client_error());
    }
}
