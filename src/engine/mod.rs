//! Inference engine module
//!
//! - Model loading and OpenVINO inference
//! - Image to tensor preprocessing
//! - Score to label mapping

pub mod labels;
pub mod model;
pub mod preprocess;

pub use labels::Label;
pub use model::{Classifier, OpenVinoClassifier};
pub use preprocess::{load_tensor, PreprocessError};
