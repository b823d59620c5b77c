//! Classifier service configuration

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub preprocess: PreprocessConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub device: String,
}

/// Input transform applied to every upload before inference
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub width: u32,
    pub height: u32,
    pub apply_exif_orientation: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub scratch_dir: PathBuf,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn default_path() -> &'static str {
        "config.toml"
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/fresh_rotten_classifier.onnx"),
            device: "CPU".to_string(),
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        // Must match the training input size
        Self {
            width: 150,
            height: 150,
            apply_exif_orientation: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from("uploads"),
        }
    }
}
