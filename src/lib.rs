//! Fresh/Rotten Produce Classifier Library

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod service;
pub mod storage;

pub use config::Config;
pub use error::PredictError;
