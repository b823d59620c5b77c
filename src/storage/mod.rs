//! Storage module - transient upload files

pub mod scratch;

pub use scratch::{ScratchFile, ScratchStore};
