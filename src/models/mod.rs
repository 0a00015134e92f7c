//! Whisper model management.

pub mod catalog;

pub use catalog::{ModelInfo, WhisperModel, get_model, list_models, model_info};
