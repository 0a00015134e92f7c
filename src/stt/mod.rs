//! Speech-to-text backends.
//!
//! Two implementations of [`TranscriptionBackend`]: the external whisper.cpp
//! CLI (GPU) and the in-process whisper-rs decoder (CPU). Both validate
//! their input the same way and produce the same ordered segment list, so
//! the pipeline can swap one for the other.

pub mod backend;
pub mod convert;
pub mod whisper;
pub mod whisper_cpp;

pub use backend::{MockBackend, TranscriptionBackend, validate_media_path};
pub use convert::{TempWav, WavSource, ensure_wav};
pub use whisper::{WhisperRsBackend, WhisperRsConfig};
pub use whisper_cpp::{WhisperCppBackend, WhisperCppConfig};
