//! meetscribe - Meeting transcription with speaker identification
//!
//! Offline pipeline: whisper.cpp (GPU) or whisper-rs (CPU) for
//! speech-to-text, pyannote for diarization, rule-based transcript cleanup.

// Library code propagates errors; unwrap belongs in tests
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod clean;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
#[cfg(feature = "cli")]
pub mod diagnostics;
pub mod diarize;
pub mod error;
pub mod models;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod segment;
pub mod stt;

// Pipeline assembly
pub use pipeline::{
    PipelineOptions, Stage, StageContext, StageData, TranscriptionPipeline, default_pipeline,
};

// Transcription backends
pub use stt::{MockBackend, TranscriptionBackend};

// Error handling
pub use error::{MeetscribeError, Result};

// Config
pub use config::Config;

// Transcript types
pub use models::WhisperModel;
pub use segment::{DiarizedSegment, TranscriptSegment};

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.2+abc1234"` when git hash is available, `"0.3.2"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
