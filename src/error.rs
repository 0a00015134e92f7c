//! Error types for meetscribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeetscribeError {
    // Configuration errors
    #[error("Missing required token: {token}\nGet a token at: {help_url}")]
    MissingToken { token: String, help_url: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // Model errors
    #[error("Model not found: {path}\nDownload from: {hint}")]
    ModelNotFound { path: String, hint: String },

    #[error("Failed to load model: {message}")]
    ModelLoad { message: String },

    // Transcription errors
    #[error("GPU transcription unavailable: {reason}")]
    GpuUnavailable { reason: String },

    #[error("Audio conversion failed for {source_path}: {message}")]
    AudioConversion { source_path: String, message: String },

    #[error("whisper.cpp failed with return code {status}")]
    Whisper { status: i32, stderr: String },

    #[error("Transcription failed: {message}")]
    Transcription { message: String },

    #[error("Unsupported media type: {path} (expected one of: {expected})")]
    UnsupportedMedia { path: String, expected: String },

    // Diarization errors
    #[error("Diarization failed: {message}")]
    Diarization { message: String },

    // Frame classification errors (raised by external collaborators)
    #[error("Classification failed: {message}")]
    Classification { message: String },

    // File lookup, shared by transcription and diarization inputs
    #[error("Audio file not found: {path}")]
    FileNotFound { path: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

/// Coarse grouping of [`MeetscribeError`] variants, mirroring the error
/// hierarchy: recovery policies and exit reporting match on the group
/// rather than on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Model,
    Transcription,
    Diarization,
    Classification,
    /// A missing input file, shared by transcription and diarization
    /// validation: neither stage owns it exclusively.
    FileNotFound,
    Io,
    Other,
}

impl MeetscribeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingToken { .. } | Self::InvalidConfig { .. } => ErrorKind::Configuration,
            Self::ModelNotFound { .. } | Self::ModelLoad { .. } => ErrorKind::Model,
            Self::GpuUnavailable { .. }
            | Self::AudioConversion { .. }
            | Self::Whisper { .. }
            | Self::Transcription { .. }
            | Self::UnsupportedMedia { .. } => ErrorKind::Transcription,
            Self::Diarization { .. } => ErrorKind::Diarization,
            Self::Classification { .. } => ErrorKind::Classification,
            Self::FileNotFound { .. } => ErrorKind::FileNotFound,
            Self::Io(_) => ErrorKind::Io,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, MeetscribeError>;
