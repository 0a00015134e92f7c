//! Transcript and diarization segment types shared across the pipeline.
//!
//! Times are seconds from the start of the recording. Segments arrive from
//! the transcription backends ordered by start time and keep that order
//! through every later stage.

use serde::{Deserialize, Serialize};

use crate::defaults::UNKNOWN_SPEAKER;

/// A span of transcribed speech, before any speaker is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// A diarization turn: who spoke during an interval. Carries no text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSegment {
    pub start: f64,
    pub end: f64,
    pub speaker: String,
}

impl SpeakerSegment {
    pub fn new(start: f64, end: f64, speaker: impl Into<String>) -> Self {
        Self {
            start,
            end,
            speaker: speaker.into(),
        }
    }
}

/// A transcript span with its speaker label attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiarizedSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub speaker: String,
}

impl DiarizedSegment {
    /// Creates a segment with the speaker still unknown.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            speaker: UNKNOWN_SPEAKER.to_string(),
        }
    }

    pub fn with_speaker(start: f64, end: f64, text: impl Into<String>, speaker: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            speaker: speaker.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}
