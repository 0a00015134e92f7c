use crate::defaults;
use crate::error::{MeetscribeError, Result};
use crate::segment::TranscriptSegment;
use std::path::Path;
use std::sync::Arc;

/// Trait for file-based speech-to-text transcription.
///
/// This trait allows swapping implementations (whisper.cpp subprocess,
/// in-process decode, or a mock). Implementations validate their input with
/// [`validate_media_path`] before doing any work, and return segments
/// ordered by start time.
pub trait TranscriptionBackend: Send + Sync {
    /// Transcribe a media file to timestamped segments.
    ///
    /// # Arguments
    /// * `audio` - Path to a media file (see [`defaults::MEDIA_EXTENSIONS`])
    /// * `language` - ISO language code, or `None` for the default
    fn transcribe(&self, audio: &Path, language: Option<&str>) -> Result<Vec<TranscriptSegment>>;

    /// Short name of this backend for status output.
    fn name(&self) -> &'static str;
}

/// Implement TranscriptionBackend for Arc<T> to allow sharing.
impl<T: TranscriptionBackend> TranscriptionBackend for Arc<T> {
    fn transcribe(&self, audio: &Path, language: Option<&str>) -> Result<Vec<TranscriptSegment>> {
        (**self).transcribe(audio, language)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Check that a path points at a regular file with a supported extension.
///
/// Runs before any subprocess is spawned or model loaded, so a typo'd path
/// fails fast instead of after a model load.
pub fn validate_media_path(path: &Path) -> Result<()> {
    if !path.exists() || !path.is_file() {
        return Err(MeetscribeError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match extension {
        Some(ext) if defaults::MEDIA_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(MeetscribeError::UnsupportedMedia {
            path: path.display().to_string(),
            expected: defaults::MEDIA_EXTENSIONS.join(", "),
        }),
    }
}

/// Mock backend for testing
#[derive(Debug, Clone)]
pub struct MockBackend {
    name: &'static str,
    segments: Vec<TranscriptSegment>,
    should_fail: bool,
}

impl MockBackend {
    /// Create a new mock backend with default settings
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            segments: vec![TranscriptSegment::new(0.0, 1.0, "mock transcription")],
            should_fail: false,
        }
    }

    /// Configure the mock to return specific segments
    pub fn with_segments(mut self, segments: Vec<TranscriptSegment>) -> Self {
        self.segments = segments;
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl TranscriptionBackend for MockBackend {
    fn transcribe(&self, _audio: &Path, _language: Option<&str>) -> Result<Vec<TranscriptSegment>> {
        if self.should_fail {
            Err(MeetscribeError::Transcription {
                message: "mock transcription failure".to_string(),
            })
        } else {
            Ok(self.segments.clone())
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
