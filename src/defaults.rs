//! Default configuration constants for meetscribe.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Audio sample rate in Hz that both transcription backends expect.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency. Inputs at any other rate are
/// transcoded down to this before decoding.
pub const SAMPLE_RATE: u32 = 16000;

/// Default Whisper model name.
///
/// "large-v3" gives the best accuracy on meeting audio with crosstalk and
/// distant microphones. Use a smaller model for quick drafts.
pub const DEFAULT_MODEL: &str = "large-v3";

/// Default language code passed to whisper.cpp when none is requested.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Default minimum number of speakers hinted to the diarization model.
pub const MIN_SPEAKERS: u32 = 2;

/// Default maximum number of speakers hinted to the diarization model.
///
/// Six covers most meetings; raise it for large calls. The bounds are soft:
/// the model may still find fewer or more speakers.
pub const MAX_SPEAKERS: u32 = 6;

/// Default minimum segment length (in characters, after trimming) kept by
/// the cleanup pass. Shorter segments are almost always decode noise.
pub const MIN_SEGMENT_LENGTH: usize = 3;

/// Default similarity ratio at or above which a segment is considered a
/// near-duplicate of the previously kept one and dropped.
pub const SIMILARITY_THRESHOLD: f64 = 0.9;

/// Beam width for the in-process (CPU) decoder.
///
/// Beam search at width 5 trades a little speed for noticeably fewer
/// hallucinated continuations than greedy decoding on long recordings.
pub const BEAM_SIZE: usize = 5;

/// RMS-based energy threshold (0.0 to 1.0) below which a window counts as
/// silence for the pre-decode voice activity filter.
pub const VAD_THRESHOLD: f32 = 0.02;

/// Minimum silence duration in milliseconds before a gap is cut out by the
/// voice activity filter. Shorter gaps are natural pauses and stay in.
pub const VAD_MIN_SILENCE_MS: u32 = 500;

/// Padding in milliseconds kept around detected speech so word onsets and
/// endings are not clipped by the voice activity filter.
pub const VAD_SPEECH_PAD_MS: u32 = 200;

/// Media file extensions accepted as transcription input (lowercase).
///
/// Anything else is rejected before a subprocess is spawned. Video
/// containers are accepted because ffmpeg extracts their audio track.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "wav", "mp3", "m4a", "flac", "ogg", "mp4", "mkv", "mov", "avi", "webm",
];

/// Diarization model identifier, used in token help text.
pub const DIARIZATION_MODEL: &str = "pyannote/speaker-diarization-3.1";

/// Where to create a Hugging Face access token for diarization.
pub const HF_TOKEN_HELP_URL: &str = "https://huggingface.co/settings/tokens";

/// Where to fetch ggml model files when one is missing.
pub const MODEL_DOWNLOAD_HINT: &str = "https://huggingface.co/ggerganov/whisper.cpp";

/// Speaker label for transcript spans no diarization interval covers.
pub const UNKNOWN_SPEAKER: &str = "Unknown";

/// Speaker label applied to every segment when diarization is skipped.
pub const GENERIC_SPEAKER: &str = "Speaker";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speaker_bounds_are_ordered() {
        assert!(MIN_SPEAKERS >= 1);
        assert!(MAX_SPEAKERS >= MIN_SPEAKERS);
    }

    #[test]
    fn extension_list_is_lowercase() {
        for ext in MEDIA_EXTENSIONS {
            assert_eq!(*ext, ext.to_lowercase(), "extension {ext} not lowercase");
        }
    }

    #[test]
    fn wav_passthrough_is_supported() {
        assert!(MEDIA_EXTENSIONS.contains(&"wav"));
    }
}
