//! Pipeline stages and the data that flows between them.
//!
//! Each stage takes the previous stage's output and returns its own;
//! [`StageData`] enumerates the payload types so a misassembled pipeline
//! fails with a clear message instead of a type puzzle. The shared
//! [`StageContext`] carries what stages need beyond their direct input:
//! the original audio path (diarization re-reads the file) and the
//! progress flags.

use std::path::{Path, PathBuf};

use crate::clean::TranscriptCleaner;
use crate::config::{CleanupConfig, Config};
use crate::diarize::{Diarizer, assign_speakers_to_transcript, segments_without_speakers};
use crate::error::{MeetscribeError, Result};
use crate::segment::{DiarizedSegment, TranscriptSegment};
use crate::stt::{
    TranscriptionBackend, WhisperCppBackend, WhisperCppConfig, WhisperRsBackend, WhisperRsConfig,
};

/// Payload passed from one stage to the next.
#[derive(Debug, Clone, PartialEq)]
pub enum StageData {
    /// The input media file, before transcription.
    Audio(PathBuf),
    /// Timed text, before speaker attribution.
    Transcript(Vec<TranscriptSegment>),
    /// Timed text with speakers attached.
    Diarized(Vec<DiarizedSegment>),
}

impl StageData {
    /// Short payload description for mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Audio(_) => "an audio path",
            Self::Transcript(_) => "transcript segments",
            Self::Diarized(_) => "diarized segments",
        }
    }

    /// Unwrap the audio path, or report which stage got the wrong input.
    pub fn into_audio(self, stage: &'static str) -> Result<PathBuf> {
        match self {
            Self::Audio(path) => Ok(path),
            other => Err(mismatch(stage, "an audio path", &other)),
        }
    }

    /// Unwrap transcript segments, or report the mismatch.
    pub fn into_transcript(self, stage: &'static str) -> Result<Vec<TranscriptSegment>> {
        match self {
            Self::Transcript(segments) => Ok(segments),
            other => Err(mismatch(stage, "transcript segments", &other)),
        }
    }

    /// Unwrap diarized segments, or report the mismatch.
    pub fn into_diarized(self, stage: &'static str) -> Result<Vec<DiarizedSegment>> {
        match self {
            Self::Diarized(segments) => Ok(segments),
            other => Err(mismatch(stage, "diarized segments", &other)),
        }
    }
}

fn mismatch(stage: &str, expected: &str, got: &StageData) -> MeetscribeError {
    MeetscribeError::Other(format!(
        "{stage} stage expected {expected}, got {}",
        got.kind()
    ))
}

/// Shared state the orchestrator hands to every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageContext {
    audio_path: Option<PathBuf>,
    show_progress: bool,
    debug: bool,
}

impl Default for StageContext {
    fn default() -> Self {
        Self {
            audio_path: None,
            show_progress: true,
            debug: false,
        }
    }
}

impl StageContext {
    /// Context for a pipeline run over the given media file.
    pub fn new(audio_path: impl Into<PathBuf>) -> Self {
        Self {
            audio_path: Some(audio_path.into()),
            ..Self::default()
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The original media file, when known.
    pub fn audio_path(&self) -> Option<&Path> {
        self.audio_path.as_deref()
    }

    pub fn show_progress(&self) -> bool {
        self.show_progress
    }

    pub fn debug(&self) -> bool {
        self.debug
    }
}

/// One step of the transcription pipeline.
///
/// Stages hold their configuration but no run state, so one pipeline can
/// process several files.
pub trait Stage {
    /// Human-readable name, used by progress callbacks and error messages.
    fn name(&self) -> &'static str;

    /// Transform the previous stage's output into this stage's output.
    fn process(&self, data: StageData, ctx: &StageContext) -> Result<StageData>;
}

/// Transcription with GPU-first backend selection.
///
/// Tries the external whisper.cpp CLI when allowed; any GPU failure beyond
/// a plain missing install is reported and answered with one CPU retry.
/// Only a CPU failure is fatal.
pub struct TranscribeStage {
    config: Config,
    use_gpu: bool,
    language: Option<String>,
}

impl TranscribeStage {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            use_gpu: true,
            language: None,
        }
    }

    /// Allow or forbid the GPU attempt (forbidden = straight to CPU).
    pub fn with_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = use_gpu;
        self
    }

    /// Force a transcription language instead of auto-detection.
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    /// Run the GPU backend if it is installed at all.
    ///
    /// `None` means whisper.cpp is simply not present; that is a notice, not
    /// a warning, and the CPU decoder takes over.
    fn gpu_attempt(
        &self,
        audio: &Path,
        ctx: &StageContext,
    ) -> Option<Result<Vec<TranscriptSegment>>> {
        let mut cpp = WhisperCppConfig::from_config(&self.config);
        cpp.show_progress = ctx.show_progress();
        cpp.debug = ctx.debug();
        match WhisperCppBackend::new(cpp) {
            Err(MeetscribeError::GpuUnavailable { .. }) => None,
            Err(e) => Some(Err(e)),
            Ok(backend) => Some(backend.transcribe(audio, self.language.as_deref())),
        }
    }
}

impl Stage for TranscribeStage {
    fn name(&self) -> &'static str {
        "Transcribe"
    }

    fn process(&self, data: StageData, ctx: &StageContext) -> Result<StageData> {
        let audio = data.into_audio(self.name())?;

        if self.use_gpu {
            match self.gpu_attempt(&audio, ctx) {
                Some(Ok(segments)) => return Ok(StageData::Transcript(segments)),
                Some(Err(e)) => {
                    println!("WARNING: GPU transcription failed: {e}");
                    println!("Falling back to CPU...\n");
                }
                None => println!("GPU backend not found, using CPU (whisper-rs)..."),
            }
        }

        let backend = WhisperRsBackend::new(WhisperRsConfig::from_config(&self.config))?;
        let segments = backend.transcribe(&audio, self.language.as_deref())?;
        Ok(StageData::Transcript(segments))
    }
}

/// Speaker attribution.
///
/// Never fatal: a missing token, a missing audio path, or a diarization
/// failure all degrade to the generic `Speaker` label with a warning, and
/// the transcript carries on.
pub struct DiarizeStage {
    config: Config,
    token: Option<String>,
    enabled: bool,
}

impl DiarizeStage {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            token: None,
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Use this token instead of the config/environment lookup.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.config.huggingface_token())
    }

    fn skip(&self, segments: &[TranscriptSegment]) -> Result<StageData> {
        Ok(StageData::Diarized(segments_without_speakers(segments)))
    }
}

impl Stage for DiarizeStage {
    fn name(&self) -> &'static str {
        "Diarize"
    }

    fn process(&self, data: StageData, ctx: &StageContext) -> Result<StageData> {
        let segments = data.into_transcript(self.name())?;

        if !self.enabled {
            return self.skip(&segments);
        }

        let Some(token) = self.resolve_token() else {
            println!("\nWARNING: No HuggingFace token found. Skipping speaker diarization.");
            println!(
                "Set HF_TOKEN environment variable or add 'huggingface_token' to meetscribe.json"
            );
            println!("Get a token at: https://huggingface.co/settings/tokens\n");
            return self.skip(&segments);
        };

        let Some(audio) = ctx.audio_path() else {
            println!(
                "\nWARNING: Audio path not set for diarization. Skipping speaker identification."
            );
            return self.skip(&segments);
        };

        let attempt = Diarizer::new(
            Some(&token),
            self.config.min_speakers,
            self.config.max_speakers,
        )
        .and_then(|diarizer| diarizer.diarize(audio));

        match attempt {
            Ok(speakers) => Ok(StageData::Diarized(assign_speakers_to_transcript(
                &segments, &speakers,
            ))),
            Err(e) => {
                println!("\nWARNING: Diarization failed: {e}");
                println!("Continuing without speaker identification.\n");
                self.skip(&segments)
            }
        }
    }
}

/// Transcript cleanup.
pub struct CleanupStage {
    cleanup: CleanupConfig,
    enabled: bool,
}

impl CleanupStage {
    pub fn new(cleanup: CleanupConfig) -> Self {
        Self {
            cleanup,
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl Stage for CleanupStage {
    fn name(&self) -> &'static str {
        "Cleanup"
    }

    fn process(&self, data: StageData, _ctx: &StageContext) -> Result<StageData> {
        let segments = data.into_diarized(self.name())?;
        if !self.enabled {
            // Pass-through: same segments, same order
            return Ok(StageData::Diarized(segments));
        }
        let cleaner = TranscriptCleaner::new(self.cleanup.clone());
        Ok(StageData::Diarized(cleaner.clean(segments)))
    }
}
