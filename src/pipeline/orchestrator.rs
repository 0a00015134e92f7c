//! The pipeline itself: an ordered list of stages and a run loop.
//!
//! The orchestrator is deliberately dumb. It threads [`StageData`] through
//! the stages and fires progress callbacks; it never catches an error.
//! Recovery lives inside the stages that can actually recover (GPU falls
//! back to CPU, diarization degrades to a generic label), so an error
//! reaching the run loop is final by definition.

use std::fmt;
use std::path::Path;

use crate::config::Config;
use crate::diarize::segments_without_speakers;
use crate::error::{MeetscribeError, Result};
use crate::segment::DiarizedSegment;

use super::stage::{CleanupStage, DiarizeStage, Stage, StageContext, StageData, TranscribeStage};

/// Callback fired before each stage runs, with the stage name.
pub type StageStartFn = dyn Fn(&str);

/// Callback fired after each stage, with the stage name and its output.
pub type StageCompleteFn = dyn Fn(&str, &StageData);

/// An ordered chain of [`Stage`]s over one audio file.
pub struct TranscriptionPipeline {
    stages: Vec<Box<dyn Stage>>,
    on_stage_start: Option<Box<StageStartFn>>,
    on_stage_complete: Option<Box<StageCompleteFn>>,
    show_progress: bool,
    debug: bool,
}

impl Default for TranscriptionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptionPipeline {
    /// An empty pipeline. Use [`default_pipeline`] for the standard chain.
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            on_stage_start: None,
            on_stage_complete: None,
            show_progress: true,
            debug: false,
        }
    }

    pub fn add_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn on_stage_start(mut self, callback: impl Fn(&str) + 'static) -> Self {
        self.on_stage_start = Some(Box::new(callback));
        self
    }

    pub fn on_stage_complete(mut self, callback: impl Fn(&str, &StageData) + 'static) -> Self {
        self.on_stage_complete = Some(Box::new(callback));
        self
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Process one file through every stage, in order.
    ///
    /// The final payload is normalized to diarized segments: a chain that
    /// stops at a bare transcript gets the generic speaker label, and a
    /// chain that never transcribed anything is an error.
    pub fn run(&self, audio: &Path) -> Result<Vec<DiarizedSegment>> {
        let ctx = StageContext::new(audio)
            .with_progress(self.show_progress)
            .with_debug(self.debug);
        let mut data = StageData::Audio(audio.to_path_buf());

        for stage in &self.stages {
            if let Some(callback) = &self.on_stage_start {
                callback(stage.name());
            }
            data = stage.process(data, &ctx)?;
            if let Some(callback) = &self.on_stage_complete {
                callback(stage.name(), &data);
            }
        }

        match data {
            StageData::Diarized(segments) => Ok(segments),
            StageData::Transcript(segments) => Ok(segments_without_speakers(&segments)),
            StageData::Audio(_) => Err(MeetscribeError::Other(
                "pipeline finished without producing a transcript".to_string(),
            )),
        }
    }
}

impl fmt::Debug for TranscriptionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscriptionPipeline")
            .field("stages", &self.stage_names())
            .field("show_progress", &self.show_progress)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

/// Switches for assembling the standard pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Try the whisper.cpp GPU backend before falling back to CPU.
    pub use_gpu: bool,
    /// Run speaker diarization.
    pub diarize: bool,
    /// Run transcript cleanup.
    pub cleanup: bool,
    /// Print transcription progress while decoding.
    pub show_progress: bool,
    /// Echo every line the external tools produce.
    pub debug: bool,
    /// Transcription language, `None` for auto-detection.
    pub language: Option<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            use_gpu: true,
            diarize: true,
            cleanup: true,
            show_progress: true,
            debug: false,
            language: None,
        }
    }
}

/// The standard three-stage chain: transcribe, diarize, cleanup.
pub fn default_pipeline(config: &Config, options: &PipelineOptions) -> TranscriptionPipeline {
    TranscriptionPipeline::new()
        .with_progress(options.show_progress)
        .with_debug(options.debug)
        .add_stage(
            TranscribeStage::new(config.clone())
                .with_gpu(options.use_gpu)
                .with_language(options.language.clone()),
        )
        .add_stage(DiarizeStage::new(config.clone()).with_enabled(options.diarize))
        .add_stage(CleanupStage::new(config.cleanup.clone()).with_enabled(options.cleanup))
}
