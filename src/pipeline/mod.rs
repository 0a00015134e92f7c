//! The transcription pipeline.
//!
//! A linear chain of stages run synchronously over one audio file:
//! transcribe, diarize, cleanup. Stages own their recovery; the
//! orchestrator only sequences them and reports progress.

pub mod orchestrator;
pub mod stage;

pub use orchestrator::{
    PipelineOptions, StageCompleteFn, StageStartFn, TranscriptionPipeline, default_pipeline,
};
pub use stage::{CleanupStage, DiarizeStage, Stage, StageContext, StageData, TranscribeStage};
