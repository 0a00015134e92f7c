//! End-to-end pipeline tests over the public API.
//!
//! Nothing here needs model weights. The GPU backend is exercised through a
//! scripted whisper-cli stand-in (Unix only), and scenario tests that start
//! from a known transcript feed it in with a small stage of their own.

use std::path::Path;

use meetscribe::config::{Config, PathsConfig};
use meetscribe::diarize::assign_speakers_to_transcript;
use meetscribe::error::{MeetscribeError, Result};
use meetscribe::output::write_transcript;
use meetscribe::pipeline::{
    CleanupStage, DiarizeStage, PipelineOptions, Stage, StageContext, StageData, TranscribeStage,
    TranscriptionPipeline, default_pipeline,
};
use meetscribe::segment::{DiarizedSegment, SpeakerSegment, TranscriptSegment};

/// Stage producing a fixed transcript, standing in for a decoder.
struct CannedTranscript(Vec<(f64, f64, &'static str)>);

impl Stage for CannedTranscript {
    fn name(&self) -> &'static str {
        "Transcribe"
    }

    fn process(&self, data: StageData, _ctx: &StageContext) -> Result<StageData> {
        let StageData::Audio(_) = data else {
            panic!("transcribe stage expects the audio path");
        };
        let segments = self
            .0
            .iter()
            .map(|(start, end, text)| TranscriptSegment::new(*start, *end, *text))
            .collect();
        Ok(StageData::Transcript(segments))
    }
}

/// Transcript-in, cleaned-transcript-out pipeline with diarization off.
fn scenario_pipeline(transcript: Vec<(f64, f64, &'static str)>) -> TranscriptionPipeline {
    let config = Config::default();
    TranscriptionPipeline::new()
        .with_progress(false)
        .add_stage(CannedTranscript(transcript))
        .add_stage(DiarizeStage::new(config.clone()).with_enabled(false))
        .add_stage(CleanupStage::new(config.cleanup))
}

#[cfg(unix)]
fn install_fake_gpu(dir: &Path, script_body: &str) -> Config {
    use std::os::unix::fs::PermissionsExt;

    let cli = dir.join("whisper-cli");
    std::fs::write(&cli, format!("#!/bin/sh\n{script_body}\n")).unwrap();
    std::fs::set_permissions(&cli, std::fs::Permissions::from_mode(0o755)).unwrap();
    std::fs::write(dir.join("ggml-large-v3-turbo.bin"), b"ggml").unwrap();

    Config {
        paths: PathsConfig {
            whisper_cpp_exe: Some(cli),
            whisper_cpp_models: Some(dir.to_path_buf()),
            oneapi_bin: None,
            output_dir: None,
        },
        ..Config::default()
    }
}

// ── Cleanup scenarios ───────────────────────────────────────────────────

#[test]
fn hallucination_lines_are_dropped_from_the_final_transcript() {
    let pipeline = scenario_pipeline(vec![
        (0.0, 5.0, "This is real content."),
        (5.0, 10.0, "Thanks for watching!"),
    ]);
    let segments = pipeline.run(Path::new("meeting.wav")).unwrap();

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].text, "This is real content.");
    assert_eq!(segments[0].speaker, "Speaker");
}

#[test]
fn repeated_lines_collapse_to_one() {
    let pipeline = scenario_pipeline(vec![
        (0.0, 5.0, "Hello there."),
        (5.0, 10.0, "Hello there."),
        (10.0, 15.0, "Something different."),
    ]);
    let segments = pipeline.run(Path::new("meeting.wav")).unwrap();

    let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, ["Hello there.", "Something different."]);
}

#[test]
fn lone_fillers_are_removed_but_real_sentences_survive() {
    let pipeline = scenario_pipeline(vec![
        (0.0, 2.0, "Yeah"),
        (2.0, 6.0, "Yeah, I agree with that point."),
    ]);
    let segments = pipeline.run(Path::new("meeting.wav")).unwrap();

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].text, "Yeah, I agree with that point.");
}

// ── Speaker attribution ─────────────────────────────────────────────────

#[test]
fn speakers_attach_by_segment_midpoint() {
    let transcript = [TranscriptSegment::new(5.0, 10.0, "text")];
    let speakers = [
        SpeakerSegment::new(0.0, 6.0, "Speaker 1"),
        SpeakerSegment::new(6.0, 12.0, "Speaker 2"),
    ];

    let labeled = assign_speakers_to_transcript(&transcript, &speakers);

    assert_eq!(labeled.len(), 1);
    // midpoint 7.5 lands in the second turn
    assert_eq!(labeled[0].speaker, "Speaker 2");
}

// ── Backend wiring ──────────────────────────────────────────────────────

#[cfg(unix)]
#[test]
fn scripted_gpu_run_produces_a_labeled_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let config = install_fake_gpu(
        dir.path(),
        concat!(
            "echo '[00:00:00.000 --> 00:00:02.000]  Good morning.'\n",
            "echo '[00:00:02.000 --> 00:00:05.500]  Let us get started.'",
        ),
    );
    let audio = dir.path().join("standup.wav");
    std::fs::write(&audio, b"RIFF").unwrap();

    let pipeline = TranscriptionPipeline::new()
        .with_progress(false)
        .add_stage(TranscribeStage::new(config.clone()))
        .add_stage(DiarizeStage::new(config.clone()).with_enabled(false))
        .add_stage(CleanupStage::new(config.cleanup));
    let segments = pipeline.run(&audio).unwrap();

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].text, "Good morning.");
    assert_eq!(segments[0].start, 0.0);
    assert_eq!(segments[1].text, "Let us get started.");
    assert!((segments[1].end - 5.5).abs() < 1e-9);
    assert!(segments.iter().all(|s| s.speaker == "Speaker"));
}

#[test]
fn missing_backends_surface_the_cpu_error() {
    // Empty tool dir: whisper-cli is absent so the GPU attempt steps aside,
    // and the model file is absent so the CPU decoder reports it
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        paths: PathsConfig {
            whisper_cpp_exe: Some(dir.path().join("whisper-cli")),
            whisper_cpp_models: Some(dir.path().to_path_buf()),
            oneapi_bin: None,
            output_dir: None,
        },
        ..Config::default()
    };
    let audio = dir.path().join("meeting.wav");
    std::fs::write(&audio, b"RIFF").unwrap();

    let pipeline = TranscriptionPipeline::new()
        .with_progress(false)
        .add_stage(TranscribeStage::new(config));
    let err = pipeline.run(&audio).unwrap_err();

    assert!(matches!(err, MeetscribeError::ModelNotFound { .. }));
}

#[cfg(unix)]
#[test]
fn default_pipeline_degrades_to_generic_speakers_without_diarization() {
    let dir = tempfile::tempdir().unwrap();
    let config = install_fake_gpu(
        dir.path(),
        "echo '[00:00:00.000 --> 00:00:03.000]  Welcome back, everyone.'",
    );
    let audio = dir.path().join("retro.wav");
    std::fs::write(&audio, b"RIFF").unwrap();

    let options = PipelineOptions {
        show_progress: false,
        ..PipelineOptions::default()
    };
    let segments = default_pipeline(&config, &options).run(&audio).unwrap();

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].text, "Welcome back, everyone.");
    assert_eq!(segments[0].speaker, "Speaker");
}

// ── Saved transcript ────────────────────────────────────────────────────

#[test]
fn transcript_file_groups_consecutive_speaker_lines() {
    let dir = tempfile::tempdir().unwrap();
    let segments = [
        DiarizedSegment::with_speaker(0.0, 2.0, "First point.", "Speaker 1"),
        DiarizedSegment::with_speaker(2.0, 4.0, "Second point.", "Speaker 1"),
        DiarizedSegment::with_speaker(4.0, 6.0, "A question?", "Speaker 2"),
    ];

    let path = write_transcript(&segments, Path::new("Weekly Sync: Q3.mp4"), dir.path()).unwrap();

    assert_eq!(path.file_name().unwrap(), "Weekly Sync_ Q3.txt");
    let body = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        body,
        "Speaker 1: First point.\nSpeaker 1: Second point.\n\nSpeaker 2: A question?"
    );
}
