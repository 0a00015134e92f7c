//! Speaker diarization through pyannote.
//!
//! The heavy lifting happens in an external runner process (pyannote has no
//! native port), reached through the [`SpeakerModel`] trait so tests and
//! future engines can slot in without touching the labeling logic here.
//! Raw engine labels like `SPEAKER_00` are renamed to `Speaker 1`,
//! `Speaker 2`, ... in order of first appearance.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::defaults;
use crate::error::{MeetscribeError, Result};
use crate::segment::SpeakerSegment;

/// Command used when `PYANNOTE_RUNNER` is not set.
const DEFAULT_RUNNER: &str = "pyannote-runner";

/// One speaker turn as the engine reports it, before relabeling.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTurn {
    pub start: f64,
    pub end: f64,
    pub label: String,
}

/// A diarization engine: takes an audio file, returns raw speaker turns.
pub trait SpeakerModel {
    fn diarize_raw(
        &self,
        audio: &Path,
        min_speakers: u32,
        max_speakers: u32,
    ) -> Result<Vec<RawTurn>>;
}

/// Production [`SpeakerModel`] that shells out to a pyannote runner script.
///
/// The runner is found through the `PYANNOTE_RUNNER` environment variable,
/// falling back to `pyannote-runner` on PATH. It receives the audio path
/// plus speaker bounds and prints one `start<TAB>end<TAB>label` line per
/// turn. The HuggingFace token travels in the `HF_TOKEN` environment
/// variable, never on the command line.
pub struct PyannoteRunner {
    command: PathBuf,
    token: String,
}

impl PyannoteRunner {
    pub fn new(token: String) -> Self {
        let command = std::env::var_os("PYANNOTE_RUNNER")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RUNNER));
        Self { command, token }
    }

    /// Use an explicit runner command instead of the environment lookup.
    pub fn with_command(command: impl Into<PathBuf>, token: String) -> Self {
        Self {
            command: command.into(),
            token,
        }
    }
}

impl std::fmt::Debug for PyannoteRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PyannoteRunner")
            .field("command", &self.command)
            .field("token", &"***")
            .finish()
    }
}

impl SpeakerModel for PyannoteRunner {
    fn diarize_raw(
        &self,
        audio: &Path,
        min_speakers: u32,
        max_speakers: u32,
    ) -> Result<Vec<RawTurn>> {
        // The runner loads the model on every invocation
        println!("Loading speaker diarization model...");

        let output = Command::new(&self.command)
            .arg(audio)
            .arg("--model")
            .arg(defaults::DIARIZATION_MODEL)
            .arg("--min-speakers")
            .arg(min_speakers.to_string())
            .arg("--max-speakers")
            .arg(max_speakers.to_string())
            .env("HF_TOKEN", &self.token)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| MeetscribeError::Diarization {
                message: if e.kind() == std::io::ErrorKind::NotFound {
                    format!(
                        "pyannote runner not found: {} (set PYANNOTE_RUNNER)",
                        self.command.display()
                    )
                } else {
                    e.to_string()
                },
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .map(|line| line.trim().to_string())
                .unwrap_or_else(|| format!("runner exited with status {}", output.status));
            return Err(MeetscribeError::Diarization { message: detail });
        }

        parse_turns(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse `start<TAB>end<TAB>label` lines into raw turns.
fn parse_turns(output: &str) -> Result<Vec<RawTurn>> {
    let mut turns = Vec::new();
    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.splitn(3, '\t');
        let turn = fields
            .next()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .zip(fields.next().and_then(|s| s.trim().parse::<f64>().ok()))
            .zip(fields.next().map(|s| s.trim().to_string()))
            .map(|((start, end), label)| RawTurn { start, end, label });
        match turn {
            Some(turn) => turns.push(turn),
            None => {
                return Err(MeetscribeError::Diarization {
                    message: format!("unexpected runner output line: {line:?}"),
                });
            }
        }
    }
    Ok(turns)
}

/// Mock speaker model for testing.
#[derive(Debug, Clone, Default)]
pub struct MockSpeakerModel {
    turns: Vec<RawTurn>,
    should_fail: bool,
}

impl MockSpeakerModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return these turns from every call.
    pub fn with_turns(mut self, turns: Vec<RawTurn>) -> Self {
        self.turns = turns;
        self
    }

    /// Fail every call with a diarization error.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl SpeakerModel for MockSpeakerModel {
    fn diarize_raw(
        &self,
        _audio: &Path,
        _min_speakers: u32,
        _max_speakers: u32,
    ) -> Result<Vec<RawTurn>> {
        if self.should_fail {
            return Err(MeetscribeError::Diarization {
                message: "mock diarization failure".to_string(),
            });
        }
        Ok(self.turns.clone())
    }
}

/// Speaker diarization with human-friendly labels.
///
/// Requires a HuggingFace token up front; pyannote models are gated and a
/// missing token would otherwise surface as a confusing download error
/// halfway through a run.
pub struct Diarizer {
    min_speakers: u32,
    max_speakers: u32,
    model: Box<dyn SpeakerModel>,
}

impl std::fmt::Debug for Diarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diarizer")
            .field("min_speakers", &self.min_speakers)
            .field("max_speakers", &self.max_speakers)
            .field("model", &"<SpeakerModel>")
            .finish()
    }
}

impl Diarizer {
    /// Create a diarizer backed by the pyannote runner.
    ///
    /// The token must already be resolved (config over environment); a
    /// missing or blank one is rejected here, at construction.
    pub fn new(token: Option<&str>, min_speakers: u32, max_speakers: u32) -> Result<Self> {
        let token = match token {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => {
                return Err(MeetscribeError::MissingToken {
                    token: "HF_TOKEN".to_string(),
                    help_url: defaults::HF_TOKEN_HELP_URL.to_string(),
                });
            }
        };
        Ok(Self {
            min_speakers,
            max_speakers,
            model: Box::new(PyannoteRunner::new(token)),
        })
    }

    /// Swap in a different diarization engine.
    pub fn with_model(mut self, model: Box<dyn SpeakerModel>) -> Self {
        self.model = model;
        self
    }

    /// Identify who speaks when in the given audio file.
    ///
    /// Labels are assigned in order of first appearance: the first distinct
    /// voice becomes `Speaker 1`, the next `Speaker 2`, and so on.
    pub fn diarize(&self, audio: &Path) -> Result<Vec<SpeakerSegment>> {
        if !audio.exists() {
            return Err(MeetscribeError::FileNotFound {
                path: audio.display().to_string(),
            });
        }

        let name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| audio.display().to_string());
        println!("Identifying speakers in: {name}");
        println!("This may take a while...\n");

        let turns = self
            .model
            .diarize_raw(audio, self.min_speakers, self.max_speakers)?;
        let (segments, speaker_count) = label_turns(turns);

        println!("Identified {speaker_count} speakers\n");
        Ok(segments)
    }
}

/// Rename raw engine labels to `Speaker N` in first-appearance order.
fn label_turns(turns: Vec<RawTurn>) -> (Vec<SpeakerSegment>, usize) {
    let mut speaker_map: HashMap<String, String> = HashMap::new();
    let mut segments = Vec::with_capacity(turns.len());
    for turn in turns {
        let next = speaker_map.len() + 1;
        let label = speaker_map
            .entry(turn.label)
            .or_insert_with(|| format!("Speaker {next}"))
            .clone();
        segments.push(SpeakerSegment::new(turn.start, turn.end, label));
    }
    (segments, speaker_map.len())
}
