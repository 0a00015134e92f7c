//! GPU transcription through the whisper.cpp CLI.
//!
//! Runs an external `whisper-cli` (typically a SYCL build on Intel GPUs) and
//! parses its timestamped output lines as they stream in. The executable and
//! model file are checked at construction, so a machine without the GPU
//! stack fails fast and the caller can fall back to the in-process decoder.

use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;
use crate::defaults;
use crate::error::{MeetscribeError, Result};
use crate::paths;
use crate::segment::TranscriptSegment;
use crate::stt::backend::{TranscriptionBackend, validate_media_path};
use crate::stt::convert::ensure_wav;

/// A transcript line as whisper.cpp prints it:
/// `[00:01:02.500 --> 00:01:05.000]   text`.
static TIMESTAMP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d{2}:\d{2}:\d{2}\.\d{3}) --> (\d{2}:\d{2}:\d{2}\.\d{3})\]\s*(.+)$")
        .expect("timestamp line pattern is valid")
});

/// How many trailing output lines to keep for the error report when the
/// subprocess fails.
const ERROR_TAIL_LINES: usize = 10;

/// Configuration for the whisper.cpp backend.
#[derive(Debug, Clone)]
pub struct WhisperCppConfig {
    pub exe: PathBuf,
    pub model_path: PathBuf,
    pub oneapi_bin: Option<PathBuf>,
    pub show_progress: bool,
    pub debug: bool,
}

impl WhisperCppConfig {
    /// Resolve paths from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            exe: paths::whisper_cpp_exe(&config.paths),
            model_path: config
                .model
                .path_in(&paths::whisper_cpp_models(&config.paths)),
            oneapi_bin: paths::oneapi_bin(&config.paths),
            show_progress: true,
            debug: false,
        }
    }
}

/// Transcription backend that shells out to whisper.cpp.
#[derive(Debug)]
pub struct WhisperCppBackend {
    config: WhisperCppConfig,
}

impl WhisperCppBackend {
    /// Check prerequisites and build the backend.
    ///
    /// A missing executable means the GPU stack is not installed here; a
    /// missing model file is a separate error because the fix is different
    /// (download the weights, not install a toolchain).
    pub fn new(config: WhisperCppConfig) -> Result<Self> {
        if !config.exe.is_file() {
            return Err(MeetscribeError::GpuUnavailable {
                reason: format!("whisper-cli not found at {}", config.exe.display()),
            });
        }
        if !config.model_path.is_file() {
            return Err(MeetscribeError::ModelNotFound {
                path: config.model_path.display().to_string(),
                hint: defaults::MODEL_DOWNLOAD_HINT.to_string(),
            });
        }
        Ok(Self { config })
    }

    fn run_whisper_cli(&self, wav: &Path, language: &str) -> Result<Vec<TranscriptSegment>> {
        let mut command = Command::new(&self.config.exe);
        command
            .arg("-m")
            .arg(&self.config.model_path)
            .arg("-f")
            .arg(wav)
            .arg("-l")
            .arg(language)
            // First SYCL device; the CLI picks the GPU over the CPU fallback
            .env("GGML_SYCL_DEVICE", "0")
            .stdin(Stdio::null());

        if let Some(bin) = &self.config.oneapi_bin
            && bin.exists()
        {
            command.env("PATH", prepend_to_path(bin));
        }

        // Merge stderr into stdout so model-load chatter and transcript
        // lines stream through one pipe, in order, without a drain thread.
        let (reader, writer) = std::io::pipe()?;
        let writer_clone = writer.try_clone()?;
        command.stdout(writer).stderr(writer_clone);

        let mut child = command.spawn().map_err(|e| MeetscribeError::Whisper {
            status: -1,
            stderr: format!("failed to start {}: {e}", self.config.exe.display()),
        })?;
        // The Command still holds our copies of the pipe write end; drop it
        // or reading below never sees EOF.
        drop(command);

        let mut segments = Vec::new();
        let mut raw_lines: Vec<String> = Vec::new();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            if self.config.debug {
                println!("{line}");
            }
            if let Some(segment) = parse_transcript_line(&line) {
                if self.config.show_progress && !self.config.debug {
                    println!("{line}");
                }
                segments.push(segment);
            }
            raw_lines.push(line);
        }

        let status = child.wait()?;
        if !status.success() {
            let tail_start = raw_lines.len().saturating_sub(ERROR_TAIL_LINES);
            return Err(MeetscribeError::Whisper {
                status: status.code().unwrap_or(-1),
                stderr: raw_lines[tail_start..].join("\n"),
            });
        }

        Ok(segments)
    }
}

impl TranscriptionBackend for WhisperCppBackend {
    fn transcribe(&self, audio: &Path, language: Option<&str>) -> Result<Vec<TranscriptSegment>> {
        validate_media_path(audio)?;
        let wav = ensure_wav(audio)?;
        let language = language.unwrap_or(defaults::DEFAULT_LANGUAGE);
        // The temp WAV guard lives until after the subprocess finishes,
        // and cleans up whether it succeeded or not
        self.run_whisper_cli(wav.path(), language)
    }

    fn name(&self) -> &'static str {
        "whisper.cpp"
    }
}

/// Parse one output line into a segment, if it is a transcript line.
///
/// Lines that do not carry the timestamp prefix (model loading, SYCL device
/// listings, performance summaries) and timestamped lines with empty text
/// are skipped.
fn parse_transcript_line(line: &str) -> Option<TranscriptSegment> {
    let caps = TIMESTAMP_LINE.captures(line)?;
    let start = parse_timestamp(caps.get(1)?.as_str())?;
    let end = parse_timestamp(caps.get(2)?.as_str())?;
    let text = caps.get(3)?.as_str().trim();
    if text.is_empty() {
        return None;
    }
    Some(TranscriptSegment::new(start, end, text))
}

/// `HH:MM:SS.mmm` to seconds.
fn parse_timestamp(ts: &str) -> Option<f64> {
    let mut parts = ts.splitn(3, ':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// A PATH value with `dir` prepended to the current one.
fn prepend_to_path(dir: &Path) -> OsString {
    let current = std::env::var_os("PATH").unwrap_or_default();
    let mut entries = vec![dir.to_path_buf()];
    entries.extend(std::env::split_paths(&current));
    std::env::join_paths(entries).unwrap_or(current)
}
