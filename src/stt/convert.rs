//! Audio conversion for transcription input.
//!
//! whisper.cpp and the in-process decoder both want mono 16 kHz 16-bit PCM.
//! `.wav` inputs are passed through untouched; everything else is transcoded
//! with ffmpeg into a temp file that is removed again when the handle goes
//! out of scope, whichever way the transcription attempt ends.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::defaults::SAMPLE_RATE;
use crate::error::{MeetscribeError, Result};

/// A WAV file ready for decoding: either the original input or a transcoded
/// temporary that cleans up after itself.
#[derive(Debug)]
pub enum WavSource {
    Original(PathBuf),
    Converted(TempWav),
}

impl WavSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Original(path) => path,
            Self::Converted(temp) => temp.path(),
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted(_))
    }
}

/// Owns a transcoded WAV in the system temp directory and deletes it on drop.
#[derive(Debug)]
pub struct TempWav {
    path: PathBuf,
}

impl TempWav {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempWav {
    fn drop(&mut self) {
        fs::remove_file(&self.path).ok();
    }
}

/// Produce a WAV for the given media file, transcoding if necessary.
pub fn ensure_wav(source: &Path) -> Result<WavSource> {
    let already_wav = source
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
    if already_wav {
        return Ok(WavSource::Original(source.to_path_buf()));
    }

    Ok(WavSource::Converted(force_wav(source)?))
}

/// Transcode unconditionally, even when the source already is a `.wav`.
///
/// The in-process decoder needs exactly 16 kHz mono PCM; a passthrough
/// `.wav` at some other rate takes a second trip through ffmpeg.
pub(crate) fn force_wav(source: &Path) -> Result<TempWav> {
    // Guard is created first so a failed or partial transcode is removed too
    let guard = TempWav {
        path: temp_wav_path(source),
    };
    transcode_to_wav(source, guard.path())?;
    Ok(guard)
}

/// Where the transcoded copy of `source` goes: `<tmp>/<stem>_whisper.wav`.
fn temp_wav_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    std::env::temp_dir().join(format!("{stem}_whisper.wav"))
}

fn transcode_to_wav(source: &Path, target: &Path) -> Result<()> {
    let output = Command::new("ffmpeg")
        .arg("-y") // overwrite a leftover conversion of the same file
        .arg("-i")
        .arg(source)
        .arg("-ar")
        .arg(SAMPLE_RATE.to_string()) // 16 kHz
        .arg("-ac")
        .arg("1") // mono
        .arg("-c:a")
        .arg("pcm_s16le") // 16-bit PCM
        .arg(target)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| MeetscribeError::AudioConversion {
            source_path: source.display().to_string(),
            message: if e.kind() == std::io::ErrorKind::NotFound {
                "ffmpeg not found on PATH".to_string()
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
            .unwrap_or_else(|| format!("ffmpeg exited with status {}", output.status));
        return Err(MeetscribeError::AudioConversion {
            source_path: source.display().to_string(),
            message: detail,
        });
    }

    Ok(())
}
