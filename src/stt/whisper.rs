//! In-process CPU transcription with whisper-rs.
//!
//! The fallback backend for machines without the external whisper.cpp GPU
//! stack. The model is loaded lazily on the first call and memoized for the
//! lifetime of the backend. A small RMS voice-activity gate finds the
//! speech regions first and only those reach the decoder, which is where
//! the time goes on CPU.
//!
//! # Feature Gate
//!
//! Real decoding requires the `whisper` feature (and cmake to build the
//! bundled whisper.cpp). Without it this module compiles as a stub that
//! fails with instructions when used.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::defaults;
use crate::error::{MeetscribeError, Result};
use crate::paths;
use crate::segment::TranscriptSegment;
use crate::stt::backend::{TranscriptionBackend, validate_media_path};

#[cfg(feature = "whisper")]
use crate::stt::convert::{ensure_wav, force_wav};
#[cfg(feature = "whisper")]
use std::sync::{Mutex, Once};
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// RMS window for the voice-activity gate.
const VAD_WINDOW_MS: u32 = 100;

/// Configuration for the in-process backend.
#[derive(Debug, Clone)]
pub struct WhisperRsConfig {
    /// Path to the ggml model file
    pub model_path: PathBuf,
    /// Number of decoder threads (None = whisper.cpp default)
    pub threads: Option<usize>,
}

impl WhisperRsConfig {
    /// Resolve the model file from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            model_path: config
                .model
                .path_in(&paths::whisper_cpp_models(&config.paths)),
            threads: None,
        }
    }
}

/// Transcription backend decoding through whisper-rs on the CPU.
///
/// The WhisperContext is created on first use behind a Mutex; construction
/// only checks that the model file is there, so probing this backend stays
/// cheap when the GPU path ends up handling the job.
#[cfg(feature = "whisper")]
pub struct WhisperRsBackend {
    config: WhisperRsConfig,
    model_name: String,
    context: Mutex<Option<WhisperContext>>,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperRsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperRsBackend")
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

/// In-process backend placeholder (without the whisper feature).
///
/// Construction still validates the model path; any transcription attempt
/// returns an error explaining how to enable the real decoder.
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperRsBackend {
    config: WhisperRsConfig,
    model_name: String,
}

/// Check the model file and derive the display name from its file stem.
fn validated_model_name(model_path: &Path) -> Result<String> {
    if !model_path.is_file() {
        return Err(MeetscribeError::ModelNotFound {
            path: model_path.display().to_string(),
            hint: defaults::MODEL_DOWNLOAD_HINT.to_string(),
        });
    }
    Ok(model_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string())
}

#[cfg(feature = "whisper")]
impl WhisperRsBackend {
    /// Create the backend, verifying the model file exists.
    pub fn new(config: WhisperRsConfig) -> Result<Self> {
        let model_name = validated_model_name(&config.model_path)?;
        Ok(Self {
            config,
            model_name,
            context: Mutex::new(None),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperRsConfig {
        &self.config
    }

    /// Model display name, e.g. `ggml-large-v3-turbo`.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn load_context(&self) -> Result<WhisperContext> {
        // Route whisper.cpp logging through hooks so model loading does not
        // spray the console (only once per process)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        println!("Loading {} model...", self.model_name);
        let model_path =
            self.config
                .model_path
                .to_str()
                .ok_or_else(|| MeetscribeError::ModelLoad {
                    message: "Invalid UTF-8 in model path".to_string(),
                })?;
        WhisperContext::new_with_params(model_path, WhisperContextParameters::default()).map_err(
            |e| MeetscribeError::ModelLoad {
                message: format!("{e} ({model_path})"),
            },
        )
    }

    /// Run the decoder over one speech region and append its segments.
    ///
    /// `offset` is the region start in seconds; whisper reports timestamps
    /// relative to the buffer it was given, so they are shifted back onto
    /// the recording's timeline here.
    fn decode_region(
        &self,
        context: &WhisperContext,
        samples: &[f32],
        offset: f64,
        language: Option<&str>,
        report_language: bool,
        segments: &mut Vec<TranscriptSegment>,
    ) -> Result<()> {
        let mut state = context
            .create_state()
            .map_err(|e| MeetscribeError::Transcription {
                message: format!("Failed to create decoder state: {e}"),
            })?;

        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: defaults::BEAM_SIZE as i32,
            patience: -1.0,
        });
        // None lets whisper.cpp auto-detect the language
        params.set_language(language);
        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, samples)
            .map_err(|e| MeetscribeError::Transcription {
                message: format!("Whisper inference failed: {e}"),
            })?;

        if report_language {
            // no_speech_probability is 0.0..1.0; confidence = 1 - no_speech_prob
            let mut confidence_sum = 0.0_f32;
            let mut count = 0_u32;
            for segment in state.as_iter() {
                confidence_sum += 1.0 - segment.no_speech_probability();
                count += 1;
            }
            let probability = if count > 0 {
                (confidence_sum / count as f32).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let lang_id = state.full_lang_id_from_state();
            let detected = whisper_rs::get_lang_str(lang_id).unwrap_or("unknown");
            println!("Detected language: {detected} (probability: {probability:.2})\n");
        }

        for segment in state.as_iter() {
            let text = segment.to_string();
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            segments.push(TranscriptSegment::new(
                offset + segment.start_timestamp() as f64 / 100.0,
                offset + segment.end_timestamp() as f64 / 100.0,
                text,
            ));
        }
        Ok(())
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperRsBackend {
    /// Create the backend stub, verifying the model file exists.
    pub fn new(config: WhisperRsConfig) -> Result<Self> {
        let model_name = validated_model_name(&config.model_path)?;
        Ok(Self { config, model_name })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperRsConfig {
        &self.config
    }

    /// Model display name, e.g. `ggml-large-v3-turbo`.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(feature = "whisper")]
impl TranscriptionBackend for WhisperRsBackend {
    fn transcribe(&self, audio: &Path, language: Option<&str>) -> Result<Vec<TranscriptSegment>> {
        validate_media_path(audio)?;

        println!("Transcribing: {}", display_name(audio));
        println!("This may take a while for long recordings...\n");

        let wav = ensure_wav(audio)?;
        let samples = load_pcm_16k(wav.path())?;
        let regions = speech_regions(&samples, defaults::SAMPLE_RATE);
        if regions.is_empty() {
            return Ok(Vec::new());
        }

        let mut guard = self.context.lock().map_err(|e| MeetscribeError::ModelLoad {
            message: format!("Model lock poisoned: {e}"),
        })?;
        if guard.is_none() {
            *guard = Some(self.load_context()?);
        }
        let context = guard.as_ref().expect("context was loaded above");

        let mut segments = Vec::new();
        for (i, region) in regions.iter().enumerate() {
            let offset = region.start as f64 / f64::from(defaults::SAMPLE_RATE);
            self.decode_region(
                context,
                &samples[region.start..region.end],
                offset,
                language,
                i == 0,
                &mut segments,
            )?;
        }
        Ok(segments)
    }

    fn name(&self) -> &'static str {
        "whisper-rs"
    }
}

#[cfg(not(feature = "whisper"))]
impl TranscriptionBackend for WhisperRsBackend {
    fn transcribe(&self, audio: &Path, _language: Option<&str>) -> Result<Vec<TranscriptSegment>> {
        validate_media_path(audio)?;
        Err(MeetscribeError::Transcription {
            message: concat!(
                "Whisper feature not enabled. This binary was built without the in-process decoder.\n",
                "To fix: cargo build --release (whisper is enabled by default)\n",
                "If the build fails with cmake errors, install: sudo apt install cmake"
            )
            .to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "whisper-rs"
    }
}

/// File name for progress messages, falling back to the full path.
#[cfg(feature = "whisper")]
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load a WAV as 16 kHz mono f32, re-transcoding through ffmpeg when the
/// container is not already in that format.
#[cfg(feature = "whisper")]
fn load_pcm_16k(path: &Path) -> Result<Vec<f32>> {
    match read_wav_mono(path) {
        Ok((samples, rate)) if rate == defaults::SAMPLE_RATE => Ok(samples),
        // Wrong rate, odd bit depth, unreadable header: let ffmpeg produce
        // the exact format instead of resampling here
        _ => {
            let converted = force_wav(path)?;
            let (samples, _) = read_wav_mono(converted.path())?;
            Ok(samples)
        }
    }
}

/// Read a WAV file into normalized mono f32 samples plus its sample rate.
///
/// 16-bit PCM is scaled by 1/32768; float WAVs are taken as-is.
/// Multi-channel audio is averaged down to mono.
///
/// This function is available even without the whisper feature.
pub fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path).map_err(|e| MeetscribeError::Transcription {
        message: format!("Cannot read WAV {}: {e}", path.display()),
    })?;
    let spec = reader.spec();
    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .map(|s| s.map(|v| f32::from(v) / 32768.0))
            .collect::<std::result::Result<_, _>>(),
        hound::SampleFormat::Float => reader.samples::<f32>().collect(),
    }
    .map_err(|e| MeetscribeError::Transcription {
        message: format!("Cannot decode WAV {}: {e}", path.display()),
    })?;
    Ok((downmix(interleaved, spec.channels), spec.sample_rate))
}

/// Average interleaved channels into mono. Mono input passes through.
pub fn downmix(interleaved: Vec<f32>, channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return interleaved;
    }
    let channels = channels as usize;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// A run of speech in the sample buffer, in sample indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechRegion {
    pub start: usize,
    pub end: usize,
}

/// Find the regions with audible speech.
///
/// Windows whose RMS clears [`defaults::VAD_THRESHOLD`] count as speech.
/// Pauses shorter than [`defaults::VAD_MIN_SILENCE_MS`] stay inside a
/// region; longer ones split the buffer so the decoder never sees them.
/// Each region is padded by [`defaults::VAD_SPEECH_PAD_MS`] on both sides
/// to keep word onsets intact.
pub fn speech_regions(samples: &[f32], sample_rate: u32) -> Vec<SpeechRegion> {
    let per_ms = sample_rate as usize / 1000;
    let window = per_ms * VAD_WINDOW_MS as usize;
    if window == 0 || samples.is_empty() {
        return Vec::new();
    }
    let min_gap = per_ms * defaults::VAD_MIN_SILENCE_MS as usize;
    let pad = per_ms * defaults::VAD_SPEECH_PAD_MS as usize;

    let mut regions: Vec<SpeechRegion> = Vec::new();
    let mut start = 0;
    while start < samples.len() {
        let end = (start + window).min(samples.len());
        if rms(&samples[start..end]) >= defaults::VAD_THRESHOLD {
            match regions.last_mut() {
                Some(last) if start - last.end < min_gap => last.end = end,
                _ => regions.push(SpeechRegion { start, end }),
            }
        }
        start = end;
    }

    let mut padded: Vec<SpeechRegion> = Vec::with_capacity(regions.len());
    for region in regions {
        let start = region.start.saturating_sub(pad);
        let end = (region.end + pad).min(samples.len());
        match padded.last_mut() {
            // Padding can make neighbors touch; merge them back together
            Some(last) if start <= last.end => last.end = end,
            _ => padded.push(SpeechRegion { start, end }),
        }
    }
    padded
}

/// Root mean square of a sample window.
fn rms(window: &[f32]) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = window.iter().map(|s| s * s).sum();
    (sum_squares / window.len() as f32).sqrt()
}
