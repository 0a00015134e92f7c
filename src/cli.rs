//! Command-line interface for meetscribe
//!
//! Provides argument parsing using clap derive macros. Running without a
//! subcommand transcribes the given file; subcommands cover the catalog,
//! configuration, and environment checks.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::models::WhisperModel;

/// Meeting transcription with speaker identification
#[derive(Parser, Debug)]
#[command(
    name = "meetscribe",
    version,
    about = "Transcribe meeting recordings with speaker identification"
)]
pub struct Cli {
    /// Subcommand to execute (default: transcribe AUDIO_FILE)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Audio or video file to transcribe
    #[arg(value_name = "AUDIO_FILE")]
    pub audio_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Whisper model (tiny, base, small, medium, large-v3, turbo)
    #[arg(short, long, value_name = "MODEL", value_parser = parse_model)]
    pub model: Option<WhisperModel>,

    /// Language code for transcription (e.g. en, de, es). Default: en on the
    /// GPU backend, auto-detect on CPU
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Skip speaker diarization
    #[arg(long)]
    pub no_diarize: bool,

    /// Skip transcript cleanup
    #[arg(long)]
    pub no_cleanup: bool,

    /// Skip the GPU backend and transcribe in-process on the CPU
    #[arg(long)]
    pub cpu: bool,

    /// Do not print transcript lines while transcribing
    #[arg(long)]
    pub no_progress: bool,

    /// Echo every line the external tools produce
    #[arg(long, global = true)]
    pub debug: bool,

    /// Directory for the transcript file (default: the Videos/Captures dir)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Parse a model name against the closed catalog.
fn parse_model(s: &str) -> Result<WhisperModel, String> {
    s.parse::<WhisperModel>().map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the Whisper models this tool can run
    Models,

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Check external dependencies (ffmpeg, whisper.cpp, model files)
    Check,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration inspection actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration as JSON
    Show,
    /// Print a default configuration template
    Dump,
    /// Print the configuration file search path
    Path,
}
