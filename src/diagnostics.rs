//! System diagnostics and dependency checking.
//!
//! Backs the `check` subcommand: verifies the external tools the pipeline
//! shells out to, the configured model weights, and the diarization token.

use std::process::Command;

use crate::config::Config;
use crate::defaults;
use crate::paths;

/// Result of a dependency check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Tool is installed and working
    Ok,
    /// Tool is not found
    NotFound,
    /// Tool is found but has issues
    Warning(String),
}

/// Check that a command exists and answers its version probe.
fn check_command(command: &str, probe_arg: &str) -> CheckResult {
    match Command::new(command).arg(probe_arg).output() {
        Ok(output) if output.status.success() => CheckResult::Ok,
        Ok(_) => CheckResult::Warning(format!("'{command}' found but '{probe_arg}' failed")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(format!("Error checking '{command}': {e}")),
    }
}

/// Run all dependency checks and print results.
pub fn check_dependencies(config: &Config) {
    println!("Checking dependencies...\n");

    // ffmpeg converts anything that is not already 16 kHz mono WAV
    print!("ffmpeg (audio conversion): ");
    match check_command("ffmpeg", "-version") {
        CheckResult::Ok => println!("✓ OK"),
        CheckResult::NotFound => {
            println!("✗ NOT FOUND");
            println!("  Install: sudo apt install ffmpeg  (Debian/Ubuntu)");
            println!("           sudo pacman -S ffmpeg    (Arch)");
        }
        CheckResult::Warning(msg) => println!("⚠ WARNING: {msg}"),
    }

    // whisper.cpp CLI, the GPU backend
    let exe = paths::whisper_cpp_exe(&config.paths);
    print!("whisper-cli (GPU backend): ");
    let gpu_available = exe.is_file();
    if gpu_available {
        println!("✓ OK ({})", exe.display());
    } else {
        println!("- not found");
        println!("  Looked at: {}", exe.display());
        println!("  Transcription will fall back to the in-process CPU decoder.");
    }

    // Model weights, shared by both backends
    let model_path = config.model.path_in(&paths::whisper_cpp_models(&config.paths));
    let model_available = model_path.is_file();
    print!("{} model: ", config.model);
    if model_available {
        println!("✓ OK ({})", model_path.display());
    } else {
        println!("✗ NOT FOUND");
        println!("  Expected: {}", model_path.display());
        println!("  Download from: {}", defaults::MODEL_DOWNLOAD_HINT);
    }

    // Diarization token
    print!("HuggingFace token: ");
    if config.huggingface_token().is_some() {
        println!("✓ OK");
    } else {
        println!("- not set");
        println!("  Speaker diarization will be skipped.");
        println!("  Get a token at: {}", defaults::HF_TOKEN_HELP_URL);
    }

    println!();
    if model_available && gpu_available {
        println!("✓ Ready to transcribe on the GPU.");
    } else if model_available {
        println!("✓ Ready to transcribe on the CPU.");
    } else {
        println!("⚠ No model weights found; transcription cannot run.");
    }
}
