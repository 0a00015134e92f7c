//! Resolution of external tool and output locations.
//!
//! Every artifact follows the same order: explicit config value, then an
//! environment variable, then the platform default. Nothing here checks that
//! the resolved path exists; callers decide whether a missing artifact is
//! fatal (the whisper.cpp executable) or merely skippable (the oneAPI
//! runtime).

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PathsConfig;

/// The whisper.cpp CLI executable.
///
/// `paths.whisper_cpp_exe` → `WHISPER_CPP_EXE` → a source build under the
/// home directory.
pub fn whisper_cpp_exe(paths: &PathsConfig) -> PathBuf {
    if let Some(exe) = &paths.whisper_cpp_exe {
        return exe.clone();
    }
    if let Ok(exe) = std::env::var("WHISPER_CPP_EXE")
        && !exe.is_empty()
    {
        return PathBuf::from(exe);
    }
    let file = if cfg!(windows) { "whisper-cli.exe" } else { "whisper-cli" };
    home_dir()
        .join("whisper.cpp")
        .join("build")
        .join("bin")
        .join(file)
}

/// The directory holding ggml model files.
///
/// `paths.whisper_cpp_models` → `WHISPER_CPP_MODELS` → the models directory
/// of a source build under the home directory.
pub fn whisper_cpp_models(paths: &PathsConfig) -> PathBuf {
    if let Some(dir) = &paths.whisper_cpp_models {
        return dir.clone();
    }
    if let Ok(dir) = std::env::var("WHISPER_CPP_MODELS")
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    home_dir().join("whisper.cpp").join("models")
}

/// The Intel oneAPI runtime `bin` directory, when one can be found.
///
/// `paths.oneapi_bin` → `ONEAPI_BIN` → the newest versioned install under
/// the platform oneAPI root. Returns `None` when no install is discovered;
/// the SYCL build of whisper.cpp then runs with whatever is already on PATH.
pub fn oneapi_bin(paths: &PathsConfig) -> Option<PathBuf> {
    if let Some(bin) = &paths.oneapi_bin {
        return Some(bin.clone());
    }
    if let Ok(bin) = std::env::var("ONEAPI_BIN")
        && !bin.is_empty()
    {
        return Some(PathBuf::from(bin));
    }
    newest_versioned_subdir(&oneapi_root()).map(|dir| dir.join("bin"))
}

/// Where transcripts are written.
///
/// `paths.output_dir` → `MEETSCRIBE_OUTPUT_DIR` → `<videos>/Captures` →
/// the current directory.
pub fn output_dir(paths: &PathsConfig) -> PathBuf {
    if let Some(dir) = &paths.output_dir {
        return dir.clone();
    }
    if let Ok(dir) = std::env::var("MEETSCRIBE_OUTPUT_DIR")
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    if let Some(videos) = dirs::video_dir() {
        return videos.join("Captures");
    }
    PathBuf::from(".")
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn oneapi_root() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\Program Files (x86)\Intel\oneAPI")
    } else {
        PathBuf::from("/opt/intel/oneapi")
    }
}

/// The subdirectory of `root` with the highest version-looking name.
///
/// oneAPI installs side by side as `2024.2`, `2025.1`, `2025.3`, ...;
/// comparison is numeric per component, so `2025.10` beats `2025.9`.
fn newest_versioned_subdir(root: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(root).ok()?;
    let mut best: Option<(Vec<u32>, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(version) = parse_version(name) else {
            continue;
        };
        if best.as_ref().is_none_or(|(v, _)| version > *v) {
            best = Some((version, path));
        }
    }
    best.map(|(_, path)| path)
}

/// Parse a dotted numeric name like "2025.3" into its components.
fn parse_version(name: &str) -> Option<Vec<u32>> {
    let parts: Option<Vec<u32>> = name.split('.').map(|p| p.parse().ok()).collect();
    parts.filter(|p| !p.is_empty())
}
