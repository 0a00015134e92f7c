//! Transcript rendering and persistence.
//!
//! One render for the console (timestamped, one line per segment) and one
//! for the saved file (grouped by speaker, blank line between speaker
//! blocks). Both are pure string builders; only [`write_transcript`]
//! touches the filesystem.

use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;

use crate::error::Result;
use crate::segment::DiarizedSegment;

/// Width of the `===` banner framing the console transcript.
const BANNER_WIDTH: usize = 60;

/// File name used when sanitizing leaves nothing of the source stem.
const FALLBACK_FILE_STEM: &str = "transcript";

/// Format seconds as `HH:MM:SS`, truncating fractional seconds.
pub fn format_time(seconds: f64) -> String {
    let total = seconds as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// One console line: `[HH:MM:SS -> HH:MM:SS] <speaker>: <text>`.
pub fn format_segment_line(segment: &DiarizedSegment) -> String {
    format!(
        "[{} -> {}] {}: {}",
        format_time(segment.start),
        format_time(segment.end),
        segment.speaker,
        segment.text
    )
}

/// Print the full transcript between banners.
///
/// Timestamps are dimmed and speaker names colored when stdout is a
/// terminal; piped output stays plain so it matches the saved file.
pub fn print_transcript(segments: &[DiarizedSegment]) {
    let color = std::io::stdout().is_terminal();
    println!("{}", "=".repeat(BANNER_WIDTH));
    println!("TRANSCRIPT");
    println!("{}\n", "=".repeat(BANNER_WIDTH));
    for segment in segments {
        if color {
            let timestamp = format!(
                "[{} -> {}]",
                format_time(segment.start),
                format_time(segment.end)
            );
            println!(
                "{} {}: {}",
                timestamp.dimmed(),
                segment.speaker.green(),
                segment.text
            );
        } else {
            println!("{}", format_segment_line(segment));
        }
    }
}

/// Build the file form of the transcript: `speaker: text` lines, grouped
/// with one blank line wherever the speaker changes.
pub fn transcript_body(segments: &[DiarizedSegment]) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(segments.len());
    let mut prev_speaker: Option<&str> = None;
    for segment in segments {
        if let Some(prev) = prev_speaker
            && prev != segment.speaker
        {
            lines.push(String::new());
        }
        lines.push(format!("{}: {}", segment.speaker, segment.text));
        prev_speaker = Some(&segment.speaker);
    }
    lines.join("\n")
}

/// Make a file stem safe on common filesystems.
///
/// Characters that are illegal on Windows or act as separators elsewhere
/// become `_`; leading and trailing dots and spaces are stripped. An empty
/// result falls back to a generic name.
pub fn sanitize_file_name(stem: &str) -> String {
    let replaced: String = stem
        .chars()
        .map(|c| {
            if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
            {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = replaced.trim_matches(|c| c == '.' || c == ' ');
    if trimmed.is_empty() {
        FALLBACK_FILE_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Write the transcript next to other captures and return the path.
///
/// The file is named after the source recording's stem, sanitized, with a
/// `.txt` extension. The output directory is created if needed.
pub fn write_transcript(
    segments: &[DiarizedSegment],
    source: &Path,
    output_dir: &Path,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let path = output_dir.join(format!("{}.txt", sanitize_file_name(&stem)));
    fs::write(&path, transcript_body(segments))?;
    Ok(path)
}

/// Print the closing banner naming the saved transcript file.
pub fn print_saved_footer(path: &Path) {
    println!("\n{}", "=".repeat(BANNER_WIDTH));
    println!("Transcript saved to: {}", path.display());
    println!("{}", "=".repeat(BANNER_WIDTH));
}
