//! Transcript cleanup passes.
//!
//! Whisper output on meeting audio carries predictable noise: training-data
//! hallucinations ("Thanks for watching!"), standalone fillers, stretches of
//! the wrong language on silence, and near-identical repeats when the decoder
//! loops. Each pass here removes one class of noise; all of them only ever
//! drop whole segments, so order and content of what survives are untouched.
//!
//! Passes run in a fixed order: non-English, hallucinations, fillers,
//! consecutive near-duplicates, minimum length. The first four can be toggled
//! off; the length pass always runs.

pub mod similarity;

use std::sync::LazyLock;

use regex::{Regex, RegexSet};

use crate::config::CleanupConfig;
use crate::segment::DiarizedSegment;
use similarity::similarity_ratio;

/// Segments matching any of these anywhere in the (lowercased) text are
/// YouTube-style hallucinations that whisper emits on silence or music.
static HALLUCINATION_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        "thanks for watching",
        "thank you for watching",
        "subscribe.*channel",
        "please like.*comment",
        "don't forget to subscribe",
        "see you in the next",
        r"\[music\]",
        r"\[applause\]",
        r"\(music\)",
        r"\(applause\)",
    ])
    .expect("hallucination patterns are valid")
});

/// A segment whose whole trimmed text matches one of these is a standalone
/// filler. Anchored on both ends: fillers inside a sentence never match.
static FILLER_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)^(uh+|um+|hmm+|huh|mhm|ah+)\.?$",
        r"(?i)^(yeah|yep|yes|okay|ok|right|sure)\.?$",
        r"^[.,!?;:\-]+$",
        r"^\s*$",
    ])
    .expect("filler patterns are valid")
});

/// CJK codepoint ranges: Chinese, hiragana, katakana, hangul.
static NON_ENGLISH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\u{4e00}-\u{9fff}\u{3040}-\u{309f}\u{30a0}-\u{30ff}\u{ac00}-\u{d7af}]")
        .expect("CJK range pattern is valid")
});

/// Applies the cleanup passes configured in a [`CleanupConfig`].
#[derive(Debug, Clone)]
pub struct TranscriptCleaner {
    config: CleanupConfig,
}

impl TranscriptCleaner {
    pub fn new(config: CleanupConfig) -> Self {
        Self { config }
    }

    /// Run every enabled pass over the segments, in fixed order.
    pub fn clean(&self, segments: Vec<DiarizedSegment>) -> Vec<DiarizedSegment> {
        let mut segments = segments;
        if self.config.remove_non_english {
            segments.retain(|seg| !has_non_english(&seg.text));
        }
        if self.config.remove_hallucinations {
            segments.retain(|seg| !is_hallucination(&seg.text));
        }
        if self.config.remove_fillers {
            segments.retain(|seg| !is_filler(&seg.text));
        }
        if self.config.remove_duplicates {
            segments = self.drop_consecutive_duplicates(segments);
        }
        segments.retain(|seg| seg.text.trim().chars().count() >= self.config.min_segment_length);
        segments
    }

    /// Apply the single-string rules: returns the text unchanged, or empty
    /// when any enabled pass (or the length floor) would drop it.
    pub fn clean_text(&self, text: &str) -> String {
        if self.config.remove_non_english && has_non_english(text) {
            return String::new();
        }
        if self.config.remove_hallucinations && is_hallucination(text) {
            return String::new();
        }
        if self.config.remove_fillers && is_filler(text) {
            return String::new();
        }
        if text.trim().chars().count() < self.config.min_segment_length {
            return String::new();
        }
        text.to_string()
    }

    /// Drop segments nearly identical to the last one kept.
    ///
    /// The comparison anchor only advances on keep, so a run of
    /// mutually-similar segments collapses onto its first member.
    fn drop_consecutive_duplicates(&self, segments: Vec<DiarizedSegment>) -> Vec<DiarizedSegment> {
        let mut result = Vec::with_capacity(segments.len());
        let mut prev_text: Option<String> = None;
        for seg in segments {
            let normalized = seg.text.trim().to_lowercase();
            if let Some(prev) = &prev_text
                && similarity_ratio(&normalized, prev) >= self.config.similarity_threshold
            {
                continue;
            }
            prev_text = Some(normalized);
            result.push(seg);
        }
        result
    }
}

fn is_hallucination(text: &str) -> bool {
    HALLUCINATION_PATTERNS.is_match(&text.to_lowercase())
}

fn is_filler(text: &str) -> bool {
    FILLER_PATTERNS.is_match(text.trim())
}

fn has_non_english(text: &str) -> bool {
    NON_ENGLISH.is_match(text)
}
