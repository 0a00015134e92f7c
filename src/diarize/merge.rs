//! Merging speaker turns into the transcript.
//!
//! Transcript and speaker segments come from different engines and never
//! line up exactly. Each transcript segment is attributed by the speaker
//! active at its midpoint, which is robust against the sub-second jitter
//! at segment boundaries.

use crate::defaults;
use crate::segment::{DiarizedSegment, SpeakerSegment, TranscriptSegment};

/// Who is talking at `timestamp`, or `Unknown` when nobody is.
///
/// The first containing turn wins; boundaries are inclusive on both ends.
pub fn speaker_at_time(segments: &[SpeakerSegment], timestamp: f64) -> &str {
    segments
        .iter()
        .find(|seg| seg.start <= timestamp && timestamp <= seg.end)
        .map(|seg| seg.speaker.as_str())
        .unwrap_or(defaults::UNKNOWN_SPEAKER)
}

/// Attribute each transcript segment to the speaker at its midpoint.
pub fn assign_speakers_to_transcript(
    transcript: &[TranscriptSegment],
    speakers: &[SpeakerSegment],
) -> Vec<DiarizedSegment> {
    transcript
        .iter()
        .map(|seg| {
            let speaker = speaker_at_time(speakers, seg.midpoint());
            DiarizedSegment::with_speaker(seg.start, seg.end, seg.text.clone(), speaker)
        })
        .collect()
}

/// Give every transcript segment the generic speaker label.
///
/// Used when diarization is skipped or fails, so the rest of the pipeline
/// and the output formatting see the same shape either way.
pub fn segments_without_speakers(transcript: &[TranscriptSegment]) -> Vec<DiarizedSegment> {
    transcript
        .iter()
        .map(|seg| {
            DiarizedSegment::with_speaker(
                seg.start,
                seg.end,
                seg.text.clone(),
                defaults::GENERIC_SPEAKER,
            )
        })
        .collect()
}
