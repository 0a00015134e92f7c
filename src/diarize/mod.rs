//! Speaker identification.
//!
//! [`Diarizer`] finds who speaks when; [`merge`] attaches those labels to
//! transcript segments by midpoint containment.

pub mod diarizer;
pub mod merge;

pub use diarizer::{Diarizer, MockSpeakerModel, PyannoteRunner, RawTurn, SpeakerModel};
pub use merge::{assign_speakers_to_transcript, segments_without_speakers, speaker_at_time};
