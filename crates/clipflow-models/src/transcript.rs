//! Transcript records produced by the transcription stage.

use serde::{Deserialize, Serialize};

/// One word and its timing in the source audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// One transcript segment, as returned by the transcription service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentTimestamp {
    pub start: f64,
    pub text: String,
}

/// Full transcript for a video, persisted by the transcript repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub words: Vec<WordTimestamp>,
    pub segments: Vec<SegmentTimestamp>,
}

impl Transcript {
    /// Segment pairs `(start, text)` as consumed by the generation prompt
    /// builder.
    pub fn segment_pairs(&self) -> Vec<(f64, &str)> {
        self.segments
            .iter()
            .map(|s| (s.start, s.text.as_str()))
            .collect()
    }
}
