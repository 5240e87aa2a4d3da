/// Timestamped fragment of transcribed speech. Offsets are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionResult {
    pub full_text: String,
    pub detected_language: String,
    pub segments: Vec<TranscriptSegment>,
    pub elapsed_seconds: f64,
}

impl TranscriptionResult {
    /// Joins segment texts with single spaces and trims the ends.
    pub fn from_segments(
        segments: Vec<TranscriptSegment>,
        detected_language: String,
        elapsed_seconds: f64,
    ) -> Self {
        let full_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string();

        Self {
            full_text,
            detected_language,
            segments,
            elapsed_seconds,
        }
    }
}
