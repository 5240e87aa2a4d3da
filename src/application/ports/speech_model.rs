use std::path::Path;
use std::sync::Arc;

use crate::domain::{ComputeBackend, ModelSize, Precision, TranscriptSegment};

/// Lazily produced, single-pass sequence of decoded segments in chronological order.
pub type SegmentStream =
    Box<dyn Iterator<Item = Result<TranscriptSegment, SpeechModelError>> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub beam_size: usize,
}

pub struct Decoding {
    /// Best-guess language for the whole recording.
    pub language: String,
    pub segments: SegmentStream,
}

/// Initializes speech-recognition models. Implementations may block for seconds.
pub trait SpeechModelLoader: Send + Sync {
    fn load(
        &self,
        size: ModelSize,
        backend: ComputeBackend,
        precision: Precision,
    ) -> Result<Arc<dyn SpeechModel>, SpeechModelError>;
}

/// A loaded model. Decoding is blocking work.
pub trait SpeechModel: Send + Sync {
    fn decode(
        &self,
        audio_path: &Path,
        options: DecodeOptions,
    ) -> Result<Decoding, SpeechModelError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SpeechModelError {
    #[error("model loading failed: {0}")]
    ModelLoadFailed(String),
    #[error("audio decoding failed: {0}")]
    AudioDecodingFailed(String),
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
}
