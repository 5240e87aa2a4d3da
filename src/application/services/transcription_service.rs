use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::application::ports::{DecodeOptions, SpeechModel, SpeechModelError};
use crate::application::services::{ModelCache, ModelCacheError};
use crate::domain::{ModelSize, TranscriptSegment, TranscriptionResult};

/// Beam width used for every decode.
pub const BEAM_SIZE: usize = 5;

pub struct TranscriptionService {
    model_cache: Arc<ModelCache>,
}

impl TranscriptionService {
    pub fn new(model_cache: Arc<ModelCache>) -> Self {
        Self { model_cache }
    }

    /// Transcribes a staged audio file.
    ///
    /// The reported elapsed time covers model acquisition and the full decode,
    /// so a cold model load shows up in it.
    pub async fn transcribe(
        &self,
        audio_path: &Path,
        size: ModelSize,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        let started = Instant::now();

        let model = self.model_cache.acquire(size).await?;

        let path = audio_path.to_path_buf();
        let (language, segments) =
            tokio::task::spawn_blocking(move || drain(model.as_ref(), &path))
                .await
                .map_err(|e| TranscriptionError::TaskFailed(e.to_string()))??;

        let result = TranscriptionResult::from_segments(
            segments,
            language,
            started.elapsed().as_secs_f64(),
        );

        tracing::info!(
            model_size = %size,
            language = %result.detected_language,
            segments = result.segments.len(),
            chars = result.full_text.len(),
            elapsed_secs = result.elapsed_seconds,
            "Audio transcription completed"
        );

        Ok(result)
    }
}

fn drain(
    model: &dyn SpeechModel,
    audio_path: &Path,
) -> Result<(String, Vec<TranscriptSegment>), SpeechModelError> {
    let decoding = model.decode(
        audio_path,
        DecodeOptions {
            beam_size: BEAM_SIZE,
        },
    )?;
    let segments = decoding.segments.collect::<Result<Vec<_>, _>>()?;
    Ok((decoding.language, segments))
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error(transparent)]
    Model(#[from] ModelCacheError),
    #[error(transparent)]
    Decoding(#[from] SpeechModelError),
    #[error("transcription task failed: {0}")]
    TaskFailed(String),
}
