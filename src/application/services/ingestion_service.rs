use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::BoxStream;

use crate::application::ports::{StagingStore, StagingStoreError};
use crate::application::services::{SummaryService, TranscriptionError, TranscriptionService};
use crate::domain::{AudioFormat, ModelSize, SummaryStrategy, TranscriptionResult, UploadArtifact};

/// An audio upload as received from the client.
pub struct AudioUpload<'a> {
    pub filename: String,
    pub model_size: String,
    pub data: BoxStream<'a, Result<Bytes, io::Error>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncounterSummary {
    pub transcription: TranscriptionResult,
    pub summary: String,
}

/// Runs an upload through validation, staging, transcription and summary.
///
/// The staged file is deleted on every exit path. Errors are cleaned up
/// before they are returned, and a drop guard covers cancellation.
pub struct IngestionService {
    staging_store: Arc<dyn StagingStore>,
    transcription_service: Arc<TranscriptionService>,
    summary_service: Arc<SummaryService>,
}

impl IngestionService {
    pub fn new(
        staging_store: Arc<dyn StagingStore>,
        transcription_service: Arc<TranscriptionService>,
        summary_service: Arc<SummaryService>,
    ) -> Self {
        Self {
            staging_store,
            transcription_service,
            summary_service,
        }
    }

    #[tracing::instrument(
        skip(self, upload),
        fields(filename = %upload.filename, model_size = %upload.model_size)
    )]
    pub async fn process(
        &self,
        upload: AudioUpload<'_>,
    ) -> Result<EncounterSummary, IngestionError> {
        let format = AudioFormat::from_filename(&upload.filename)
            .ok_or_else(|| IngestionError::UnsupportedFormat(upload.filename.clone()))?;
        let size: ModelSize = upload
            .model_size
            .parse()
            .map_err(IngestionError::InvalidModelSize)?;

        let artifact = UploadArtifact::new(upload.filename, format);
        let local_path = self.staging_store.local_path(&artifact.storage_path);
        let _guard = StagedFileGuard(local_path.clone());

        let result = self
            .process_pipeline(&artifact, &local_path, size, upload.data)
            .await;

        if let Err(e) = self.staging_store.delete(&artifact.storage_path).await {
            tracing::warn!(
                error = %e,
                path = %artifact.storage_path,
                "Failed to delete staged upload"
            );
        } else {
            tracing::debug!(path = %artifact.storage_path, "Staged upload deleted");
        }

        if let Err(e) = &result {
            tracing::error!(error = %e, "Audio processing failed");
        }

        result
    }

    async fn process_pipeline(
        &self,
        artifact: &UploadArtifact,
        local_path: &Path,
        size: ModelSize,
        data: BoxStream<'_, Result<Bytes, io::Error>>,
    ) -> Result<EncounterSummary, IngestionError> {
        let bytes = self
            .staging_store
            .store(&artifact.storage_path, data)
            .await?;
        tracing::info!(path = %artifact.storage_path, bytes, "Upload staged");

        let transcription = self
            .transcription_service
            .transcribe(local_path, size)
            .await?;

        tracing::debug!("Generating summary");
        let summary = self
            .summary_service
            .summarize(&transcription.full_text, SummaryStrategy::RuleBased, None)
            .await
            .into_text();

        Ok(EncounterSummary {
            transcription,
            summary,
        })
    }
}

/// Removes the staged file if the request future is dropped mid-flight.
struct StagedFileGuard(PathBuf);

impl Drop for StagedFileGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.0) {
            Ok(()) => {
                tracing::debug!(path = %self.0.display(), "Staged upload removed by guard");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.0.display(),
                    "Failed to remove staged upload"
                );
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("unsupported file type '{0}': only .wav, .m4a, .mp3 and .webm are accepted")]
    UnsupportedFormat(String),
    #[error("{0}")]
    InvalidModelSize(String),
    #[error("staging: {0}")]
    Staging(#[from] StagingStoreError),
    #[error("transcription: {0}")]
    Transcription(#[from] TranscriptionError),
}

impl IngestionError {
    /// Whether the caller sent something we refuse to process.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IngestionError::UnsupportedFormat(_) | IngestionError::InvalidModelSize(_)
        )
    }
}
