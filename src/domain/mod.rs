mod audio_format;
mod compute_backend;
mod model_size;
mod storage_path;
mod summary_outcome;
mod summary_strategy;
mod transcript;
mod upload_artifact;

pub use audio_format::AudioFormat;
pub use compute_backend::{ComputeBackend, Precision};
pub use model_size::ModelSize;
pub use storage_path::StoragePath;
pub use summary_outcome::{SummaryFailure, SummaryOutcome};
pub use summary_strategy::SummaryStrategy;
pub use transcript::{TranscriptSegment, TranscriptionResult};
pub use upload_artifact::UploadArtifact;
