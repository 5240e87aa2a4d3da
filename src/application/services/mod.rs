mod extractive_summarizer;
mod ingestion_service;
mod model_cache;
mod summary_service;
mod transcription_service;

pub use extractive_summarizer::summarize_extractive;
pub use ingestion_service::{AudioUpload, EncounterSummary, IngestionError, IngestionService};
pub use model_cache::{ModelCache, ModelCacheError};
pub use summary_service::{LLM_TEMPERATURE, PROMPT_PLACEHOLDER, SummaryConfig, SummaryService};
pub use transcription_service::{BEAM_SIZE, TranscriptionError, TranscriptionService};
