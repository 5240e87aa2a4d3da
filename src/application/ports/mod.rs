mod llm_client;
mod speech_model;
mod staging_store;

pub use llm_client::{ChatRequest, LlmClient, LlmClientError, LlmEndpoint};
pub use speech_model::{
    DecodeOptions, Decoding, SegmentStream, SpeechModel, SpeechModelError, SpeechModelLoader,
};
pub use staging_store::{StagingStore, StagingStoreError};
