mod emr_proxy;
mod error_response;
mod health;
mod prompt;
mod summarize;
mod upload_audio;

pub use emr_proxy::emr_proxy_handler;
pub use error_response::{ErrorResponse, error_response};
pub use health::health_handler;
pub use prompt::prompt_handler;
pub use summarize::{SummarizeRequest, SummarizeResponse, summarize_handler};
pub use upload_audio::{SegmentResponse, UploadAudioResponse, upload_audio_handler};
