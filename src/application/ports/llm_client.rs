use async_trait::async_trait;

/// Where and as whom a chat completion is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmEndpoint {
    pub provider: String,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_text: String,
    pub temperature: f32,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        endpoint: &LlmEndpoint,
        request: &ChatRequest,
    ) -> Result<String, LlmClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmClientError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("request timed out")]
    Timeout,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
