use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::{ChatRequest, LlmClient, LlmEndpoint};
use crate::application::services::summarize_extractive;
use crate::domain::{SummaryFailure, SummaryOutcome, SummaryStrategy};

/// Sampling temperature for clinical note generation.
pub const LLM_TEMPERATURE: f32 = 0.5;
/// Token marking where a prompt template expects the conversation. The
/// conversation travels as its own user message, so the token is removed.
pub const PROMPT_PLACEHOLDER: &str = "{text}";

const OLLAMA_PROVIDER: &str = "ollama";
const OLLAMA_API_KEY: &str = "ollama";
const OLLAMA_MODEL: &str = "llama3.1";
const OPENAI_PROVIDER: &str = "openai";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENAI_MODEL: &str = "gpt-4o-mini";

/// Provider configuration consulted on every LLM summary.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub ollama_base_url: String,
    pub prompt_path: PathBuf,
}

pub struct SummaryService {
    llm_client: Arc<dyn LlmClient>,
    config: SummaryConfig,
}

impl SummaryService {
    pub fn new(llm_client: Arc<dyn LlmClient>, config: SummaryConfig) -> Self {
        Self { llm_client, config }
    }

    pub async fn summarize(
        &self,
        text: &str,
        strategy: SummaryStrategy,
        custom_prompt: Option<&str>,
    ) -> SummaryOutcome {
        if text.is_empty() {
            return SummaryOutcome::Summary(String::new());
        }

        match strategy {
            SummaryStrategy::RuleBased => SummaryOutcome::Summary(summarize_extractive(text)),
            SummaryStrategy::Llm => self.summarize_with_llm(text, custom_prompt).await,
        }
    }

    /// Raw contents of the built-in prompt template.
    pub async fn prompt_template(&self) -> std::io::Result<String> {
        tokio::fs::read_to_string(&self.config.prompt_path).await
    }

    /// `"ollama"` selects the self-hosted endpoint; any other provider means the hosted API.
    pub fn resolve_endpoint(&self) -> Result<LlmEndpoint, SummaryFailure> {
        if self.config.provider == OLLAMA_PROVIDER {
            return Ok(LlmEndpoint {
                provider: OLLAMA_PROVIDER.to_string(),
                base_url: self.config.ollama_base_url.trim_end_matches('/').to_string(),
                api_key: OLLAMA_API_KEY.to_string(),
                model: OLLAMA_MODEL.to_string(),
            });
        }

        let api_key = self
            .config
            .openai_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SummaryFailure::MissingCredential {
                provider: OPENAI_PROVIDER.to_string(),
            })?;

        Ok(LlmEndpoint {
            provider: OPENAI_PROVIDER.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            api_key,
            model: OPENAI_MODEL.to_string(),
        })
    }

    async fn summarize_with_llm(&self, text: &str, custom_prompt: Option<&str>) -> SummaryOutcome {
        let endpoint = match self.resolve_endpoint() {
            Ok(endpoint) => endpoint,
            Err(failure) => {
                tracing::warn!(provider = %self.config.provider, "LLM credential missing");
                return SummaryOutcome::Unavailable(failure);
            }
        };

        let system_prompt = match self.system_prompt(custom_prompt).await {
            Ok(prompt) => prompt,
            Err(failure) => {
                tracing::warn!(error = %failure, "Prompt template unavailable");
                return SummaryOutcome::Unavailable(failure);
            }
        };

        let request = ChatRequest {
            system_prompt,
            user_text: text.to_string(),
            temperature: LLM_TEMPERATURE,
        };

        tracing::debug!(
            provider = %endpoint.provider,
            model = %endpoint.model,
            chars = text.len(),
            custom_prompt = custom_prompt.is_some(),
            "Requesting LLM summary"
        );

        match self.llm_client.complete(&endpoint, &request).await {
            Ok(summary) => {
                tracing::info!(
                    provider = %endpoint.provider,
                    chars = summary.len(),
                    "LLM summary generated"
                );
                SummaryOutcome::Summary(summary)
            }
            Err(e) => {
                tracing::error!(provider = %endpoint.provider, error = %e, "LLM summary failed");
                SummaryOutcome::Unavailable(SummaryFailure::Provider {
                    provider: endpoint.provider,
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn system_prompt(&self, custom_prompt: Option<&str>) -> Result<String, SummaryFailure> {
        if let Some(prompt) = custom_prompt.filter(|p| !p.trim().is_empty()) {
            return Ok(strip_placeholder(prompt));
        }

        self.prompt_template()
            .await
            .map(|template| strip_placeholder(&template))
            .map_err(|e| SummaryFailure::PromptUnavailable {
                path: self.config.prompt_path.display().to_string(),
                reason: e.to_string(),
            })
    }
}

fn strip_placeholder(prompt: &str) -> String {
    prompt.replace(PROMPT_PLACEHOLDER, "").trim().to_string()
}
