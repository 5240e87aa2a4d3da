use std::fmt;

/// Result of a summarization request.
///
/// Summarization never fails with an error: a failure is carried as
/// [`SummaryOutcome::Unavailable`] and rendered as an explanatory message in
/// place of the summary.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    Summary(String),
    Unavailable(SummaryFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SummaryFailure {
    MissingCredential { provider: String },
    PromptUnavailable { path: String, reason: String },
    Provider { provider: String, reason: String },
}

impl SummaryOutcome {
    pub fn is_summary(&self) -> bool {
        matches!(self, SummaryOutcome::Summary(_))
    }

    /// Text delivered to the caller: the summary, or the failure message.
    pub fn into_text(self) -> String {
        match self {
            SummaryOutcome::Summary(text) => text,
            SummaryOutcome::Unavailable(failure) => failure.to_string(),
        }
    }
}

impl fmt::Display for SummaryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryFailure::MissingCredential { provider } => write!(
                f,
                "[LLM summary unavailable] API key for provider '{}' is not configured. Set OPENAI_API_KEY.",
                provider
            ),
            SummaryFailure::PromptUnavailable { path, reason } => write!(
                f,
                "[LLM summary unavailable] could not read prompt template '{}': {}",
                path, reason
            ),
            SummaryFailure::Provider { provider, reason } => write!(
                f,
                "[LLM summary failed] provider '{}' returned an error: {}",
                provider, reason
            ),
        }
    }
}
