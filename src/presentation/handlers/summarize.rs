use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::domain::{SummaryOutcome, SummaryStrategy};
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::handlers::error_response;
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub text: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

/// Soft LLM failures come back as a 200 carrying the diagnostic text.
#[tracing::instrument(skip(state, request))]
pub async fn summarize_handler(
    State(state): State<AppState>,
    request: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Response {
    let request = match request {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected summary request body");
            return error_response(rejection.status(), rejection.body_text());
        }
    };

    let strategy = request
        .method
        .as_deref()
        .map(SummaryStrategy::from_method)
        .unwrap_or_default();

    tracing::info!(
        strategy = %strategy,
        text = %sanitize_prompt(&request.text),
        custom_prompt = request.custom_prompt.is_some(),
        "Summary requested"
    );

    let outcome = state
        .summary_service
        .summarize(&request.text, strategy, request.custom_prompt.as_deref())
        .await;

    if let SummaryOutcome::Unavailable(failure) = &outcome {
        tracing::warn!(reason = %failure, "Summary unavailable");
    }

    Json(SummarizeResponse {
        summary: outcome.into_text(),
    })
    .into_response()
}
