use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::presentation::handlers::error_response;
use crate::presentation::state::AppState;

pub async fn prompt_handler(State(state): State<AppState>) -> Response {
    match state.summary_service.prompt_template().await {
        Ok(template) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            template,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Prompt template unreadable");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read prompt template: {}", e),
            )
        }
    }
}
