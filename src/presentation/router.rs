use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{any, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    emr_proxy_handler, health_handler, prompt_handler, summarize_handler, upload_audio_handler,
};
use crate::presentation::state::AppState;

const STATIC_DIR: &str = "static";

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let body_limit = DefaultBodyLimit::max(state.settings.max_body_bytes());

    Router::new()
        .route("/health", get(health_handler))
        .route("/upload-audio", post(upload_audio_handler))
        .route("/summarize", post(summarize_handler))
        .route("/prompt", get(prompt_handler))
        .route("/emr/{*path}", any(emr_proxy_handler))
        .route_service("/", ServeFile::new(format!("{STATIC_DIR}/index.html")))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(body_limit)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
