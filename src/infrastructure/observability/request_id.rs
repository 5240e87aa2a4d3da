use std::time::Instant;

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Caller ids longer than this are replaced with a generated one.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation id attached to request extensions for handlers that want it.
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

fn inbound_request_id(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    if raw.is_empty() || raw.len() > MAX_REQUEST_ID_LEN {
        return None;
    }
    Some(raw.to_owned())
}

/// Tags every request with an id (caller supplied or generated), scopes its logs
/// to a span carrying that id, and echoes the id back on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = inbound_request_id(request.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());
    let header_value = HeaderValue::from_str(&id).ok();

    let span = tracing::info_span!(
        "request",
        request_id = %id,
        method = %request.method(),
        path = %request.uri().path()
    );
    request.extensions_mut().insert(RequestId(id));

    let started = Instant::now();
    let mut response = async move {
        let response = next.run(request).await;
        tracing::debug!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request finished"
        );
        response
    }
    .instrument(span)
    .await;

    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
