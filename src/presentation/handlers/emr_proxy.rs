use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::infrastructure::emr::{EmrProxyError, ProxyRequest};
use crate::presentation::handlers::error_response;
use crate::presentation::state::AppState;

const FORWARDED_PROTO: &str = "x-forwarded-proto";
const EMR_PREFIX: &str = "/emr/";

pub async fn emr_proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(proxy) = state.emr_proxy.as_ref() else {
        tracing::error!("EMR_API_URL not configured");
        let e = EmrProxyError::NotConfigured;
        return error_response(e.status_code(), e.to_string());
    };

    let request = ProxyRequest {
        proxy_root: proxy_root(&headers),
        method,
        path: backend_path(&uri),
        query: uri.query().map(str::to_owned),
        headers,
        body,
    };

    match proxy.forward(request).await {
        Ok(response) => (response.status, response.headers, response.body).into_response(),
        Err(e) => error_response(e.status_code(), e.to_string()),
    }
}

/// Path below `/emr/`, still percent-encoded as the caller sent it.
fn backend_path(uri: &Uri) -> String {
    let path = uri.path();
    path.strip_prefix(EMR_PREFIX)
        .unwrap_or_else(|| path.trim_start_matches('/'))
        .to_owned()
}

/// `{scheme}://{host}/emr` as seen by the caller.
fn proxy_root(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    format!("{}://{}/emr", scheme, host)
}
