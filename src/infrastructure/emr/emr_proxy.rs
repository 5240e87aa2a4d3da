use std::time::Duration;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use bytes::Bytes;
use thiserror::Error;

const DROPPED_REQUEST_HEADERS: [HeaderName; 3] =
    [header::HOST, header::CONTENT_LENGTH, header::ACCEPT_ENCODING];

const DROPPED_RESPONSE_HEADERS: [HeaderName; 3] = [
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONTENT_ENCODING,
];

#[derive(Debug, Error)]
pub enum EmrProxyError {
    #[error("EMR_API_URL configuration missing")]
    NotConfigured,

    #[error("Failed to connect to EMR service: {0}")]
    Connection(String),

    #[error("Failed to build EMR client: {0}")]
    ClientBuild(String),
}

impl EmrProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Connection(_) => StatusCode::BAD_GATEWAY,
            Self::NotConfigured | Self::ClientBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// An inbound request under `/emr`, already split from the axum extractor types.
#[derive(Debug)]
pub struct ProxyRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Externally visible root of the proxy, e.g. `http://host:8000/emr`.
    pub proxy_root: String,
}

#[derive(Debug)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Forwards `/emr/*` traffic to the configured EMR backend.
pub struct EmrProxy {
    client: reqwest::Client,
    base_url: String,
}

impl EmrProxy {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, EmrProxyError> {
        let base_url = api_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(EmrProxyError::NotConfigured);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| EmrProxyError::ClientBuild(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let path = path.trim_start_matches('/');
        match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("{}/{}?{}", self.base_url, path, q),
            None => format!("{}/{}", self.base_url, path),
        }
    }

    #[tracing::instrument(
        skip(self, request),
        fields(method = %request.method, path = %request.path)
    )]
    pub async fn forward(&self, request: ProxyRequest) -> Result<ProxyResponse, EmrProxyError> {
        let target_url = self.target_url(&request.path, request.query.as_deref());

        let mut headers = request.headers;
        for name in DROPPED_REQUEST_HEADERS {
            headers.remove(name);
        }

        let response = self
            .client
            .request(request.method, &target_url)
            .headers(headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target_url = %target_url, error = %e, "EMR proxy error");
                EmrProxyError::Connection(e.to_string())
            })?;

        let status = response.status();
        let mut headers = response.headers().clone();
        for name in DROPPED_RESPONSE_HEADERS {
            headers.remove(name);
        }

        let rewritten = headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|location| rewrite_location(location, &self.base_url, &request.proxy_root));
        if let Some(location) = rewritten {
            if let Ok(value) = HeaderValue::from_str(&location) {
                headers.insert(header::LOCATION, value);
            }
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::error!(target_url = %target_url, error = %e, "EMR response body unreadable");
            EmrProxyError::Connection(e.to_string())
        })?;

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "EMR response relayed");

        Ok(ProxyResponse {
            status,
            headers,
            body,
        })
    }
}

/// Points a backend redirect back at the proxy. `None` when the location is elsewhere.
pub fn rewrite_location(location: &str, backend_base: &str, proxy_root: &str) -> Option<String> {
    let remainder = location.strip_prefix(backend_base)?;
    Some(format!("{}{}", proxy_root.trim_end_matches('/'), remainder))
}
