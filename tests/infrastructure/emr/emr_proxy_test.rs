use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::json;

use medscribe::infrastructure::emr::{EmrProxy, EmrProxyError, ProxyRequest, rewrite_location};

use crate::support::spawn_server;

fn proxy_request(method: Method, path: &str, query: Option<&str>, body: &str) -> ProxyRequest {
    let mut headers = HeaderMap::new();
    headers.insert(header::HOST, "clinic.example:8000".parse().unwrap());
    headers.insert("x-clinic-user", "dr-kim".parse().unwrap());
    headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
    ProxyRequest {
        method,
        path: path.to_string(),
        query: query.map(str::to_string),
        headers,
        body: Bytes::from(body.to_string()),
        proxy_root: "http://clinic.example:8000/emr".to_string(),
    }
}

async fn echo(
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    Json(json!({
        "method": method.as_str(),
        "path": path,
        "query": query,
        "user": headers.get("x-clinic-user").and_then(|v| v.to_str().ok()),
        "host": headers.get(header::HOST).and_then(|v| v.to_str().ok()),
        "body": String::from_utf8_lossy(&body),
    }))
}

#[tokio::test]
async fn given_backend_when_forwarding_then_method_path_query_headers_and_body_arrive() {
    let router = Router::new().route("/{*path}", any(echo));
    let (base_url, _shutdown) = spawn_server(router).await;
    let proxy = EmrProxy::new(&format!("{base_url}/"), Duration::from_secs(5)).unwrap();

    let response = proxy
        .forward(proxy_request(
            Method::POST,
            "patients/7/visits",
            Some("skip=0&limit=10"),
            r#"{"note":"follow-up"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.headers.get(header::CONTENT_LENGTH).is_none());
    let echoed: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["path"], "patients/7/visits");
    assert_eq!(echoed["query"], "skip=0&limit=10");
    assert_eq!(echoed["user"], "dr-kim");
    assert_ne!(echoed["host"], "clinic.example:8000");
    assert_eq!(echoed["body"], r#"{"note":"follow-up"}"#);
}

#[tokio::test]
async fn given_backend_error_status_when_forwarding_then_status_is_relayed() {
    let router = Router::new().route(
        "/patients/{id}",
        get(|| async { (StatusCode::NOT_FOUND, Json(json!({ "detail": "Patient not found" }))) }),
    );
    let (base_url, _shutdown) = spawn_server(router).await;
    let proxy = EmrProxy::new(&base_url, Duration::from_secs(5)).unwrap();

    let response = proxy
        .forward(proxy_request(Method::GET, "patients/99", None, ""))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn given_backend_redirect_when_forwarding_then_location_points_at_proxy() {
    let (base_url, _shutdown) = {
        let router = Router::new().route(
            "/visits",
            any(|headers: HeaderMap| async move {
                let host = headers
                    .get(header::HOST)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                (
                    StatusCode::TEMPORARY_REDIRECT,
                    [(header::LOCATION, format!("http://{host}/visits/"))],
                )
            }),
        );
        spawn_server(router).await
    };
    let proxy = EmrProxy::new(&base_url, Duration::from_secs(5)).unwrap();

    let response = proxy
        .forward(proxy_request(Method::GET, "visits", None, ""))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers.get(header::LOCATION).unwrap(),
        "http://clinic.example:8000/emr/visits/"
    );
}

#[tokio::test]
async fn given_unreachable_backend_when_forwarding_then_bad_gateway_error() {
    let proxy = EmrProxy::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

    let err = proxy
        .forward(proxy_request(Method::GET, "doctors/", None, ""))
        .await
        .unwrap_err();

    assert!(matches!(err, EmrProxyError::Connection(_)));
    assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    assert!(err.to_string().starts_with("Failed to connect to EMR service"));
}

#[test]
fn given_blank_url_when_creating_proxy_then_not_configured() {
    let err = EmrProxy::new("  ", Duration::from_secs(1)).err().unwrap();

    assert!(matches!(err, EmrProxyError::NotConfigured));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn given_trailing_slash_when_creating_proxy_then_target_urls_have_single_separator() {
    let proxy = EmrProxy::new("http://emr.internal:9000/api/", Duration::from_secs(1)).unwrap();

    assert_eq!(proxy.base_url(), "http://emr.internal:9000/api");
    assert_eq!(
        proxy.target_url("patients/", Some("skip=5")),
        "http://emr.internal:9000/api/patients/?skip=5"
    );
    assert_eq!(
        proxy.target_url("doctors/3", Some("")),
        "http://emr.internal:9000/api/doctors/3"
    );
}

#[test]
fn given_location_on_backend_when_rewriting_then_prefix_is_replaced_once() {
    let rewritten = rewrite_location(
        "http://emr:9000/patients/1?next=http://emr:9000/x",
        "http://emr:9000",
        "https://clinic.example/emr/",
    );

    assert_eq!(
        rewritten.as_deref(),
        Some("https://clinic.example/emr/patients/1?next=http://emr:9000/x")
    );
}

#[test]
fn given_foreign_location_when_rewriting_then_none() {
    assert_eq!(
        rewrite_location("https://sso.example/login", "http://emr:9000", "http://proxy/emr"),
        None
    );
}
