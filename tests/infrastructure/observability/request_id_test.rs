use axum::body::Body;
use axum::extract::Extension;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::{Router, middleware};
use tower::ServiceExt;

use medscribe::infrastructure::observability::{
    REQUEST_ID_HEADER, RequestId, request_id_middleware,
};

fn app() -> Router {
    Router::new()
        .route(
            "/",
            get(|Extension(id): Extension<RequestId>| async move { id.0 }),
        )
        .layer(middleware::from_fn(request_id_middleware))
}

#[test]
fn given_request_id_header_constant_when_accessed_then_returns_correct_value() {
    assert_eq!(REQUEST_ID_HEADER, "x-request-id");
}

#[tokio::test]
async fn given_incoming_request_id_when_handling_then_it_is_echoed_and_visible_to_handlers() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/")
                .header(REQUEST_ID_HEADER, "visit-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "visit-42");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"visit-42");
}

#[tokio::test]
async fn given_no_request_id_when_handling_then_uuid_is_generated() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn given_oversized_request_id_when_handling_then_a_fresh_uuid_replaces_it() {
    let oversized = "x".repeat(300);
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/")
                .header(REQUEST_ID_HEADER, oversized.as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .unwrap()
        .to_str()
        .unwrap();
    assert_ne!(id, oversized);
    assert!(uuid::Uuid::parse_str(id).is_ok());
}
