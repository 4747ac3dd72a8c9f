//! Audit middleware integration tests.
//!
//! The middleware buffers POST request bodies for logging and, on error
//! responses, drains the body and rebuilds the response from the captured
//! bytes. These tests pin the externally observable half of that contract:
//! the client must see exactly the response the handler produced, whether or
//! not the middleware buffered it along the way.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use captcha_gateway::error::{ApiError, EngineError};
use captcha_gateway::server::{Envelope, Payload, RouterConfig};

use super::test_utils::{
    create_test_png, mock_router, post_json, post_multipart, read_json, router_with, MockEngine,
};

// =============================================================================
// Error Response Replay
// =============================================================================

#[tokio::test]
async fn test_error_body_replayed_byte_identical() {
    // The response that leaves the audit middleware must be byte-identical
    // to the envelope the handler rendered before the middleware drained it.
    let router = router_with(MockEngine::failing("mock engine failure"), RouterConfig::new());
    let png = create_test_png(32, 16, 1);

    let response = router
        .oneshot(post_multipart("/ocr", &[("file", &png)]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let received = response.into_body().collect().await.unwrap().to_bytes();

    // Render the same envelope the handler produced, without any middleware
    let outcome: Result<Payload, ApiError> =
        Err(ApiError::Engine(EngineError::new("mock engine failure")));
    let direct = Envelope::from(outcome).into_response();
    let expected = direct.into_body().collect().await.unwrap().to_bytes();

    assert_eq!(received, expected);
}

#[tokio::test]
async fn test_error_response_headers_preserved() {
    let router = router_with(MockEngine::failing("fault"), RouterConfig::new());
    let png = create_test_png(32, 16, 2);

    let response = router
        .oneshot(post_multipart("/ocr", &[("file", &png)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The headers the handler set must survive the drain-and-replay
    let outcome: Result<Payload, ApiError> = Err(ApiError::Engine(EngineError::new("fault")));
    let direct = Envelope::from(outcome).into_response();
    assert_eq!(
        response.headers().get("content-type"),
        direct.headers().get("content-type")
    );

    let replayed = response.into_body().collect().await.unwrap().to_bytes();
    let expected = direct.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(replayed.len(), expected.len());
}

#[tokio::test]
async fn test_decode_error_body_replayed_intact() {
    // Ingestion failures take the same replay path as engine failures.
    let (router, _) = mock_router();

    let response = router
        .oneshot(post_json("/ocr/base64", json!({ "image": "%%%" })))
        .await
        .unwrap();

    let (status, body) = read_json(response).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert!(!body["error"].as_str().unwrap().is_empty());
}

// =============================================================================
// Success Passthrough
// =============================================================================

#[tokio::test]
async fn test_success_response_passes_through() {
    let (router, _) = mock_router();
    let png = create_test_png(32, 16, 3);

    let response = router
        .oneshot(post_multipart("/ocr", &[("file", &png)]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let (_, body) = read_json(response).await;
    assert_eq!(body["success"], json!(true));
}

#[tokio::test]
async fn test_get_request_is_not_buffered() {
    // GETs skip request-body capture entirely; the greeting still works.
    let (router, _) = mock_router();

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();

    let (status, body) = read_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
}

// =============================================================================
// Request Body Capture
// =============================================================================

#[tokio::test]
async fn test_binary_request_body_does_not_abort() {
    // Multipart bodies carrying PNG bytes are not valid UTF-8; the audit
    // middleware logs the decode failure and the request proceeds.
    let (router, engine) = mock_router();
    let png = create_test_png(32, 16, 4);
    assert!(std::str::from_utf8(&png).is_err());

    let response = router
        .oneshot(post_multipart("/ocr", &[("file", &png)]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(engine.call_count(), 1);
}

#[tokio::test]
async fn test_textual_request_body_is_forwarded_unchanged() {
    // The JSON path buffers a valid UTF-8 body; the rebuilt request must
    // still deserialize downstream.
    let (router, _) = mock_router();
    let png = create_test_png(32, 16, 5);
    let encoded = STANDARD.encode(&png);

    let response = router
        .oneshot(post_json("/ocr/base64", json!({ "image": encoded })))
        .await
        .unwrap();

    let (status, body) = read_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], json!(MockEngine::expected_text(&png)));
}
