//! Test utilities for integration tests.
//!
//! Provides a mock recognition engine, router builders and helpers for
//! constructing multipart requests and decoding envelope responses.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use image::{GrayImage, Luma};
use serde_json::{json, Value};

use captcha_gateway::engine::{BoundingBox, ClassifyOptions, EngineSet, RecognitionEngine};
use captcha_gateway::error::EngineError;
use captcha_gateway::server::{create_router, RouterConfig};

// =============================================================================
// Mock Engine
// =============================================================================

/// Engine double with deterministic, content-derived results.
///
/// Results are a pure function of the input bytes, which lets tests assert
/// that concurrent requests are not cross-wired. A shared call counter
/// tracks how often any capability was invoked.
pub struct MockEngine {
    calls: Arc<AtomicUsize>,
    fail_with: Option<String>,
}

impl MockEngine {
    /// A mock engine that always succeeds.
    pub fn ok() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail_with: None,
        }
    }

    /// A mock engine whose every call fails with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail_with: Some(message.into()),
        }
    }

    /// How many engine calls have been made across all capability handles.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The classification text this mock produces for the given image bytes.
    pub fn expected_text(image: &[u8]) -> String {
        format!(
            "text-{:02x}-{}",
            image.first().copied().unwrap_or(0),
            image.len()
        )
    }

    fn tick(&self) -> Result<(), EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(message) => Err(EngineError::new(message.clone())),
            None => Ok(()),
        }
    }
}

impl Clone for MockEngine {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
            fail_with: self.fail_with.clone(),
        }
    }
}

#[async_trait]
impl RecognitionEngine for MockEngine {
    async fn classify(&self, image: Bytes, opts: ClassifyOptions) -> Result<Value, EngineError> {
        self.tick()?;

        // Yield so concurrent classify calls genuinely interleave
        tokio::task::yield_now().await;

        let text = Self::expected_text(&image);
        if opts.probability {
            Ok(json!({ "text": text, "probability": [0.97, 0.85] }))
        } else if opts.beta {
            Ok(json!(format!("{text}-beta")))
        } else {
            Ok(json!(text))
        }
    }

    async fn detect(&self, image: Bytes) -> Result<Vec<BoundingBox>, EngineError> {
        self.tick()?;

        let w = (image.len() as u32 % 100) + 10;
        Ok(vec![BoundingBox(0, 0, w, w), BoundingBox(w, 0, 2 * w, w)])
    }

    async fn slide_match(
        &self,
        target: Bytes,
        background: Bytes,
        simple_target: bool,
    ) -> Result<Value, EngineError> {
        self.tick()?;

        Ok(json!({
            "target": [target.len(), 0, background.len(), 40],
            "simple_target": simple_target,
        }))
    }

    async fn slide_comparison(
        &self,
        target: Bytes,
        background: Bytes,
    ) -> Result<Value, EngineError> {
        self.tick()?;

        Ok(json!({
            "target": [target.len() % 50, background.len() % 50],
        }))
    }
}

// =============================================================================
// Router Builders
// =============================================================================

/// Build a router over a successful mock engine, returning the engine handle
/// for call-count assertions.
pub fn mock_router() -> (Router, MockEngine) {
    let engine = MockEngine::ok();
    let router = router_with(engine.clone(), RouterConfig::new());
    (router, engine)
}

/// Build a router over the given engine and configuration.
pub fn router_with(engine: MockEngine, config: RouterConfig) -> Router {
    let engines = EngineSet::new(engine.clone(), engine.clone(), engine);
    create_router(engines, config)
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Boundary used by all test multipart bodies.
pub const BOUNDARY: &str = "gateway-test-boundary";

/// Content-Type header value for test multipart bodies.
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Assemble a multipart/form-data body from named binary parts.
pub fn multipart_body(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{name}.png\"\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Build a multipart POST request.
pub fn post_multipart(uri: &str, parts: &[(&str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", multipart_content_type())
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

/// Build a JSON POST request.
pub fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

/// Drain a response into its status and parsed JSON body.
pub async fn read_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "response body is not JSON ({e}): {:?}",
            String::from_utf8_lossy(&bytes)
        )
    });
    (status, value)
}

// =============================================================================
// Test Images
// =============================================================================

/// Create a small PNG with a gradient pattern.
///
/// The seed shifts the pixel values so two images with different seeds have
/// different bytes.
pub fn create_test_png(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, y| {
        Luma([((x + y) as u8).wrapping_add(seed)])
    });

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}
