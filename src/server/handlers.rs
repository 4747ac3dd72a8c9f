//! HTTP request handlers for the recognition API.
//!
//! # Endpoints
//!
//! - `GET /` - greeting
//! - `POST /ocr` - OCR on an uploaded file
//! - `POST /ocr/base64` - OCR on a base64 JSON payload
//! - `POST /detect` - bounding-box detection
//! - `POST /slide` - slider match
//! - `POST /slide_comparison` - slider comparison
//!
//! Every POST handler funnels its outcome through [`Envelope`]: success is a
//! 200 with the payload, any ingestion or engine failure is a 500 with the
//! message. Handlers never surface a raw fault to the transport.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::engine::{ClassifyOptions, EngineSet, RecognitionEngine};
use crate::error::ApiError;
use crate::ingest;

use super::envelope::{Envelope, Payload};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state: the three engine handles.
///
/// Passed to all handlers via Axum's State extractor. The handle set is
/// created once at startup and shared read-only across requests.
pub struct AppState<E: RecognitionEngine> {
    /// The engine handle set
    pub engines: Arc<EngineSet<E>>,
}

impl<E: RecognitionEngine> AppState<E> {
    /// Create a new application state around an engine handle set.
    pub fn new(engines: EngineSet<E>) -> Self {
        Self {
            engines: Arc::new(engines),
        }
    }
}

impl<E: RecognitionEngine> Clone for AppState<E> {
    fn clone(&self) -> Self {
        Self {
            engines: Arc::clone(&self.engines),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query flags accepted by the OCR upload endpoint.
#[derive(Debug, Deserialize)]
pub struct OcrQueryParams {
    /// Use the engine's alternative (beta) model
    #[serde(default)]
    pub beta: bool,

    /// Return structured confidence alongside the text
    #[serde(default)]
    pub probability: bool,
}

/// JSON body for the base64 OCR endpoint.
#[derive(Debug, Deserialize)]
pub struct Base64ImageRequest {
    /// Base64-encoded image (standard alphabet)
    pub image: String,

    /// Use the engine's alternative (beta) model
    #[serde(default)]
    pub beta: bool,

    /// Return structured confidence alongside the text
    #[serde(default)]
    pub probability: bool,
}

/// Query flags accepted by the slider-match endpoint.
#[derive(Debug, Deserialize)]
pub struct SlideQueryParams {
    /// Treat the target as a plain cut-out rather than a styled piece
    #[serde(default)]
    pub simple_target: bool,
}

// =============================================================================
// Response Types
// =============================================================================

/// Greeting returned from the root endpoint.
#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    /// Human-readable service banner
    pub message: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle greeting requests.
///
/// # Endpoint
///
/// `GET /`
pub async fn root_handler() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: format!(
            "captcha-gateway v{} is ready",
            env!("CARGO_PKG_VERSION")
        ),
    })
}

/// Handle OCR on an uploaded file.
///
/// # Endpoint
///
/// `POST /ocr` with a multipart `file` part.
///
/// # Query Parameters
///
/// - `beta`: use the alternative model (default: false)
/// - `probability`: return structured confidence (default: false)
pub async fn ocr_handler<E: RecognitionEngine>(
    State(state): State<AppState<E>>,
    Query(query): Query<OcrQueryParams>,
    multipart: Multipart,
) -> Envelope {
    let outcome: Result<Payload, ApiError> = async {
        let image = ingest::file_from_multipart(multipart, "file").await?;
        let opts = ClassifyOptions {
            probability: query.probability,
            beta: query.beta,
        };
        let result = state.engines.classify(image, opts).await?;
        Ok(Payload::Result(result))
    }
    .await;

    Envelope::from(outcome)
}

/// Handle OCR on a base64 JSON payload.
///
/// # Endpoint
///
/// `POST /ocr/base64` with body `{"image": "<base64>", "beta": false,
/// "probability": false}`.
pub async fn ocr_base64_handler<E: RecognitionEngine>(
    State(state): State<AppState<E>>,
    Json(request): Json<Base64ImageRequest>,
) -> Envelope {
    let outcome: Result<Payload, ApiError> = async {
        let image = ingest::decode_image_base64(&request.image)?;
        let opts = ClassifyOptions {
            probability: request.probability,
            beta: request.beta,
        };
        let result = state.engines.classify(image, opts).await?;
        Ok(Payload::Result(result))
    }
    .await;

    Envelope::from(outcome)
}

/// Handle glyph detection on an uploaded file.
///
/// # Endpoint
///
/// `POST /detect` with a multipart `file` part. The success payload is keyed
/// `bboxes`, an ordered list of `[x1, y1, x2, y2]` boxes.
pub async fn detect_handler<E: RecognitionEngine>(
    State(state): State<AppState<E>>,
    multipart: Multipart,
) -> Envelope {
    let outcome: Result<Payload, ApiError> = async {
        let image = ingest::file_from_multipart(multipart, "file").await?;
        let bboxes = state.engines.detect(image).await?;
        Ok(Payload::Bboxes(bboxes))
    }
    .await;

    Envelope::from(outcome)
}

/// Handle slider matching.
///
/// # Endpoint
///
/// `POST /slide` with multipart `target` and `background` parts.
///
/// # Query Parameters
///
/// - `simple_target`: the target is a plain cut-out (default: false)
pub async fn slide_handler<E: RecognitionEngine>(
    State(state): State<AppState<E>>,
    Query(query): Query<SlideQueryParams>,
    multipart: Multipart,
) -> Envelope {
    let outcome: Result<Payload, ApiError> = async {
        let upload = ingest::slide_from_multipart(multipart).await?;
        let result = state
            .engines
            .slide_match(upload.target, upload.background, query.simple_target)
            .await?;
        Ok(Payload::Result(result))
    }
    .await;

    Envelope::from(outcome)
}

/// Handle slider comparison.
///
/// # Endpoint
///
/// `POST /slide_comparison` with multipart `target` (the shadowed full
/// image) and `background` (the original full image) parts.
pub async fn slide_comparison_handler<E: RecognitionEngine>(
    State(state): State<AppState<E>>,
    multipart: Multipart,
) -> Envelope {
    let outcome: Result<Payload, ApiError> = async {
        let upload = ingest::slide_from_multipart(multipart).await?;
        let result = state
            .engines
            .slide_comparison(upload.target, upload.background)
            .await?;
        Ok(Payload::Result(result))
    }
    .await;

    Envelope::from(outcome)
}

// =============================================================================
// Tests
// =============================================================================
