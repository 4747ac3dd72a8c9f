//! The uniform response envelope.
//!
//! Every handler outcome leaves the service as `{success, result|bboxes,
//! error}` with a fixed status mapping: 200 for success, 500 for any
//! ingestion or engine failure. The envelope is a two-variant type encoded
//! in exactly one place so handlers cannot drift on the shape.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use crate::engine::BoundingBox;
use crate::error::ApiError;

// =============================================================================
// Payload
// =============================================================================

/// A successful recognition payload, keyed by the capability that produced it.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Serialized under the `result` key (OCR and slide operations)
    Result(Value),

    /// Serialized under the `bboxes` key (detection)
    Bboxes(Vec<BoundingBox>),
}

// =============================================================================
// Envelope
// =============================================================================

/// The two-variant response envelope.
///
/// `Success` carries a payload and no `error` key; `Failure` carries a
/// non-empty message and no payload key. There are no partial states.
#[derive(Debug)]
pub enum Envelope {
    Success(Payload),
    Failure(String),
}

impl From<Result<Payload, ApiError>> for Envelope {
    fn from(outcome: Result<Payload, ApiError>) -> Self {
        match outcome {
            Ok(payload) => Envelope::Success(payload),
            Err(err) => Envelope::Failure(err.to_string()),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        match self {
            Envelope::Success(Payload::Result(value)) => (
                StatusCode::OK,
                Json(json!({ "success": true, "result": value })),
            )
                .into_response(),

            Envelope::Success(Payload::Bboxes(bboxes)) => (
                StatusCode::OK,
                Json(json!({ "success": true, "bboxes": bboxes })),
            )
                .into_response(),

            Envelope::Failure(message) => {
                error!("request failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": message })),
                )
                    .into_response()
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
