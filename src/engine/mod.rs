//! Recognition engine abstraction.
//!
//! The actual recognition algorithms live in an external, opaque engine.
//! This module pins down the call contract the gateway holds that engine to
//! ([`RecognitionEngine`]) and the set of three long-lived capability
//! handles created once at startup ([`EngineSet`]).
//!
//! # Handles
//!
//! The engine is instantiated three times, each handle configured for one
//! capability mode:
//!
//! - general classification (text OCR)
//! - detection (bounding boxes)
//! - slide (slider match and comparison)
//!
//! Handles are expensive to construct, so they are built before the server
//! accepts traffic and shared read-only by every in-flight request for the
//! process lifetime. They are never rebuilt per request.

mod remote;

pub use remote::{EngineMode, RemoteEngine};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;

// =============================================================================
// Call Types
// =============================================================================

/// Optional flags for a classification call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Ask the engine for structured confidence alongside the text
    pub probability: bool,

    /// Select the engine's alternative (beta) classification model
    pub beta: bool,
}

/// An axis-aligned box as `(x1, y1, x2, y2)` pixel coordinates.
///
/// Serializes as a 4-element JSON array, the shape detection clients expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox(pub u32, pub u32, pub u32, pub u32);

// =============================================================================
// Engine Contract
// =============================================================================

/// Call contract for the external recognition engine.
///
/// Implementations are thin adapters over the collaborator; the gateway
/// never inspects image content itself, and any failure inside a call
/// (undecodable image, no match found, internal fault) collapses into a
/// single [`EngineError`] carrying the underlying message.
///
/// Calls run on the shared runtime. An implementation wrapping a
/// synchronous, potentially blocking engine must offload its calls to a
/// worker pool (e.g. `tokio::task::spawn_blocking`) so a slow inference
/// cannot starve other in-flight requests.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Recognize the text in a captcha image.
    ///
    /// Returns a plain string, or a structure carrying text and confidence
    /// when [`ClassifyOptions::probability`] is set. The shape is owned by
    /// the engine; the gateway only serializes it.
    async fn classify(&self, image: Bytes, opts: ClassifyOptions) -> Result<Value, EngineError>;

    /// Locate glyphs in an image, in reading order.
    async fn detect(&self, image: Bytes) -> Result<Vec<BoundingBox>, EngineError>;

    /// Match a slider piece against its background puzzle.
    async fn slide_match(
        &self,
        target: Bytes,
        background: Bytes,
        simple_target: bool,
    ) -> Result<Value, EngineError>;

    /// Compare a shadowed full image with the original to find the gap.
    async fn slide_comparison(
        &self,
        target: Bytes,
        background: Bytes,
    ) -> Result<Value, EngineError>;
}

// =============================================================================
// Engine Handle Set
// =============================================================================

/// The three long-lived engine handles, one per capability mode.
///
/// Each facade call is forwarded verbatim to the handle owning that
/// capability. The set holds no other state: no caching, no retries.
pub struct EngineSet<E> {
    /// Handle configured for general classification
    classifier: E,

    /// Handle configured for detection
    detector: E,

    /// Handle configured for slide operations
    slide: E,
}

impl<E: RecognitionEngine> EngineSet<E> {
    /// Bundle three capability handles into a set.
    pub fn new(classifier: E, detector: E, slide: E) -> Self {
        Self {
            classifier,
            detector,
            slide,
        }
    }

    /// Recognize text via the classification handle.
    pub async fn classify(
        &self,
        image: Bytes,
        opts: ClassifyOptions,
    ) -> Result<Value, EngineError> {
        self.classifier.classify(image, opts).await
    }

    /// Locate glyphs via the detection handle.
    pub async fn detect(&self, image: Bytes) -> Result<Vec<BoundingBox>, EngineError> {
        self.detector.detect(image).await
    }

    /// Match a slider piece via the slide handle.
    pub async fn slide_match(
        &self,
        target: Bytes,
        background: Bytes,
        simple_target: bool,
    ) -> Result<Value, EngineError> {
        self.slide
            .slide_match(target, background, simple_target)
            .await
    }

    /// Compare slider images via the slide handle.
    pub async fn slide_comparison(
        &self,
        target: Bytes,
        background: Bytes,
    ) -> Result<Value, EngineError> {
        self.slide.slide_comparison(target, background).await
    }
}

// =============================================================================
// Tests
// =============================================================================
