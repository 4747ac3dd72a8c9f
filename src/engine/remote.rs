//! HTTP adapter for the recognition engine.
//!
//! The engine runs as its own service; each [`RemoteEngine`] is one
//! persistent, mode-scoped handle to it. Single-image calls ship the raw
//! bytes as the request body, slide calls ship both images as multipart
//! parts. Any transport or engine-side failure is flattened into an
//! [`EngineError`] with the collaborator's message.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::error::EngineError;

use super::{BoundingBox, ClassifyOptions, EngineSet, RecognitionEngine};

/// Capability mode a remote handle is created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// General text classification
    Classification,

    /// Bounding-box detection
    Detection,

    /// Slider match and comparison
    Slide,
}

impl EngineMode {
    /// Path segment the mode's operations live under.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineMode::Classification => "classification",
            EngineMode::Detection => "detection",
            EngineMode::Slide => "slide",
        }
    }
}

/// One persistent handle to a remote recognition engine.
pub struct RemoteEngine {
    client: reqwest::Client,
    base_url: String,
    mode: EngineMode,
}

impl RemoteEngine {
    /// Create a handle against `base_url` in the given capability mode.
    pub fn new(client: reqwest::Client, base_url: &str, mode: EngineMode) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            mode,
        }
    }

    /// Build the standard set of three handles against one engine endpoint.
    ///
    /// The handles share a connection pool but are otherwise independent;
    /// they are meant to be constructed once and kept for the process
    /// lifetime.
    pub fn connect(base_url: &str, timeout: Duration) -> Result<EngineSet<RemoteEngine>, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::new(format!("failed to build engine client: {e}")))?;

        Ok(EngineSet::new(
            RemoteEngine::new(client.clone(), base_url, EngineMode::Classification),
            RemoteEngine::new(client.clone(), base_url, EngineMode::Detection),
            RemoteEngine::new(client, base_url, EngineMode::Slide),
        ))
    }

    /// Check that the engine answers at all.
    ///
    /// Used at startup before the server starts accepting traffic.
    pub async fn ping(base_url: &str, timeout: Duration) -> Result<(), EngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::new(format!("failed to build engine client: {e}")))?;

        let url = format!("{}/health", base_url.trim_end_matches('/'));
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| EngineError::new(format!("engine unreachable: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(EngineError::new(format!(
                "engine health check returned {}",
                response.status()
            )))
        }
    }

    /// Full URL for one of this handle's operations.
    fn endpoint(&self, operation: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.mode.as_str(), operation)
    }

    /// Turn an engine response into its JSON payload or an error message.
    async fn parse(response: reqwest::Response) -> Result<Value, EngineError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::new(format!("engine returned {status}: {body}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| EngineError::new(format!("invalid engine response: {e}")))
    }

    /// POST raw image bytes to a single-image operation.
    async fn post_image(
        &self,
        operation: &str,
        image: Bytes,
        query: &[(&str, bool)],
    ) -> Result<Value, EngineError> {
        let response = self
            .client
            .post(self.endpoint(operation))
            .query(query)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await
            .map_err(|e| EngineError::new(format!("engine call failed: {e}")))?;

        Self::parse(response).await
    }

    /// POST a target/background image pair to a slide operation.
    async fn post_pair(
        &self,
        operation: &str,
        target: Bytes,
        background: Bytes,
        query: &[(&str, bool)],
    ) -> Result<Value, EngineError> {
        let form = Form::new()
            .part("target", Part::bytes(target.to_vec()))
            .part("background", Part::bytes(background.to_vec()));

        let response = self
            .client
            .post(self.endpoint(operation))
            .query(query)
            .multipart(form)
            .send()
            .await
            .map_err(|e| EngineError::new(format!("engine call failed: {e}")))?;

        Self::parse(response).await
    }
}

#[async_trait]
impl RecognitionEngine for RemoteEngine {
    async fn classify(&self, image: Bytes, opts: ClassifyOptions) -> Result<Value, EngineError> {
        self.post_image(
            "classify",
            image,
            &[("probability", opts.probability), ("beta", opts.beta)],
        )
        .await
    }

    async fn detect(&self, image: Bytes) -> Result<Vec<BoundingBox>, EngineError> {
        let value = self.post_image("detect", image, &[]).await?;
        serde_json::from_value(value)
            .map_err(|e| EngineError::new(format!("invalid detection payload: {e}")))
    }

    async fn slide_match(
        &self,
        target: Bytes,
        background: Bytes,
        simple_target: bool,
    ) -> Result<Value, EngineError> {
        self.post_pair(
            "match",
            target,
            background,
            &[("simple_target", simple_target)],
        )
        .await
    }

    async fn slide_comparison(
        &self,
        target: Bytes,
        background: Bytes,
    ) -> Result<Value, EngineError> {
        self.post_pair("comparison", target, background, &[]).await
    }
}

// =============================================================================
// Tests
// =============================================================================
