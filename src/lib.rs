//! # Captcha Gateway
//!
//! An HTTP gateway in front of an image-recognition engine: text OCR,
//! bounding-box detection and slide-captcha matching, exposed as a small
//! JSON API.
//!
//! The recognition algorithms live in an external, opaque engine. This
//! library owns everything around it: request dispatch, an origin-restricted
//! CORS policy, an audit-logging middleware that captures request bodies and
//! replays error-response bodies, image ingestion from multipart uploads or
//! base64 JSON payloads, and a uniform `{success, result|bboxes, error}`
//! response envelope.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`engine`] - Engine call contract, the three startup handles and the
//!   HTTP adapter to a remote engine
//! - [`ingest`] - Multipart and base64 image ingestion
//! - [`server`] - Axum-based routes, CORS, audit middleware and envelope
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error taxonomy shared across the crate
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use captcha_gateway::engine::RemoteEngine;
//! use captcha_gateway::server::{create_router, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Three engine handles, created once for the process lifetime
//!     let engines = RemoteEngine::connect("http://localhost:9000", Duration::from_secs(30))?;
//!
//!     let config = RouterConfig::new()
//!         .with_cors_origins(vec!["https://example.com".to_string()]);
//!     let router = create_router(engines, config);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use engine::{
    BoundingBox, ClassifyOptions, EngineMode, EngineSet, RecognitionEngine, RemoteEngine,
};
pub use error::{ApiError, EngineError};
pub use ingest::{decode_image_base64, file_from_multipart, slide_from_multipart, SlideUpload};
pub use server::{
    audit_middleware, create_router, AppState, Base64ImageRequest, Envelope, OcrQueryParams,
    Payload, RouterConfig, SlideQueryParams, WelcomeResponse, DEFAULT_MAX_BODY_BYTES,
    PREFLIGHT_MAX_AGE_SECS,
};
