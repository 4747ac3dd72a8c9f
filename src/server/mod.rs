//! Axum-based HTTP server: routing, CORS, audit logging and the response
//! envelope.

pub mod audit;
pub mod envelope;
pub mod handlers;
pub mod routes;

pub use audit::audit_middleware;
pub use envelope::{Envelope, Payload};
pub use handlers::{
    detect_handler, ocr_base64_handler, ocr_handler, root_handler, slide_comparison_handler,
    slide_handler, AppState, Base64ImageRequest, OcrQueryParams, SlideQueryParams, WelcomeResponse,
};
pub use routes::{create_router, RouterConfig, DEFAULT_MAX_BODY_BYTES, PREFLIGHT_MAX_AGE_SECS};
