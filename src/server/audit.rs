//! Request/response audit logging.
//!
//! Wraps every request/response pair that reaches the dispatcher. The
//! pre-phase records request metadata and, for POSTs, the full request body;
//! the post-phase records status and elapsed time. For error responses the
//! body is additionally drained, logged, and the response rebuilt from the
//! captured bytes: the transport can only read a body once, so replaying it
//! is the only way to both inspect and deliver it.
//!
//! Successful responses pass through untouched to preserve streaming.
//! Log lines from concurrent requests may interleave; each line is
//! self-contained with its own timestamp and path.

use std::net::SocketAddr;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::{
    body::{to_bytes, Body},
    extract::{ConnectInfo, Request},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::{error, info, warn};

/// Upper bound when buffering bodies for the audit log.
///
/// Larger bodies fail the capture; the failure is logged and the request or
/// response proceeds without its body text.
const AUDIT_BODY_LIMIT: usize = 32 * 1024 * 1024;

// =============================================================================
// Audit Record
// =============================================================================

/// Snapshot of one request, taken before the handler chain runs.
#[derive(Debug)]
struct AuditRecord {
    /// Unix timestamp of request arrival (seconds)
    timestamp: u64,

    /// `Origin` header, or `-` when absent
    origin: String,

    /// `Host` header, or `-` when absent
    host: String,

    /// First `X-Forwarded-For` hop, else the socket peer address
    client_ip: String,

    method: Method,
    path: String,

    /// Request headers rendered as a compact JSON object
    headers: String,
}

impl AuditRecord {
    fn capture(request: &Request) -> Self {
        Self {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_secs(),
            origin: header_or_dash(request.headers(), header::ORIGIN),
            host: header_or_dash(request.headers(), header::HOST),
            client_ip: client_ip(request),
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            headers: render_headers(request.headers()),
        }
    }
}

fn header_or_dash(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

/// Resolve the client address: proxy header first, then the socket peer.
fn client_ip(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Render the header map as one compact JSON object.
///
/// Non-UTF-8 header values are replaced lossily; duplicate names keep the
/// last value.
fn render_headers(headers: &HeaderMap) -> String {
    let map: serde_json::Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();

    Value::Object(map).to_string()
}

// =============================================================================
// Middleware
// =============================================================================

/// Audit every request/response pair passing through the dispatcher.
///
/// Installed with `axum::middleware::from_fn`; sits inside the CORS layer so
/// preflights never reach it.
pub async fn audit_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let record = AuditRecord::capture(&request);

    info!(
        timestamp = record.timestamp,
        origin = %record.origin,
        host = %record.host,
        client_ip = %record.client_ip,
        method = %record.method,
        path = %record.path,
        headers = %record.headers,
        "request received"
    );

    // Only POSTs carry a body worth logging; buffering also means the
    // request must be rebuilt from the captured bytes before dispatch.
    let request = if record.method == Method::POST {
        log_request_body(request, &record).await
    } else {
        request
    };

    let response = next.run(request).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let status = response.status();

    if status.as_u16() < 400 {
        info!(
            status = status.as_u16(),
            elapsed_ms,
            path = %record.path,
            "request completed"
        );
        return response;
    }

    replay_error_response(response, &record, elapsed_ms).await
}

/// Buffer and log a POST request body, then rebuild the request.
///
/// A body that is not valid UTF-8 (e.g. a multipart upload) is logged as a
/// decode error; the request itself always proceeds.
async fn log_request_body(request: Request, record: &AuditRecord) -> Request {
    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, AUDIT_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(
                path = %record.path,
                "failed to read request body for audit: {}", err
            );
            return Request::from_parts(parts, Body::empty());
        }
    };

    match std::str::from_utf8(&bytes) {
        Ok(text) => info!(path = %record.path, body = %text, "request body"),
        Err(_) => error!(
            path = %record.path,
            "request body is not valid UTF-8 ({} bytes)",
            bytes.len()
        ),
    }

    Request::from_parts(parts, Body::from(bytes))
}

/// Drain an error response, log its body, and rebuild it byte-for-byte.
///
/// Status and headers are carried over unchanged, so the client observes
/// exactly the response the handler produced.
async fn replay_error_response(
    response: Response,
    record: &AuditRecord,
    elapsed_ms: u64,
) -> Response {
    let (mut parts, body) = response.into_parts();
    let status = parts.status.as_u16();

    let bytes = match to_bytes(body, AUDIT_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(
                status,
                path = %record.path,
                "failed to drain response body for audit: {}", err
            );
            // The body errored mid-stream; nothing is left to replay.
            parts.headers.remove(header::CONTENT_LENGTH);
            return Response::from_parts(parts, Body::empty());
        }
    };

    match std::str::from_utf8(&bytes) {
        Ok(text) => {
            if status >= 500 {
                error!(status, elapsed_ms, path = %record.path, body = %text, "request failed");
            } else {
                warn!(status, elapsed_ms, path = %record.path, body = %text, "request failed");
            }
        }
        Err(_) => warn!(
            status,
            elapsed_ms,
            path = %record.path,
            "request failed with non-text body ({} bytes)",
            bytes.len()
        ),
    }

    Response::from_parts(parts, Body::from(bytes))
}

// =============================================================================
// Tests
// =============================================================================
