//! Image ingestion.
//!
//! Clients supply images two ways: raw bytes in a multipart upload, or a
//! base64 string inside a JSON payload. Both paths normalize to plain
//! [`Bytes`] here. No image-format validation happens at this layer;
//! whether the bytes decode to pixels is the engine's call.

use axum::extract::Multipart;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;

use crate::error::ApiError;

/// Both halves of a slide-captcha request.
#[derive(Debug, Clone)]
pub struct SlideUpload {
    /// The puzzle piece, or the shadowed full image for comparison
    pub target: Bytes,

    /// The background image
    pub background: Bytes,
}

/// Read the bytes of the named multipart part verbatim.
///
/// An empty upload is forwarded as-is and left for the engine to reject.
/// A missing part, or a part that fails to read, is a decode error.
pub async fn file_from_multipart(mut multipart: Multipart, field: &str) -> Result<Bytes, ApiError> {
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Decode(format!("unreadable multipart body: {e}")))?
    {
        if part.name() == Some(field) {
            return part
                .bytes()
                .await
                .map_err(|e| ApiError::Decode(format!("failed to read upload `{field}`: {e}")));
        }
    }

    Err(ApiError::Decode(format!(
        "missing multipart field `{field}`"
    )))
}

/// Read the `target` and `background` parts of a slide request.
///
/// Unlike single uploads, both parts must be present and non-empty.
pub async fn slide_from_multipart(mut multipart: Multipart) -> Result<SlideUpload, ApiError> {
    let mut target: Option<Bytes> = None;
    let mut background: Option<Bytes> = None;

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Decode(format!("unreadable multipart body: {e}")))?
    {
        let name = part.name().map(str::to_owned);
        let data = part.bytes().await.map_err(|e| {
            ApiError::Decode(format!(
                "failed to read upload `{}`: {e}",
                name.as_deref().unwrap_or("<unnamed>")
            ))
        })?;

        match name.as_deref() {
            Some("target") => target = Some(data),
            Some("background") => background = Some(data),
            _ => {}
        }
    }

    let target =
        target.ok_or_else(|| ApiError::Decode("missing multipart field `target`".to_string()))?;
    let background = background
        .ok_or_else(|| ApiError::Decode("missing multipart field `background`".to_string()))?;

    if target.is_empty() {
        return Err(ApiError::Decode("empty upload for `target`".to_string()));
    }
    if background.is_empty() {
        return Err(ApiError::Decode("empty upload for `background`".to_string()));
    }

    Ok(SlideUpload { target, background })
}

/// Decode a base64-encoded image from a JSON payload.
///
/// Uses the standard alphabet. Malformed input, or input that decodes to
/// zero bytes, is a decode error.
pub fn decode_image_base64(encoded: &str) -> Result<Bytes, ApiError> {
    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ApiError::Decode(format!("invalid base64 image: {e}")))?;

    if decoded.is_empty() {
        return Err(ApiError::Decode(
            "base64 image decoded to zero bytes".to_string(),
        ));
    }

    Ok(Bytes::from(decoded))
}
