use thiserror::Error;

/// Failure reported by the external recognition engine.
///
/// The engine is an opaque collaborator: a decoding failure, a no-match
/// result and an internal fault all surface as this one type carrying the
/// underlying message. The HTTP layer does not distinguish engine failure
/// subtypes.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineError {
    /// Message produced by the engine or its transport
    pub message: String,
}

impl EngineError {
    /// Create an engine error from any displayable source.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that can occur while handling a recognition request.
///
/// All variants map to the same 500 `{success: false, error}` envelope;
/// client-caused and engine-caused failures are deliberately not told apart
/// at the status level.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Malformed base64 or an unreadable upload
    #[error("decode error: {0}")]
    Decode(String),

    /// The recognition engine failed or found no result
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Anything else
    #[error("{0}")]
    Unknown(String),
}
