//! Configuration management for the captcha gateway.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `CAPTCHA_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Environment Variables
//!
//! - `CAPTCHA_HOST` - Server bind address (default: 0.0.0.0)
//! - `CAPTCHA_PORT` - Server port (default: 8000)
//! - `CAPTCHA_ENGINE_ENDPOINT` - Base URL of the recognition engine (required)
//! - `CAPTCHA_ENGINE_TIMEOUT` - Engine call timeout in seconds (default: 30)
//! - `CAPTCHA_CORS_ORIGINS` - Comma-separated origin allow-list
//! - `CAPTCHA_PATH_PREFIX` - Path prefix the API is nested under
//! - `CAPTCHA_MAX_BODY_BYTES` - Request body cap in bytes (default: 16 MiB)

use clap::Parser;

use crate::server::routes::DEFAULT_MAX_BODY_BYTES;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default engine call timeout in seconds.
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Captcha Gateway - HTTP front for an image-recognition engine.
///
/// Exposes OCR, glyph detection and slider matching over HTTP; the actual
/// recognition is delegated to an external engine reached at
/// `--engine-endpoint`.
#[derive(Parser, Debug, Clone)]
#[command(name = "captcha-gateway")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "CAPTCHA_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "CAPTCHA_PORT")]
    pub port: u16,

    // =========================================================================
    // Engine Configuration
    // =========================================================================
    /// Base URL of the recognition engine (e.g. http://localhost:9000).
    #[arg(long, env = "CAPTCHA_ENGINE_ENDPOINT")]
    pub engine_endpoint: String,

    /// Timeout for a single engine call, in seconds.
    #[arg(long, default_value_t = DEFAULT_ENGINE_TIMEOUT_SECS, env = "CAPTCHA_ENGINE_TIMEOUT")]
    pub engine_timeout: u64,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, the request origin is reflected back.
    #[arg(long, env = "CAPTCHA_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // HTTP Configuration
    // =========================================================================
    /// Path prefix to serve the API under (e.g. /api).
    #[arg(long, env = "CAPTCHA_PATH_PREFIX")]
    pub path_prefix: Option<String>,

    /// Maximum request body size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES, env = "CAPTCHA_MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable transport-level request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.engine_endpoint.is_empty() {
            return Err(
                "Engine endpoint is required. Set --engine-endpoint or CAPTCHA_ENGINE_ENDPOINT"
                    .to_string(),
            );
        }

        if !self.engine_endpoint.starts_with("http://")
            && !self.engine_endpoint.starts_with("https://")
        {
            return Err(format!(
                "Engine endpoint must be an http(s) URL, got '{}'",
                self.engine_endpoint
            ));
        }

        if self.engine_timeout == 0 {
            return Err("engine_timeout must be greater than 0".to_string());
        }

        if self.max_body_bytes < 1024 {
            return Err("max_body_bytes must be at least 1KB".to_string());
        }

        if let Some(ref prefix) = self.path_prefix {
            if !prefix.starts_with('/') {
                return Err(format!("path_prefix must start with '/', got '{}'", prefix));
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Tests
// =============================================================================
