//! Captcha Gateway - HTTP front for an image-recognition engine.
//!
//! This binary starts the HTTP server and wires up all components.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use captcha_gateway::{
    config::Config,
    engine::RemoteEngine,
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("captcha-gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Engine endpoint: {}", config.engine_endpoint);
    info!("  Engine timeout: {}s", config.engine_timeout);
    match config.cors_origins {
        Some(ref origins) => info!("  CORS origins: {}", origins.join(", ")),
        None => info!("  CORS origins: (reflecting request origin)"),
    }
    if let Some(ref prefix) = config.path_prefix {
        info!("  Path prefix: {}", prefix);
    }

    let timeout = Duration::from_secs(config.engine_timeout);

    // Check engine connectivity before accepting traffic
    info!("");
    info!("Connecting to recognition engine...");
    match RemoteEngine::ping(&config.engine_endpoint, timeout).await {
        Ok(()) => info!("  Engine reachable"),
        Err(e) => {
            error!("  Failed to reach engine: {}", e);
            error!("");
            error!("  Please check:");
            error!("    - The engine service is running");
            error!(
                "    - The endpoint '{}' is correct and reachable",
                config.engine_endpoint
            );
            return ExitCode::FAILURE;
        }
    }

    // Create the three engine handles; they live for the process lifetime
    let engines = match RemoteEngine::connect(&config.engine_endpoint, timeout) {
        Ok(engines) => engines,
        Err(e) => {
            error!("Failed to initialize engine handles: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Build router
    let router_config = build_router_config(&config);
    let router = create_router(engines, router_config);

    // Bind and serve
    let addr = config.bind_address();
    let prefix = config.path_prefix.as_deref().unwrap_or("");

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}{}/", addr, prefix);
    info!(
        "    curl -F file=@captcha.png http://{}{}/ocr",
        addr, prefix
    );
    info!(
        "    curl -F target=@piece.png -F background=@puzzle.png http://{}{}/slide",
        addr, prefix
    );
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "captcha_gateway=debug,tower_http=debug"
    } else {
        "captcha_gateway=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_max_body_bytes(config.max_body_bytes)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    if let Some(ref prefix) = config.path_prefix {
        router_config = router_config.with_path_prefix(prefix.clone());
    }

    router_config
}
