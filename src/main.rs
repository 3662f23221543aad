//! Gatehouse binary entry point

use gatehouse::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Load configuration from file and environment
/// 2. Initialize tracing/logging per the logging config
/// 3. Initialize AppState
/// 4. Build Axum router
/// 5. Start HTTPS server
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration; errors here print directly to stderr
    let config = config::AppConfig::load()?;

    // 2. Initialize tracing/logging
    let default_filter = format!("gatehouse={},tower_http=debug", config.logging.level);

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!("Starting Gatehouse...");
    tracing::info!(
        domain = %config.server.domain,
        protocol = %config.server.protocol,
        "Configuration loaded"
    );
    config.log_startup_warnings();

    // 3. Initialize application state
    let state = AppState::new(config.clone())?;

    // 4. Build Axum router
    let app = gatehouse::build_router(state);

    // 5. Load TLS material; missing or unreadable files are fatal
    let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(
        &config.tls.cert_path,
        &config.tls.key_path,
    )
    .await
    .map_err(|e| {
        format!(
            "failed to load TLS files {:?} / {:?}: {e}",
            config.tls.cert_path, config.tls.key_path
        )
    })?;

    // 6. Start HTTPS server
    let addr: std::net::SocketAddr =
        format!("{}:{}", config.server.host, config.server.port).parse()?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Public URL: {}", config.server.base_url());

    axum_server::bind_rustls(addr, tls)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
