//! Gatehouse - a minimal HTTPS server gating one resource behind
//! Google OAuth sign-in
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Router (Axum)                          │
//! │  - Landing page, gated resource, failure page               │
//! │  - OAuth redirect/callback/logout endpoints                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Auth Layer                             │
//! │  - Delegated provider flow (IdentityProvider)               │
//! │  - HMAC-signed cookie sessions, dual-key verification       │
//! │  - Login gate middleware                                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All session state lives in the signed cookie; the server keeps
//! no session records.
//!
//! # Modules
//!
//! - `auth`: OAuth flow, session codec, login gate
//! - `routes`: content handlers
//! - `config`: Configuration management
//! - `error`: Error types

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// This struct is cloned for each request. Everything in it is
/// read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Identity provider integration
    pub provider: Arc<dyn auth::IdentityProvider>,
}

impl AppState {
    /// Initialize application state with the real Google provider
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        let http_client = reqwest::Client::builder()
            .user_agent("Gatehouse/0.1.0")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        let redirect_uri = format!("{}/auth/google/callback", config.server.base_url());
        let provider = auth::GoogleProvider::new(
            config.auth.client_id.clone(),
            config.auth.client_secret.clone(),
            redirect_uri,
            http_client,
        );

        Ok(Self::with_provider(config, Arc::new(provider)))
    }

    /// Initialize application state with an explicit provider
    ///
    /// Tests use this to inject a fake provider.
    pub fn with_provider(
        config: config::AppConfig,
        provider: Arc<dyn auth::IdentityProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            provider,
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use axum::http::{HeaderValue, header};
    use tower_http::{
        compression::CompressionLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
    };

    Router::new()
        .merge(auth::auth_router())
        .merge(routes::content_router(state.clone()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        // Security headers on every response
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .with_state(state)
}
