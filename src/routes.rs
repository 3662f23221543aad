//! Content routes
//!
//! The landing page, the one gated resource, and the sign-in
//! failure page. Leaf handlers with no internal state.

use axum::{Router, middleware, response::IntoResponse, routing::get};
use tower_http::services::ServeFile;

use crate::AppState;
use crate::auth::{CurrentUser, require_login};

/// Path of the static landing page
const INDEX_PAGE: &str = "public/index.html";

/// Create content router
///
/// Routes:
/// - GET / - Static landing page
/// - GET /secret - Gated resource
/// - GET /failure - Sign-in failure page
pub fn content_router(state: AppState) -> Router<AppState> {
    let gated = Router::new()
        .route("/secret", get(secret))
        .route_layer(middleware::from_fn_with_state(state, require_login));

    Router::new()
        .route_service("/", ServeFile::new(INDEX_PAGE))
        .route("/failure", get(failure))
        .merge(gated)
}

/// GET /secret
///
/// Only reachable through the login gate.
async fn secret(CurrentUser(session): CurrentUser) -> impl IntoResponse {
    tracing::debug!(subject = %session.subject, "serving gated content");
    "Your secret code is 4"
}

/// GET /failure
async fn failure() -> impl IntoResponse {
    "Failed to log in!"
}
