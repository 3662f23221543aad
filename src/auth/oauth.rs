//! Google OAuth flow
//!
//! Drives the redirect and callback legs of the OAuth 2.0
//! authorization code flow. Every failure on the callback leg is a
//! user-facing redirect to `/failure`, never a server error.

use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde::Deserialize;

use super::middleware::SESSION_COOKIE;
use super::session::{Session, create_session_token};
use crate::AppState;

/// Name of the transient CSRF state cookie
const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Create authentication router
///
/// Routes:
/// - GET /auth/google - Redirect to Google
/// - GET /auth/google/callback - OAuth callback
/// - GET /auth/logout - Clear session, redirect home
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/google", get(begin_auth))
        .route("/auth/google/callback", get(auth_callback))
        .route("/auth/logout", get(logout))
}

// =============================================================================
// Begin auth
// =============================================================================

/// GET /auth/google
///
/// Redirects user to the provider's authorization page.
///
/// # Steps
/// 1. Generate CSRF state token
/// 2. Store state in cookie
/// 3. Redirect to provider with client_id, redirect_uri, scope, state
async fn begin_auth(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let csrf_state = generate_csrf_state();
    let authorize_url = state.provider.authorize_url(&csrf_state);

    let state_cookie = Cookie::build((OAUTH_STATE_COOKIE, csrf_state))
        .path("/")
        .http_only(true)
        .secure(state.config.should_use_secure_cookies())
        .same_site(SameSite::Lax)
        .build();

    (jar.add(state_cookie), Redirect::to(&authorize_url))
}

// =============================================================================
// Callback
// =============================================================================

/// Query parameters from the provider callback
///
/// All optional: the provider reports a declined consent screen
/// through `error` instead of `code`.
#[derive(Debug, Deserialize)]
struct CallbackQuery {
    /// Authorization code
    code: Option<String>,
    /// CSRF state token
    state: Option<String>,
    /// Provider-reported error, e.g. "access_denied"
    error: Option<String>,
}

/// GET /auth/google/callback
///
/// Handles the provider redirect. On success sets the session
/// cookie and redirects home; on any failure redirects to
/// `/failure` with no session cookie.
///
/// # Steps
/// 1. Verify CSRF state against the state cookie
/// 2. Exchange code for an identity claim
/// 3. Create session and set cookie
/// 4. Redirect to home
async fn auth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> impl IntoResponse {
    // Read the state cookie before scheduling its removal; the jar
    // forgets the value once removed.
    let expected_state = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|cookie| cookie.value().to_owned());
    let jar = jar.remove(Cookie::build(OAUTH_STATE_COOKIE).path("/"));

    if let Some(provider_error) = &query.error {
        tracing::warn!(error = %provider_error, "provider declined the authorization");
        return (jar, Redirect::to("/failure"));
    }

    let (Some(code), Some(returned_state)) = (&query.code, &query.state) else {
        tracing::warn!("callback missing code or state parameter");
        return (jar, Redirect::to("/failure"));
    };

    if expected_state.as_deref() != Some(returned_state.as_str()) {
        tracing::warn!("callback state does not match state cookie");
        return (jar, Redirect::to("/failure"));
    }

    let claim = match state.provider.exchange_code(code).await {
        Ok(claim) => claim,
        Err(error) => {
            tracing::warn!(%error, "code exchange failed");
            return (jar, Redirect::to("/failure"));
        }
    };

    let session = Session::for_claim(claim, state.config.auth.session_max_age);
    let token = match create_session_token(&session, &state.config.auth.cookie_key_primary) {
        Ok(token) => token,
        Err(error) => {
            tracing::error!(%error, "failed to sign session cookie");
            return (jar, Redirect::to("/failure"));
        }
    };

    tracing::info!(subject = %session.subject, "user signed in");

    let session_cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.config.should_use_secure_cookies())
        .same_site(SameSite::Lax)
        .build();

    (jar.add(session_cookie), Redirect::to("/"))
}

// =============================================================================
// Logout
// =============================================================================

/// GET /auth/logout
///
/// Clears the session cookie and redirects to the root.
async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/"))
}

// =============================================================================
// Helpers
// =============================================================================

/// Generate a random CSRF state token
fn generate_csrf_state() -> String {
    use rand::{Rng, distributions::Alphanumeric, thread_rng};

    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
