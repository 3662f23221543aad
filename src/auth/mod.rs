//! Google OAuth authentication
//!
//! Handles:
//! - Delegated OAuth flow
//! - Signed-cookie session management
//! - Authentication middleware

mod middleware;
mod oauth;
pub mod provider;
pub mod session;

pub use middleware::{CurrentUser, SESSION_COOKIE, require_login};
pub use oauth::auth_router;
pub use provider::{GoogleProvider, IdentityClaim, IdentityProvider};
pub use session::{Session, create_session_token, verify_session_token};
