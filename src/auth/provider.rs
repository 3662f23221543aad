//! Identity provider integration
//!
//! The OAuth2 handshake itself (token exchange, response signature
//! checks) is delegated to the provider; this module only drives the
//! redirect/callback legs and maps the provider's user info onto a
//! minimal identity claim.

use axum::async_trait;
use serde::Deserialize;

use crate::error::AppError;

/// Minimal identity data obtained from the provider
///
/// Treated as opaque: the provider-issued subject is the whole
/// identity model, with no independent validation on our side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaim {
    /// Provider-issued subject identifier
    pub subject: String,
    /// Email, when the email scope was granted
    pub email: Option<String>,
}

/// Capability interface for the delegated auth flow
///
/// Swappable so tests can run the callback leg against a fake
/// without any network traffic.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authorization endpoint URL to redirect the user to
    fn authorize_url(&self, state: &str) -> String;

    /// Exchange an authorization code for an identity claim
    async fn exchange_code(&self, code: &str) -> Result<IdentityClaim, AppError>;
}

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Google OAuth2 provider
pub struct GoogleProvider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http_client: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            http_client,
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct TokenRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope=email&state={}",
            GOOGLE_AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for an identity claim
    ///
    /// # Steps
    /// 1. POST the code to Google's token endpoint
    /// 2. Fetch user info with the returned access token
    async fn exchange_code(&self, code: &str) -> Result<IdentityClaim, AppError> {
        let token_response = self
            .http_client
            .post(GOOGLE_TOKEN_URL)
            .form(&TokenRequest {
                code,
                client_id: &self.client_id,
                client_secret: &self.client_secret,
                redirect_uri: &self.redirect_uri,
                grant_type: "authorization_code",
            })
            .send()
            .await?;

        if !token_response.status().is_success() {
            let status = token_response.status();
            let body = token_response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "token exchange failed with {status}: {body}"
            )));
        }

        let token: GoogleTokenResponse = token_response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("malformed token response: {e}")))?;

        let userinfo_response = self
            .http_client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?;

        if !userinfo_response.status().is_success() {
            return Err(AppError::Provider(format!(
                "userinfo request failed with {}",
                userinfo_response.status()
            )));
        }

        let user: GoogleUserInfo = userinfo_response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("malformed userinfo response: {e}")))?;

        Ok(IdentityClaim {
            subject: user.sub,
            email: user.email,
        })
    }
}
