//! Session management
//!
//! Uses HMAC-signed tokens stored in cookies.
//! No server-side session storage needed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::provider::IdentityClaim;

/// User session data
///
/// Stored in a signed cookie. Contains the minimal identity
/// claim obtained from the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Provider-issued subject identifier
    pub subject: String,
    /// Email from the provider's email scope, when granted
    pub email: Option<String>,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a session for a claim, valid for `max_age_seconds` from now
    pub fn for_claim(claim: IdentityClaim, max_age_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            subject: claim.subject,
            email: claim.email,
            created_at: now,
            expires_at: now + chrono::Duration::seconds(max_age_seconds),
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Create a signed session token
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
///
/// Always signs with the primary key; rotation happens on the
/// verification side.
///
/// # Arguments
/// * `session` - Session data to encode
/// * `primary_key` - HMAC signing key
///
/// # Returns
/// Signed token string
pub fn create_session_token(
    session: &Session,
    primary_key: &str,
) -> Result<String, crate::error::AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let payload =
        serde_json::to_string(session).map_err(|e| crate::error::AppError::Internal(e.into()))?;

    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(primary_key.as_bytes())
        .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a session token
///
/// The signature is accepted if it verifies under any of the
/// configured keys, so sessions signed before a key rotation
/// stay valid until they expire.
///
/// # Arguments
/// * `token` - Token string to verify
/// * `keys` - Candidate HMAC keys, primary first
///
/// # Returns
/// Decoded session if valid
///
/// # Errors
/// Returns error if no key verifies the signature, the token is
/// malformed, or the session is expired
pub fn verify_session_token(
    token: &str,
    keys: &[&str],
) -> Result<Session, crate::error::AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return Err(crate::error::AppError::Unauthorized);
    }

    let payload_b64 = parts[0];
    let signature_b64 = parts[1];

    let claimed_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| crate::error::AppError::Unauthorized)?;

    type HmacSha256 = Hmac<Sha256>;
    let verified = keys.iter().any(|key| {
        HmacSha256::new_from_slice(key.as_bytes())
            .map(|mut mac| {
                mac.update(payload_b64.as_bytes());
                mac.verify_slice(&claimed_signature).is_ok()
            })
            .unwrap_or(false)
    });
    if !verified {
        return Err(crate::error::AppError::InvalidSignature);
    }

    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| crate::error::AppError::Unauthorized)?;

    let payload_str =
        String::from_utf8(payload_bytes).map_err(|_| crate::error::AppError::Unauthorized)?;

    let session: Session =
        serde_json::from_str(&payload_str).map_err(|_| crate::error::AppError::Unauthorized)?;

    if session.is_expired() {
        return Err(crate::error::AppError::Unauthorized);
    }

    Ok(session)
}
