//! Access token inspection
//!
//! The backend signs its access tokens; the client only needs to read
//! the subject and expiry, for instance when restoring a stored session.
//! Signatures are not checked here, the backend checks them on every call.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::error::AuthResult;

/// Seconds before expiry at which a token is treated as expired
pub const EXPIRY_LEEWAY_SECS: i64 = 30;

/// Claims carried by a backend access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID
    pub sub: String,
    /// Expiration time
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl AccessClaims {
    /// Read the claims of a token without verifying its signature
    pub fn peek(token: &str) -> AuthResult<Self> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data =
            decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(token_data.claims)
    }

    /// Whether the token is expired, or about to be, at `now` (unix seconds)
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now + EXPIRY_LEEWAY_SECS
    }
}
