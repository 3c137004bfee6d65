//! OAuth2 sign-in for Google and GitHub providers
//!
//! The backend runs the provider dance; the client only generates the
//! PKCE pair, sends the user to the authorization URL and later trades
//! the returned code for a session.

use std::fmt;

use oauth2::PkceCodeChallenge;
use serde::{Deserialize, Serialize};

/// OAuth2 provider types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    /// Get the provider name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A PKCE challenge and the verifier that answers it
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub challenge: String,
    pub verifier: String,
}

impl PkcePair {
    /// Generate a random S256 pair
    pub fn generate() -> Self {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        Self {
            challenge: challenge.as_str().to_string(),
            verifier: verifier.secret().to_string(),
        }
    }
}

/// A sign-in waiting for the provider to redirect back
#[derive(Debug, Clone)]
pub struct PendingSignIn {
    pub provider: OAuthProvider,
    /// Where to send the user
    pub authorize_url: String,
    pub(crate) code_verifier: String,
}
