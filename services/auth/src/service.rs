//! Authentication service
//!
//! Handles OAuth sign-ins, sign-outs, session restore and current-user
//! lookup against whichever backend is configured.

use std::sync::Arc;

use chrono::Utc;
use common::{
    AuthBackend, AuthCallback, AuthSession, AuthUser, Backend, OAuthRequest, Subscription,
};
use tracing::{error, info, warn};

use crate::{
    error::{AuthError, AuthResult},
    jwt::AccessClaims,
    oauth::{OAuthProvider, PendingSignIn, PkcePair},
};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    backend: Arc<dyn Backend>,
    redirect_url: String,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(backend: Arc<dyn Backend>, redirect_url: impl Into<String>) -> Self {
        Self {
            backend,
            redirect_url: redirect_url.into(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    /// Start an OAuth sign-in
    ///
    /// Returns the URL to send the user to; finish with
    /// [`complete_sign_in`](Self::complete_sign_in) once the provider
    /// redirects back with a code.
    pub async fn sign_in_with_oauth(&self, provider: OAuthProvider) -> AuthResult<PendingSignIn> {
        info!("Starting OAuth sign-in with {}", provider);

        let pkce = PkcePair::generate();
        let request = OAuthRequest {
            provider: provider.as_str().to_string(),
            redirect_to: self.redirect_url.clone(),
            code_challenge: pkce.challenge,
        };

        let authorize_url = self
            .backend
            .authorize_url(&request)
            .map_err(|e| {
                error!("OAuth login failed for {}: {}", provider, e);
                AuthError::from(e)
            })?
            .ok_or_else(|| {
                error!("OAuth login failed for {}: no backend configured", provider);
                AuthError::BackendUnavailable
            })?;

        Ok(PendingSignIn {
            provider,
            authorize_url,
            code_verifier: pkce.verifier,
        })
    }

    /// Finish an OAuth sign-in with the code the provider returned
    pub async fn complete_sign_in(
        &self,
        pending: PendingSignIn,
        auth_code: &str,
    ) -> AuthResult<AuthSession> {
        let session = self
            .backend
            .exchange_code(auth_code, &pending.code_verifier)
            .await
            .map_err(|e| {
                error!("OAuth code exchange failed for {}: {}", pending.provider, e);
                AuthError::from(e)
            })?;

        info!(
            "Signed in with {} as user: {}",
            pending.provider, session.user.id
        );
        Ok(session)
    }

    /// Reactivate a stored session, refreshing it if the access token expired
    pub async fn restore_session(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> AuthResult<AuthSession> {
        let claims = AccessClaims::peek(access_token)?;

        if claims.is_expired_at(Utc::now().timestamp()) {
            info!("Stored session for user {} expired, refreshing", claims.sub);
            return self
                .backend
                .refresh_session(refresh_token)
                .await
                .map_err(|e| {
                    warn!("Session refresh failed: {}", e);
                    AuthError::SessionExpired
                });
        }

        let session = AuthSession {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at: Some(claims.exp),
            user: AuthUser {
                email: claims.email,
                ..AuthUser::new(claims.sub)
            },
        };
        self.backend.set_session(session.clone()).await?;

        info!("Restored session for user: {}", session.user.id);
        Ok(session)
    }

    /// Sign out the current user
    pub async fn sign_out(&self) -> AuthResult<()> {
        self.backend.sign_out().await.map_err(|e| {
            error!("Sign out failed: {}", e);
            AuthError::from(e)
        })
    }

    /// Get the current session user
    ///
    /// A failed identity check counts as "no user".
    pub async fn get_current_user(&self) -> Option<AuthUser> {
        match self.backend.get_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!("Identity check failed: {}", e);
                None
            }
        }
    }

    /// Register a listener for sign-in, sign-out and token refresh
    pub fn on_auth_state_change(&self, callback: AuthCallback) -> Subscription {
        self.backend.on_auth_state_change(callback)
    }
}
