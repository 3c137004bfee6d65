//! Offline stand-in for the hosted backend
//!
//! Every storage call succeeds with an empty result, subscriptions are
//! no-ops and the active identity is a fixed local guest.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{StoreError, StoreResult},
    listeners::AuthListeners,
    store::{
        AuthBackend, AuthCallback, AuthSession, AuthUser, Backend, ChangeCallback, ChannelSpec,
        OAuthRequest, Query, RemoteStore, Subscription,
    },
};

/// Identifier of the local guest identity
pub const GUEST_USER_ID: &str = "guest";

/// Backend used when no hosted backend is configured
#[derive(Clone, Default)]
pub struct OfflineClient {
    listeners: AuthListeners,
}

impl OfflineClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guest() -> AuthUser {
        AuthUser::new(GUEST_USER_ID)
    }
}

#[async_trait]
impl RemoteStore for OfflineClient {
    async fn select(&self, query: &Query) -> StoreResult<Vec<Value>> {
        debug!("Offline select on {}", query);
        Ok(Vec::new())
    }

    async fn insert(&self, table: &str, _row: Value) -> StoreResult<Option<Value>> {
        debug!("Offline insert into {} dropped", table);
        Ok(None)
    }

    async fn update(&self, query: &Query, _patch: Value) -> StoreResult<Option<Value>> {
        debug!("Offline update on {} dropped", query);
        Ok(None)
    }

    async fn delete(&self, query: &Query) -> StoreResult<()> {
        debug!("Offline delete on {} dropped", query);
        Ok(())
    }

    async fn subscribe(
        &self,
        channel: ChannelSpec,
        _on_change: ChangeCallback,
    ) -> StoreResult<Subscription> {
        Ok(Subscription::noop(channel.name))
    }
}

#[async_trait]
impl AuthBackend for OfflineClient {
    async fn get_user(&self) -> StoreResult<Option<AuthUser>> {
        Ok(Some(Self::guest()))
    }

    fn authorize_url(&self, _request: &OAuthRequest) -> StoreResult<Option<String>> {
        Ok(None)
    }

    async fn exchange_code(
        &self,
        _auth_code: &str,
        _code_verifier: &str,
    ) -> StoreResult<AuthSession> {
        Err(StoreError::Configuration(
            "no backend configured to exchange the authorization code".to_string(),
        ))
    }

    async fn refresh_session(&self, _refresh_token: &str) -> StoreResult<AuthSession> {
        Err(StoreError::Configuration(
            "no backend configured to refresh the session".to_string(),
        ))
    }

    async fn set_session(&self, _session: AuthSession) -> StoreResult<()> {
        Ok(())
    }

    async fn sign_out(&self) -> StoreResult<()> {
        Ok(())
    }

    fn on_auth_state_change(&self, callback: AuthCallback) -> Subscription {
        self.listeners.register(callback)
    }
}

impl Backend for OfflineClient {
    fn is_configured(&self) -> bool {
        false
    }
}
