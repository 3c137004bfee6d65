//! HTTP client for the hosted backend
//!
//! Storage goes through the PostgREST endpoints under `/rest/v1`, identity
//! through the auth endpoints under `/auth/v1`, and change notifications
//! through the realtime websocket.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, header};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info};
use url::Url;

use crate::{
    backend::BackendConfig,
    error::{StoreError, StoreResult},
    listeners::AuthListeners,
    realtime,
    store::{
        AuthBackend, AuthCallback, AuthEvent, AuthSession, AuthUser, Backend, ChangeCallback,
        ChannelSpec, OAuthRequest, Query, RemoteStore, Subscription,
    },
};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> AuthSession {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| unix_now() + secs));

        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Client for a configured hosted backend
#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: Url,
    anon_key: String,
    session: Arc<RwLock<Option<AuthSession>>>,
    listeners: AuthListeners,
}

impl SupabaseClient {
    /// Build a client from configuration
    pub fn new(config: &BackendConfig) -> StoreResult<Self> {
        let (Some(url), Some(anon_key)) = (&config.supabase_url, &config.supabase_anon_key) else {
            return Err(StoreError::Configuration(
                "backend URL and anon key are required".to_string(),
            ));
        };

        // A trailing slash keeps `join` from dropping the last path segment.
        let base_url = Url::parse(&format!("{}/", url.trim_end_matches('/')))
            .map_err(|e| StoreError::Configuration(format!("Invalid backend URL: {}", e)))?;

        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            base_url,
            anon_key: anon_key.clone(),
            session: Arc::new(RwLock::new(None)),
            listeners: AuthListeners::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The session requests are currently made with
    pub fn current_session(&self) -> Option<AuthSession> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_session(&self, session: Option<AuthSession>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn bearer_token(&self) -> String {
        self.current_session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn endpoint(&self, path: &str) -> StoreResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| StoreError::Configuration(format!("Invalid endpoint {}: {}", path, e)))
    }

    fn rest_url(&self, table: &str) -> StoreResult<Url> {
        self.endpoint(&format!("rest/v1/{}", table))
    }

    fn realtime_url(&self) -> StoreResult<Url> {
        let mut url = self.endpoint("realtime/v1/websocket")?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| StoreError::Configuration("Cannot derive realtime URL".to_string()))?;
        url.query_pairs_mut()
            .append_pair("apikey", &self.anon_key)
            .append_pair("vsn", "1.0.0");
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer_token())
    }

    /// Turn a non-success response into a `Status` error
    async fn check(response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// Decode a single-object body, treating an empty body as no row
    async fn single_row(response: Response) -> StoreResult<Option<Value>> {
        let body = Self::check(response).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn token_request(&self, grant_type: &str, body: Value) -> StoreResult<AuthSession> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);

        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;

        let token: TokenResponse = Self::check(response).await?.json().await?;
        Ok(token.into_session())
    }
}

#[async_trait]
impl RemoteStore for SupabaseClient {
    async fn select(&self, query: &Query) -> StoreResult<Vec<Value>> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(query.params());

        let response = self
            .authorized(self.http.get(self.rest_url(query.table())?))
            .query(&params)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn insert(&self, table: &str, row: Value) -> StoreResult<Option<Value>> {
        let response = self
            .authorized(self.http.post(self.rest_url(table)?))
            .header("Prefer", RETURN_REPRESENTATION)
            .header(header::ACCEPT, SINGLE_OBJECT)
            .json(&row)
            .send()
            .await?;

        Self::single_row(response).await
    }

    async fn update(&self, query: &Query, patch: Value) -> StoreResult<Option<Value>> {
        let response = self
            .authorized(self.http.patch(self.rest_url(query.table())?))
            .query(&query.params())
            .header("Prefer", RETURN_REPRESENTATION)
            .header(header::ACCEPT, SINGLE_OBJECT)
            .json(&patch)
            .send()
            .await?;

        Self::single_row(response).await
    }

    async fn delete(&self, query: &Query) -> StoreResult<()> {
        let response = self
            .authorized(self.http.delete(self.rest_url(query.table())?))
            .query(&query.params())
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn subscribe(
        &self,
        channel: ChannelSpec,
        on_change: ChangeCallback,
    ) -> StoreResult<Subscription> {
        realtime::open(
            self.realtime_url()?,
            self.bearer_token(),
            channel,
            on_change,
        )
        .await
    }
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    async fn get_user(&self) -> StoreResult<Option<AuthUser>> {
        let Some(session) = self.current_session() else {
            return Ok(None);
        };

        let response = self
            .http
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        let user: AuthUser = Self::check(response).await?.json().await?;
        Ok(Some(user))
    }

    fn authorize_url(&self, request: &OAuthRequest) -> StoreResult<Option<String>> {
        let mut url = self.endpoint("auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", &request.provider)
            .append_pair("redirect_to", &request.redirect_to)
            .append_pair("code_challenge", &request.code_challenge)
            .append_pair("code_challenge_method", "s256");
        Ok(Some(url.to_string()))
    }

    async fn exchange_code(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> StoreResult<AuthSession> {
        let session = self
            .token_request(
                "pkce",
                json!({ "auth_code": auth_code, "code_verifier": code_verifier }),
            )
            .await?;

        info!("Signed in as user: {}", session.user.id);
        self.replace_session(Some(session.clone()));
        self.listeners.emit(AuthEvent::SignedIn, Some(&session));
        Ok(session)
    }

    async fn refresh_session(&self, refresh_token: &str) -> StoreResult<AuthSession> {
        let session = self
            .token_request("refresh_token", json!({ "refresh_token": refresh_token }))
            .await?;

        self.replace_session(Some(session.clone()));
        self.listeners
            .emit(AuthEvent::TokenRefreshed, Some(&session));
        Ok(session)
    }

    async fn set_session(&self, session: AuthSession) -> StoreResult<()> {
        self.replace_session(Some(session.clone()));
        self.listeners.emit(AuthEvent::SignedIn, Some(&session));
        Ok(())
    }

    async fn sign_out(&self) -> StoreResult<()> {
        let Some(session) = self.current_session() else {
            return Ok(());
        };

        let result = async {
            let url = self.endpoint("auth/v1/logout")?;
            let response = self
                .http
                .post(url)
                .header("apikey", &self.anon_key)
                .bearer_auth(&session.access_token)
                .send()
                .await?;
            Self::check(response).await?;
            Ok::<_, StoreError>(())
        }
        .await;

        // The local session is dropped even when the backend call fails.
        self.replace_session(None);
        self.listeners.emit(AuthEvent::SignedOut, None);

        if let Err(e) = &result {
            error!("Backend sign out failed: {}", e);
        }
        result
    }

    fn on_auth_state_change(&self, callback: AuthCallback) -> Subscription {
        self.listeners.register(callback)
    }
}

impl Backend for SupabaseClient {
    fn is_configured(&self) -> bool {
        true
    }
}
