//! Remote data client contract
//!
//! The application talks to its hosted backend through two capabilities:
//! table-scoped CRUD with change notifications ([`RemoteStore`]) and
//! identity management ([`AuthBackend`]). Both the real client and the
//! offline stand-in implement them, so callers never special-case an
//! absent backend.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreResult;

/// Sort direction of an ordered select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

impl Order {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            ascending: false,
        }
    }
}

/// A table-scoped query: equality filters plus an optional ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    filters: Vec<(String, String)>,
    order: Option<Order>,
}

impl Query {
    /// Start a query against `table`
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order: None,
        }
    }

    /// Keep only rows where `column` equals `value`
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    /// Order the result set
    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    /// Value of the equality filter on `column`, if any
    pub fn filter_value(&self, column: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn ordering(&self) -> Option<Order> {
        self.order
    }

    /// Render the filters and ordering as PostgREST query parameters
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|(column, value)| (column.clone(), format!("eq.{}", value)))
            .collect();

        if let Some(order) = self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push((
                "order".to_string(),
                format!("{}.{}", order.column, direction),
            ));
        }

        params
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table)?;
        for (column, value) in &self.filters {
            write!(f, " {}={}", column, value)?;
        }
        if let Some(order) = self.order {
            write!(
                f,
                " order by {} {}",
                order.column,
                if order.ascending { "asc" } else { "desc" }
            )?;
        }
        Ok(())
    }
}

/// Kind of row change delivered over a realtime channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeEvent {
    Insert,
    Update,
    Delete,
}

/// A row-level change notification
#[derive(Debug, Clone, PartialEq)]
pub struct ChangePayload {
    pub event: ChangeEvent,
    pub table: String,
    pub record: Option<Value>,
    pub old_record: Option<Value>,
    pub commit_timestamp: Option<String>,
}

/// What a realtime channel listens to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub name: String,
    pub schema: String,
    pub table: String,
    pub filter: Option<String>,
}

impl ChannelSpec {
    /// Channel for every change of `table` rows owned by `owner_id`
    pub fn owner_scoped(table: &str, owner_id: &str) -> Self {
        Self {
            name: format!("public:{}:user:{}", table, owner_id),
            schema: "public".to_string(),
            table: table.to_string(),
            filter: Some(format!("user_id=eq.{}", owner_id)),
        }
    }
}

/// Callback invoked for every change on a channel
pub type ChangeCallback = Arc<dyn Fn(ChangePayload) + Send + Sync>;

/// Handle to a live subscription
///
/// The teardown runs once, on [`Subscription::unsubscribe`] or on drop.
pub struct Subscription {
    topic: String,
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(topic: impl Into<String>, teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            topic: topic.into(),
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A handle whose unsubscribe does nothing
    pub fn noop(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            teardown: None,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Stop delivery on this subscription
    pub fn unsubscribe(mut self) {
        self.run_teardown();
    }

    fn run_teardown(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_teardown();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("active", &self.teardown.is_some())
            .finish()
    }
}

/// Identity of a signed-in user as reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

impl AuthUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            user_metadata: Value::Null,
        }
    }
}

/// Tokens plus the user they belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp (seconds) at which the access token expires
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

/// Auth state transitions reported to listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Callback invoked on every auth state change
pub type AuthCallback = Arc<dyn Fn(AuthEvent, Option<&AuthSession>) + Send + Sync>;

/// Parameters of an OAuth authorization redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthRequest {
    pub provider: String,
    pub redirect_to: String,
    /// S256 PKCE challenge
    pub code_challenge: String,
}

/// Table-scoped CRUD plus row change notifications
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch every row matching the query
    async fn select(&self, query: &Query) -> StoreResult<Vec<Value>>;

    /// Insert one row and return it as stored, if the backend produced one
    async fn insert(&self, table: &str, row: Value) -> StoreResult<Option<Value>>;

    /// Patch the single row matching the query and return it as stored
    async fn update(&self, query: &Query, patch: Value) -> StoreResult<Option<Value>>;

    /// Remove the rows matching the query
    async fn delete(&self, query: &Query) -> StoreResult<()>;

    /// Open a change-notification channel
    async fn subscribe(
        &self,
        channel: ChannelSpec,
        on_change: ChangeCallback,
    ) -> StoreResult<Subscription>;
}

/// Identity and session management
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// The user behind the active session, if any
    async fn get_user(&self) -> StoreResult<Option<AuthUser>>;

    /// Authorization URL to send the user to, or `None` when sign-in is impossible
    fn authorize_url(&self, request: &OAuthRequest) -> StoreResult<Option<String>>;

    /// Trade an authorization code for a session and make it active
    async fn exchange_code(&self, auth_code: &str, code_verifier: &str)
    -> StoreResult<AuthSession>;

    /// Trade a refresh token for a new session and make it active
    async fn refresh_session(&self, refresh_token: &str) -> StoreResult<AuthSession>;

    /// Make an existing session active
    async fn set_session(&self, session: AuthSession) -> StoreResult<()>;

    /// Drop the active session
    async fn sign_out(&self) -> StoreResult<()>;

    /// Register a listener for auth state changes
    fn on_auth_state_change(&self, callback: AuthCallback) -> Subscription;
}

/// A complete backend: storage, realtime and auth behind one handle
pub trait Backend: RemoteStore + AuthBackend {
    /// Whether this backend persists anything
    fn is_configured(&self) -> bool;
}
