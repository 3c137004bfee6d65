//! In-memory backend for planner integration tests

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use common::{
    AuthBackend, AuthCallback, AuthEvent, AuthSession, AuthUser, Backend, BackendConfig,
    ChangeCallback, ChangeEvent, ChangePayload, ChannelSpec, OAuthRequest, Query, RemoteStore,
    StoreError, StoreResult, Subscription, listeners::AuthListeners,
};
use planner::AppState;
use serde_json::Value;
use tokio::sync::Notify;

/// Table rows, realtime channels and one optional signed-in user
#[derive(Default)]
pub struct FakeBackend {
    user: Mutex<Option<AuthUser>>,
    rows: Mutex<HashMap<String, Vec<Value>>>,
    calls: Mutex<Vec<String>>,
    next_id: AtomicU64,
    fail_selects: AtomicBool,
    fail_inserts: AtomicBool,
    fail_updates: AtomicBool,
    fail_subscribes: AtomicBool,
    insert_gate: Mutex<Option<Arc<Notify>>>,
    select_gate: Mutex<Option<Arc<Notify>>>,
    channels: Mutex<Vec<(ChannelSpec, ChangeCallback)>>,
    open_channels: Arc<AtomicUsize>,
    listeners: AuthListeners,
}

impl FakeBackend {
    pub fn signed_in(user_id: &str) -> Arc<Self> {
        let backend = Self::default();
        *backend.user.lock().unwrap() = Some(AuthUser::new(user_id));
        Arc::new(backend)
    }

    pub fn signed_out() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_selects(&self) {
        self.fail_selects.store(true, Ordering::SeqCst);
    }

    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }

    pub fn fail_subscribes(&self) {
        self.fail_subscribes.store(true, Ordering::SeqCst);
    }

    /// Hold every insert until the returned gate is notified
    pub fn hold_inserts(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.insert_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Hold selects after they read their rows, until the gate is notified
    pub fn hold_selects(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.select_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Let later selects through; already held ones keep waiting
    pub fn release_selects(&self) {
        *self.select_gate.lock().unwrap() = None;
    }

    pub fn seed(&self, table: &str, row: Value) {
        self.rows
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.rows
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn open_channels(&self) -> usize {
        self.open_channels.load(Ordering::SeqCst)
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels
            .lock()
            .unwrap()
            .iter()
            .map(|(spec, _)| spec.name.clone())
            .collect()
    }

    /// Deliver a change on every channel of `table`
    pub fn emit_change(&self, table: &str, event: ChangeEvent) {
        let callbacks: Vec<ChangeCallback> = self
            .channels
            .lock()
            .unwrap()
            .iter()
            .filter(|(spec, _)| spec.table == table)
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(ChangePayload {
                event,
                table: table.to_string(),
                record: None,
                old_record: None,
                commit_timestamp: None,
            });
        }
    }

    pub fn switch_user(&self, user_id: Option<&str>) {
        let session = user_id.map(|id| AuthSession {
            access_token: format!("access-{}", id),
            refresh_token: format!("refresh-{}", id),
            expires_at: None,
            user: AuthUser::new(id),
        });
        *self.user.lock().unwrap() = session.as_ref().map(|s| s.user.clone());

        match &session {
            Some(session) => self.listeners.emit(AuthEvent::SignedIn, Some(session)),
            None => self.listeners.emit(AuthEvent::SignedOut, None),
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn matches(row: &Value, query: &Query) -> bool {
        query
            .filters()
            .iter()
            .all(|(column, expected)| match row.get(column) {
                Some(Value::String(value)) => value == expected,
                Some(value) => value.to_string() == *expected,
                None => false,
            })
    }

    fn sort_key(row: &Value, column: &str) -> String {
        match row.get(column) {
            Some(Value::String(value)) => value.clone(),
            Some(value) => value.to_string(),
            None => String::new(),
        }
    }
}

fn failure(what: &str) -> StoreError {
    StoreError::Status {
        status: 503,
        message: format!("{} unavailable", what),
    }
}

#[async_trait]
impl RemoteStore for FakeBackend {
    async fn select(&self, query: &Query) -> StoreResult<Vec<Value>> {
        self.record(format!("select {}", query));
        if self.fail_selects.load(Ordering::SeqCst) {
            return Err(failure("select"));
        }

        let mut rows: Vec<Value> = self
            .rows(query.table())
            .into_iter()
            .filter(|row| Self::matches(row, query))
            .collect();

        if let Some(order) = query.ordering() {
            rows.sort_by_key(|row| Self::sort_key(row, order.column));
            if !order.ascending {
                rows.reverse();
            }
        }

        let gate = self.select_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Value) -> StoreResult<Option<Value>> {
        let gate = self.insert_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.record(format!("insert {}", table));
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(failure("insert"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(fields) = row.as_object_mut() {
            fields.insert("id".to_string(), Value::String(format!("srv-{}", id)));
            fields.insert(
                "created_at".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
        self.seed(table, row.clone());
        Ok(Some(row))
    }

    async fn update(&self, query: &Query, patch: Value) -> StoreResult<Option<Value>> {
        self.record(format!("update {}", query));
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(failure("update"));
        }

        let mut rows = self.rows.lock().unwrap();
        let mut updated = None;
        for row in rows.entry(query.table().to_string()).or_default() {
            if !Self::matches(row, query) {
                continue;
            }
            if let (Some(fields), Some(changes)) = (row.as_object_mut(), patch.as_object()) {
                for (key, value) in changes {
                    fields.insert(key.clone(), value.clone());
                }
            }
            updated.get_or_insert_with(|| row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, query: &Query) -> StoreResult<()> {
        self.record(format!("delete {}", query));
        self.rows
            .lock()
            .unwrap()
            .entry(query.table().to_string())
            .or_default()
            .retain(|row| !Self::matches(row, query));
        Ok(())
    }

    async fn subscribe(
        &self,
        channel: ChannelSpec,
        on_change: ChangeCallback,
    ) -> StoreResult<Subscription> {
        self.record(format!("subscribe {}", channel.name));
        if self.fail_subscribes.load(Ordering::SeqCst) {
            return Err(StoreError::Realtime("channel rejected".to_string()));
        }

        let name = channel.name.clone();
        self.channels.lock().unwrap().push((channel, on_change));

        let open = Arc::clone(&self.open_channels);
        open.fetch_add(1, Ordering::SeqCst);
        Ok(Subscription::new(name, move || {
            open.fetch_sub(1, Ordering::SeqCst);
        }))
    }
}

#[async_trait]
impl AuthBackend for FakeBackend {
    async fn get_user(&self) -> StoreResult<Option<AuthUser>> {
        self.record("get_user".to_string());
        Ok(self.user.lock().unwrap().clone())
    }

    fn authorize_url(&self, request: &OAuthRequest) -> StoreResult<Option<String>> {
        Ok(Some(format!(
            "https://backend.test/auth/v1/authorize?provider={}",
            request.provider
        )))
    }

    async fn exchange_code(
        &self,
        _auth_code: &str,
        _code_verifier: &str,
    ) -> StoreResult<AuthSession> {
        Err(StoreError::NoSession)
    }

    async fn refresh_session(&self, _refresh_token: &str) -> StoreResult<AuthSession> {
        Err(StoreError::NoSession)
    }

    async fn set_session(&self, session: AuthSession) -> StoreResult<()> {
        *self.user.lock().unwrap() = Some(session.user.clone());
        self.listeners.emit(AuthEvent::SignedIn, Some(&session));
        Ok(())
    }

    async fn sign_out(&self) -> StoreResult<()> {
        self.switch_user(None);
        Ok(())
    }

    fn on_auth_state_change(&self, callback: AuthCallback) -> Subscription {
        self.listeners.register(callback)
    }
}

impl Backend for FakeBackend {
    fn is_configured(&self) -> bool {
        true
    }
}

pub async fn app(backend: Arc<FakeBackend>) -> AppState {
    AppState::with_backend(BackendConfig::default(), backend).await
}
