//! Registry of auth state listeners

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::store::{AuthCallback, AuthEvent, AuthSession, Subscription};

/// Listeners registered through `on_auth_state_change`
#[derive(Clone, Default)]
pub struct AuthListeners {
    next_id: Arc<AtomicU64>,
    entries: Arc<Mutex<HashMap<u64, AuthCallback>>>,
}

impl AuthListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; the returned handle removes it again
    pub fn register(&self, callback: AuthCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, callback);

        let entries = Arc::clone(&self.entries);
        Subscription::new(format!("auth:{}", id), move || {
            entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);
        })
    }

    /// Notify every listener
    pub fn emit(&self, event: AuthEvent, session: Option<&AuthSession>) {
        // Callbacks run outside the lock so they may register or unregister.
        let callbacks: Vec<AuthCallback> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        debug!("Emitting {:?} to {} auth listeners", event, callbacks.len());
        for callback in callbacks {
            callback(event, session);
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
