//! Process-wide session context
//!
//! One context is created at start-up and handed to every page
//! controller, so the app holds a single auth-state subscription instead
//! of one per page.

use std::sync::{Arc, Mutex, PoisonError};

use common::{AuthUser, GUEST_USER_ID, Subscription};
use tokio::sync::watch;
use tracing::info;

use crate::service::AuthService;

struct SessionInner {
    auth: AuthService,
    current: Arc<watch::Sender<Option<AuthUser>>>,
    listener: Mutex<Option<Subscription>>,
}

/// Shared view of the signed-in user
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

impl SessionContext {
    /// Fetch the initial user and start following auth state changes
    pub async fn init(auth: AuthService) -> Self {
        let (sender, _receiver) = watch::channel(None);
        let current = Arc::new(sender);

        // Listen before the initial fetch so a sign-in racing it is not lost.
        let sink = Arc::clone(&current);
        let listener = auth.on_auth_state_change(Arc::new(move |event, session| {
            let user = session.map(|s| s.user.clone());
            info!(
                "Auth state changed: {:?}, user: {}",
                event,
                user.as_ref().map(|u| u.id.as_str()).unwrap_or("none")
            );
            sink.send_replace(user);
        }));

        let initial = auth.get_current_user().await;
        current.send_if_modified(|user| {
            if user.is_none() && initial.is_some() {
                *user = initial;
                true
            } else {
                false
            }
        });

        info!(
            "Session context initialized, user: {}",
            current
                .borrow()
                .as_ref()
                .map(|u| u.id.as_str())
                .unwrap_or("none")
        );

        Self {
            inner: Arc::new(SessionInner {
                auth,
                current,
                listener: Mutex::new(Some(listener)),
            }),
        }
    }

    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// The signed-in user, if any
    pub fn current_user(&self) -> Option<AuthUser> {
        self.inner.current.borrow().clone()
    }

    /// Identifier to stamp on locally created records
    pub fn owner_id(&self) -> String {
        self.current_user()
            .map(|u| u.id)
            .unwrap_or_else(|| GUEST_USER_ID.to_string())
    }

    /// Follow changes of the signed-in user
    pub fn watch(&self) -> watch::Receiver<Option<AuthUser>> {
        self.inner.current.subscribe()
    }

    /// Whether the context still follows auth state changes
    pub fn is_active(&self) -> bool {
        self.inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stop following auth state changes
    pub fn teardown(&self) {
        let listener = self
            .inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(listener) = listener {
            listener.unsubscribe();
            info!("Session context torn down");
        }
    }
}
