//! Session state holder — the single owner of "who is signed in".
//!
//! DESIGN
//! ======
//! State lives inside a `tokio::sync::watch` channel so every mutation is
//! also a notification to dependents. `sign_in` never touches `user`
//! directly: it funnels the provider result through `notify`, the same path
//! every other auth-state transition takes, so ordering is last-writer-wins
//! however the async interleaving falls out.
//!
//! The holder also carries a small key-value scratch tied to the session
//! (the dashboard caches its last listing pass there); `sign_out` wipes it
//! after the provider confirms termination.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::services::identity::{IdentityError, IdentityProvider, Session, User};

/// Auth state transition kinds, mirroring the provider's notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Observable session state. `loading` is true only between construction
/// and the first write.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
}

impl SessionState {
    fn initial() -> Self {
        Self { user: None, loading: true }
    }
}

#[derive(Clone)]
pub struct SessionHolder {
    tx: Arc<watch::Sender<SessionState>>,
    local: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl SessionHolder {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::initial());
        Self { tx: Arc::new(tx), local: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Subscribe to state transitions. Dropping the returned subscription
    /// detaches it from the holder.
    #[must_use]
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription { rx: self.tx.subscribe() }
    }

    /// Apply an auth state transition. Always clears `loading`; a `None`
    /// session clears `user` whatever the event was.
    pub fn notify(&self, event: AuthEvent, session: Option<&Session>) {
        let user = session.map(|s| s.user.clone());
        let signed_in = user.is_some();
        self.tx.send_modify(|state| {
            state.user = user;
            state.loading = false;
        });
        tracing::debug!(?event, signed_in, "auth state change");
    }

    /// One startup query against the identity provider. `loading` is cleared
    /// regardless of outcome. A notification may land while the query is in
    /// flight; whichever write applies last wins.
    pub async fn initialize(&self, provider: &dyn IdentityProvider, stored_token: Option<&str>) {
        let user = match stored_token {
            Some(token) => match provider.get_user(token).await {
                Ok(user) => user,
                Err(error) => {
                    tracing::error!(%error, "initial session check failed");
                    None
                }
            },
            None => None,
        };
        self.tx.send_modify(|state| {
            state.user = user;
            state.loading = false;
        });
    }

    /// Submit credentials. On success the state change arrives through
    /// [`SessionHolder::notify`], never as a direct mutation — callers must
    /// not assume `user` is set synchronously with the returned session.
    ///
    /// # Errors
    ///
    /// Provider denials and faults come back as an opaque
    /// [`IdentityError`]; nothing is thrown past this boundary.
    pub async fn sign_in(
        &self,
        provider: &dyn IdentityProvider,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let session = provider.sign_in_with_password(email, password).await?;
        self.notify(AuthEvent::SignedIn, Some(&session));
        Ok(session)
    }

    /// Terminate the provider session, then wipe the local scratch.
    /// Returns once both have completed.
    pub async fn sign_out(&self, provider: &dyn IdentityProvider, access_token: &str) {
        if let Err(error) = provider.sign_out(access_token).await {
            tracing::warn!(%error, "provider sign-out failed; clearing local state anyway");
        }
        self.notify(AuthEvent::SignedOut, None);
        self.clear_local().await;
    }

    // =========================================================================
    // LOCAL SCRATCH
    // =========================================================================

    /// Store a session-scoped value.
    pub async fn put_local(&self, key: &str, value: serde_json::Value) {
        self.local.write().await.insert(key.to_owned(), value);
    }

    pub async fn get_local(&self, key: &str) -> Option<serde_json::Value> {
        self.local.read().await.get(key).cloned()
    }

    pub async fn clear_local(&self) {
        self.local.write().await.clear();
    }
}

impl Default for SessionHolder {
    fn default() -> Self {
        Self::new()
    }
}

/// Watch-backed auth-state subscription. Dropping it unsubscribes.
pub struct AuthSubscription {
    rx: watch::Receiver<SessionState>,
}

impl AuthSubscription {
    /// Current state as seen by this subscriber.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    /// Wait for the next transition. Returns `None` once the holder is gone.
    pub async fn changed(&mut self) -> Option<SessionState> {
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
