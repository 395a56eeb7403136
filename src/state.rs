//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into axum handlers via the `State` extractor. The
//! identity and storage collaborators sit behind trait objects so route and
//! service tests can swap in fakes. The session holder is the one explicit
//! session context for the process: created here at startup, torn down with
//! the process or on sign-out — never ambient global state.

use std::sync::Arc;

use crate::attempts::LoginAttempts;
use crate::services::identity::IdentityProvider;
use crate::services::listing::ListingConfig;
use crate::services::session::SessionHolder;
use crate::services::storage::StorageProvider;

/// Shared application state. Clone is required by axum — all inner fields
/// are Arc-backed or cheap.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub storage: Arc<dyn StorageProvider>,
    pub session: SessionHolder,
    pub attempts: LoginAttempts,
    pub listing: ListingConfig,
}

impl AppState {
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>, storage: Arc<dyn StorageProvider>) -> Self {
        Self {
            identity,
            storage,
            session: SessionHolder::new(),
            attempts: LoginAttempts::new(),
            listing: ListingConfig::from_env(),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
