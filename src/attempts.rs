//! Sign-in attempt limiting, scoped to one login-view lifetime.
//!
//! DESIGN
//! ======
//! `Arc<Mutex<HashMap>>` keyed by the view token minted when the login form
//! renders. Once a view accumulates `max` failures, further submissions are
//! rejected before any identity-provider contact. A fresh view (page reload)
//! gets a fresh token and therefore a fresh counter; sign-out clears
//! everything. Entries expire an hour after their last failure so abandoned
//! views do not pin memory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const DEFAULT_MAX_ATTEMPTS: usize = 5;
const ENTRY_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("too many failed attempts (max {max})")]
    Blocked { max: usize },
}

#[derive(Clone)]
pub struct LoginAttempts {
    inner: Arc<Mutex<HashMap<String, AttemptEntry>>>,
    max: usize,
}

struct AttemptEntry {
    count: usize,
    last_failure: Instant,
}

impl LoginAttempts {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max: crate::config::env_parse("MAX_LOGIN_ATTEMPTS", DEFAULT_MAX_ATTEMPTS),
        }
    }

    /// Reject the submission when the view is saturated. Called before any
    /// identity-provider contact.
    ///
    /// # Errors
    ///
    /// Returns [`AttemptError::Blocked`] once the view has `max` failures.
    pub fn check(&self, view_id: &str) -> Result<(), AttemptError> {
        self.check_at(view_id, Instant::now())
    }

    fn check_at(&self, view_id: &str, now: Instant) -> Result<(), AttemptError> {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        prune(&mut inner, now);
        match inner.get(view_id) {
            Some(entry) if entry.count >= self.max => Err(AttemptError::Blocked { max: self.max }),
            _ => Ok(()),
        }
    }

    /// Record one failed submission, returning the new count.
    pub fn record_failure(&self, view_id: &str) -> usize {
        self.record_failure_at(view_id, Instant::now())
    }

    fn record_failure_at(&self, view_id: &str, now: Instant) -> usize {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        prune(&mut inner, now);
        let entry = inner
            .entry(view_id.to_owned())
            .or_insert(AttemptEntry { count: 0, last_failure: now });
        entry.count += 1;
        entry.last_failure = now;
        entry.count
    }

    /// Forget a view's failures (successful sign-in or view teardown).
    pub fn reset(&self, view_id: &str) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.remove(view_id);
    }

    /// Forget every view (sign-out).
    pub fn reset_all(&self) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.clear();
    }

    #[must_use]
    pub fn max(&self) -> usize {
        self.max
    }
}

impl Default for LoginAttempts {
    fn default() -> Self {
        Self::new()
    }
}

fn prune(map: &mut HashMap<String, AttemptEntry>, now: Instant) {
    map.retain(|_, entry| now.duration_since(entry.last_failure) <= ENTRY_TTL);
}

#[cfg(test)]
#[path = "attempts_test.rs"]
mod tests;
