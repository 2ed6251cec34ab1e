//! Session continuity for remote agents.
//!
//! A [`SessionStore`] owns the opaque session id a remote service uses to tie
//! consecutive turns together. It is seeded from configuration and replaced by
//! the first non-empty id the service reports back.

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handle to the current session id.
///
/// Cloning the store shares the underlying id.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    current: Arc<RwLock<Option<String>>>,
}

impl SessionStore {
    /// Creates a store seeded with a configured session id.
    ///
    /// Blank ids are treated as "no session".
    pub fn new(initial: Option<String>) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial.filter(|id| !id.trim().is_empty()))),
        }
    }

    /// Returns the session id to send with the next request, if any.
    pub async fn get(&self) -> Option<String> {
        self.current.read().await.clone()
    }

    /// Records a session id observed in a response.
    ///
    /// Returns `true` when the stored id changed. Blank ids are ignored so a
    /// known session is never forgotten.
    pub async fn set(&self, session_id: &str) -> bool {
        if session_id.trim().is_empty() {
            return false;
        }

        let mut current = self.current.write().await;
        if current.as_deref() == Some(session_id) {
            return false;
        }

        tracing::info!("Session changed: {:?} -> {}", current.as_deref(), session_id);
        *current = Some(session_id.to_string());
        true
    }

    /// Forgets the current session so the service opens a new one.
    pub async fn clear(&self) {
        *self.current.write().await = None;
    }
}
