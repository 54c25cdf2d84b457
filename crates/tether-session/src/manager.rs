//! The session manager: the only component that writes to the store.
//!
//! It is responsible for:
//! - Issuing pending sessions and starting their expiry timers
//! - Promoting a key to an authenticated session bound to a bot
//! - Closing one session, or all of them at shutdown
//! - Checking the verify key presented by a client
//!
//! Every operation is total. A missing session is reported as `None` from
//! [`get`](SessionManager::get), never as an error, so the router can
//! answer "unauthenticated" without treating it as a fault.
//!
//! # Concurrency
//!
//! `SessionManager` is `Send + Sync` and is shared by `Arc` between every
//! connection task. All state lives in the [`SessionStore`], whose lock is
//! held for one map operation at a time. Sessions are closed *after* they
//! leave the store, outside the lock, so a bot's `release` hook never runs
//! while other connections wait on the map.

use std::sync::Arc;

use crate::expiry::ExpiryScheduler;
use crate::{
    AuthedSession, Bot, PendingSession, Session, SessionConfig, SessionError, SessionKey,
    SessionStore,
};

/// Manages the lifecycle of every session on the server.
///
/// ## Lifecycle
///
/// ```text
/// create_pending() ──→ [Pending] ──promote()──→ [Authenticated]
///                          │                         │
///               (pending_ttl elapsed)             close()
///                       close()                      │
///                          ▼                         ▼
///                      [removed]                 [removed]
/// ```
pub struct SessionManager<B: Bot> {
    store: Arc<SessionStore<B>>,
    expiry: ExpiryScheduler,
    config: SessionConfig,
}

impl<B: Bot> SessionManager<B> {
    /// Creates a manager with an empty store.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            store: Arc::new(SessionStore::new()),
            expiry: ExpiryScheduler::new(config.pending_ttl),
            config,
        }
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Checks a client's verify key against the configured one.
    ///
    /// With no key configured every client passes.
    ///
    /// # Errors
    /// [`SessionError::AuthKeyFail`] if a key is configured and `presented`
    /// is missing or different.
    pub fn verify_key(&self, presented: Option<&str>) -> Result<(), SessionError> {
        match self.config.verify_key.as_deref() {
            None => Ok(()),
            Some(expected) if presented == Some(expected) => Ok(()),
            Some(_) => Err(SessionError::AuthKeyFail),
        }
    }

    /// Issues a new pending session and returns its key.
    ///
    /// The session closes itself after `pending_ttl` unless it is promoted
    /// or closed first. Must be called inside a Tokio runtime, since the
    /// expiry timer is a spawned task.
    pub fn create_pending(&self) -> SessionKey {
        // A collision on 128 random bits is not expected, but the store
        // would reject it rather than overwrite a live session.
        let session = loop {
            let candidate = Arc::new(Session::Pending(PendingSession::new(SessionKey::generate())));
            if self.store.insert_vacant(Arc::clone(&candidate)) {
                break candidate;
            }
        };

        let timer = self.expiry.schedule(&self.store, &session);
        session.attach_expiry(timer);

        let key = session.key().clone();
        let ttl_secs = self.config.pending_ttl.as_secs();
        tracing::info!(%key, ttl_secs, "pending session issued");
        key
    }

    /// Stores an authenticated session bound to `bot` under `key`.
    ///
    /// Whatever was stored under `key` before (pending or authenticated) is
    /// displaced in the same lock acquisition and then closed, which cancels
    /// a pending session's timer or releases a previous bot. A key with no
    /// current session still gets the new authenticated session; see
    /// [`promote_live`](Self::promote_live) for the variant that refuses.
    pub fn promote(&self, bot: B, key: &SessionKey) -> SessionKey {
        let account = bot.account();
        let session = Arc::new(Session::Authenticated(AuthedSession::new(key.clone(), bot)));

        if let Some(previous) = self.store.replace(session) {
            retire(&previous);
        }

        tracing::info!(%key, account, "session authenticated");
        key.clone()
    }

    /// Like [`promote`](Self::promote), but only while `key` still holds a
    /// session. The check and the swap share one lock acquisition, so a key
    /// whose pending window runs out mid-bind stays gone.
    ///
    /// # Errors
    /// [`SessionError::IllegalSession`] if `key` expired, was closed, or was
    /// never issued. `bot` is dropped without being released.
    pub fn promote_live(&self, bot: B, key: &SessionKey) -> Result<SessionKey, SessionError> {
        let account = bot.account();
        let session = Arc::new(Session::Authenticated(AuthedSession::new(key.clone(), bot)));

        let previous = self
            .store
            .replace_occupied(session)
            .ok_or_else(|| SessionError::IllegalSession(key.to_string()))?;
        retire(&previous);

        tracing::info!(%key, account, "session authenticated");
        Ok(key.clone())
    }

    /// Looks up the session stored under `key`.
    pub fn get(&self, key: &SessionKey) -> Option<Arc<Session<B>>> {
        self.store.get(key)
    }

    /// Closes and removes the session under `key`. Closing an unknown key
    /// is a no-op.
    pub fn close(&self, key: &SessionKey) {
        if let Some(session) = self.store.remove(key) {
            if session.close() {
                tracing::info!(%key, authenticated = session.is_authenticated(), "session closed");
            }
        }
    }

    /// Closes every session. Used at shutdown.
    pub fn close_all(&self) {
        let sessions = self.store.drain();
        let count = sessions.len();
        for session in sessions {
            session.close();
        }
        tracing::info!(count, "all sessions closed");
    }

    /// Number of live sessions, pending and authenticated.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

fn retire<B: Bot>(previous: &Session<B>) {
    let was_pending = !previous.is_authenticated();
    previous.close();
    tracing::debug!(key = %previous.key(), was_pending, "closed session displaced by promotion");
}

// =========================================================================
// Tests
// =========================================================================
