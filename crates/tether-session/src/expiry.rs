//! Deferred close for pending sessions.
//!
//! Each pending session gets one timer task at creation. When it fires it
//! removes the session only if the store still holds *that same* session
//! object under the key. Promotion and explicit close both replace or
//! remove the object first, so a late timer finds something else (or
//! nothing) and does nothing.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::AbortHandle;

use crate::{Bot, Session, SessionStore};

/// Spawns expiry timers for pending sessions.
#[derive(Debug, Clone)]
pub(crate) struct ExpiryScheduler {
    ttl: Duration,
}

impl ExpiryScheduler {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Starts the timer for `session`. Must be called inside a Tokio runtime.
    ///
    /// The task holds only weak references: a dropped store or a session
    /// that nobody else holds cannot be kept alive by its own timer. The
    /// `Weak` to the session also pins its allocation, so the pointer
    /// comparison below cannot match a newer session reusing the address.
    pub(crate) fn schedule<B: Bot>(
        &self,
        store: &Arc<SessionStore<B>>,
        session: &Arc<Session<B>>,
    ) -> AbortHandle {
        let store = Arc::downgrade(store);
        let target = Arc::downgrade(session);
        let key = session.key().clone();
        let ttl = self.ttl;

        let task = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;

            let Some(store) = store.upgrade() else {
                return;
            };
            let expired = store.remove_if(&key, |current| {
                Weak::ptr_eq(&Arc::downgrade(current), &target)
            });
            if let Some(session) = expired {
                if session.close() {
                    tracing::info!(%key, "pending session expired");
                }
            }
        });
        task.abort_handle()
    }
}
