//! The session store: a concurrency-safe map from key to session.
//!
//! The store only holds sessions. It never closes one; whoever removes or
//! displaces a session gets it back and is responsible for closing it.
//! Every method takes the lock for a single map operation and never
//! across an `.await`, so connection tasks and expiry timers can share it
//! freely.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Bot, Session, SessionKey};

/// Keyed registry of live sessions.
pub struct SessionStore<B: Bot> {
    sessions: Mutex<HashMap<SessionKey, Arc<Session<B>>>>,
}

impl<B: Bot> SessionStore<B> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Inserts `session` only if its key is free. Returns `false` when the
    /// key is already taken, leaving the existing session untouched.
    pub fn insert_vacant(&self, session: Arc<Session<B>>) -> bool {
        match self.sessions.lock().entry(session.key().clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(session);
                true
            }
        }
    }

    /// Stores `session` under its key, returning whatever it displaced.
    pub fn replace(&self, session: Arc<Session<B>>) -> Option<Arc<Session<B>>> {
        self.sessions.lock().insert(session.key().clone(), session)
    }

    /// Stores `session` only if its key is already occupied, returning the
    /// session it displaced. A free key is left free and `session` is
    /// dropped unstored.
    pub fn replace_occupied(&self, session: Arc<Session<B>>) -> Option<Arc<Session<B>>> {
        match self.sessions.lock().entry(session.key().clone()) {
            Entry::Occupied(mut slot) => Some(slot.insert(session)),
            Entry::Vacant(_) => None,
        }
    }

    /// Looks up the session currently stored under `key`.
    pub fn get(&self, key: &SessionKey) -> Option<Arc<Session<B>>> {
        self.sessions.lock().get(key).cloned()
    }

    /// Removes and returns the session under `key`.
    pub fn remove(&self, key: &SessionKey) -> Option<Arc<Session<B>>> {
        self.sessions.lock().remove(key)
    }

    /// Removes the session under `key` only if `still_current` approves it.
    ///
    /// The check and the removal happen under one lock acquisition, so no
    /// replacement can slip in between them.
    pub fn remove_if(
        &self,
        key: &SessionKey,
        still_current: impl FnOnce(&Arc<Session<B>>) -> bool,
    ) -> Option<Arc<Session<B>>> {
        let mut sessions = self.sessions.lock();
        match sessions.get(key) {
            Some(current) if still_current(current) => sessions.remove(key),
            _ => None,
        }
    }

    /// Removes and returns every session.
    pub fn drain(&self) -> Vec<Arc<Session<B>>> {
        self.sessions.lock().drain().map(|(_, session)| session).collect()
    }

    /// Number of stored sessions, pending and authenticated.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Returns `true` if no sessions are stored.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

impl<B: Bot> Default for SessionStore<B> {
    fn default() -> Self {
        Self::new()
    }
}
