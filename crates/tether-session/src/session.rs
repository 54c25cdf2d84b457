//! Session types: what a session key can point at.
//!
//! A session is in exactly one of two shapes:
//!
//! ```text
//!   Pending ──(promote)──→ Authenticated
//!      │                        │
//!   (expire / close)         (close)
//!      ▼                        ▼
//!   [removed]               [removed, bot released]
//! ```
//!
//! Promotion does not mutate a session in place. The manager stores a new
//! [`AuthedSession`] under the same key and closes the pending one, so any
//! holder of the old `Arc` sees a closed pending session, never a
//! half-promoted one.

use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::task::AbortHandle;

use crate::Bot;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a pending session may wait for promotion before it is
    /// closed and evicted. Default: 180 seconds.
    pub pending_ttl: Duration,

    /// Shared secret a client must present to `verify`. `None` turns
    /// verification off and any presented key is accepted.
    pub verify_key: Option<String>,
}

impl SessionConfig {
    /// The default pending-session lifetime.
    pub const DEFAULT_PENDING_TTL: Duration = Duration::from_secs(180);

    /// Sets the pending-session lifetime.
    pub fn with_pending_ttl(mut self, ttl: Duration) -> Self {
        self.pending_ttl = ttl;
        self
    }

    /// Requires clients to present `key` when verifying.
    pub fn with_verify_key(mut self, key: impl Into<String>) -> Self {
        self.verify_key = Some(key.into());
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pending_ttl: Self::DEFAULT_PENDING_TTL,
            verify_key: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionKey
// ---------------------------------------------------------------------------

/// The opaque token a client uses to name its session.
///
/// Keys are 32 lowercase hex characters (128 random bits), so guessing a
/// live key is infeasible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(String);

impl SessionKey {
    /// Generates a fresh random key.
    pub(crate) fn generate() -> Self {
        let bytes: [u8; 16] = rand::rng().random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Returns the key as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for SessionKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

// ---------------------------------------------------------------------------
// PendingSession
// ---------------------------------------------------------------------------

/// A session issued before authentication. It is time-limited: its expiry
/// timer closes it unless promotion or an explicit close gets there first.
pub struct PendingSession {
    key: SessionKey,
    created_at: Instant,
    expiry: OnceLock<AbortHandle>,
    closed: AtomicBool,
}

impl PendingSession {
    pub(crate) fn new(key: SessionKey) -> Self {
        Self {
            key,
            created_at: Instant::now(),
            expiry: OnceLock::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// The key this session is stored under.
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// When the session was issued.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Returns `true` once the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Hands the session its expiry timer. A session closed before the
    /// timer arrives cancels it on the spot.
    pub(crate) fn attach_expiry(&self, timer: AbortHandle) {
        if let Err(extra) = self.expiry.set(timer) {
            tracing::warn!(key = %self.key, "expiry timer attached twice");
            extra.abort();
            return;
        }
        if self.is_closed() {
            self.cancel_expiry();
        }
    }

    fn cancel_expiry(&self) {
        if let Some(timer) = self.expiry.get() {
            timer.abort();
        }
    }

    /// Returns `true` if this call closed the session.
    fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.cancel_expiry();
        true
    }
}

impl fmt::Debug for PendingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSession")
            .field("key", &self.key)
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// AuthedSession
// ---------------------------------------------------------------------------

/// A session bound to a backend bot. Not time-limited; it lives until it
/// is closed, and closing it releases the bot.
pub struct AuthedSession<B: Bot> {
    key: SessionKey,
    created_at: Instant,
    bot: B,
    closed: AtomicBool,
}

impl<B: Bot> AuthedSession<B> {
    pub(crate) fn new(key: SessionKey, bot: B) -> Self {
        Self {
            key,
            created_at: Instant::now(),
            bot,
            closed: AtomicBool::new(false),
        }
    }

    /// The key this session is stored under.
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// When the session was authenticated.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// The bot this session acts as.
    pub fn bot(&self) -> &B {
        &self.bot
    }

    /// Returns `true` once the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Returns `true` if this call closed the session.
    fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.bot.release();
        true
    }
}

impl<B: Bot> fmt::Debug for AuthedSession<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthedSession")
            .field("key", &self.key)
            .field("account", &self.bot.account())
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Any session the store can hold.
pub enum Session<B: Bot> {
    /// Issued, not yet authenticated.
    Pending(PendingSession),
    /// Bound to a bot.
    Authenticated(AuthedSession<B>),
}

impl<B: Bot> Session<B> {
    /// The key this session is stored under.
    pub fn key(&self) -> &SessionKey {
        match self {
            Self::Pending(s) => s.key(),
            Self::Authenticated(s) => s.key(),
        }
    }

    /// When this session object was created.
    pub fn created_at(&self) -> Instant {
        match self {
            Self::Pending(s) => s.created_at(),
            Self::Authenticated(s) => s.created_at(),
        }
    }

    /// Returns `true` for a bound session, closed or not.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Returns `true` once the session has been closed.
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Pending(s) => s.is_closed(),
            Self::Authenticated(s) => s.is_closed(),
        }
    }

    /// The authenticated view of this session, if it is bound and still
    /// open. Closed sessions never hand out their bot.
    pub fn as_authenticated(&self) -> Option<&AuthedSession<B>> {
        match self {
            Self::Authenticated(s) if !s.is_closed() => Some(s),
            _ => None,
        }
    }

    /// Closes the session's own resources: a pending session cancels its
    /// timer, an authenticated one releases its bot. Idempotent; returns
    /// `true` only for the call that actually closed it.
    pub(crate) fn close(&self) -> bool {
        match self {
            Self::Pending(s) => s.close(),
            Self::Authenticated(s) => s.close(),
        }
    }

    pub(crate) fn attach_expiry(&self, timer: AbortHandle) {
        match self {
            Self::Pending(s) => s.attach_expiry(timer),
            Self::Authenticated(_) => timer.abort(),
        }
    }
}

impl<B: Bot> fmt::Debug for Session<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending(s) => s.fmt(f),
            Self::Authenticated(s) => s.fmt(f),
        }
    }
}
