//! Session lifecycle management for Tether.
//!
//! A client holds exactly one thing that identifies it to the server: an
//! opaque [`SessionKey`]. This crate owns everything that key can point at:
//!
//! 1. **Issuing**: a fresh key maps to a *pending* session that expires
//!    after [`SessionConfig::pending_ttl`] unless it is promoted.
//! 2. **Promotion**: binding a pending key to a [`Bot`] replaces the pending
//!    session with an *authenticated* one under the same key.
//! 3. **Teardown**: explicit close, expiry, or server shutdown removes the
//!    session; a removed key never comes back on its own.
//!
//! # How it fits in the stack
//!
//! ```text
//! Router (above)   ← reads sessions to gate and run commands
//!     ↕
//! Session Layer (this crate)  ← the only writer of the session store
//!     ↕
//! Protocol Layer (below)  ← provides StatusCode for the bind/verify boundary
//! ```

#![allow(async_fn_in_trait)]

mod bot;
mod error;
mod expiry;
mod manager;
mod session;
mod store;

pub use bot::{Bot, BotProvider};
pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{AuthedSession, PendingSession, Session, SessionConfig, SessionKey};
pub use store::SessionStore;
