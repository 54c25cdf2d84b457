//! The backend binding an authenticated session owns.
//!
//! Tether does not implement a bot. The backend supplies two things:
//!
//! - a [`Bot`] handle, which an authenticated session takes ownership of,
//! - a [`BotProvider`], which finds the handle for an account during `bind`.

use std::future::Future;

use crate::SessionError;

/// A handle to one backend actor.
///
/// The session that owns the handle calls [`release`](Self::release)
/// exactly once, when the session closes. After that the session no longer
/// hands the bot out to anyone.
pub trait Bot: Send + Sync + 'static {
    /// The account number this bot acts as.
    fn account(&self) -> i64;

    /// Releases whatever the binding holds. Called once per binding.
    fn release(&self) {}
}

/// Resolves bot handles by account number.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use tether_session::{Bot, BotProvider, SessionError};
///
/// #[derive(Clone)]
/// struct StaticBot(i64);
///
/// impl Bot for StaticBot {
///     fn account(&self) -> i64 {
///         self.0
///     }
/// }
///
/// struct Fleet(HashMap<i64, StaticBot>);
///
/// impl BotProvider for Fleet {
///     type Bot = StaticBot;
///
///     async fn find_bot(&self, account: i64) -> Result<StaticBot, SessionError> {
///         self.0.get(&account).cloned().ok_or(SessionError::NoBot(account))
///     }
/// }
/// ```
pub trait BotProvider: Send + Sync + 'static {
    /// The handle type this provider produces.
    type Bot: Bot;

    /// Returns a fresh binding for `account`.
    ///
    /// # Errors
    /// [`SessionError::NoBot`] if no bot is logged in under that account.
    fn find_bot(
        &self,
        account: i64,
    ) -> impl Future<Output = Result<Self::Bot, SessionError>> + Send;
}
