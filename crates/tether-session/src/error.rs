//! Error types for the session layer.

use tether_protocol::StatusCode;

/// Errors raised while a connection verifies and binds its session.
///
/// The store and manager operations themselves never fail: a missing
/// session is a `None`, not an error. These variants exist for the
/// boundary where a client asks to become authenticated.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The presented verify key does not match the configured one.
    #[error("verify key rejected")]
    AuthKeyFail,

    /// The [`BotProvider`](crate::BotProvider) has no bot for this account.
    #[error("no bot for account {0}")]
    NoBot(i64),

    /// The session key is unknown, expired, or not owned by the caller.
    #[error("illegal session: {0}")]
    IllegalSession(String),
}

impl SessionError {
    /// The status code a client receives for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::AuthKeyFail => StatusCode::AuthKeyFail,
            Self::NoBot(_) => StatusCode::NoBot,
            Self::IllegalSession(_) => StatusCode::IllegalSession,
        }
    }
}
