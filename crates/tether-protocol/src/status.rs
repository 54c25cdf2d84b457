//! Status codes: the server's non-business answers.
//!
//! A status travels in the `data` slot of a response exactly where a
//! handler's result would. On the wire it is an object with an integer
//! `code` and a human-readable `msg`:
//!
//! ```json
//! { "code": 400, "msg": "invalid parameter" }
//! ```
//!
//! Nothing in the envelope marks a payload as a status, so clients must
//! check `code` rather than assume success from well-formed JSON.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// The closed set of status codes.
///
/// Only three are produced by the router itself
/// ([`InvalidParameter`](Self::InvalidParameter),
/// [`OperationNotSupported`](Self::OperationNotSupported),
/// [`UnauthenticatedAccess`](Self::UnauthenticatedAccess)). The session
/// commands use the authentication codes, and handlers may answer with any
/// of the business codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// The operation succeeded and has no further payload.
    Success,
    /// The presented verify key was wrong.
    AuthKeyFail,
    /// No bot is registered under the requested account.
    NoBot,
    /// The session key is unknown, expired, or belongs to another connection.
    IllegalSession,
    /// The session is missing or has not been bound to a bot yet.
    UnauthenticatedAccess,
    /// The target of the operation does not exist.
    NoElement,
    /// Unknown command or sub-command, or a command that is switched off.
    OperationNotSupported,
    /// The bot lacks the permission the operation needs.
    PermissionDenied,
    /// The bot is muted in the target group.
    BotMuted,
    /// The outgoing message exceeds the backend's size limit.
    MessageTooLarge,
    /// The payload is absent or does not have the expected shape.
    InvalidParameter,
    /// A handler failed for a reason it did not classify.
    Internal,
}

impl StatusCode {
    /// Every status code, in code order.
    pub const ALL: [StatusCode; 12] = [
        Self::Success,
        Self::AuthKeyFail,
        Self::NoBot,
        Self::IllegalSession,
        Self::UnauthenticatedAccess,
        Self::NoElement,
        Self::OperationNotSupported,
        Self::PermissionDenied,
        Self::BotMuted,
        Self::MessageTooLarge,
        Self::InvalidParameter,
        Self::Internal,
    ];

    /// The integer sent in the `code` field.
    pub fn code(self) -> u16 {
        match self {
            Self::Success => 0,
            Self::AuthKeyFail => 1,
            Self::NoBot => 2,
            Self::IllegalSession => 3,
            Self::UnauthenticatedAccess => 4,
            Self::NoElement => 5,
            Self::OperationNotSupported => 6,
            Self::PermissionDenied => 10,
            Self::BotMuted => 20,
            Self::MessageTooLarge => 30,
            Self::InvalidParameter => 400,
            Self::Internal => 500,
        }
    }

    /// The text sent in the `msg` field.
    pub fn message(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::AuthKeyFail => "wrong verify key",
            Self::NoBot => "bot does not exist",
            Self::IllegalSession => "session invalid or does not exist",
            Self::UnauthenticatedAccess => "session not authenticated",
            Self::NoElement => "target does not exist",
            Self::OperationNotSupported => "operation not supported",
            Self::PermissionDenied => "permission denied",
            Self::BotMuted => "bot is muted",
            Self::MessageTooLarge => "message too large",
            Self::InvalidParameter => "invalid parameter",
            Self::Internal => "internal error",
        }
    }

    /// Looks a status up by its wire code.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// Returns the wire shape of this status.
    pub fn payload(self) -> StatusPayload {
        StatusPayload {
            code: self.code(),
            msg: self.message().to_owned(),
        }
    }

    /// Returns this status as a JSON value, ready for a response's `data`.
    pub fn to_value(self) -> serde_json::Value {
        serde_json::json!({ "code": self.code(), "msg": self.message() })
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload().serialize(serializer)
    }
}

/// The `{code, msg}` object as it appears on the wire.
///
/// Clients deserialize into this to inspect a response; the server builds
/// it from a [`StatusCode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    /// Integer status code.
    pub code: u16,
    /// Human-readable description.
    pub msg: String,
}

impl StatusPayload {
    /// Maps the wire code back to a known status, if there is one.
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_code(self.code)
    }
}
