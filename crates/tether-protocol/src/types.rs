//! Envelope and session payload types.
//!
//! Field names on the wire are camelCase (`syncId`, `subCommand`,
//! `verifyKey`, `sessionKey`); serde renames them so the Rust side keeps
//! snake_case.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// One request from a client.
///
/// `sync_id` is opaque to the server and copied verbatim into the
/// response, so a client can match answers to requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEnvelope {
    /// Caller-chosen correlation id.
    pub sync_id: String,
    /// Command path, e.g. `"sendGroupMessage"`.
    pub command: String,
    /// Nested verb for commands such as `groupConfig` (`"get"`, `"update"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_command: Option<String>,
    /// Untyped command arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

impl CommandEnvelope {
    /// Builds an envelope without a sub-command.
    pub fn new(
        sync_id: impl Into<String>,
        command: impl Into<String>,
        content: Option<Value>,
    ) -> Self {
        Self {
            sync_id: sync_id.into(),
            command: command.into(),
            sub_command: None,
            content,
        }
    }

    /// Sets the sub-command.
    pub fn with_sub_command(mut self, sub_command: impl Into<String>) -> Self {
        self.sub_command = Some(sub_command.into());
        self
    }
}

/// The single response to a [`CommandEnvelope`].
///
/// `data` is either a handler's result or a
/// [`StatusCode`](crate::StatusCode) payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    /// Copied from the request.
    pub sync_id: String,
    /// Result payload or status object.
    pub data: Value,
}

impl ResponseEnvelope {
    /// Builds a response carrying a status code.
    pub fn status(sync_id: impl Into<String>, status: crate::StatusCode) -> Self {
        Self {
            sync_id: sync_id.into(),
            data: status.to_value(),
        }
    }
}

// ---------------------------------------------------------------------------
// Session payloads
// ---------------------------------------------------------------------------

/// Content of a `verify` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// The shared secret configured on the server, if verification is on.
    #[serde(default)]
    pub verify_key: Option<String>,
}

/// Content of a `bind` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindRequest {
    /// The key returned by `verify`. Optional: a connection can only bind
    /// its own session, so the key is checked when present.
    #[serde(default)]
    pub session_key: Option<String>,
    /// Account number of the bot to bind to.
    pub qq: i64,
}

/// Answer to a successful `verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIssued {
    /// Always 0.
    pub code: u16,
    /// The session key.
    pub session: String,
}

impl SessionIssued {
    /// Wraps an issued session key.
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            code: crate::StatusCode::Success.code(),
            session: session.into(),
        }
    }
}
