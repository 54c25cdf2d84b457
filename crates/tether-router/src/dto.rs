//! Parameter and result shapes exchanged with business handlers.
//!
//! Parameters are decoded from a command's `content` (camelCase on the
//! wire). Results are serialized into the response's `data`. None of these
//! types carry a session: the router pairs them with the caller's session
//! in a [`Request`](crate::Request).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tether_protocol::StatusCode;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// A single target: a friend, a group, or a message id depending on the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub target: i64,
}

/// A member of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberTarget {
    /// Group id.
    pub target: i64,
    pub member_id: i64,
}

/// `memberProfile` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfileQuery {
    pub group: i64,
    pub member: i64,
}

/// `messageFromId` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageId {
    pub id: i32,
}

/// `mute` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuteParams {
    pub target: i64,
    pub member_id: i64,
    /// Mute duration in seconds.
    #[serde(default)]
    pub time: u32,
}

/// `kick` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickParams {
    pub target: i64,
    pub member_id: i64,
    #[serde(default)]
    pub msg: String,
}

/// Answer to a friend, join, or invitation request event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub event_id: i64,
    pub from_id: i64,
    pub group_id: i64,
    /// Backend-defined decision code (accept, reject, ...).
    pub operate: i32,
    #[serde(default)]
    pub message: String,
}

/// Group settings. On update, absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announcement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confess_talk: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_member_invite: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_approve: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymous_chat: Option<bool>,
}

/// `groupConfig update` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfigUpdate {
    pub target: i64,
    pub config: GroupConfig,
}

/// Member settings. On update, absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_title: Option<String>,
}

/// `memberInfo update` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfoUpdate {
    pub target: i64,
    pub member_id: i64,
    pub info: MemberInfo,
}

/// A friend or group message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub target: i64,
    /// Id of a message to quote.
    #[serde(default)]
    pub quote: Option<i64>,
    /// Message elements; their shape belongs to the backend.
    pub message_chain: Vec<Value>,
}

/// A temporary message to a group member who is not a friend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTempMessage {
    pub qq: i64,
    pub group: i64,
    #[serde(default)]
    pub quote: Option<i64>,
    pub message_chain: Vec<Value>,
}

/// Images by URL, to a friend (`qq` or `target`) or a group (`group`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendImage {
    #[serde(default)]
    pub target: Option<i64>,
    #[serde(default)]
    pub qq: Option<i64>,
    #[serde(default)]
    pub group: Option<i64>,
    pub urls: Vec<String>,
}

/// Where a nudge lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NudgeKind {
    Friend,
    Group,
    Stranger,
}

/// `sendNudge` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nudge {
    pub target: i64,
    pub subject: i64,
    pub kind: NudgeKind,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A successful result that carries data: `{"code":0,"msg":"","data":...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataResult<T> {
    pub code: u16,
    pub msg: String,
    pub data: T,
}

impl<T> DataResult<T> {
    /// Wraps `data` with a success code.
    pub fn ok(data: T) -> Self {
        Self {
            code: StatusCode::Success.code(),
            msg: String::new(),
            data,
        }
    }
}

/// The result of sending a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub code: u16,
    pub msg: String,
    /// Backend id of the sent message, usable with `recall` and `quote`.
    pub message_id: i64,
}

impl SendReceipt {
    /// A success receipt for `message_id`.
    pub fn sent(message_id: i64) -> Self {
        Self {
            code: StatusCode::Success.code(),
            msg: StatusCode::Success.message().to_owned(),
            message_id,
        }
    }
}

/// Server information returned by `about`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct About {
    pub version: String,
}

/// A friend of the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub id: i64,
    pub nickname: String,
    pub remark: String,
}

/// The bot's role in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    Owner,
    Administrator,
    Member,
}

/// A group the bot is in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub permission: Permission,
}

/// A member of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub member_name: String,
    pub permission: Permission,
    pub group: Group,
}

/// Profile card of the bot, a friend, or a member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub nickname: String,
    pub email: String,
    pub age: u32,
    pub level: u32,
    pub sign: String,
    pub sex: String,
}
