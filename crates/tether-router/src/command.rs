//! Command identifiers.
//!
//! Every routable command has a [`Command`] variant and a wire path.
//! The path strings live in [`paths`] so the server, the registry, and
//! clients in tests all spell them the same way.

use tether_protocol::StatusCode;

/// Wire paths of every command.
pub mod paths {
    pub const ABOUT: &str = "about";

    pub const NEW_FRIEND_REQUEST: &str = "resp_newFriendRequestEvent";
    pub const MEMBER_JOIN_REQUEST: &str = "resp_memberJoinRequestEvent";
    pub const BOT_INVITED_JOIN_GROUP_REQUEST: &str = "resp_botInvitedJoinGroupRequestEvent";

    pub const DELETE_FRIEND: &str = "deleteFriend";

    pub const MUTE_ALL: &str = "muteAll";
    pub const UNMUTE_ALL: &str = "unmuteAll";
    pub const MUTE: &str = "mute";
    pub const UNMUTE: &str = "unmute";
    pub const KICK: &str = "kick";
    pub const QUIT: &str = "quit";
    pub const SET_ESSENCE: &str = "setEssence";
    pub const GROUP_CONFIG: &str = "groupConfig";
    pub const MEMBER_INFO: &str = "memberInfo";

    pub const FRIEND_LIST: &str = "friendList";
    pub const GROUP_LIST: &str = "groupList";
    pub const MEMBER_LIST: &str = "memberList";
    pub const BOT_PROFILE: &str = "botProfile";
    pub const FRIEND_PROFILE: &str = "friendProfile";
    pub const MEMBER_PROFILE: &str = "memberProfile";

    pub const MESSAGE_FROM_ID: &str = "messageFromId";
    pub const SEND_FRIEND_MESSAGE: &str = "sendFriendMessage";
    pub const SEND_GROUP_MESSAGE: &str = "sendGroupMessage";
    pub const SEND_TEMP_MESSAGE: &str = "sendTempMessage";
    pub const SEND_IMAGE_MESSAGE: &str = "sendImageMessage";
    pub const UPLOAD_IMAGE: &str = "uploadImage";
    pub const UPLOAD_VOICE: &str = "uploadVoice";
    pub const RECALL: &str = "recall";
    pub const SEND_NUDGE: &str = "sendNudge";

    // Session commands, answered by the connection handler before routing.
    pub const VERIFY: &str = "verify";
    pub const BIND: &str = "bind";
    pub const RELEASE: &str = "release";
}

/// A routable command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    About,
    NewFriendRequest,
    MemberJoinRequest,
    BotInvitedJoinGroupRequest,
    DeleteFriend,
    MuteAll,
    UnmuteAll,
    Mute,
    Unmute,
    Kick,
    Quit,
    SetEssence,
    GroupConfig,
    MemberInfo,
    FriendList,
    GroupList,
    MemberList,
    BotProfile,
    FriendProfile,
    MemberProfile,
    MessageFromId,
    SendFriendMessage,
    SendGroupMessage,
    SendTempMessage,
    SendImageMessage,
    UploadImage,
    UploadVoice,
    Recall,
    SendNudge,
}

impl Command {
    /// Every command, in registry order.
    pub const ALL: [Command; 29] = [
        Self::About,
        Self::NewFriendRequest,
        Self::MemberJoinRequest,
        Self::BotInvitedJoinGroupRequest,
        Self::DeleteFriend,
        Self::MuteAll,
        Self::UnmuteAll,
        Self::Mute,
        Self::Unmute,
        Self::Kick,
        Self::Quit,
        Self::SetEssence,
        Self::GroupConfig,
        Self::MemberInfo,
        Self::FriendList,
        Self::GroupList,
        Self::MemberList,
        Self::BotProfile,
        Self::FriendProfile,
        Self::MemberProfile,
        Self::MessageFromId,
        Self::SendFriendMessage,
        Self::SendGroupMessage,
        Self::SendTempMessage,
        Self::SendImageMessage,
        Self::UploadImage,
        Self::UploadVoice,
        Self::Recall,
        Self::SendNudge,
    ];

    /// The wire path of this command.
    pub fn path(self) -> &'static str {
        match self {
            Self::About => paths::ABOUT,
            Self::NewFriendRequest => paths::NEW_FRIEND_REQUEST,
            Self::MemberJoinRequest => paths::MEMBER_JOIN_REQUEST,
            Self::BotInvitedJoinGroupRequest => paths::BOT_INVITED_JOIN_GROUP_REQUEST,
            Self::DeleteFriend => paths::DELETE_FRIEND,
            Self::MuteAll => paths::MUTE_ALL,
            Self::UnmuteAll => paths::UNMUTE_ALL,
            Self::Mute => paths::MUTE,
            Self::Unmute => paths::UNMUTE,
            Self::Kick => paths::KICK,
            Self::Quit => paths::QUIT,
            Self::SetEssence => paths::SET_ESSENCE,
            Self::GroupConfig => paths::GROUP_CONFIG,
            Self::MemberInfo => paths::MEMBER_INFO,
            Self::FriendList => paths::FRIEND_LIST,
            Self::GroupList => paths::GROUP_LIST,
            Self::MemberList => paths::MEMBER_LIST,
            Self::BotProfile => paths::BOT_PROFILE,
            Self::FriendProfile => paths::FRIEND_PROFILE,
            Self::MemberProfile => paths::MEMBER_PROFILE,
            Self::MessageFromId => paths::MESSAGE_FROM_ID,
            Self::SendFriendMessage => paths::SEND_FRIEND_MESSAGE,
            Self::SendGroupMessage => paths::SEND_GROUP_MESSAGE,
            Self::SendTempMessage => paths::SEND_TEMP_MESSAGE,
            Self::SendImageMessage => paths::SEND_IMAGE_MESSAGE,
            Self::UploadImage => paths::UPLOAD_IMAGE,
            Self::UploadVoice => paths::UPLOAD_VOICE,
            Self::Recall => paths::RECALL,
            Self::SendNudge => paths::SEND_NUDGE,
        }
    }

    /// Whether the caller must hold an authenticated session.
    pub fn requires_session(self) -> bool {
        !matches!(self, Self::About)
    }

    /// Whether the command is off in a standard registry. Uploads need a
    /// multipart body, which a text frame cannot carry.
    pub fn disabled_by_default(self) -> bool {
        matches!(self, Self::UploadImage | Self::UploadVoice)
    }
}

/// The nested verb of a `groupConfig` or `memberInfo` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubCommand {
    /// Read, with scalar arguments taken straight from the payload.
    Get,
    /// Write, with a typed parameter object.
    Update,
}

impl SubCommand {
    /// Parses a sub-command. `"post"` is accepted as an alias of `"update"`.
    ///
    /// # Errors
    /// [`StatusCode::OperationNotSupported`] for anything else, including
    /// a missing sub-command.
    pub fn parse(raw: Option<&str>) -> Result<Self, StatusCode> {
        match raw {
            Some("get") => Ok(Self::Get),
            Some("update" | "post") => Ok(Self::Update),
            _ => Err(StatusCode::OperationNotSupported),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_paths_are_unique() {
        let paths: HashSet<_> = Command::ALL.iter().map(|c| c.path()).collect();
        assert_eq!(paths.len(), Command::ALL.len());
    }

    #[test]
    fn test_only_about_is_public() {
        let public: Vec<_> = Command::ALL.into_iter().filter(|c| !c.requires_session()).collect();
        assert_eq!(public, vec![Command::About]);
    }

    #[test]
    fn test_session_commands_are_not_routable_paths() {
        for path in [paths::VERIFY, paths::BIND, paths::RELEASE] {
            assert!(Command::ALL.iter().all(|c| c.path() != path));
        }
    }

    #[test]
    fn test_sub_command_parse() {
        assert_eq!(SubCommand::parse(Some("get")), Ok(SubCommand::Get));
        assert_eq!(SubCommand::parse(Some("update")), Ok(SubCommand::Update));
        assert_eq!(SubCommand::parse(Some("post")), Ok(SubCommand::Update));
        assert_eq!(SubCommand::parse(Some("delete")), Err(StatusCode::OperationNotSupported));
        assert_eq!(SubCommand::parse(None), Err(StatusCode::OperationNotSupported));
    }
}
