//! The business backend the router dispatches into.
//!
//! [`Actions`] has one method per command. Every method has a default
//! body that answers [`HandlerError::Unsupported`], so a backend only
//! implements what it can actually do and the rest of the command surface
//! reports "operation not supported".
//!
//! Methods are written with `-> impl Future + Send` so they stay callable
//! from spawned connection tasks; implementors can use plain `async fn`.
//!
//! ```rust,no_run
//! use tether_router::{Actions, HandlerResult, Request};
//! use tether_router::dto::{Friend, Target};
//! use tether_protocol::StatusCode;
//! # use tether_session::Bot;
//! # struct MyBot;
//! # impl Bot for MyBot { fn account(&self) -> i64 { 1 } }
//!
//! struct Backend;
//!
//! impl Actions for Backend {
//!     type Bot = MyBot;
//!
//!     async fn friend_list(&self, _req: Request<'_, MyBot, ()>) -> HandlerResult<Vec<Friend>> {
//!         Ok(Vec::new())
//!     }
//!
//!     async fn delete_friend(
//!         &self,
//!         req: Request<'_, MyBot, Target>,
//!     ) -> HandlerResult<StatusCode> {
//!         let _ = req.params.target;
//!         Ok(StatusCode::Success)
//!     }
//! }
//! ```

use std::future::{Future, Ready, ready};

use serde_json::Value;
use tether_protocol::StatusCode;
use tether_session::Bot;

use crate::dto::{
    About, EventResponse, Friend, Group, GroupConfig, GroupConfigUpdate, KickParams, Member,
    MemberInfo, MemberInfoUpdate, MemberProfileQuery, MemberTarget, MessageId, MuteParams, Nudge,
    Profile, SendImage, SendMessage, SendReceipt, SendTempMessage, Target,
};
use crate::{HandlerError, HandlerResult, Request};

fn unsupported<T>() -> Ready<HandlerResult<T>> {
    ready(Err(HandlerError::Unsupported))
}

/// Command handlers, one per routable command.
pub trait Actions: Send + Sync + 'static {
    /// The bot type sessions are bound to.
    type Bot: Bot;

    /// `about`. The only command callable without a session.
    fn about(&self) -> impl Future<Output = HandlerResult<About>> + Send {
        ready(Ok(About {
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }))
    }

    // -- event responses ----------------------------------------------------

    fn new_friend_request(
        &self,
        _req: Request<'_, Self::Bot, EventResponse>,
    ) -> impl Future<Output = HandlerResult<StatusCode>> + Send {
        unsupported()
    }

    fn member_join_request(
        &self,
        _req: Request<'_, Self::Bot, EventResponse>,
    ) -> impl Future<Output = HandlerResult<StatusCode>> + Send {
        unsupported()
    }

    fn bot_invited_join_group_request(
        &self,
        _req: Request<'_, Self::Bot, EventResponse>,
    ) -> impl Future<Output = HandlerResult<StatusCode>> + Send {
        unsupported()
    }

    // -- friends --------------------------------------------------------------

    fn delete_friend(
        &self,
        _req: Request<'_, Self::Bot, Target>,
    ) -> impl Future<Output = HandlerResult<StatusCode>> + Send {
        unsupported()
    }

    // -- group administration -------------------------------------------------

    fn mute_all(
        &self,
        _req: Request<'_, Self::Bot, Target>,
    ) -> impl Future<Output = HandlerResult<StatusCode>> + Send {
        unsupported()
    }

    fn unmute_all(
        &self,
        _req: Request<'_, Self::Bot, Target>,
    ) -> impl Future<Output = HandlerResult<StatusCode>> + Send {
        unsupported()
    }

    fn mute(
        &self,
        _req: Request<'_, Self::Bot, MuteParams>,
    ) -> impl Future<Output = HandlerResult<StatusCode>> + Send {
        unsupported()
    }

    fn unmute(
        &self,
        _req: Request<'_, Self::Bot, MemberTarget>,
    ) -> impl Future<Output = HandlerResult<StatusCode>> + Send {
        unsupported()
    }

    fn kick(
        &self,
        _req: Request<'_, Self::Bot, KickParams>,
    ) -> impl Future<Output = HandlerResult<StatusCode>> + Send {
        unsupported()
    }

    /// Makes the bot leave the group.
    fn quit(
        &self,
        _req: Request<'_, Self::Bot, Target>,
    ) -> impl Future<Output = HandlerResult<StatusCode>> + Send {
        unsupported()
    }

    /// Marks the message with id `target` as essence.
    fn set_essence(
        &self,
        _req: Request<'_, Self::Bot, Target>,
    ) -> impl Future<Output = HandlerResult<StatusCode>> + Send {
        unsupported()
    }

    /// `groupConfig` with sub-command `get`.
    fn group_config(
        &self,
        _req: Request<'_, Self::Bot, Target>,
    ) -> impl Future<Output = HandlerResult<GroupConfig>> + Send {
        unsupported()
    }

    /// `groupConfig` with sub-command `update`.
    fn update_group_config(
        &self,
        _req: Request<'_, Self::Bot, GroupConfigUpdate>,
    ) -> impl Future<Output = HandlerResult<StatusCode>> + Send {
        unsupported()
    }

    /// `memberInfo` with sub-command `get`.
    fn member_info(
        &self,
        _req: Request<'_, Self::Bot, MemberTarget>,
    ) -> impl Future<Output = HandlerResult<MemberInfo>> + Send {
        unsupported()
    }

    /// `memberInfo` with sub-command `update`.
    fn update_member_info(
        &self,
        _req: Request<'_, Self::Bot, MemberInfoUpdate>,
    ) -> impl Future<Output = HandlerResult<StatusCode>> + Send {
        unsupported()
    }

    // -- queries ----------------------------------------------------------------

    fn friend_list(
        &self,
        _req: Request<'_, Self::Bot, ()>,
    ) -> impl Future<Output = HandlerResult<Vec<Friend>>> + Send {
        unsupported()
    }

    fn group_list(
        &self,
        _req: Request<'_, Self::Bot, ()>,
    ) -> impl Future<Output = HandlerResult<Vec<Group>>> + Send {
        unsupported()
    }

    fn member_list(
        &self,
        _req: Request<'_, Self::Bot, Target>,
    ) -> impl Future<Output = HandlerResult<Vec<Member>>> + Send {
        unsupported()
    }

    fn bot_profile(
        &self,
        _req: Request<'_, Self::Bot, ()>,
    ) -> impl Future<Output = HandlerResult<Profile>> + Send {
        unsupported()
    }

    fn friend_profile(
        &self,
        _req: Request<'_, Self::Bot, Target>,
    ) -> impl Future<Output = HandlerResult<Profile>> + Send {
        unsupported()
    }

    fn member_profile(
        &self,
        _req: Request<'_, Self::Bot, MemberProfileQuery>,
    ) -> impl Future<Output = HandlerResult<Profile>> + Send {
        unsupported()
    }

    // -- messages ---------------------------------------------------------------

    /// Looks up a cached message. `Status(NoElement)` when it is gone.
    fn message_from_id(
        &self,
        _req: Request<'_, Self::Bot, MessageId>,
    ) -> impl Future<Output = HandlerResult<Value>> + Send {
        unsupported()
    }

    fn send_friend_message(
        &self,
        _req: Request<'_, Self::Bot, SendMessage>,
    ) -> impl Future<Output = HandlerResult<SendReceipt>> + Send {
        unsupported()
    }

    fn send_group_message(
        &self,
        _req: Request<'_, Self::Bot, SendMessage>,
    ) -> impl Future<Output = HandlerResult<SendReceipt>> + Send {
        unsupported()
    }

    fn send_temp_message(
        &self,
        _req: Request<'_, Self::Bot, SendTempMessage>,
    ) -> impl Future<Output = HandlerResult<SendReceipt>> + Send {
        unsupported()
    }

    /// Sends images by URL and returns the backend's image ids.
    fn send_image_message(
        &self,
        _req: Request<'_, Self::Bot, SendImage>,
    ) -> impl Future<Output = HandlerResult<Vec<String>>> + Send {
        unsupported()
    }

    /// Recalls the message with id `target`.
    fn recall(
        &self,
        _req: Request<'_, Self::Bot, Target>,
    ) -> impl Future<Output = HandlerResult<StatusCode>> + Send {
        unsupported()
    }

    fn send_nudge(
        &self,
        _req: Request<'_, Self::Bot, Nudge>,
    ) -> impl Future<Output = HandlerResult<StatusCode>> + Send {
        unsupported()
    }
}
