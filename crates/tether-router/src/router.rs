//! Command dispatch.
//!
//! [`Router::route`] turns one [`CommandEnvelope`] into one
//! [`ResponseEnvelope`]. The pipeline per command:
//!
//! 1. resolve the path in the [`Registry`] (unknown or disabled paths
//!    answer [`StatusCode::OperationNotSupported`]);
//! 2. gate on an authenticated session, except for `about`;
//! 3. pick the sub-command for `groupConfig` / `memberInfo`;
//! 4. extract parameters, typed or scalar;
//! 5. call the [`Actions`] method and serialize what it returns.
//!
//! Any step can short-circuit with a status. Whatever happens, the
//! response carries the request's `syncId`.

use std::future::Future;

use serde::Serialize;
use serde_json::Value;
use tether_protocol::{CommandEnvelope, ResponseEnvelope, StatusCode};
use tether_session::{AuthedSession, Bot, Session};

use crate::dto::{
    DataResult, EventResponse, GroupConfigUpdate, KickParams, MemberInfoUpdate,
    MemberProfileQuery, MemberTarget, MessageId, MuteParams, Nudge, SendImage, SendMessage,
    SendTempMessage, Target,
};
use crate::request::{decode, scalar};
use crate::{Actions, Command, HandlerError, HandlerResult, Registry, Request, Route, SubCommand};

/// Dispatches commands to an [`Actions`] backend.
pub struct Router<A: Actions> {
    registry: Registry,
    actions: A,
}

impl<A: Actions> Router<A> {
    /// A router over the standard command table.
    pub fn new(actions: A) -> Self {
        Self::with_registry(Registry::standard(), actions)
    }

    /// A router over a custom command table.
    pub fn with_registry(registry: Registry, actions: A) -> Self {
        Self { registry, actions }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn actions(&self) -> &A {
        &self.actions
    }

    /// Handles one command for the connection owning `session`.
    ///
    /// `session` is whatever the connection's key currently maps to, if
    /// anything. Pending, closed, and missing sessions can only reach
    /// `about`.
    pub async fn route(
        &self,
        session: Option<&Session<A::Bot>>,
        envelope: CommandEnvelope,
    ) -> ResponseEnvelope {
        let CommandEnvelope {
            sync_id,
            command,
            sub_command,
            content,
        } = envelope;

        let data = match self
            .dispatch(session, &command, sub_command.as_deref(), content.as_ref())
            .await
        {
            Ok(data) => data,
            Err(status) => {
                tracing::debug!(%sync_id, %command, %status, "command answered with status");
                status.to_value()
            }
        };

        ResponseEnvelope { sync_id, data }
    }

    async fn dispatch(
        &self,
        session: Option<&Session<A::Bot>>,
        path: &str,
        sub_command: Option<&str>,
        content: Option<&Value>,
    ) -> Result<Value, StatusCode> {
        let command = match self.registry.resolve(path) {
            Some(Route::Enabled(command)) => command,
            Some(Route::Disabled(_)) | None => return Err(StatusCode::OperationNotSupported),
        };

        if !command.requires_session() {
            return self.dispatch_public(command).await;
        }

        let session = session
            .and_then(Session::as_authenticated)
            .ok_or(StatusCode::UnauthenticatedAccess)?;

        self.dispatch_authenticated(command, session, sub_command, content)
            .await
    }

    async fn dispatch_public(&self, command: Command) -> Result<Value, StatusCode> {
        match command {
            Command::About => encode(self.actions.about().await.map(DataResult::ok)),
            _ => Err(StatusCode::OperationNotSupported),
        }
    }

    async fn dispatch_authenticated(
        &self,
        command: Command,
        session: &AuthedSession<A::Bot>,
        sub_command: Option<&str>,
        content: Option<&Value>,
    ) -> Result<Value, StatusCode> {
        let a = &self.actions;

        match command {
            Command::About => self.dispatch_public(command).await,

            Command::NewFriendRequest => {
                let params = decode::<EventResponse>(content)?;
                invoke(session, params, |r| a.new_friend_request(r)).await
            }
            Command::MemberJoinRequest => {
                let params = decode::<EventResponse>(content)?;
                invoke(session, params, |r| a.member_join_request(r)).await
            }
            Command::BotInvitedJoinGroupRequest => {
                let params = decode::<EventResponse>(content)?;
                invoke(session, params, |r| a.bot_invited_join_group_request(r)).await
            }

            Command::DeleteFriend => {
                let params = decode::<Target>(content)?;
                invoke(session, params, |r| a.delete_friend(r)).await
            }

            Command::MuteAll => {
                let params = decode::<Target>(content)?;
                invoke(session, params, |r| a.mute_all(r)).await
            }
            Command::UnmuteAll => {
                let params = decode::<Target>(content)?;
                invoke(session, params, |r| a.unmute_all(r)).await
            }
            Command::Mute => {
                let params = decode::<MuteParams>(content)?;
                invoke(session, params, |r| a.mute(r)).await
            }
            Command::Unmute => {
                let params = decode::<MemberTarget>(content)?;
                invoke(session, params, |r| a.unmute(r)).await
            }
            Command::Kick => {
                let params = decode::<KickParams>(content)?;
                invoke(session, params, |r| a.kick(r)).await
            }
            Command::Quit => {
                let params = decode::<Target>(content)?;
                invoke(session, params, |r| a.quit(r)).await
            }
            Command::SetEssence => {
                let params = decode::<Target>(content)?;
                invoke(session, params, |r| a.set_essence(r)).await
            }

            Command::GroupConfig => match SubCommand::parse(sub_command)? {
                SubCommand::Get => {
                    let params = Target {
                        target: scalar(content, "target")?,
                    };
                    invoke(session, params, |r| a.group_config(r)).await
                }
                SubCommand::Update => {
                    let params = decode::<GroupConfigUpdate>(content)?;
                    invoke(session, params, |r| a.update_group_config(r)).await
                }
            },
            Command::MemberInfo => match SubCommand::parse(sub_command)? {
                SubCommand::Get => {
                    let params = MemberTarget {
                        target: scalar(content, "target")?,
                        member_id: scalar(content, "memberId")?,
                    };
                    invoke(session, params, |r| a.member_info(r)).await
                }
                SubCommand::Update => {
                    let params = decode::<MemberInfoUpdate>(content)?;
                    invoke(session, params, |r| a.update_member_info(r)).await
                }
            },

            Command::FriendList => {
                invoke(session, (), |r| async move {
                    a.friend_list(r).await.map(DataResult::ok)
                })
                .await
            }
            Command::GroupList => {
                invoke(session, (), |r| async move {
                    a.group_list(r).await.map(DataResult::ok)
                })
                .await
            }
            Command::MemberList => {
                let params = Target {
                    target: scalar(content, "target")?,
                };
                invoke(session, params, |r| async move {
                    a.member_list(r).await.map(DataResult::ok)
                })
                .await
            }
            Command::BotProfile => invoke(session, (), |r| a.bot_profile(r)).await,
            Command::FriendProfile => {
                let params = Target {
                    target: scalar(content, "target")?,
                };
                invoke(session, params, |r| a.friend_profile(r)).await
            }
            Command::MemberProfile => {
                let params = MemberProfileQuery {
                    group: scalar(content, "group")?,
                    member: scalar(content, "member")?,
                };
                invoke(session, params, |r| a.member_profile(r)).await
            }

            Command::MessageFromId => {
                let params = MessageId {
                    id: scalar(content, "id")?,
                };
                invoke(session, params, |r| async move {
                    a.message_from_id(r).await.map(DataResult::ok)
                })
                .await
            }
            Command::SendFriendMessage => {
                let params = decode::<SendMessage>(content)?;
                invoke(session, params, |r| a.send_friend_message(r)).await
            }
            Command::SendGroupMessage => {
                let params = decode::<SendMessage>(content)?;
                invoke(session, params, |r| a.send_group_message(r)).await
            }
            Command::SendTempMessage => {
                let params = decode::<SendTempMessage>(content)?;
                invoke(session, params, |r| a.send_temp_message(r)).await
            }
            Command::SendImageMessage => {
                let params = decode::<SendImage>(content)?;
                invoke(session, params, |r| async move {
                    a.send_image_message(r).await.map(DataResult::ok)
                })
                .await
            }
            // Uploads carry multipart bodies, which this channel cannot
            // deliver. They stay unsupported even when re-registered.
            Command::UploadImage | Command::UploadVoice => Err(StatusCode::OperationNotSupported),
            Command::Recall => {
                let params = decode::<Target>(content)?;
                invoke(session, params, |r| a.recall(r)).await
            }
            Command::SendNudge => {
                let params = decode::<Nudge>(content)?;
                invoke(session, params, |r| a.send_nudge(r)).await
            }
        }
    }
}

/// Builds the handler's [`Request`], awaits the handler, and encodes its result.
async fn invoke<'s, B, P, R, F, Fut>(
    session: &'s AuthedSession<B>,
    params: P,
    handler: F,
) -> Result<Value, StatusCode>
where
    B: Bot,
    R: Serialize,
    F: FnOnce(Request<'s, B, P>) -> Fut,
    Fut: Future<Output = HandlerResult<R>>,
{
    encode(handler(Request { session, params }).await)
}

fn encode<R: Serialize>(result: HandlerResult<R>) -> Result<Value, StatusCode> {
    match result {
        Ok(data) => serde_json::to_value(data).map_err(|e| {
            tracing::warn!(error = %e, "failed to serialize handler result");
            StatusCode::Internal
        }),
        Err(HandlerError::Failed(reason)) => {
            tracing::warn!(%reason, "handler failed");
            Err(StatusCode::Internal)
        }
        Err(e) => Err(e.status()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tether_session::{SessionConfig, SessionManager};

    use super::*;
    use crate::dto::{Friend, GroupConfig};

    struct TestBot;

    impl Bot for TestBot {
        fn account(&self) -> i64 {
            10001
        }
    }

    #[derive(Default)]
    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    impl Actions for Counting {
        type Bot = TestBot;

        async fn delete_friend(
            &self,
            req: Request<'_, TestBot, Target>,
        ) -> HandlerResult<StatusCode> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if req.params.target == 404 {
                return Err(HandlerError::Status(StatusCode::NoElement));
            }
            Ok(StatusCode::Success)
        }

        async fn friend_list(&self, req: Request<'_, TestBot, ()>) -> HandlerResult<Vec<Friend>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Friend {
                id: req.bot().account() + 1,
                nickname: "alice".into(),
                remark: String::new(),
            }])
        }

        async fn group_config(
            &self,
            req: Request<'_, TestBot, Target>,
        ) -> HandlerResult<GroupConfig> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GroupConfig {
                name: Some(format!("group-{}", req.params.target)),
                ..GroupConfig::default()
            })
        }

        async fn quit(&self, _req: Request<'_, TestBot, Target>) -> HandlerResult<StatusCode> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(HandlerError::Failed("backend unreachable".into()))
        }
    }

    fn authed(manager: &SessionManager<TestBot>) -> Arc<Session<TestBot>> {
        let key = manager.promote(TestBot, &"k".into());
        manager.get(&key).unwrap()
    }

    fn envelope(command: &str, content: Value) -> CommandEnvelope {
        CommandEnvelope::new("7", command, Some(content))
    }

    #[tokio::test]
    async fn test_route_unknown_command_is_unsupported() {
        let router = Router::new(Counting::default());
        let manager = SessionManager::new(SessionConfig::default());
        let session = authed(&manager);

        let resp = router.route(Some(&*session), envelope("noSuchThing", json!({}))).await;

        assert_eq!(resp.sync_id, "7");
        assert_eq!(resp.data, StatusCode::OperationNotSupported.to_value());
    }

    #[tokio::test]
    async fn test_route_without_session_is_unauthenticated() {
        let router = Router::new(Counting::default());
        let calls = router.actions().calls.clone();

        let resp = router.route(None, envelope("deleteFriend", json!({"target": 1}))).await;

        assert_eq!(resp.data, StatusCode::UnauthenticatedAccess.to_value());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_route_about_needs_no_session() {
        let router = Router::new(Counting::default());

        let resp = router.route(None, CommandEnvelope::new("1", "about", None)).await;

        assert_eq!(resp.data["code"], 0);
        assert_eq!(resp.data["data"]["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_route_invalid_params_skip_handler() {
        let router = Router::new(Counting::default());
        let calls = router.actions().calls.clone();
        let manager = SessionManager::new(SessionConfig::default());
        let session = authed(&manager);

        let resp = router
            .route(Some(&*session), envelope("deleteFriend", json!({"target": "abc"})))
            .await;

        assert_eq!(resp.data, StatusCode::InvalidParameter.to_value());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_route_handler_status_is_forwarded() {
        let router = Router::new(Counting::default());
        let manager = SessionManager::new(SessionConfig::default());
        let session = authed(&manager);

        let ok = router
            .route(Some(&*session), envelope("deleteFriend", json!({"target": 1})))
            .await;
        let missing = router
            .route(Some(&*session), envelope("deleteFriend", json!({"target": 404})))
            .await;

        assert_eq!(ok.data, StatusCode::Success.to_value());
        assert_eq!(missing.data, StatusCode::NoElement.to_value());
    }

    #[tokio::test]
    async fn test_route_list_is_wrapped_in_data_result() {
        let router = Router::new(Counting::default());
        let manager = SessionManager::new(SessionConfig::default());
        let session = authed(&manager);

        let resp = router
            .route(Some(&*session), CommandEnvelope::new("2", "friendList", None))
            .await;

        assert_eq!(resp.data["code"], 0);
        assert_eq!(resp.data["data"][0]["id"], 10002);
    }

    #[tokio::test]
    async fn test_route_sub_command_get_uses_scalar() {
        let router = Router::new(Counting::default());
        let manager = SessionManager::new(SessionConfig::default());
        let session = authed(&manager);

        let env = envelope("groupConfig", json!({"target": "123"})).with_sub_command("get");
        let resp = router.route(Some(&*session), env).await;

        assert_eq!(resp.data, json!({"name": "group-123"}));
    }

    #[tokio::test]
    async fn test_route_unknown_sub_command_is_unsupported() {
        let router = Router::new(Counting::default());
        let calls = router.actions().calls.clone();
        let manager = SessionManager::new(SessionConfig::default());
        let session = authed(&manager);

        let env = envelope("groupConfig", json!({"target": 1})).with_sub_command("delete");
        let resp = router.route(Some(&*session), env).await;

        assert_eq!(resp.data, StatusCode::OperationNotSupported.to_value());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_route_handler_failure_is_internal() {
        let router = Router::new(Counting::default());
        let manager = SessionManager::new(SessionConfig::default());
        let session = authed(&manager);

        let resp = router
            .route(Some(&*session), envelope("quit", json!({"target": 1})))
            .await;

        assert_eq!(resp.data, StatusCode::Internal.to_value());
    }

    #[tokio::test]
    async fn test_route_default_action_is_unsupported() {
        let router = Router::new(Counting::default());
        let manager = SessionManager::new(SessionConfig::default());
        let session = authed(&manager);

        let resp = router
            .route(Some(&*session), envelope("muteAll", json!({"target": 1})))
            .await;

        assert_eq!(resp.data, StatusCode::OperationNotSupported.to_value());
    }
}
