//! Echo bot: an in-memory bot served over Tether.
//!
//! One bot, account 10001, with a fixed friend list and two groups.
//! Messages sent to a friend are echoed back into the message cache, so
//! `messageFromId` can fetch both the original and the echo.
//!
//! Environment:
//! - `TETHER_BIND`: listen address (default `127.0.0.1:8080`)
//! - `TETHER_VERIFY_KEY`: require this key on `verify` (default: none)
//! - `RUST_LOG`: log filter (default `info`)

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use serde_json::json;
use tether::prelude::*;
use tether::router::dto::{
    Friend, Group, GroupConfig, GroupConfigUpdate, Member, MessageId, Permission, Profile,
    SendMessage, SendReceipt, Target,
};
use tokio::sync::Mutex;

const ACCOUNT: i64 = 10001;

// ---------------------------------------------------------------------------
// In-memory bot
// ---------------------------------------------------------------------------

struct World {
    friends: Vec<Friend>,
    groups: Vec<Group>,
    configs: Mutex<HashMap<i64, GroupConfig>>,
    messages: Mutex<HashMap<i64, Value>>,
    next_message_id: AtomicI64,
}

impl World {
    fn new() -> Self {
        let groups = vec![
            Group {
                id: 20001,
                name: "echo-lab".into(),
                permission: Permission::Owner,
            },
            Group {
                id: 20002,
                name: "visitors".into(),
                permission: Permission::Member,
            },
        ];
        let configs = groups
            .iter()
            .map(|g| {
                let config = GroupConfig {
                    name: Some(g.name.clone()),
                    allow_member_invite: Some(true),
                    ..GroupConfig::default()
                };
                (g.id, config)
            })
            .collect();

        Self {
            friends: vec![
                Friend {
                    id: 30001,
                    nickname: "alice".into(),
                    remark: "".into(),
                },
                Friend {
                    id: 30002,
                    nickname: "bob".into(),
                    remark: "from work".into(),
                },
            ],
            groups,
            configs: Mutex::new(configs),
            messages: Mutex::new(HashMap::new()),
            next_message_id: AtomicI64::new(1),
        }
    }

    async fn store(&self, kind: &str, target: i64, chain: &[Value]) -> i64 {
        let id = self.next_message_id.fetch_add(1, Ordering::Relaxed);
        let message = json!({
            "type": kind,
            "messageId": id,
            "target": target,
            "messageChain": chain,
        });
        self.messages.lock().await.insert(id, message);
        id
    }
}

#[derive(Clone)]
struct EchoBot {
    world: Arc<World>,
}

impl Bot for EchoBot {
    fn account(&self) -> i64 {
        ACCOUNT
    }

    fn release(&self) {
        tracing::info!(account = ACCOUNT, "echo bot released");
    }
}

struct Fleet {
    world: Arc<World>,
}

impl BotProvider for Fleet {
    type Bot = EchoBot;

    async fn find_bot(&self, account: i64) -> Result<EchoBot, SessionError> {
        if account != ACCOUNT {
            return Err(SessionError::NoBot(account));
        }
        Ok(EchoBot {
            world: Arc::clone(&self.world),
        })
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

struct EchoActions;

impl Actions for EchoActions {
    type Bot = EchoBot;

    async fn friend_list(&self, req: Request<'_, EchoBot, ()>) -> HandlerResult<Vec<Friend>> {
        Ok(req.bot().world.friends.clone())
    }

    async fn group_list(&self, req: Request<'_, EchoBot, ()>) -> HandlerResult<Vec<Group>> {
        Ok(req.bot().world.groups.clone())
    }

    async fn member_list(&self, req: Request<'_, EchoBot, Target>) -> HandlerResult<Vec<Member>> {
        let world = &req.bot().world;
        let group = world
            .groups
            .iter()
            .find(|g| g.id == req.params.target)
            .ok_or(HandlerError::Status(StatusCode::NoElement))?;
        Ok(world
            .friends
            .iter()
            .map(|f| Member {
                id: f.id,
                member_name: f.nickname.clone(),
                permission: Permission::Member,
                group: group.clone(),
            })
            .collect())
    }

    async fn bot_profile(&self, _req: Request<'_, EchoBot, ()>) -> HandlerResult<Profile> {
        Ok(Profile {
            nickname: "echo".into(),
            sign: "I repeat what you say".into(),
            ..Profile::default()
        })
    }

    async fn group_config(&self, req: Request<'_, EchoBot, Target>) -> HandlerResult<GroupConfig> {
        req.bot()
            .world
            .configs
            .lock()
            .await
            .get(&req.params.target)
            .cloned()
            .ok_or(HandlerError::Status(StatusCode::NoElement))
    }

    async fn update_group_config(
        &self,
        req: Request<'_, EchoBot, GroupConfigUpdate>,
    ) -> HandlerResult<StatusCode> {
        let mut configs = req.bot().world.configs.lock().await;
        let current = configs
            .get_mut(&req.params.target)
            .ok_or(HandlerError::Status(StatusCode::NoElement))?;
        let update = req.params.config;
        if update.name.is_some() {
            current.name = update.name;
        }
        if update.announcement.is_some() {
            current.announcement = update.announcement;
        }
        if update.allow_member_invite.is_some() {
            current.allow_member_invite = update.allow_member_invite;
        }
        Ok(StatusCode::Success)
    }

    async fn send_friend_message(
        &self,
        req: Request<'_, EchoBot, SendMessage>,
    ) -> HandlerResult<SendReceipt> {
        let world = &req.bot().world;
        if !world.friends.iter().any(|f| f.id == req.params.target) {
            return Err(HandlerError::Status(StatusCode::NoElement));
        }
        let sent = world
            .store("FriendMessage", req.params.target, &req.params.message_chain)
            .await;
        let echo = world
            .store("FriendMessage", ACCOUNT, &req.params.message_chain)
            .await;
        tracing::debug!(sent, echo, target = req.params.target, "echoed friend message");
        Ok(SendReceipt::sent(sent))
    }

    async fn send_group_message(
        &self,
        req: Request<'_, EchoBot, SendMessage>,
    ) -> HandlerResult<SendReceipt> {
        let world = &req.bot().world;
        if !world.groups.iter().any(|g| g.id == req.params.target) {
            return Err(HandlerError::Status(StatusCode::NoElement));
        }
        let sent = world
            .store("GroupMessage", req.params.target, &req.params.message_chain)
            .await;
        Ok(SendReceipt::sent(sent))
    }

    async fn message_from_id(&self, req: Request<'_, EchoBot, MessageId>) -> HandlerResult<Value> {
        req.bot()
            .world
            .messages
            .lock()
            .await
            .get(&i64::from(req.params.id))
            .cloned()
            .ok_or(HandlerError::Status(StatusCode::NoElement))
    }

    async fn recall(&self, req: Request<'_, EchoBot, Target>) -> HandlerResult<StatusCode> {
        match req.bot().world.messages.lock().await.remove(&req.params.target) {
            Some(_) => Ok(StatusCode::Success),
            None => Err(HandlerError::Status(StatusCode::NoElement)),
        }
    }
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

fn session_config() -> SessionConfig {
    match std::env::var("TETHER_VERIFY_KEY") {
        Ok(key) if !key.is_empty() => SessionConfig::default().with_verify_key(key),
        _ => SessionConfig::default(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tether::init_tracing();

    let bind = std::env::var("TETHER_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let fleet = Fleet {
        world: Arc::new(World::new()),
    };

    let server = TetherServer::<Fleet, EchoActions>::builder()
        .bind(&bind)
        .session_config(session_config())
        .build(fleet, EchoActions)
        .await?;
    tracing::info!(addr = %server.local_addr()?, account = ACCOUNT, "echo bot ready");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
        })
        .await?;
    Ok(())
}
