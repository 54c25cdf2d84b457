//! Integration tests for the Tether server, handler, and full connection flow.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tether::prelude::*;
use tether::router::dto::{Friend, Target};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Mock bot, provider, and backend
// =========================================================================

#[derive(Clone)]
struct TestBot {
    account: i64,
    releases: Arc<AtomicUsize>,
}

impl Bot for TestBot {
    fn account(&self) -> i64 {
        self.account
    }

    fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Knows exactly one bot, account 10001.
#[derive(Clone, Default)]
struct OneBot {
    releases: Arc<AtomicUsize>,
}

impl BotProvider for OneBot {
    type Bot = TestBot;

    async fn find_bot(&self, account: i64) -> Result<TestBot, SessionError> {
        if account != 10001 {
            return Err(SessionError::NoBot(account));
        }
        Ok(TestBot {
            account,
            releases: Arc::clone(&self.releases),
        })
    }
}

struct Backend;

impl Actions for Backend {
    type Bot = TestBot;

    async fn friend_list(&self, req: Request<'_, TestBot, ()>) -> HandlerResult<Vec<Friend>> {
        Ok(vec![Friend {
            id: req.bot().account() + 1,
            nickname: "alice".into(),
            remark: "".into(),
        }])
    }

    async fn delete_friend(&self, req: Request<'_, TestBot, Target>) -> HandlerResult<StatusCode> {
        // Slow down odd targets so ordering is observable.
        if req.params.target % 2 == 1 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        Ok(StatusCode::Success)
    }
}

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

struct Running {
    addr: String,
    sessions: Arc<SessionManager<TestBot>>,
    releases: Arc<AtomicUsize>,
    stop: Option<oneshot::Sender<()>>,
    stopped: tokio::task::JoinHandle<()>,
}

async fn start_with(builder: TetherServerBuilder) -> Running {
    let provider = OneBot::default();
    let releases = Arc::clone(&provider.releases);
    let server = builder
        .bind("127.0.0.1:0")
        .build(provider, Backend)
        .await
        .expect("server should build");

    let addr = server.local_addr().expect("should have local addr").to_string();
    let sessions = server.sessions();
    let (stop, stop_rx) = oneshot::channel();

    let stopped = tokio::spawn(async move {
        let _ = server
            .run_until(async {
                let _ = stop_rx.await;
            })
            .await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    Running {
        addr,
        sessions,
        releases,
        stop: Some(stop),
        stopped,
    }
}

async fn start_server() -> Running {
    start_with(TetherServerBuilder::new()).await
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, frame: Value) {
    ws.send(Message::Text(frame.to_string().into())).await.expect("send");
}

async fn recv(ws: &mut ClientWs) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timeout")
        .expect("stream ended")
        .expect("recv");
    serde_json::from_str(msg.to_text().expect("text frame")).expect("json")
}

async fn call(ws: &mut ClientWs, sync_id: &str, command: &str, content: Value) -> Value {
    send(ws, json!({"syncId": sync_id, "command": command, "content": content})).await;
    let resp = recv(ws).await;
    assert_eq!(resp["syncId"], sync_id);
    resp["data"].clone()
}

/// verify + bind as account 10001; returns the session key.
async fn login(ws: &mut ClientWs) -> String {
    let issued = call(ws, "v", "verify", json!({})).await;
    assert_eq!(issued["code"], 0);
    let key = issued["session"].as_str().expect("session key").to_owned();
    let bound = call(ws, "b", "bind", json!({"sessionKey": key, "qq": 10001})).await;
    assert_eq!(bound["code"], 0);
    key
}

async fn wait_for(mut done: impl FnMut() -> bool) {
    for _ in 0..100 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached");
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_connection_issues_pending_session() {
    let server = start_server().await;
    let _ws = connect(&server.addr).await;

    wait_for(|| server.sessions.len() == 1).await;
}

#[tokio::test]
async fn test_verify_returns_live_session_key() {
    let server = start_server().await;
    let mut ws = connect(&server.addr).await;

    let issued = call(&mut ws, "1", "verify", json!({})).await;

    assert_eq!(issued["code"], 0);
    let key = SessionKey::from(issued["session"].as_str().unwrap());
    let session = server.sessions.get(&key).expect("key should be live");
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_verify_wrong_key_is_auth_key_fail() {
    let server = start_with(
        TetherServerBuilder::new()
            .session_config(SessionConfig::default().with_verify_key("secret")),
    )
    .await;
    let mut ws = connect(&server.addr).await;

    let wrong = call(&mut ws, "1", "verify", json!({"verifyKey": "guess"})).await;
    let right = call(&mut ws, "2", "verify", json!({"verifyKey": "secret"})).await;

    assert_eq!(wrong, StatusCode::AuthKeyFail.to_value());
    assert_eq!(right["code"], 0);
}

#[tokio::test]
async fn test_failed_verify_revokes_earlier_pass() {
    let server = start_with(
        TetherServerBuilder::new()
            .session_config(SessionConfig::default().with_verify_key("secret")),
    )
    .await;
    let mut ws = connect(&server.addr).await;

    let right = call(&mut ws, "1", "verify", json!({"verifyKey": "secret"})).await;
    let key = right["session"].as_str().unwrap().to_owned();
    let wrong = call(&mut ws, "2", "verify", json!({"verifyKey": "guess"})).await;
    let bound = call(&mut ws, "3", "bind", json!({"sessionKey": key, "qq": 10001})).await;

    assert_eq!(right["code"], 0);
    assert_eq!(wrong, StatusCode::AuthKeyFail.to_value());
    assert_eq!(bound, StatusCode::UnauthenticatedAccess.to_value());
}

#[tokio::test]
async fn test_bind_before_verify_is_unauthenticated() {
    let server = start_server().await;
    let mut ws = connect(&server.addr).await;

    let resp = call(&mut ws, "1", "bind", json!({"qq": 10001})).await;

    assert_eq!(resp, StatusCode::UnauthenticatedAccess.to_value());
}

#[tokio::test]
async fn test_bind_rejects_foreign_key_and_unknown_bot() {
    let server = start_server().await;
    let mut ws = connect(&server.addr).await;
    let issued = call(&mut ws, "1", "verify", json!({})).await;
    let key = issued["session"].as_str().unwrap().to_owned();

    let foreign = call(&mut ws, "2", "bind", json!({"sessionKey": "not-mine", "qq": 10001})).await;
    let no_bot = call(&mut ws, "3", "bind", json!({"sessionKey": key, "qq": 42})).await;

    assert_eq!(foreign, StatusCode::IllegalSession.to_value());
    assert_eq!(no_bot, StatusCode::NoBot.to_value());
}

#[tokio::test]
async fn test_routed_command_before_bind_is_unauthenticated() {
    let server = start_server().await;
    let mut ws = connect(&server.addr).await;
    call(&mut ws, "1", "verify", json!({})).await;

    let resp = call(&mut ws, "2", "friendList", json!({})).await;

    assert_eq!(resp, StatusCode::UnauthenticatedAccess.to_value());
}

#[tokio::test]
async fn test_about_works_without_session() {
    let server = start_server().await;
    let mut ws = connect(&server.addr).await;

    let resp = call(&mut ws, "1", "about", json!({})).await;

    assert_eq!(resp["code"], 0);
    assert!(resp["data"]["version"].is_string());
}

#[tokio::test]
async fn test_bound_session_routes_commands() {
    let server = start_server().await;
    let mut ws = connect(&server.addr).await;
    login(&mut ws).await;

    let friends = call(&mut ws, "1", "friendList", json!({})).await;
    let unsupported = call(&mut ws, "2", "muteAll", json!({"target": 1})).await;
    let unknown = call(&mut ws, "3", "noSuchCommand", json!({})).await;
    let invalid = call(&mut ws, "4", "deleteFriend", json!({"target": "x"})).await;

    assert_eq!(friends["data"][0]["id"], 10002);
    assert_eq!(unsupported, StatusCode::OperationNotSupported.to_value());
    assert_eq!(unknown, StatusCode::OperationNotSupported.to_value());
    assert_eq!(invalid, StatusCode::InvalidParameter.to_value());
}

#[tokio::test]
async fn test_malformed_frame_gets_invalid_parameter_and_loop_continues() {
    let server = start_server().await;
    let mut ws = connect(&server.addr).await;

    ws.send(Message::Text("not json".to_string().into())).await.expect("send");
    let resp = recv(&mut ws).await;
    assert_eq!(resp, StatusCode::InvalidParameter.to_value());

    let about = call(&mut ws, "after", "about", json!({})).await;
    assert_eq!(about["code"], 0);
}

#[tokio::test]
async fn test_responses_follow_request_order() {
    let server = start_server().await;
    let mut ws = connect(&server.addr).await;
    login(&mut ws).await;

    for target in 1..=6 {
        send(
            &mut ws,
            json!({
                "syncId": target.to_string(),
                "command": "deleteFriend",
                "content": {"target": target},
            }),
        )
        .await;
    }

    for target in 1..=6 {
        let resp = recv(&mut ws).await;
        assert_eq!(resp["syncId"], target.to_string());
    }
}

#[tokio::test]
async fn test_release_closes_session_and_releases_bot() {
    let server = start_server().await;
    let mut ws = connect(&server.addr).await;
    let key = login(&mut ws).await;

    let resp = call(&mut ws, "r", "release", json!({})).await;

    assert_eq!(resp, StatusCode::Success.to_value());
    assert!(server.sessions.get(&SessionKey::from(key.as_str())).is_none());
    assert_eq!(server.releases.load(Ordering::SeqCst), 1);

    let after = call(&mut ws, "x", "friendList", json!({})).await;
    assert_eq!(after, StatusCode::UnauthenticatedAccess.to_value());
}

#[tokio::test]
async fn test_verify_after_release_issues_fresh_key() {
    let server = start_server().await;
    let mut ws = connect(&server.addr).await;
    let old = login(&mut ws).await;
    call(&mut ws, "r", "release", json!({})).await;

    let issued = call(&mut ws, "v2", "verify", json!({})).await;
    let fresh = issued["session"].as_str().unwrap().to_owned();
    let stale = call(&mut ws, "b2", "bind", json!({"sessionKey": old, "qq": 10001})).await;
    let rebound = call(&mut ws, "b3", "bind", json!({"sessionKey": fresh, "qq": 10001})).await;

    assert_ne!(fresh, old);
    assert_eq!(stale, StatusCode::IllegalSession.to_value());
    assert_eq!(rebound, StatusCode::Success.to_value());
}

#[tokio::test]
async fn test_disconnect_closes_session() {
    let server = start_server().await;
    let mut ws = connect(&server.addr).await;
    login(&mut ws).await;

    ws.close(None).await.expect("close");
    drop(ws);

    let releases = Arc::clone(&server.releases);
    wait_for(|| releases.load(Ordering::SeqCst) == 1).await;
    wait_for(|| server.sessions.is_empty()).await;
}

#[tokio::test]
async fn test_idle_timeout_closes_connection() {
    let server = start_with(
        TetherServerBuilder::new()
            .server_config(ServerConfig::default().with_idle_timeout(Duration::from_millis(50))),
    )
    .await;
    let mut ws = connect(&server.addr).await;

    let result = tokio::time::timeout(Duration::from_secs(2), ws.next()).await;

    match result {
        Ok(Some(Ok(Message::Close(_)))) | Ok(None) | Ok(Some(Err(_))) => {}
        other => panic!("expected close, got {other:?}"),
    }
    wait_for(|| server.sessions.is_empty()).await;
}

#[tokio::test]
async fn test_disabled_command_is_unsupported() {
    let mut registry = Registry::standard();
    registry.disable(paths::FRIEND_LIST);
    let server = start_with(TetherServerBuilder::new().registry(registry)).await;
    let mut ws = connect(&server.addr).await;
    login(&mut ws).await;

    let resp = call(&mut ws, "1", "friendList", json!({})).await;

    assert_eq!(resp, StatusCode::OperationNotSupported.to_value());
}

#[tokio::test]
async fn test_shutdown_closes_all_sessions() {
    let mut server = start_server().await;
    let mut first = connect(&server.addr).await;
    let mut second = connect(&server.addr).await;
    login(&mut first).await;
    login(&mut second).await;

    server.stop.take().unwrap().send(()).unwrap();
    (&mut server.stopped).await.unwrap();

    assert!(server.sessions.is_empty());
    assert_eq!(server.releases.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_pending_handshake_survives_other_connection_closing() {
    let server = start_server().await;
    let mut first = connect(&server.addr).await;
    wait_for(|| server.sessions.len() == 1).await;

    // Connected at the TCP level, upgrade request not sent yet.
    let tcp = TcpStream::connect(server.addr.as_str()).await.expect("tcp connect");
    tokio::time::sleep(Duration::from_millis(50)).await;

    first.close(None).await.expect("close");
    drop(first);
    wait_for(|| server.sessions.is_empty()).await;

    let (mut second, _) = tokio_tungstenite::client_async(format!("ws://{}", server.addr), tcp)
        .await
        .expect("handshake should complete after another connection ended");
    let about = json!({"syncId": "1", "command": "about", "content": {}});
    second
        .send(Message::Text(about.to_string().into()))
        .await
        .expect("send");
    let reply = tokio::time::timeout(Duration::from_secs(5), second.next())
        .await
        .expect("timeout")
        .expect("stream ended")
        .expect("recv");
    let reply: Value = serde_json::from_str(reply.to_text().expect("text frame")).expect("json");
    assert_eq!(reply["syncId"], "1");
    assert_eq!(reply["data"]["code"], 0);
}

#[tokio::test]
async fn test_idle_tcp_client_does_not_block_new_connections() {
    let server = start_server().await;
    let _idle = TcpStream::connect(server.addr.as_str()).await.expect("tcp connect");

    let mut ws = tokio::time::timeout(Duration::from_secs(2), connect(&server.addr))
        .await
        .expect("a silent client must not hold up the accept loop");

    let about = call(&mut ws, "1", "about", json!({})).await;
    assert_eq!(about["code"], 0);
}

#[tokio::test]
async fn test_handshake_timeout_drops_silent_client() {
    let server = start_with(
        TetherServerBuilder::new().server_config(
            ServerConfig::default().with_handshake_timeout(Duration::from_millis(100)),
        ),
    )
    .await;
    let mut idle = TcpStream::connect(server.addr.as_str()).await.expect("tcp connect");

    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_secs(2), idle.read(&mut buf))
        .await
        .expect("server should drop the client");

    assert!(matches!(read, Ok(0) | Err(_)), "expected EOF, got {read:?}");
    assert!(server.sessions.is_empty());
}
