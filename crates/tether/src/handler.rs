//! Per-connection handler: session commands and command routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Issue a pending session for the connection
//!   2. Loop: receive a frame → decode a `CommandEnvelope` → answer it
//!   3. On exit, close whatever session the connection holds
//!
//! `verify`, `bind`, and `release` act on the connection's own session and
//! are answered here. Everything else goes to the router together with the
//! session the connection's key currently maps to. Frames are answered one
//! at a time, so responses leave in the order requests arrived.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tether_protocol::{
    BindRequest, Codec, CommandEnvelope, ResponseEnvelope, SessionIssued, StatusCode,
    VerifyRequest,
};
use tether_router::{Actions, paths};
use tether_session::{Bot, BotProvider, SessionError, SessionKey, SessionManager};
use tether_transport::{Connection, TransportError, WebSocketConnection};

use crate::TetherError;
use crate::server::ServerState;

/// The connection's hold on its session.
///
/// Dropping the guard closes the session, so cleanup happens however the
/// handler exits, including when its task is aborted at shutdown.
struct SessionGuard<B: Bot> {
    key: SessionKey,
    /// Set by a successful `verify`; cleared by `release` and by any later verify attempt.
    verified: bool,
    sessions: Arc<SessionManager<B>>,
}

impl<B: Bot> Drop for SessionGuard<B> {
    fn drop(&mut self) {
        self.sessions.close(&self.key);
    }
}

/// Commands the handler answers itself instead of routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionCommand {
    Verify,
    Bind,
    Release,
}

impl SessionCommand {
    fn parse(command: &str) -> Option<Self> {
        match command {
            paths::VERIFY => Some(Self::Verify),
            paths::BIND => Some(Self::Bind),
            paths::RELEASE => Some(Self::Release),
            _ => None,
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<P, A>(
    conn: WebSocketConnection,
    state: Arc<ServerState<P, A>>,
) -> Result<(), TetherError>
where
    P: BotProvider,
    A: Actions<Bot = P::Bot>,
{
    let conn_id = conn.id();
    let mut guard = SessionGuard {
        key: state.sessions.create_pending(),
        verified: false,
        sessions: Arc::clone(&state.sessions),
    };
    tracing::debug!(%conn_id, key = %guard.key, "handling new connection");
    let state: &ServerState<P, A> = &state;

    loop {
        let received = match state.config.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::info!(%conn_id, "connection idle, closing");
                    break;
                }
            },
            None => conn.recv().await,
        };

        let text = match received {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(TransportError::NotText(reason)) => {
                tracing::debug!(%conn_id, %reason, "dropping non-text frame");
                send(&conn, &state.codec, &StatusCode::InvalidParameter).await?;
                continue;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let envelope: CommandEnvelope = match state.codec.decode(&text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode command envelope");
                send(&conn, &state.codec, &StatusCode::InvalidParameter).await?;
                continue;
            }
        };

        let response = answer(state, &mut guard, envelope).await;
        send(&conn, &state.codec, &response).await?;
    }

    if let Err(e) = conn.close().await {
        tracing::trace!(%conn_id, error = %e, "close after disconnect");
    }
    // guard drops here → session closes.
    Ok(())
}

/// Produces the single response for one command envelope.
async fn answer<P, A>(
    state: &ServerState<P, A>,
    guard: &mut SessionGuard<P::Bot>,
    envelope: CommandEnvelope,
) -> ResponseEnvelope
where
    P: BotProvider,
    A: Actions<Bot = P::Bot>,
{
    let Some(command) = SessionCommand::parse(&envelope.command) else {
        let session = state.sessions.get(&guard.key);
        return state.router.route(session.as_deref(), envelope).await;
    };

    let content = envelope.content.as_ref();
    let outcome = match command {
        SessionCommand::Verify => verify(state, guard, content),
        SessionCommand::Bind => bind(state, guard, content).await,
        SessionCommand::Release => Ok(release(state, guard)),
    };

    ResponseEnvelope {
        sync_id: envelope.sync_id,
        data: outcome.unwrap_or_else(StatusCode::to_value),
    }
}

fn verify<P, A>(
    state: &ServerState<P, A>,
    guard: &mut SessionGuard<P::Bot>,
    content: Option<&Value>,
) -> Result<Value, StatusCode>
where
    P: BotProvider,
    A: Actions<Bot = P::Bot>,
{
    // Only the latest attempt counts: a failed verify revokes an earlier pass.
    guard.verified = false;

    let request = match content {
        Some(content) => {
            VerifyRequest::deserialize(content).map_err(|_| StatusCode::InvalidParameter)?
        }
        None => VerifyRequest::default(),
    };

    state
        .sessions
        .verify_key(request.verify_key.as_deref())
        .map_err(|e| rejected("verify", &e))?;

    // The pending window may have run out, or the client released.
    if state.sessions.get(&guard.key).is_none() {
        guard.key = state.sessions.create_pending();
    }
    guard.verified = true;

    serde_json::to_value(SessionIssued::new(guard.key.as_str())).map_err(|_| StatusCode::Internal)
}

async fn bind<P, A>(
    state: &ServerState<P, A>,
    guard: &SessionGuard<P::Bot>,
    content: Option<&Value>,
) -> Result<Value, StatusCode>
where
    P: BotProvider,
    A: Actions<Bot = P::Bot>,
{
    if !guard.verified {
        return Err(StatusCode::UnauthenticatedAccess);
    }

    let request = content
        .ok_or(StatusCode::InvalidParameter)
        .and_then(|c| BindRequest::deserialize(c).map_err(|_| StatusCode::InvalidParameter))?;

    if let Some(presented) = request.session_key.as_deref() {
        if presented != guard.key.as_str() {
            return Err(rejected("bind", &SessionError::IllegalSession(presented.to_owned())));
        }
    }

    let bot = state
        .provider
        .find_bot(request.qq)
        .await
        .map_err(|e| rejected("bind", &e))?;

    state
        .sessions
        .promote_live(bot, &guard.key)
        .map_err(|e| rejected("bind", &e))?;

    Ok(StatusCode::Success.to_value())
}

fn release<P, A>(state: &ServerState<P, A>, guard: &mut SessionGuard<P::Bot>) -> Value
where
    P: BotProvider,
    A: Actions<Bot = P::Bot>,
{
    state.sessions.close(&guard.key);
    guard.verified = false;
    StatusCode::Success.to_value()
}

fn rejected(command: &'static str, error: &SessionError) -> StatusCode {
    tracing::debug!(command, %error, "session command rejected");
    error.status()
}

/// Encodes `value` and sends it as one text frame.
async fn send<T: serde::Serialize>(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    value: &T,
) -> Result<(), TetherError> {
    let text = codec.encode(value)?;
    conn.send(&text).await?;
    Ok(())
}
