//! `TetherServer` builder and server loop.
//!
//! This is the entry point for running a Tether server. It ties together
//! all the layers: transport → protocol → session → router.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tether_protocol::JsonCodec;
use tether_router::{Actions, Registry, Router};
use tether_session::{BotProvider, SessionConfig, SessionManager};
use tether_transport::{Connection, Incoming, Transport, WebSocketIncoming, WebSocketTransport};
use tokio::task::JoinSet;

use crate::TetherError;
use crate::handler::handle_connection;

/// How long a client may take to finish the WebSocket upgrade.
const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection-level settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Close a connection that sends nothing for this long. `None` keeps
    /// idle connections open.
    pub idle_timeout: Option<Duration>,
    /// Drop a client that has not completed the WebSocket upgrade in time.
    pub handshake_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            idle_timeout: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Sets the idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Sets the handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<P: BotProvider, A: Actions<Bot = P::Bot>> {
    pub(crate) sessions: Arc<SessionManager<P::Bot>>,
    pub(crate) router: Router<A>,
    pub(crate) provider: P,
    pub(crate) codec: JsonCodec,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a Tether server.
///
/// # Example
///
/// ```rust,ignore
/// use tether::prelude::*;
///
/// let server = TetherServer::builder()
///     .bind("0.0.0.0:8080")
///     .session_config(SessionConfig::default().with_verify_key("secret"))
///     .build(my_provider, my_actions)
///     .await?;
/// server.run().await
/// ```
pub struct TetherServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    server_config: ServerConfig,
    registry: Registry,
}

impl TetherServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
            server_config: ServerConfig::default(),
            registry: Registry::standard(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets the connection configuration.
    pub fn server_config(mut self, config: ServerConfig) -> Self {
        self.server_config = config;
        self
    }

    /// Replaces the standard command table.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Binds the listener and assembles the server.
    ///
    /// `provider` resolves bots for `bind`; `actions` serves every routed
    /// command.
    pub async fn build<P, A>(
        self,
        provider: P,
        actions: A,
    ) -> Result<TetherServer<P, A>, TetherError>
    where
        P: BotProvider,
        A: Actions<Bot = P::Bot>,
    {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            sessions: Arc::new(SessionManager::new(self.session_config)),
            router: Router::with_registry(self.registry, actions),
            provider,
            codec: JsonCodec,
            config: self.server_config,
        });

        Ok(TetherServer { transport, state })
    }
}

impl Default for TetherServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Tether server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct TetherServer<P: BotProvider, A: Actions<Bot = P::Bot>> {
    transport: WebSocketTransport,
    state: Arc<ServerState<P, A>>,
}

impl<P, A> TetherServer<P, A>
where
    P: BotProvider,
    A: Actions<Bot = P::Bot>,
{
    /// Creates a new builder.
    pub fn builder() -> TetherServerBuilder {
        TetherServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The session manager shared by every connection.
    pub fn sessions(&self) -> Arc<SessionManager<P::Bot>> {
        Arc::clone(&self.state.sessions)
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), TetherError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// On shutdown every connection task is aborted and every session is
    /// closed, releasing all bound bots.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), TetherError>
    where
        F: Future<Output = ()> + Send,
    {
        tracing::info!("Tether server running");

        let mut connections = JoinSet::new();
        let mut shutdown = std::pin::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(incoming) => {
                        let state = Arc::clone(&self.state);
                        connections.spawn(serve(incoming, state));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        tracing::info!(open = connections.len(), "shutting down");
        connections.shutdown().await;
        self.transport.shutdown().await?;
        self.state.sessions.close_all();
        Ok(())
    }
}

/// Upgrades one client and serves it until it disconnects.
///
/// Runs on the connection's own task so a slow or silent client never
/// holds up the accept loop.
async fn serve<P, A>(incoming: WebSocketIncoming, state: Arc<ServerState<P, A>>)
where
    P: BotProvider,
    A: Actions<Bot = P::Bot>,
{
    let addr = incoming.peer_addr();
    let upgrade = tokio::time::timeout(state.config.handshake_timeout, incoming.upgrade());
    let conn = match upgrade.await {
        Ok(Ok(conn)) => conn,
        Ok(Err(e)) => {
            tracing::debug!(%addr, error = %e, "WebSocket upgrade failed");
            return;
        }
        Err(_) => {
            tracing::debug!(%addr, "WebSocket upgrade timed out");
            return;
        }
    };

    let conn_id = conn.id();
    if let Err(e) = handle_connection(conn, state).await {
        tracing::debug!(%conn_id, error = %e, "connection ended with error");
    }
}
