//! Transport abstraction layer for Tether.
//!
//! The command channel is a text protocol: every frame carries one JSON
//! document. [`Connection`] therefore moves `String`s rather than raw bytes,
//! and implementations are responsible for rejecting frames that are not
//! valid text.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketIncoming, WebSocketTransport};

use std::fmt;

/// Opaque identifier for a connection, used for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// A client accepted at the socket level whose handshake has not run yet.
    type Incoming: Incoming<Connection = Self::Connection, Error = Self::Error>;
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next client.
    ///
    /// Cancel-safe: this only accepts the socket, so dropping the future
    /// never strands a client mid-handshake. The handshake happens in
    /// [`Incoming::upgrade`].
    async fn accept(&mut self) -> Result<Self::Incoming, Self::Error>;

    /// Stops accepting new connections.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// A client that has connected but not completed the protocol handshake.
///
/// Upgrading may wait on the remote peer, so callers run it on the
/// connection's own task rather than in the accept loop.
pub trait Incoming: Send + 'static {
    /// The connection produced by a successful handshake.
    type Connection: Connection;
    /// The error type for a failed handshake.
    type Error: std::error::Error + Send + Sync;

    /// Performs the handshake and returns the ready connection.
    async fn upgrade(self) -> Result<Self::Connection, Self::Error>;
}

/// A single bidirectional text channel to one client.
///
/// Frames are delivered in the order they were sent; the per-connection
/// handler relies on this to answer requests first-in, first-out.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one text frame to the remote peer.
    async fn send(&self, text: &str) -> Result<(), Self::Error>;

    /// Receives the next text frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<String>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
