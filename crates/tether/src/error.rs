//! Unified error type for the Tether server.

use tether_protocol::ProtocolError;
use tether_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Only server setup and connection I/O produce these. Anything a client
/// does wrong is answered with a status on the wire instead.
#[derive(Debug, thiserror::Error)]
pub enum TetherError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
