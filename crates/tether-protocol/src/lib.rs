//! Wire protocol for Tether.
//!
//! This crate defines what travels over a connection once the transport
//! has delivered a text frame:
//!
//! - **Envelopes** ([`CommandEnvelope`], [`ResponseEnvelope`]): a request
//!   carrying a caller-chosen `syncId`, and the single response that echoes it.
//! - **Status codes** ([`StatusCode`]): the closed set of outcome codes
//!   the server can answer with instead of a business payload.
//! - **Session payloads** ([`VerifyRequest`], [`BindRequest`], [`SessionIssued`])
//!   exchanged while a connection obtains and authenticates its session.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those values are
//!   converted to and from text frames.
//!
//! ```text
//! Transport (text) → Protocol (CommandEnvelope) → Session + Router
//! ```

mod codec;
mod error;
mod status;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use status::{StatusCode, StatusPayload};
pub use types::{BindRequest, CommandEnvelope, ResponseEnvelope, SessionIssued, VerifyRequest};

/// Re-exported so downstream crates name the same payload type.
pub use serde_json::Value;
