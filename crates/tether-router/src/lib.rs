//! Command routing for Tether.
//!
//! Takes a decoded [`CommandEnvelope`](tether_protocol::CommandEnvelope)
//! plus the caller's session and produces exactly one
//! [`ResponseEnvelope`](tether_protocol::ResponseEnvelope).
//!
//! - **Registry** ([`Registry`], [`Command`]): which paths exist and which
//!   are switched off. Built once, then read-only.
//! - **Router** ([`Router`]): the auth gate, sub-command selection,
//!   parameter extraction, and status mapping.
//! - **Actions** ([`Actions`]): the business backend, one method per
//!   command. Unimplemented methods answer "operation not supported".
//!
//! ```text
//! Server (above)   ← owns connections, handles verify/bind/release
//!     ↕
//! Router (this crate)  ← everything else
//!     ↕
//! Session Layer (below)  ← who the caller is
//! ```

#![allow(async_fn_in_trait)]

mod actions;
mod command;
pub mod dto;
mod error;
mod registry;
mod request;
mod router;

pub use actions::Actions;
pub use command::{Command, SubCommand, paths};
pub use error::{HandlerError, HandlerResult};
pub use registry::{Registry, Route};
pub use request::Request;
pub use router::Router;
