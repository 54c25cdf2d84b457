//! # Tether
//!
//! A session-and-command server for bot backends.
//!
//! Clients connect over WebSocket, obtain a session key with `verify`, bind
//! it to a bot with `bind`, and then issue commands. Tether handles the
//! session lifecycle, the auth gate, parameter decoding, and status codes;
//! the backend implements [`Actions`](tether_router::Actions) for the
//! commands it supports and a [`BotProvider`](tether_session::BotProvider)
//! to look bots up.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tether::prelude::*;
//!
//! struct MyBot;
//! impl Bot for MyBot {
//!     fn account(&self) -> i64 { 10001 }
//! }
//!
//! struct Fleet;
//! impl BotProvider for Fleet {
//!     type Bot = MyBot;
//!     async fn find_bot(&self, account: i64) -> Result<MyBot, SessionError> {
//!         if account == 10001 { Ok(MyBot) } else { Err(SessionError::NoBot(account)) }
//!     }
//! }
//!
//! struct Backend;
//! impl Actions for Backend {
//!     type Bot = MyBot;
//! }
//!
//! # async fn run() -> Result<(), TetherError> {
//! let server = TetherServer::<Fleet, Backend>::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(Fleet, Backend)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::TetherError;
pub use server::{ServerConfig, TetherServer, TetherServerBuilder};

pub use tether_protocol as protocol;
pub use tether_router as router;
pub use tether_session as session;
pub use tether_transport as transport;

/// Installs a `tracing` subscriber filtered by `RUST_LOG`, defaulting to
/// `info`. Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Everything needed to implement a backend and run a server.
pub mod prelude {
    pub use crate::{ServerConfig, TetherError, TetherServer, TetherServerBuilder};
    pub use tether_protocol::{CommandEnvelope, ResponseEnvelope, StatusCode, Value};
    pub use tether_router::dto;
    pub use tether_router::{Actions, HandlerError, HandlerResult, Registry, Request, paths};
    pub use tether_session::{
        Bot, BotProvider, SessionConfig, SessionError, SessionKey, SessionManager,
    };
}
