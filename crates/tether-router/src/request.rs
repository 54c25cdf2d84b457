//! Building a handler's input from a command payload.
//!
//! A handler receives one immutable [`Request`]: the caller's
//! authenticated session plus the parameters the router extracted. Clients
//! never supply the session part; the router fills it in from the
//! connection.
//!
//! Parameters come from the payload in one of two ways:
//!
//! - [`decode`] deserializes the whole payload into a typed struct.
//! - [`scalar`] pulls one required field and parses it, accepting both
//!   JSON numbers and numeric strings (`1234` and `"1234"`).
//!
//! Both answer [`StatusCode::InvalidParameter`] on any mismatch.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tether_protocol::StatusCode;
use tether_session::{AuthedSession, Bot};

/// The single argument passed to a handler.
pub struct Request<'s, B: Bot, P> {
    /// The caller's session.
    pub session: &'s AuthedSession<B>,
    /// Parameters extracted from the payload.
    pub params: P,
}

impl<'s, B: Bot, P> Request<'s, B, P> {
    /// The bot the caller is bound to.
    pub fn bot(&self) -> &'s B {
        self.session.bot()
    }
}

/// Deserializes the payload into `P`.
pub(crate) fn decode<P: DeserializeOwned>(content: Option<&Value>) -> Result<P, StatusCode> {
    let content = content.ok_or(StatusCode::InvalidParameter)?;
    P::deserialize(content).map_err(|e| {
        tracing::debug!(error = %e, "payload does not match parameter shape");
        StatusCode::InvalidParameter
    })
}

/// Reads the required scalar `field` from the payload.
pub(crate) fn scalar<T: FromStr>(content: Option<&Value>, field: &str) -> Result<T, StatusCode> {
    let parsed = match content.and_then(|c| c.get(field)) {
        Some(Value::Number(n)) => n.to_string().parse().ok(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        tracing::debug!(field, "missing or malformed scalar");
        StatusCode::InvalidParameter
    })
}
