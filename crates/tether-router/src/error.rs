//! How business handlers fail.

use tether_protocol::StatusCode;

/// A handler's failure, as far as the router needs to know about it.
///
/// The router never inspects a handler's internals. It only maps this
/// enum onto the response.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Answer with this status, e.g. [`StatusCode::NoElement`] when the
    /// target does not exist or [`StatusCode::BotMuted`].
    #[error("{0}")]
    Status(StatusCode),

    /// The backend does not implement this command.
    #[error("not supported by this backend")]
    Unsupported,

    /// Anything else. The reason is logged; the client sees
    /// [`StatusCode::Internal`].
    #[error("handler failed: {0}")]
    Failed(String),
}

impl HandlerError {
    /// The status a client receives for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Status(status) => *status,
            Self::Unsupported => StatusCode::OperationNotSupported,
            Self::Failed(_) => StatusCode::Internal,
        }
    }
}

impl From<StatusCode> for HandlerError {
    fn from(status: StatusCode) -> Self {
        Self::Status(status)
    }
}

/// What every handler returns.
pub type HandlerResult<T> = Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_passes_through() {
        assert_eq!(HandlerError::Status(StatusCode::BotMuted).status(), StatusCode::BotMuted);
    }

    #[test]
    fn test_unsupported_maps_to_operation_not_supported() {
        assert_eq!(HandlerError::Unsupported.status(), StatusCode::OperationNotSupported);
    }

    #[test]
    fn test_failed_maps_to_internal() {
        let err = HandlerError::Failed("backend timeout".into());
        assert_eq!(err.status(), StatusCode::Internal);
        assert!(err.to_string().contains("backend timeout"));
    }
}
