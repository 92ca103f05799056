// Service error taxonomy
//
// What a caller can see. Downstream failures are logged here with full
// detail and surface only as an opaque `Internal` message.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("User must be authenticated")]
    Unauthenticated,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ServiceError::InvalidArgument(message.into())
    }

    /// Log `error` server-side and return an opaque `Internal` error
    pub fn internal(public_message: &str, error: impl fmt::Display) -> Self {
        // `{:#}` prints the full anyhow context chain
        let detail = format!("{:#}", error);
        tracing::error!(error = %detail, "{}", public_message);
        ServiceError::Internal(public_message.to_string())
    }

    /// Callable-protocol status code
    pub fn status(&self) -> &'static str {
        match self {
            ServiceError::Unauthenticated => "UNAUTHENTICATED",
            ServiceError::InvalidArgument(_) => "INVALID_ARGUMENT",
            ServiceError::Internal(_) => "INTERNAL",
        }
    }

    /// HTTP status code for the transport
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::Unauthenticated => 401,
            ServiceError::InvalidArgument(_) => 400,
            ServiceError::Internal(_) => 500,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
