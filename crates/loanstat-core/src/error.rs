//! Shared error type across loanstat crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request or config.
    BadRequest,
    /// Requested resource does not exist.
    NotFound,
    /// Downstream dependency (database) unavailable.
    Unavailable,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Unavailable => "UNAVAILABLE",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, LoanstatError>;

/// Unified error type used by core and service.
#[derive(Debug, Error)]
pub enum LoanstatError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database unavailable: {0}")]
    Unavailable(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl LoanstatError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            LoanstatError::BadRequest(_) => ClientCode::BadRequest,
            LoanstatError::NotFound(_) => ClientCode::NotFound,
            LoanstatError::Unavailable(_) => ClientCode::Unavailable,
            LoanstatError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            LoanstatError::Internal(_) => ClientCode::Internal,
        }
    }
}
