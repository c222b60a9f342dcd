//! Shared error type across Figures crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// No credentials supplied.
    AuthRequired,
    /// Credentials supplied but rejected.
    AuthFailed,
    /// Authenticated caller may not access the site.
    Forbidden,
    /// Unknown site or record.
    NotFound,
    /// One or more course filters are not courses of the site.
    InvalidFilter,
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
            ClientCode::AuthRequired => "AUTH_REQUIRED",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::Forbidden => "FORBIDDEN",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::InvalidFilter => "INVALID_FILTER",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }

    /// HTTP status the boundary responds with.
    /// Invalid filters surface as 404, like unknown records.
    pub fn http_status(self) -> u16 {
        match self {
            ClientCode::BadRequest | ClientCode::UnsupportedVersion => 400,
            ClientCode::AuthRequired | ClientCode::AuthFailed => 401,
            ClientCode::Forbidden => 403,
            ClientCode::NotFound | ClientCode::InvalidFilter => 404,
            ClientCode::Internal => 500,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, FiguresError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum FiguresError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("authentication credentials were not provided")]
    AuthRequired,
    #[error("auth failed")]
    AuthFailed,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid course filter: {}", rejected.join(", "))]
    InvalidFilter { rejected: Vec<String> },
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl FiguresError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            FiguresError::BadRequest(_) => ClientCode::BadRequest,
            FiguresError::AuthRequired => ClientCode::AuthRequired,
            FiguresError::AuthFailed => ClientCode::AuthFailed,
            FiguresError::Forbidden(_) => ClientCode::Forbidden,
            FiguresError::NotFound(_) => ClientCode::NotFound,
            FiguresError::InvalidFilter { .. } => ClientCode::InvalidFilter,
            FiguresError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            FiguresError::Internal(_) => ClientCode::Internal,
        }
    }
}
