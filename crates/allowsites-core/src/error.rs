//! Shared error type across allowsites crates.

use thiserror::Error;

/// Stable error codes surfaced in HTTP bodies and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed request.
    BadRequest,
    /// Configuration failed to parse or validate.
    InvalidConfig,
    /// Node type name not present in the registry.
    UnknownNodeType,
    /// Site key not present in the site repository.
    UnknownSite,
    /// Requested content does not exist on this site.
    NotFound,
    /// Unsupported configuration version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::UnknownNodeType => "UNKNOWN_NODE_TYPE",
            ErrorCode::UnknownSite => "UNKNOWN_SITE",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, AllowSitesError>;

/// Unified error type used by core and host.
#[derive(Debug, Error)]
pub enum AllowSitesError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid scope id: {0:?}")]
    InvalidScope(String),
    #[error("duplicate scope id: {0}")]
    DuplicateScope(String),
    #[error("unknown node type: {0}")]
    UnknownNodeType(String),
    #[error("unknown site: {0}")]
    UnknownSite(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl AllowSitesError {
    /// Map internal error to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            AllowSitesError::BadRequest(_) => ErrorCode::BadRequest,
            AllowSitesError::InvalidConfig(_)
            | AllowSitesError::InvalidScope(_)
            | AllowSitesError::DuplicateScope(_) => ErrorCode::InvalidConfig,
            AllowSitesError::UnknownNodeType(_) => ErrorCode::UnknownNodeType,
            AllowSitesError::UnknownSite(_) => ErrorCode::UnknownSite,
            AllowSitesError::NotFound(_) => ErrorCode::NotFound,
            AllowSitesError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            AllowSitesError::Internal(_) => ErrorCode::Internal,
        }
    }
}
