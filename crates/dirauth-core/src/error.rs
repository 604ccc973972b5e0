//! Error types for identity resolution.
//!
//! Directory-domain failures (`Connection`, `Bind`, `Search`) are kept as
//! distinct variants because the resolver's propagation policy treats them
//! specially: in debug mode they surface to the caller, in production mode
//! they degrade to an empty result.

use thiserror::Error;

/// Main error type for identity resolution operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Opening a transport to the directory endpoint failed
    #[error("Directory connection failed: {0}")]
    Connection(String),

    /// Binding to the directory failed
    #[error("Directory bind failed: {0}")]
    Bind(String),

    /// A directory search failed
    #[error("Directory search failed: {0}")]
    Search(String),

    /// An entry lacked an attribute the configuration requires
    #[error("Directory entry missing attribute: {0}")]
    MissingAttribute(String),

    /// Error reported by the store collaborator, passed through unmodified
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Operation timed out
    #[error("Timeout waiting for directory: {0}")]
    Timeout(String),
}

/// Specialized result type for identity resolution operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::Bind(_) => "BIND_ERROR",
            Self::Search(_) => "SEARCH_ERROR",
            Self::MissingAttribute(_) => "MISSING_ATTRIBUTE",
            Self::Store(_) => "STORE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::Timeout(_) => "TIMEOUT",
        }
    }

    /// Returns true if the error belongs to the directory failure domain.
    ///
    /// Only these errors participate in the debug/non-debug propagation
    /// policy; schema, store, and configuration errors always surface.
    #[must_use]
    pub const fn is_directory_error(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Bind(_) | Self::Search(_) | Self::Timeout(_)
        )
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Store(_) | Self::Config(_)
        )
    }
}

// Conversions from external error types
impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Config(err.to_string())
    }
}
