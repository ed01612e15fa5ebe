//! Error types for repomaster-llm

use thiserror::Error;

/// What an API error means for the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Key missing, wrong or revoked
    Auth,
    /// Account has no balance left (Z.ai code 1113)
    InsufficientBalance,
    /// Too many requests
    RateLimit,
    /// Anything else
    Other,
}

/// LLM error type
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// API returned an error; the message is already sanitized
    #[error("api error: {message}")]
    Api {
        /// Classification of the raw error
        kind: ApiErrorKind,
        /// Sanitized message
        message: String,
    },

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Filesystem error while scanning a repository
    #[error("scan error: {0}")]
    Scan(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
