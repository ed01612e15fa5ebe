//! Error types for repomaster-core

use std::path::PathBuf;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file does not exist
    #[error("configuration file not found: {}", path.display())]
    ConfigNotFound {
        /// Expected location
        path: PathBuf,
    },

    /// `.env` file could not be parsed
    #[error("failed to parse {}: {message}", path.display())]
    EnvParse {
        /// File being parsed
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Required API key is absent or still the placeholder
    #[error("{key} is not configured ({reason})")]
    ApiKeyNotConfigured {
        /// Variable name
        key: String,
        /// Missing or placeholder
        reason: String,
    },

    /// Unknown launch or backend mode name
    #[error("unknown {kind} mode: {value}")]
    UnknownMode {
        /// "launch" or "backend"
        kind: &'static str,
        /// Rejected input
        value: String,
    },

    /// Layered settings failed to build or deserialize
    #[error("invalid launcher settings: {0}")]
    Settings(#[from] config::ConfigError),

    /// TOML serialization failed
    #[error("failed to serialize {what}: {message}")]
    Serialize {
        /// What was being serialized
        what: &'static str,
        /// Serializer message
        message: String,
    },

    /// Filesystem error
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
