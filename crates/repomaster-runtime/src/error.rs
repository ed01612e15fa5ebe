//! Error types for process and environment operations

use std::path::PathBuf;

/// Errors raised while preparing or running the Python side
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// No candidate interpreter could be run
    #[error("Python interpreter not found (tried: {})", tried.join(", "))]
    PythonNotFound {
        /// Names or paths that were tried
        tried: Vec<String>,
    },

    /// Interpreter found but older than required
    #[error("Python {found} is too old. Minimum required: {required}")]
    PythonTooOld {
        /// Detected version
        found: String,
        /// Minimum version
        required: String,
    },

    /// Version text could not be parsed
    #[error("cannot parse Python version from {0:?}")]
    VersionParse(String),

    /// Port already bound by another process
    #[error("port {port} is already in use on {host}{}", suggestion_text(.suggestion))]
    PortInUse {
        /// Host that was probed
        host: String,
        /// Requested port
        port: u16,
        /// Next free port nearby, if one was found
        suggestion: Option<u16>,
    },

    /// Required Python module cannot be imported
    #[error("required module {module} is not importable: {detail}")]
    MissingDependency {
        /// Module (or alternatives) that failed
        module: String,
        /// Import error text reported by the interpreter
        detail: String,
    },

    /// Child process could not be started
    #[error("failed to start {}: {source}", program.display())]
    Spawn {
        /// Program that failed to start
        program: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Subprocess exited with non-zero status
    #[error("command failed (exit code {code}): {stderr}")]
    CommandFailed {
        /// Exit code, -1 when killed by a signal
        code: i32,
        /// Captured stderr output
        stderr: String,
    },

    /// I/O error while waiting on or signalling a child
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn suggestion_text(suggestion: &Option<u16>) -> String {
    match suggestion {
        Some(port) => format!(" (try --streamlit-port {port})"),
        None => String::new(),
    }
}

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_in_use_message() {
        let err = RuntimeError::PortInUse {
            host: "localhost".to_string(),
            port: 8501,
            suggestion: Some(8502),
        };
        assert_eq!(
            err.to_string(),
            "port 8501 is already in use on localhost (try --streamlit-port 8502)"
        );

        let err = RuntimeError::PortInUse {
            host: "localhost".to_string(),
            port: 8501,
            suggestion: None,
        };
        assert_eq!(err.to_string(), "port 8501 is already in use on localhost");
    }
}
