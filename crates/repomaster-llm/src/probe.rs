//! API connectivity probe
//!
//! Sends one short chat completion and turns the result into an outcome
//! that says whether the configuration works, not just whether the call did.

use std::fmt;

use tracing::{info, warn};

use crate::client::{ChatBackend, ChatReply, ChatRequest};
use crate::error::{ApiErrorKind, Error, Result};

/// Message sent by the connectivity probe
pub const PROBE_PROMPT: &str = "Hello! Can you confirm you're working?";

/// Token limit for the probe reply
pub const PROBE_MAX_TOKENS: u32 = 50;

/// Classified result of a chat call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// The model answered
    Replied(ChatReply),
    /// Endpoint reachable but the key was refused
    KeyRejected(String),
    /// Endpoint and key accepted, account has no balance
    InsufficientBalance(String),
    /// Unreachable, timed out, or another error
    Failed(String),
}

impl ChatOutcome {
    /// Classify a chat result
    #[must_use]
    pub fn from_result(result: Result<ChatReply>) -> Self {
        match result {
            Ok(reply) => Self::Replied(reply),
            Err(Error::Api {
                kind: ApiErrorKind::Auth,
                message,
            }) => Self::KeyRejected(message),
            Err(Error::Api {
                kind: ApiErrorKind::InsufficientBalance,
                message,
            }) => Self::InsufficientBalance(message),
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    /// Whether the integration is wired up correctly
    ///
    /// A rejected key still proves the endpoint and request format work.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for ChatOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replied(_) => f.write_str("API connection successful"),
            Self::KeyRejected(_) => {
                f.write_str("API reachable, but the key was rejected")
            }
            Self::InsufficientBalance(_) => {
                f.write_str("API configured correctly, but the account balance is insufficient")
            }
            Self::Failed(detail) => write!(f, "API connection failed: {detail}"),
        }
    }
}

/// Send the connectivity probe through `backend`
pub async fn probe_chat(backend: &dyn ChatBackend) -> ChatOutcome {
    let outcome =
        ChatOutcome::from_result(backend.complete(ChatRequest::user(PROBE_PROMPT, PROBE_MAX_TOKENS)).await);
    match &outcome {
        ChatOutcome::Failed(detail) => warn!(%detail, "Chat probe failed"),
        other => info!(outcome = %other, "Chat probe finished"),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockChatBackend;

    fn backend_returning(result: fn() -> Result<ChatReply>) -> MockChatBackend {
        let mut mock = MockChatBackend::new();
        mock.expect_complete()
            .withf(|req| req.user == PROBE_PROMPT && req.max_tokens == PROBE_MAX_TOKENS)
            .times(1)
            .returning(move |_| result());
        mock
    }

    #[tokio::test]
    async fn test_probe_connected() {
        let mock = backend_returning(|| {
            Ok(ChatReply {
                content: "Yes".to_string(),
                model: "glm-4.5".to_string(),
            })
        });
        let outcome = probe_chat(&mock).await;
        assert!(matches!(outcome, ChatOutcome::Replied(ref r) if r.content == "Yes"));
        assert!(outcome.is_configured());
    }

    #[tokio::test]
    async fn test_probe_key_rejected_counts_as_configured() {
        let mock = backend_returning(|| {
            Err(Error::Api {
                kind: ApiErrorKind::Auth,
                message: "invalid api key".to_string(),
            })
        });
        let outcome = probe_chat(&mock).await;
        assert!(matches!(outcome, ChatOutcome::KeyRejected(_)));
        assert!(outcome.is_configured());
    }

    #[tokio::test]
    async fn test_probe_balance() {
        let mock = backend_returning(|| {
            Err(Error::Api {
                kind: ApiErrorKind::InsufficientBalance,
                message: "1113".to_string(),
            })
        });
        assert!(matches!(
            probe_chat(&mock).await,
            ChatOutcome::InsufficientBalance(_)
        ));
    }

    #[tokio::test]
    async fn test_probe_network_failure() {
        let mock = backend_returning(|| Err(Error::Network("connection refused".to_string())));
        let outcome = probe_chat(&mock).await;
        assert!(!outcome.is_configured());
        assert_eq!(
            outcome.to_string(),
            "API connection failed: network error: connection refused"
        );
    }
}
