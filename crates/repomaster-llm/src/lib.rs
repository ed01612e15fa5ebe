//! RepoMaster LLM - talking to the configured model endpoint
//!
//! This crate provides:
//! - Client: async-openai chat client for OpenAI-compatible endpoints (Z.ai GLM)
//! - Probe: one-message connectivity check with outcome classification
//! - Search: Serper and Jina reachability checks
//! - Analysis: repository scan and summary prompt

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod analysis;
pub mod client;
pub mod error;
pub mod probe;
pub mod search;
pub mod util;

pub use analysis::{analyze, RepoSummary};
pub use client::{ChatBackend, ChatReply, ChatRequest, ClientConfig, OpenAiCompatible};
pub use error::{ApiErrorKind, Error, Result};
pub use probe::{probe_chat, ChatOutcome};
pub use search::{SearchProbe, ServiceStatus};
