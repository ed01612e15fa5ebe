//! OpenAI-compatible chat client
//!
//! Z.ai's GLM endpoint speaks the OpenAI chat-completions protocol, so the
//! client is async-openai pointed at the configured base URL.

use std::fmt;
use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    },
    Client,
};
use repomaster_core::{mask_api_key, ApiSettings};
use tracing::{debug, instrument};

use crate::error::{ApiErrorKind, Error, Result};
use crate::util::{classify_api_error, sanitize_api_error};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One-shot chat request: optional system prompt plus one user message
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// System prompt
    pub system: Option<String>,
    /// User message
    pub user: String,
    /// Completion token limit
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl ChatRequest {
    /// Request with just a user message
    pub fn user(content: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: None,
            user: content.into(),
            max_tokens,
            temperature: None,
        }
    }

    /// Set the system prompt
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Model answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Text of the first choice
    pub content: String,
    /// Model that answered
    pub model: String,
}

/// Anything that can answer a [`ChatRequest`]
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the request and return the first choice
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply>;
}

/// Connection settings for [`OpenAiCompatible`]
#[derive(Clone)]
pub struct ClientConfig {
    /// API key
    pub api_key: String,
    /// Endpoint, e.g. `https://api.z.ai/api/paas/v4/`
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Build from the resolved `.env` settings
    ///
    /// # Errors
    /// [`Error::NotConfigured`] when the API key is missing or a placeholder.
    pub fn from_api_settings(api: &ApiSettings) -> Result<Self> {
        let api_key = api
            .api_key
            .clone()
            .ok_or_else(|| Error::NotConfigured("OPENAI_API_KEY".to_string()))?;
        Ok(Self {
            api_key,
            base_url: api.base_url.clone(),
            model: api.model.clone(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Override the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// async-openai client against any OpenAI-compatible endpoint
pub struct OpenAiCompatible {
    client: Client<OpenAIConfig>,
    config: ClientConfig,
}

impl OpenAiCompatible {
    /// Create the client
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        // async-openai appends "/chat/completions" itself
        let base = config.base_url.trim_end_matches('/');
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(base);

        Self {
            client: Client::with_config(openai_config),
            config,
        }
    }

    /// Configured model
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request(&self, request: ChatRequest) -> CreateChatCompletionRequest {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(
                ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(system),
                    name: None,
                }
                .into(),
            );
        }
        messages.push(
            ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(request.user),
                name: None,
            }
            .into(),
        );

        CreateChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature,
            ..Default::default()
        }
    }

    fn map_error(&self, e: OpenAIError) -> Error {
        let raw = e.to_string();
        let kind = classify_api_error(&raw);
        let message = sanitize_api_error(&raw, Some(&self.config.api_key));
        match (e, kind) {
            (OpenAIError::Reqwest(_), ApiErrorKind::Other) => Error::Network(message),
            _ => Error::Api { kind, message },
        }
    }
}

#[async_trait::async_trait]
impl ChatBackend for OpenAiCompatible {
    #[instrument(skip(self, request), fields(model = %self.config.model))]
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply> {
        let openai_request = self.build_request(request);
        debug!(base_url = %self.config.base_url, "Sending chat completion");

        let response = tokio::time::timeout(
            self.config.timeout,
            self.client.chat().create(openai_request),
        )
        .await
        .map_err(|_| Error::Timeout(self.config.timeout.as_millis() as u64))?
        .map_err(|e| self.map_error(e))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| Error::InvalidResponse("No choices in response".to_string()))?;

        Ok(ChatReply {
            content: choice.message.content.clone().unwrap_or_default(),
            model: response.model,
        })
    }
}
