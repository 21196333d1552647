//! LLM backend abstraction.
//!
//! Node executors build an [`LlmRequest`] (prompt plus optional prior
//! conversation turns), obtain a backend from a [`ModelProvider`] using the
//! per-credential API key, and call [`LlmBackend::generate`]. Tests swap in
//! scripted backends at the same seam.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User/human message.
    User,
    /// Assistant/model message.
    Assistant,
}

/// One turn of conversation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmMessage {
    /// Who produced this turn.
    pub role: MessageRole,
    /// The turn's text content.
    pub content: String,
}

impl LlmMessage {
    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A request to an LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The current prompt.
    pub prompt: String,
    /// Prior conversation turns, oldest first.
    pub history: Vec<LlmMessage>,
    /// Whether the backend may let the model invoke callable tools.
    pub allow_tools: bool,
}

impl LlmRequest {
    /// Creates a request with just a prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            history: Vec::new(),
            allow_tools: true,
        }
    }

    /// Adds prior conversation turns.
    #[must_use]
    pub fn with_history(mut self, history: Vec<LlmMessage>) -> Self {
        self.history = history;
        self
    }

    /// Disables callable tools for this request.
    #[must_use]
    pub fn without_tools(mut self) -> Self {
        self.allow_tools = false;
        self
    }
}

/// A response from an LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated text, after any tool rounds resolved.
    pub content: String,
}

/// Trait for LLM backends.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generates a response for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the model call fails.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;
}

/// Constructs backends bound to a per-credential API key.
///
/// Credentials are resolved per node execution, so backends cannot be
/// constructed once at startup; the provider captures everything else
/// (endpoint, model name) and mints a backend per call.
pub trait ModelProvider: Send + Sync {
    /// Returns a backend authenticated with `api_key`.
    fn backend(&self, api_key: &str) -> Box<dyn LlmBackend>;
}
