//! LLM primitives for the weft platform.
//!
//! This crate provides:
//!
//! - **Backend abstraction**: a provider-agnostic generation interface
//! - **Gemini**: the production backend, with callable-tool support
//! - **Tools**: arithmetic functions the model may invoke mid-generation
//! - **Memory**: the bounded per-workflow conversation history
//! - **Output handling**: code-fence stripping and structured-output parsing

pub mod backend;
pub mod error;
pub mod gemini;
pub mod memory;
pub mod output;
pub mod tools;

pub use backend::{LlmBackend, LlmMessage, LlmRequest, LlmResponse, MessageRole, ModelProvider};
pub use error::{LlmError, MemoryError};
pub use gemini::{GeminiBackend, GeminiProvider};
pub use memory::{ConversationMemory, InMemoryConversationMemory, MemoryEntry, MEMORY_LIMIT};
pub use output::parse_model_output;
