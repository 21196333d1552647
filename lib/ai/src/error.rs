//! Error types for the AI crate.

use std::fmt;

/// Failures invoking a model backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// The HTTP request failed (connection, timeout).
    Http { message: String },
    /// The provider answered with an error.
    Api { message: String },
    /// The provider's response could not be decoded.
    InvalidResponse { message: String },
    /// The model produced no candidate output.
    EmptyResponse,
    /// Tool-calling did not converge within the round limit.
    ToolLoopExceeded { rounds: usize },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { message } => write!(f, "model request failed: {message}"),
            Self::Api { message } => write!(f, "model API error: {message}"),
            Self::InvalidResponse { message } => {
                write!(f, "invalid model response: {message}")
            }
            Self::EmptyResponse => write!(f, "model returned no result"),
            Self::ToolLoopExceeded { rounds } => {
                write!(f, "tool calling exceeded {rounds} rounds")
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Failures accessing the conversation memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryError {
    pub message: String,
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memory store error: {}", self.message)
    }
}

impl std::error::Error for MemoryError {}
