//! Node execution seam.
//!
//! The coordinator hands each scheduled node to a [`NodeRunner`]; the
//! production runner dispatches to per-platform executors, while tests
//! script outcomes with [`MockRunner`].

use crate::context::ExecutionContext;
use crate::definition::{NodeDefinition, Workflow};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;

/// A failed node execution.
///
/// Carries a human-readable message; the coordinator records it in the
/// execution log as `"Error: <message>"` and halts scheduling. Runners
/// never retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeError {
    message: String,
}

impl NodeError {
    /// Creates a node error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for NodeError {}

/// Executes one node against the live execution context.
#[async_trait]
pub trait NodeRunner: Send + Sync {
    /// Runs `node`, returning its result object for `$node.<id>`.
    ///
    /// The result must carry every field downstream templates may
    /// reference.
    ///
    /// # Errors
    ///
    /// Returns a [`NodeError`] with a human-readable message on any
    /// failure; the execution terminates `FAILED`.
    async fn run(
        &self,
        workflow: &Workflow,
        node: &NodeDefinition,
        context: &ExecutionContext,
    ) -> Result<JsonValue, NodeError>;
}

/// A runner with per-node scripted outcomes, for testing.
#[derive(Debug, Default)]
pub struct MockRunner {
    outcomes: HashMap<String, Result<JsonValue, String>>,
}

impl MockRunner {
    /// Creates a runner with no scripted outcomes; unknown nodes succeed
    /// with an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful result for a node id.
    #[must_use]
    pub fn succeeding(mut self, node_id: impl Into<String>, result: JsonValue) -> Self {
        self.outcomes.insert(node_id.into(), Ok(result));
        self
    }

    /// Scripts a failure for a node id.
    #[must_use]
    pub fn failing(mut self, node_id: impl Into<String>, message: impl Into<String>) -> Self {
        self.outcomes.insert(node_id.into(), Err(message.into()));
        self
    }
}

#[async_trait]
impl NodeRunner for MockRunner {
    async fn run(
        &self,
        _workflow: &Workflow,
        node: &NodeDefinition,
        _context: &ExecutionContext,
    ) -> Result<JsonValue, NodeError> {
        match self.outcomes.get(&node.id) {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(message)) => Err(NodeError::new(message.clone())),
            None => Ok(JsonValue::Object(Default::default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::NodeType;
    use weft_core::UserId;

    #[tokio::test]
    async fn mock_runner_returns_scripted_outcomes() {
        let runner = MockRunner::new()
            .succeeding("ok", serde_json::json!({"message": "hi"}))
            .failing("bad", "bot token missing");
        let workflow = Workflow::new("Test", UserId::new());
        let context = ExecutionContext::new(serde_json::json!({}));

        let ok = runner
            .run(
                &workflow,
                &NodeDefinition::new("ok", NodeType::Telegram),
                &context,
            )
            .await
            .unwrap();
        assert_eq!(ok["message"], "hi");

        let err = runner
            .run(
                &workflow,
                &NodeDefinition::new("bad", NodeType::Telegram),
                &context,
            )
            .await
            .unwrap_err();
        assert_eq!(err.message(), "bot token missing");
    }
}
