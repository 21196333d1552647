//! Per-execution context shared between nodes.
//!
//! The context carries two namespaces readable from templates:
//! - `$json.body` — the trigger payload, fixed for the execution's lifetime
//! - `$node.<id>` — result objects of previously completed nodes
//!
//! The context lives only in memory for the duration of one execution; it is
//! never persisted or reconstructed.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

/// In-memory state for one execution.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    trigger: JsonValue,
    node_results: IndexMap<String, JsonValue>,
}

impl ExecutionContext {
    /// Creates a context seeded with the trigger payload.
    #[must_use]
    pub fn new(trigger_payload: JsonValue) -> Self {
        Self {
            trigger: trigger_payload,
            node_results: IndexMap::new(),
        }
    }

    /// Returns the trigger payload (`$json.body`).
    #[must_use]
    pub fn trigger(&self) -> &JsonValue {
        &self.trigger
    }

    /// Looks up a field of the trigger payload (`$json.body.<field>`).
    #[must_use]
    pub fn trigger_field(&self, field: &str) -> Option<&JsonValue> {
        self.trigger.get(field)
    }

    /// Records a completed node's result object, making it visible to
    /// nodes that execute later in topological order.
    pub fn record_result(&mut self, node_id: impl Into<String>, result: JsonValue) {
        self.node_results.insert(node_id.into(), result);
    }

    /// Returns the result object of a completed node (`$node.<id>`).
    #[must_use]
    pub fn node_result(&self, node_id: &str) -> Option<&JsonValue> {
        self.node_results.get(node_id)
    }

    /// Looks up a field of a completed node's result (`$node.<id>.<field>`).
    #[must_use]
    pub fn node_field(&self, node_id: &str, field: &str) -> Option<&JsonValue> {
        self.node_results.get(node_id).and_then(|r| r.get(field))
    }

    /// Returns the number of recorded node results.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.node_results.len()
    }
}
