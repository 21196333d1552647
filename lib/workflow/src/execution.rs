//! Execution records and their state machine.
//!
//! One `Execution` is one run of a workflow. The API layer creates the
//! record in `PENDING` before enqueueing; exactly one coordinator moves it
//! to `RUNNING` and then to a terminal state exactly once. Per-node
//! outcomes accumulate in `logs` as `"Success"` or `"Error: <message>"`.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use weft_core::{ExecutionId, WorkflowId};

/// Lifecycle state of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Created, waiting in the queue.
    Pending,
    /// Claimed by a coordinator.
    Running,
    /// All scheduled nodes completed.
    Success,
    /// A node failed, or the graph had no runnable entry nodes.
    Failed,
}

impl ExecutionStatus {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        };
        write!(f, "{name}")
    }
}

/// Output attached to an execution record.
///
/// Only the trigger payload is persisted; node results live in the
/// transient [`crate::context::ExecutionContext`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    /// Input data that seeded the run.
    #[serde(rename = "triggerPayload", default)]
    pub trigger_payload: JsonValue,
}

/// One run of a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    /// Unique identifier for this execution.
    pub id: ExecutionId,
    /// The workflow being executed.
    pub workflow_id: WorkflowId,
    /// Current lifecycle state.
    pub status: ExecutionStatus,
    /// Node count at creation time.
    pub total_tasks: u32,
    /// Nodes completed so far. Never exceeds `total_tasks`.
    pub tasks_done: u32,
    /// Trigger payload and related output data.
    pub output: ExecutionOutput,
    /// Per-node outcome strings, keyed by node id. Grows monotonically;
    /// each node writes at most one entry per execution.
    pub logs: IndexMap<String, String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Execution {
    /// Creates a pending execution for a workflow with `total_tasks` nodes.
    #[must_use]
    pub fn new(workflow_id: WorkflowId, total_tasks: u32, trigger_payload: JsonValue) -> Self {
        Self {
            id: ExecutionId::new(),
            workflow_id,
            status: ExecutionStatus::Pending,
            total_tasks,
            tasks_done: 0,
            output: ExecutionOutput { trigger_payload },
            logs: IndexMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Marks the execution as claimed by a coordinator.
    pub fn start(&mut self) {
        self.status = ExecutionStatus::Running;
    }

    /// Records a successful node, bumping the progress counter.
    pub fn record_node_success(&mut self, node_id: &str) {
        debug_assert!(self.tasks_done < self.total_tasks);
        self.tasks_done += 1;
        self.logs.insert(node_id.to_string(), "Success".to_string());
    }

    /// Records a failed node and moves the execution to `FAILED`.
    pub fn record_node_failure(&mut self, node_id: &str, message: &str) {
        self.logs
            .insert(node_id.to_string(), format!("Error: {message}"));
        self.status = ExecutionStatus::Failed;
    }

    /// Marks the execution as successfully finished.
    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Success;
    }

    /// Marks the execution as failed without a node-level log entry.
    pub fn fail(&mut self) {
        self.status = ExecutionStatus::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_terminality() {
        assert!(!ExecutionStatus::Pending.is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(ExecutionStatus::Success.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
    }

    #[test]
    fn status_serializes_screaming() {
        let json = serde_json::to_string(&ExecutionStatus::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
        let parsed: ExecutionStatus = serde_json::from_str("\"FAILED\"").unwrap();
        assert_eq!(parsed, ExecutionStatus::Failed);
    }

    #[test]
    fn node_success_increments_progress() {
        let mut execution = Execution::new(WorkflowId::new(), 2, serde_json::json!({}));
        execution.start();
        execution.record_node_success("node1");

        assert_eq!(execution.tasks_done, 1);
        assert_eq!(execution.logs.get("node1").map(String::as_str), Some("Success"));
        assert_eq!(execution.status, ExecutionStatus::Running);
    }

    #[test]
    fn node_failure_is_terminal_with_message() {
        let mut execution = Execution::new(WorkflowId::new(), 2, serde_json::json!({}));
        execution.start();
        execution.record_node_failure("node1", "bot token missing");

        assert_eq!(execution.status, ExecutionStatus::Failed);
        assert_eq!(
            execution.logs.get("node1").map(String::as_str),
            Some("Error: bot token missing")
        );
        assert_eq!(execution.tasks_done, 0);
    }

    #[test]
    fn trigger_payload_roundtrips_with_wire_name() {
        let execution = Execution::new(
            WorkflowId::new(),
            1,
            serde_json::json!({"name": "Ann"}),
        );
        let json = serde_json::to_value(&execution).unwrap();
        assert_eq!(json["output"]["triggerPayload"]["name"], "Ann");

        let parsed: Execution = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.output.trigger_payload["name"], "Ann");
    }
}
