//! Live execution events.
//!
//! Events are transient: published fire-and-forget to a pub/sub channel
//! derived from the workflow id, never persisted, never replayed. Observers
//! that are disconnected while an event is published miss it permanently.
//!
//! Wire format is flat JSON with a snake_case `type` tag and camelCase
//! fields, forwarded verbatim to WebSocket observers by the relay.

use crate::definition::NodeType;
use crate::error::PublishError;
use crate::execution::ExecutionStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use weft_core::{ExecutionId, WorkflowId};

/// A lifecycle or per-node progress event for one execution.
///
/// Events for a single execution are published in the order the coordinator
/// reaches each milestone; `node_started` always precedes the node's
/// terminal event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ExecutionEvent {
    /// The coordinator claimed the execution.
    ExecutionStarted {
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
        ts: DateTime<Utc>,
    },
    /// A node was handed to its executor.
    NodeStarted {
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
        node_id: String,
        node_type: NodeType,
        ts: DateTime<Utc>,
    },
    /// A node's executor returned successfully.
    NodeSucceeded {
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
        node_id: String,
        tasks_done: u32,
        total_tasks: u32,
        ts: DateTime<Utc>,
    },
    /// A node's executor failed; the execution halts after this.
    NodeFailed {
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
        node_id: String,
        error: String,
        ts: DateTime<Utc>,
    },
    /// The execution reached a terminal state.
    ExecutionFinished {
        execution_id: ExecutionId,
        workflow_id: WorkflowId,
        status: ExecutionStatus,
        tasks_done: u32,
        total_tasks: u32,
        ts: DateTime<Utc>,
    },
}

impl ExecutionEvent {
    /// Returns the execution this event belongs to.
    #[must_use]
    pub fn execution_id(&self) -> ExecutionId {
        match self {
            Self::ExecutionStarted { execution_id, .. }
            | Self::NodeStarted { execution_id, .. }
            | Self::NodeSucceeded { execution_id, .. }
            | Self::NodeFailed { execution_id, .. }
            | Self::ExecutionFinished { execution_id, .. } => *execution_id,
        }
    }

    /// Returns the workflow whose channel carries this event.
    #[must_use]
    pub fn workflow_id(&self) -> WorkflowId {
        match self {
            Self::ExecutionStarted { workflow_id, .. }
            | Self::NodeStarted { workflow_id, .. }
            | Self::NodeSucceeded { workflow_id, .. }
            | Self::NodeFailed { workflow_id, .. }
            | Self::ExecutionFinished { workflow_id, .. } => *workflow_id,
        }
    }

    /// Returns the publish timestamp.
    #[must_use]
    pub fn ts(&self) -> DateTime<Utc> {
        match self {
            Self::ExecutionStarted { ts, .. }
            | Self::NodeStarted { ts, .. }
            | Self::NodeSucceeded { ts, .. }
            | Self::NodeFailed { ts, .. }
            | Self::ExecutionFinished { ts, .. } => *ts,
        }
    }
}

/// Returns the pub/sub subject carrying a workflow's events.
///
/// A pure function of the workflow id, so publishers and the relay agree
/// without coordination.
#[must_use]
pub fn events_subject(workflow_id: WorkflowId) -> String {
    format!("workflow.{}.events", workflow_id.as_ulid())
}

/// Sink for execution events.
///
/// Publishing is best-effort by contract: callers log failures and continue.
/// A failed publish must never abort an execution.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one event to the workflow's channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the event could not be handed to the pub/sub
    /// layer; callers treat this as lossy.
    async fn publish(&self, event: &ExecutionEvent) -> Result<(), PublishError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_subject_is_stable_per_workflow() {
        let workflow_id = WorkflowId::new();
        let subject = events_subject(workflow_id);

        assert!(subject.starts_with("workflow."));
        assert!(subject.ends_with(".events"));
        assert_eq!(subject, events_subject(workflow_id));
    }

    #[test]
    fn node_failed_wire_format() {
        let event = ExecutionEvent::NodeFailed {
            execution_id: ExecutionId::new(),
            workflow_id: WorkflowId::new(),
            node_id: "node1".to_string(),
            error: "bot token missing".to_string(),
            ts: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "node_failed");
        assert_eq!(json["nodeId"], "node1");
        assert_eq!(json["error"], "bot token missing");
        assert!(json["executionId"].is_string());
        assert!(json["workflowId"].is_string());
    }

    #[test]
    fn execution_finished_carries_status_and_progress() {
        let event = ExecutionEvent::ExecutionFinished {
            execution_id: ExecutionId::new(),
            workflow_id: WorkflowId::new(),
            status: ExecutionStatus::Success,
            tasks_done: 2,
            total_tasks: 2,
            ts: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "execution_finished");
        assert_eq!(json["status"], "SUCCESS");
        assert_eq!(json["tasksDone"], 2);
        assert_eq!(json["totalTasks"], 2);
    }

    #[test]
    fn event_serde_roundtrip() {
        let event = ExecutionEvent::NodeStarted {
            execution_id: ExecutionId::new(),
            workflow_id: WorkflowId::new(),
            node_id: "node1".to_string(),
            node_type: NodeType::Telegram,
            ts: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let parsed: ExecutionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
