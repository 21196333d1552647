//! Error types for the workflow crate.
//!
//! Each layer owns an error enum carrying only the information available at
//! that layer; callers add workflow- or execution-level context with
//! rootcause's `.context()` where they need it:
//! - `DefinitionError`: structural problems in a workflow definition
//! - `StoreError`: record store access failures
//! - `QueueError`: durable queue access failures
//! - `PublishError`: event publishing failures (always swallowed upstream)
//! - `CoordinatorError`: infrastructure failures while driving an execution

use std::fmt;

/// Structural problems in a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// A connection endpoint names a node id that does not exist.
    UnknownNode { node_id: String },
    /// The connection graph contains a cycle.
    CycleDetected,
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode { node_id } => {
                write!(f, "connection references unknown node: {node_id}")
            }
            Self::CycleDetected => write!(f, "connection graph contains a cycle"),
        }
    }
}

impl std::error::Error for DefinitionError {}

/// Failures accessing the workflow/execution record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached.
    Unavailable { message: String },
    /// A stored record could not be decoded.
    Malformed { message: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { message } => write!(f, "store unavailable: {message}"),
            Self::Malformed { message } => write!(f, "malformed record: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Failures accessing the durable execution queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Connection or stream/consumer setup failed.
    ConnectionFailed { message: String },
    /// Claiming a batch of messages failed.
    FetchFailed { message: String },
    /// Appending a message to the stream failed.
    AppendFailed { message: String },
    /// Acknowledging a claimed message failed.
    AckFailed { message: String },
    /// A claimed message body could not be decoded.
    Malformed { message: String },
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed { message } => {
                write!(f, "queue connection failed: {message}")
            }
            Self::FetchFailed { message } => write!(f, "queue fetch failed: {message}"),
            Self::AppendFailed { message } => write!(f, "queue append failed: {message}"),
            Self::AckFailed { message } => write!(f, "queue ack failed: {message}"),
            Self::Malformed { message } => write!(f, "malformed queue message: {message}"),
        }
    }
}

impl std::error::Error for QueueError {}

/// A failed event publish.
///
/// Publishing is lossy by contract: the coordinator logs these and keeps
/// going, so this error never propagates past the publish call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishError {
    pub message: String,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event publish failed: {}", self.message)
    }
}

impl std::error::Error for PublishError {}

/// Infrastructure failures while coordinating an execution.
///
/// These are distinct from node failures: a node failure is a terminal
/// outcome of the execution, while a coordinator error means the engine
/// could not make progress and the queue message must stay pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// The record store failed mid-execution.
    Store(StoreError),
}

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for CoordinatorError {}

impl From<StoreError> for CoordinatorError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_error_display() {
        let err = DefinitionError::UnknownNode {
            node_id: "node9".to_string(),
        };
        assert!(err.to_string().contains("node9"));
        assert!(DefinitionError::CycleDetected.to_string().contains("cycle"));
    }

    #[test]
    fn queue_error_display() {
        let err = QueueError::AckFailed {
            message: "timeout".to_string(),
        };
        assert!(err.to_string().contains("ack failed"));
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn coordinator_error_wraps_store_error() {
        let err = CoordinatorError::from(StoreError::Unavailable {
            message: "connection refused".to_string(),
        });
        assert!(err.to_string().contains("connection refused"));
    }
}
