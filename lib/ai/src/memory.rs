//! Bounded per-workflow conversation memory.
//!
//! Memory is keyed by *workflow*, not execution: sequential runs of the
//! same workflow share one history. The store is a bounded FIFO — every
//! write pushes one entry and trims to the most recent [`MEMORY_LIMIT`],
//! evicting oldest first. Reads return entries oldest first, ready to use
//! as conversation turns.

use crate::backend::MessageRole;
use crate::error::MemoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use weft_core::WorkflowId;

/// Maximum entries retained per workflow.
pub const MEMORY_LIMIT: usize = 25;

/// One remembered conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Who produced the turn.
    pub role: MessageRole,
    /// The turn's text.
    pub content: String,
    /// When the turn was recorded.
    pub ts: DateTime<Utc>,
}

impl MemoryEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            ts: Utc::now(),
        }
    }
}

/// Returns the store key carrying a workflow's memory.
///
/// A pure function of the workflow id, shared by all worker instances.
#[must_use]
pub fn memory_key(workflow_id: WorkflowId) -> String {
    format!("workflow:{}:memory", workflow_id.as_ulid())
}

/// Bounded recent-history store, shared across worker instances.
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// Returns a workflow's remembered turns, oldest first.
    async fn recent(&self, workflow_id: WorkflowId) -> Result<Vec<MemoryEntry>, MemoryError>;

    /// Appends one turn and trims to the most recent [`MEMORY_LIMIT`]
    /// entries, evicting oldest first.
    async fn append(
        &self,
        workflow_id: WorkflowId,
        entry: MemoryEntry,
    ) -> Result<(), MemoryError>;
}

/// In-memory store for tests and single-process runs.
#[derive(Debug, Default)]
pub struct InMemoryConversationMemory {
    histories: Mutex<HashMap<WorkflowId, VecDeque<MemoryEntry>>>,
}

impl InMemoryConversationMemory {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationMemory for InMemoryConversationMemory {
    async fn recent(&self, workflow_id: WorkflowId) -> Result<Vec<MemoryEntry>, MemoryError> {
        Ok(self
            .histories
            .lock()
            .unwrap()
            .get(&workflow_id)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn append(
        &self,
        workflow_id: WorkflowId,
        entry: MemoryEntry,
    ) -> Result<(), MemoryError> {
        let mut histories = self.histories.lock().unwrap();
        let history = histories.entry(workflow_id).or_default();
        history.push_back(entry);
        while history.len() > MEMORY_LIMIT {
            history.pop_front();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_key_is_stable() {
        let workflow_id = WorkflowId::new();
        let key = memory_key(workflow_id);
        assert!(key.starts_with("workflow:"));
        assert!(key.ends_with(":memory"));
        assert_eq!(key, memory_key(workflow_id));
    }

    #[tokio::test]
    async fn entries_return_oldest_first() {
        let memory = InMemoryConversationMemory::new();
        let workflow_id = WorkflowId::new();

        memory
            .append(workflow_id, MemoryEntry::new(MessageRole::User, "hi"))
            .await
            .unwrap();
        memory
            .append(workflow_id, MemoryEntry::new(MessageRole::Assistant, "hello"))
            .await
            .unwrap();

        let entries = memory.recent(workflow_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "hi");
        assert_eq!(entries[1].content, "hello");
    }

    #[tokio::test]
    async fn two_exchanges_leave_four_entries_in_order() {
        let memory = InMemoryConversationMemory::new();
        let workflow_id = WorkflowId::new();

        for (prompt, reply) in [("hi", "hello there"), ("hello", "hi again")] {
            memory
                .append(workflow_id, MemoryEntry::new(MessageRole::User, prompt))
                .await
                .unwrap();
            memory
                .append(workflow_id, MemoryEntry::new(MessageRole::Assistant, reply))
                .await
                .unwrap();
        }

        let entries = memory.recent(workflow_id).await.unwrap();
        let contents: Vec<_> = entries.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "hello there", "hello", "hi again"]);
    }

    #[tokio::test]
    async fn history_trims_oldest_beyond_limit() {
        let memory = InMemoryConversationMemory::new();
        let workflow_id = WorkflowId::new();

        for i in 0..MEMORY_LIMIT + 5 {
            memory
                .append(
                    workflow_id,
                    MemoryEntry::new(MessageRole::User, format!("turn {i}")),
                )
                .await
                .unwrap();
        }

        let entries = memory.recent(workflow_id).await.unwrap();
        assert_eq!(entries.len(), MEMORY_LIMIT);
        assert_eq!(entries[0].content, "turn 5");
        assert_eq!(entries.last().unwrap().content, format!("turn {}", MEMORY_LIMIT + 4));
    }

    #[tokio::test]
    async fn workflows_have_isolated_histories() {
        let memory = InMemoryConversationMemory::new();
        let first = WorkflowId::new();
        let second = WorkflowId::new();

        memory
            .append(first, MemoryEntry::new(MessageRole::User, "hi"))
            .await
            .unwrap();

        assert_eq!(memory.recent(first).await.unwrap().len(), 1);
        assert!(memory.recent(second).await.unwrap().is_empty());
    }
}
