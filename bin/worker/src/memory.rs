//! NATS KV-backed conversation memory.
//!
//! One bucket holds every workflow's history; the key is derived from the
//! workflow id (KV key syntax has no `:`, so the logical
//! `workflow:<id>:memory` name maps to `workflow.<id>.memory`). Appends use
//! revision-checked updates so concurrent workers cannot lose each other's
//! entries.

use async_nats::jetstream;
use async_nats::jetstream::kv;
use async_trait::async_trait;
use weft_ai::error::MemoryError;
use weft_ai::memory::{ConversationMemory, MemoryEntry, MEMORY_LIMIT};
use weft_core::WorkflowId;

/// Bucket name for workflow conversation histories.
const MEMORY_BUCKET: &str = "workflow-memory";

/// Attempts per append before giving up on revision contention.
const APPEND_ATTEMPTS: usize = 4;

/// [`ConversationMemory`] over a NATS KV bucket.
pub struct NatsKvMemory {
    store: kv::Store,
}

impl NatsKvMemory {
    /// Ensures the bucket exists and returns the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket cannot be opened or created.
    pub async fn connect(context: &jetstream::Context) -> Result<Self, MemoryError> {
        let store = match context.get_key_value(MEMORY_BUCKET).await {
            Ok(store) => store,
            Err(_) => context
                .create_key_value(kv::Config {
                    bucket: MEMORY_BUCKET.to_string(),
                    ..Default::default()
                })
                .await
                .map_err(|e| MemoryError {
                    message: format!("failed to create memory bucket: {e}"),
                })?,
        };
        Ok(Self { store })
    }

    fn key(workflow_id: WorkflowId) -> String {
        format!("workflow.{}.memory", workflow_id.as_ulid())
    }

    fn decode(bytes: &[u8]) -> Result<Vec<MemoryEntry>, MemoryError> {
        serde_json::from_slice(bytes).map_err(|e| MemoryError {
            message: format!("corrupt memory entry: {e}"),
        })
    }

    fn encode(entries: &[MemoryEntry]) -> Result<Vec<u8>, MemoryError> {
        serde_json::to_vec(entries).map_err(|e| MemoryError {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ConversationMemory for NatsKvMemory {
    async fn recent(&self, workflow_id: WorkflowId) -> Result<Vec<MemoryEntry>, MemoryError> {
        let value = self
            .store
            .get(Self::key(workflow_id))
            .await
            .map_err(|e| MemoryError {
                message: e.to_string(),
            })?;

        match value {
            Some(bytes) => Self::decode(&bytes),
            None => Ok(Vec::new()),
        }
    }

    async fn append(
        &self,
        workflow_id: WorkflowId,
        entry: MemoryEntry,
    ) -> Result<(), MemoryError> {
        let key = Self::key(workflow_id);

        for _ in 0..APPEND_ATTEMPTS {
            let current = self.store.entry(&key).await.map_err(|e| MemoryError {
                message: e.to_string(),
            })?;

            match current {
                Some(existing) => {
                    let mut entries = Self::decode(&existing.value)?;
                    entries.push(entry.clone());
                    if entries.len() > MEMORY_LIMIT {
                        let excess = entries.len() - MEMORY_LIMIT;
                        entries.drain(..excess);
                    }
                    let bytes = Self::encode(&entries)?;
                    if self
                        .store
                        .update(&key, bytes.into(), existing.revision)
                        .await
                        .is_ok()
                    {
                        return Ok(());
                    }
                }
                None => {
                    let bytes = Self::encode(std::slice::from_ref(&entry))?;
                    if self.store.create(&key, bytes.into()).await.is_ok() {
                        return Ok(());
                    }
                }
            }
            // Another worker won the revision race; reload and retry.
        }

        Err(MemoryError {
            message: "memory append contention exceeded retry budget".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_avoids_colon_syntax() {
        let key = NatsKvMemory::key(WorkflowId::new());
        assert!(key.starts_with("workflow."));
        assert!(key.ends_with(".memory"));
        assert!(!key.contains(':'));
    }
}
