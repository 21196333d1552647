//! Durable queue consumption.
//!
//! Workers read submitted executions from a durable stream through a named
//! competing-consumers group: each message is claimed by exactly one worker
//! and acknowledged only after the coordinator reaches a terminal outcome
//! for it. A crash between claim and ack leaves the message pending for the
//! stream's redelivery machinery; the engine itself runs no reclaim sweep.
//!
//! Poison messages (undecodable bodies, missing workflow or execution
//! records) are acknowledged and dropped so one bad message can never wedge
//! the loop.

use crate::coordinator::{CoordinatorOutcome, ExecutionCoordinator};
use crate::error::QueueError;
use crate::event::EventPublisher;
use crate::runner::NodeRunner;
use crate::store::EngineStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use weft_core::{ExecutionId, WorkflowId};

/// One submitted execution on the durable stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessage {
    /// The execution record to drive.
    pub execution_id: ExecutionId,
    /// The workflow it runs.
    pub workflow_id: WorkflowId,
    /// Trigger payload as enqueued.
    #[serde(default)]
    pub payload: JsonValue,
}

/// A message claimed from the stream, pending acknowledgment.
#[async_trait]
pub trait ClaimedMessage: Send {
    /// Decodes the message body.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Malformed`] if the body is not a valid
    /// [`QueueMessage`]; the consumer acknowledges such messages as poison.
    fn message(&self) -> Result<QueueMessage, QueueError>;

    /// Acknowledges the message, removing it from the pending list.
    async fn ack(&mut self) -> Result<(), QueueError>;
}

/// A durable stream of submitted executions.
#[async_trait]
pub trait ExecutionQueue: Send + Sync {
    /// The claimed-message handle this queue hands out.
    type Claimed: ClaimedMessage;

    /// Claims the next batch of messages for this consumer, blocking up to
    /// the queue's configured wait when nothing is available. An empty
    /// batch is normal and means the wait expired.
    async fn fetch(&self) -> Result<Vec<Self::Claimed>, QueueError>;
}

/// The worker's consumption loop.
pub struct QueueConsumer<Q, S, P, R> {
    queue: Q,
    coordinator: ExecutionCoordinator<S, P, R>,
}

impl<Q, S, P, R> QueueConsumer<Q, S, P, R>
where
    Q: ExecutionQueue,
    S: EngineStore,
    P: EventPublisher,
    R: NodeRunner,
{
    /// Creates a consumer over a queue and coordinator.
    pub fn new(queue: Q, coordinator: ExecutionCoordinator<S, P, R>) -> Self {
        Self { queue, coordinator }
    }

    /// Claims one batch and processes every message in it.
    ///
    /// Returns the number of messages acknowledged. Messages whose
    /// processing hit an infrastructure error are left unacknowledged and
    /// stay claimable.
    ///
    /// # Errors
    ///
    /// Returns an error only if the fetch itself failed.
    pub async fn drain_once(&self) -> Result<usize, QueueError> {
        let batch = self.queue.fetch().await?;
        let mut acked = 0;

        for mut claimed in batch {
            let message = match claimed.message() {
                Ok(message) => message,
                Err(error) => {
                    tracing::warn!(error = %error, "dropping undecodable queue message");
                    self.ack(&mut claimed).await;
                    acked += 1;
                    continue;
                }
            };

            tracing::info!(execution_id = %message.execution_id, "picked execution");

            match self.coordinator.process(&message).await {
                Ok(CoordinatorOutcome::Finished(status)) => {
                    tracing::info!(execution_id = %message.execution_id, status = %status, "execution finished");
                    self.ack(&mut claimed).await;
                    acked += 1;
                }
                Ok(CoordinatorOutcome::Poison { reason }) => {
                    tracing::warn!(execution_id = %message.execution_id, reason = %reason, "dropping poison message");
                    self.ack(&mut claimed).await;
                    acked += 1;
                }
                Err(error) => {
                    // Leave unacknowledged: the message stays pending and
                    // can be reclaimed once the store recovers.
                    tracing::error!(execution_id = %message.execution_id, error = %error, "coordinator failed, leaving message pending");
                }
            }
        }

        Ok(acked)
    }

    /// Runs the consumption loop until the task is dropped.
    ///
    /// Fetch errors are logged and retried after a short pause; the loop
    /// itself never gives up.
    pub async fn run(&self) {
        tracing::info!("worker started, waiting for jobs");
        loop {
            if let Err(error) = self.drain_once().await {
                tracing::error!(error = %error, "queue fetch failed");
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
            }
        }
    }

    async fn ack(&self, claimed: &mut Q::Claimed) {
        if let Err(error) = claimed.ack().await {
            // The message will be redelivered; the coordinator run was
            // already persisted, so the retry hits terminal records.
            tracing::warn!(error = %error, "failed to ack queue message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{NodeDefinition, NodeType, Workflow};
    use crate::error::PublishError;
    use crate::event::ExecutionEvent;
    use crate::execution::{Execution, ExecutionStatus};
    use crate::runner::MockRunner;
    use crate::store::InMemoryEngineStore;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use weft_core::UserId;

    /// Claimed message backed by raw bytes, with an observable ack flag.
    struct TestClaimed {
        body: Vec<u8>,
        acked: Arc<AtomicBool>,
    }

    #[async_trait]
    impl ClaimedMessage for TestClaimed {
        fn message(&self) -> Result<QueueMessage, QueueError> {
            serde_json::from_slice(&self.body).map_err(|e| QueueError::Malformed {
                message: e.to_string(),
            })
        }

        async fn ack(&mut self) -> Result<(), QueueError> {
            self.acked.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Queue returning one scripted batch, then empty batches.
    struct TestQueue {
        batch: Mutex<Vec<(Vec<u8>, Arc<AtomicBool>)>>,
    }

    impl TestQueue {
        fn new(bodies: Vec<Vec<u8>>) -> (Self, Vec<Arc<AtomicBool>>) {
            let flags: Vec<_> = bodies.iter().map(|_| Arc::new(AtomicBool::new(false))).collect();
            let batch = bodies.into_iter().zip(flags.iter().cloned()).collect();
            (
                Self {
                    batch: Mutex::new(batch),
                },
                flags,
            )
        }
    }

    #[async_trait]
    impl ExecutionQueue for TestQueue {
        type Claimed = TestClaimed;

        async fn fetch(&self) -> Result<Vec<TestClaimed>, QueueError> {
            Ok(self
                .batch
                .lock()
                .unwrap()
                .drain(..)
                .map(|(body, acked)| TestClaimed { body, acked })
                .collect())
        }
    }

    struct NullPublisher;

    #[async_trait]
    impl EventPublisher for NullPublisher {
        async fn publish(&self, _event: &ExecutionEvent) -> Result<(), PublishError> {
            Ok(())
        }
    }

    fn single_node_workflow() -> Workflow {
        let mut workflow = Workflow::new("Test", UserId::new());
        workflow.add_node(NodeDefinition::new("node1", NodeType::Telegram));
        workflow
    }

    fn coordinator(
        store: Arc<InMemoryEngineStore>,
    ) -> ExecutionCoordinator<InMemoryEngineStore, NullPublisher, MockRunner> {
        ExecutionCoordinator::new(store, Arc::new(NullPublisher), Arc::new(MockRunner::new()))
    }

    #[tokio::test]
    async fn message_is_acked_after_successful_execution() {
        let store = Arc::new(InMemoryEngineStore::new());
        let workflow = single_node_workflow();
        let execution = Execution::new(workflow.id, 1, serde_json::json!({}));
        let message = QueueMessage {
            execution_id: execution.id,
            workflow_id: workflow.id,
            payload: serde_json::json!({}),
        };
        let execution_id = execution.id;
        store.insert_workflow(workflow);
        store.insert_execution(execution);

        let (queue, flags) = TestQueue::new(vec![serde_json::to_vec(&message).unwrap()]);
        let consumer = QueueConsumer::new(queue, coordinator(store.clone()));

        let acked = consumer.drain_once().await.unwrap();
        assert_eq!(acked, 1);
        assert!(flags[0].load(Ordering::SeqCst));
        assert_eq!(
            store.execution(execution_id).unwrap().status,
            ExecutionStatus::Success
        );
    }

    #[tokio::test]
    async fn missing_workflow_still_acks() {
        let store = Arc::new(InMemoryEngineStore::new());
        let message = QueueMessage {
            execution_id: weft_core::ExecutionId::new(),
            workflow_id: weft_core::WorkflowId::new(),
            payload: serde_json::json!({}),
        };

        let (queue, flags) = TestQueue::new(vec![serde_json::to_vec(&message).unwrap()]);
        let consumer = QueueConsumer::new(queue, coordinator(store));

        let acked = consumer.drain_once().await.unwrap();
        assert_eq!(acked, 1);
        assert!(flags[0].load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn undecodable_body_still_acks() {
        let store = Arc::new(InMemoryEngineStore::new());
        let (queue, flags) = TestQueue::new(vec![b"not json".to_vec()]);
        let consumer = QueueConsumer::new(queue, coordinator(store));

        let acked = consumer.drain_once().await.unwrap();
        assert_eq!(acked, 1);
        assert!(flags[0].load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn empty_batch_is_normal() {
        let store = Arc::new(InMemoryEngineStore::new());
        let (queue, _) = TestQueue::new(vec![]);
        let consumer = QueueConsumer::new(queue, coordinator(store));

        assert_eq!(consumer.drain_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn store_failure_leaves_message_pending() {
        /// Store whose update calls always fail after lookup succeeds.
        struct BrokenStore {
            inner: InMemoryEngineStore,
        }

        #[async_trait]
        impl crate::store::EngineStore for BrokenStore {
            async fn find_workflow(
                &self,
                id: weft_core::WorkflowId,
            ) -> Result<Option<Workflow>, crate::error::StoreError> {
                self.inner.find_workflow(id).await
            }

            async fn find_execution(
                &self,
                id: weft_core::ExecutionId,
            ) -> Result<Option<Execution>, crate::error::StoreError> {
                self.inner.find_execution(id).await
            }

            async fn update_execution(
                &self,
                _id: weft_core::ExecutionId,
                _update: crate::store::ExecutionUpdate,
            ) -> Result<(), crate::error::StoreError> {
                Err(crate::error::StoreError::Unavailable {
                    message: "connection refused".to_string(),
                })
            }

            async fn find_credential(
                &self,
                id: weft_core::CredentialId,
            ) -> Result<Option<crate::store::CredentialRecord>, crate::error::StoreError> {
                self.inner.find_credential(id).await
            }

            async fn find_form(
                &self,
                workflow_id: weft_core::WorkflowId,
                node_id: &str,
            ) -> Result<Option<crate::store::Form>, crate::error::StoreError> {
                self.inner.find_form(workflow_id, node_id).await
            }
        }

        let inner = InMemoryEngineStore::new();
        let workflow = single_node_workflow();
        let execution = Execution::new(workflow.id, 1, serde_json::json!({}));
        let message = QueueMessage {
            execution_id: execution.id,
            workflow_id: workflow.id,
            payload: serde_json::json!({}),
        };
        inner.insert_workflow(workflow);
        inner.insert_execution(execution);

        let store = Arc::new(BrokenStore { inner });
        let coordinator =
            ExecutionCoordinator::new(store, Arc::new(NullPublisher), Arc::new(MockRunner::new()));
        let (queue, flags) = TestQueue::new(vec![serde_json::to_vec(&message).unwrap()]);
        let consumer = QueueConsumer::new(queue, coordinator);

        let acked = consumer.drain_once().await.unwrap();
        assert_eq!(acked, 0);
        assert!(!flags[0].load(Ordering::SeqCst));
    }
}
