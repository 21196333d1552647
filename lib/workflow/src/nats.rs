//! NATS integration for the execution engine.
//!
//! Three concerns map onto NATS:
//! - the durable execution queue is a JetStream work-queue stream; the
//!   competing-consumers group is a named durable consumer with explicit
//!   acks, so unacknowledged messages stay on the pending list across
//!   worker crashes
//! - live execution events are fire-and-forget core NATS publishes on
//!   [`events_subject`]; no retention, no replay
//! - producers append submitted executions with [`enqueue`]; the stream is
//!   trimmed to a bounded message count

use crate::consumer::{ClaimedMessage, ExecutionQueue, QueueMessage};
use crate::error::{PublishError, QueueError};
use crate::event::{events_subject, EventPublisher, ExecutionEvent};
use async_nats::jetstream;
use async_nats::jetstream::consumer::pull::Config as PullConfig;
use async_nats::jetstream::consumer::{AckPolicy, PullConsumer};
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;

/// Subject carrying submitted executions.
const EXECUTIONS_SUBJECT: &str = "workflow.executions";

/// Stream name for submitted executions.
const EXECUTIONS_STREAM_NAME: &str = "WORKFLOW_EXECUTIONS";

/// Durable consumer name shared by all worker instances.
const CONSUMER_GROUP: &str = "weft-workers";

/// Approximate bound on queued messages; older entries are discarded.
const MAX_QUEUED_MESSAGES: i64 = 10_000;

/// Messages claimed per fetch.
const FETCH_BATCH: usize = 10;

/// How long a fetch blocks when the queue is empty.
const FETCH_WAIT: Duration = Duration::from_secs(3);

/// Configuration for NATS-backed execution infrastructure.
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// NATS server URL.
    pub url: String,
    /// Stream name override (defaults to WORKFLOW_EXECUTIONS).
    pub stream_name: Option<String>,
    /// Durable consumer name override (defaults to weft-workers).
    pub consumer_group: Option<String>,
}

impl NatsConfig {
    /// Creates a config with the given NATS URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            stream_name: None,
            consumer_group: None,
        }
    }

    fn stream(&self) -> &str {
        self.stream_name.as_deref().unwrap_or(EXECUTIONS_STREAM_NAME)
    }

    fn group(&self) -> &str {
        self.consumer_group.as_deref().unwrap_or(CONSUMER_GROUP)
    }
}

/// Ensures the executions stream exists, returning its handle.
async fn ensure_stream(
    context: &jetstream::Context,
    config: &NatsConfig,
) -> Result<jetstream::stream::Stream, QueueError> {
    let stream_config = jetstream::stream::Config {
        name: config.stream().to_string(),
        subjects: vec![EXECUTIONS_SUBJECT.to_string()],
        storage: jetstream::stream::StorageType::File,
        retention: jetstream::stream::RetentionPolicy::WorkQueue,
        max_messages: MAX_QUEUED_MESSAGES,
        ..Default::default()
    };

    context
        .get_or_create_stream(stream_config)
        .await
        .map_err(|e| QueueError::ConnectionFailed {
            message: format!("failed to create executions stream: {e}"),
        })
}

/// JetStream-backed execution queue.
///
/// All worker instances share one durable consumer, so each queued message
/// is claimed by exactly one of them.
pub struct NatsExecutionQueue {
    consumer: PullConsumer,
}

impl NatsExecutionQueue {
    /// Connects and ensures the stream and durable consumer exist.
    ///
    /// Creation is idempotent: the first worker creates both, later workers
    /// attach to the existing ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or stream/consumer setup fails.
    pub async fn connect(config: &NatsConfig) -> Result<Self, QueueError> {
        let client = async_nats::connect(&config.url).await.map_err(|e| {
            QueueError::ConnectionFailed {
                message: e.to_string(),
            }
        })?;
        let context = jetstream::new(client);
        let stream = ensure_stream(&context, config).await?;

        let consumer = stream
            .get_or_create_consumer(
                config.group(),
                PullConfig {
                    durable_name: Some(config.group().to_string()),
                    ack_policy: AckPolicy::Explicit,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| QueueError::ConnectionFailed {
                message: format!("failed to create consumer group: {e}"),
            })?;

        Ok(Self { consumer })
    }
}

#[async_trait]
impl ExecutionQueue for NatsExecutionQueue {
    type Claimed = NatsClaimedMessage;

    async fn fetch(&self) -> Result<Vec<NatsClaimedMessage>, QueueError> {
        let mut messages = self
            .consumer
            .fetch()
            .max_messages(FETCH_BATCH)
            .expires(FETCH_WAIT)
            .messages()
            .await
            .map_err(|e| QueueError::FetchFailed {
                message: e.to_string(),
            })?;

        let mut batch = Vec::new();
        while let Some(message) = messages.next().await {
            let message = message.map_err(|e| QueueError::FetchFailed {
                message: e.to_string(),
            })?;
            batch.push(NatsClaimedMessage { message });
        }
        Ok(batch)
    }
}

/// A message claimed from the JetStream consumer.
pub struct NatsClaimedMessage {
    message: jetstream::Message,
}

#[async_trait]
impl ClaimedMessage for NatsClaimedMessage {
    fn message(&self) -> Result<QueueMessage, QueueError> {
        serde_json::from_slice(&self.message.payload).map_err(|e| QueueError::Malformed {
            message: e.to_string(),
        })
    }

    async fn ack(&mut self) -> Result<(), QueueError> {
        self.message.ack().await.map_err(|e| QueueError::AckFailed {
            message: e.to_string(),
        })
    }
}

/// Appends a submitted execution to the durable stream.
///
/// Producer-side counterpart of [`NatsExecutionQueue`]; the API layer calls
/// this after creating the execution record.
///
/// # Errors
///
/// Returns an error if the stream rejects the append.
pub async fn enqueue(
    context: &jetstream::Context,
    message: &QueueMessage,
) -> Result<(), QueueError> {
    let bytes = serde_json::to_vec(message).map_err(|e| QueueError::Malformed {
        message: e.to_string(),
    })?;

    context
        .publish(EXECUTIONS_SUBJECT, bytes.into())
        .await
        .map_err(|e| QueueError::AppendFailed {
            message: e.to_string(),
        })?
        .await
        .map_err(|e| QueueError::AppendFailed {
            message: e.to_string(),
        })?;

    tracing::info!(execution_id = %message.execution_id, "execution queued");
    Ok(())
}

/// Core-NATS event publisher.
///
/// Publishes each event to its workflow's subject without waiting for
/// delivery; subscribers that are offline miss the event permanently.
pub struct NatsEventPublisher {
    client: async_nats::Client,
}

impl NatsEventPublisher {
    /// Connects to the NATS server.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(config: &NatsConfig) -> Result<Self, PublishError> {
        let client = async_nats::connect(&config.url)
            .await
            .map_err(|e| PublishError {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Wraps an existing client connection.
    #[must_use]
    pub fn from_client(client: async_nats::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventPublisher for NatsEventPublisher {
    async fn publish(&self, event: &ExecutionEvent) -> Result<(), PublishError> {
        let subject = events_subject(event.workflow_id());
        let bytes = serde_json::to_vec(event).map_err(|e| PublishError {
            message: e.to_string(),
        })?;

        self.client
            .publish(subject, bytes.into())
            .await
            .map_err(|e| PublishError {
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = NatsConfig::new("nats://localhost:4222");
        assert_eq!(config.stream(), EXECUTIONS_STREAM_NAME);
        assert_eq!(config.group(), CONSUMER_GROUP);
    }

    #[test]
    fn config_overrides() {
        let config = NatsConfig {
            url: "nats://localhost:4222".to_string(),
            stream_name: Some("CUSTOM_EXECUTIONS".to_string()),
            consumer_group: Some("custom-workers".to_string()),
        };
        assert_eq!(config.stream(), "CUSTOM_EXECUTIONS");
        assert_eq!(config.group(), "custom-workers");
    }
}
