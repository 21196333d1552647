//! Workflow execution engine for the weft platform.
//!
//! This crate provides the core engine:
//!
//! - **Definitions**: workflows as directed graphs of typed action nodes
//! - **Templates**: `{{ $json.body.* }}` / `{{ $node.*.* }}` interpolation
//! - **Scheduling**: dependency-ordered (topological) node execution
//! - **Coordination**: the per-execution state machine and audit trail
//! - **Queue consumption**: durable at-least-once work claiming with
//!   competing consumers
//! - **Events**: transient pub/sub progress events for live observers

pub mod consumer;
pub mod context;
pub mod coordinator;
pub mod definition;
pub mod error;
pub mod event;
pub mod execution;
pub mod nats;
pub mod runner;
pub mod scheduler;
pub mod store;
pub mod template;

pub use consumer::{ClaimedMessage, ExecutionQueue, QueueConsumer, QueueMessage};
pub use context::ExecutionContext;
pub use coordinator::{CoordinatorOutcome, ExecutionCoordinator};
pub use definition::{NodeDefinition, NodeType, TriggerType, Workflow};
pub use error::{CoordinatorError, DefinitionError, PublishError, QueueError, StoreError};
pub use event::{events_subject, EventPublisher, ExecutionEvent};
pub use execution::{Execution, ExecutionStatus};
pub use runner::{NodeError, NodeRunner};
pub use scheduler::DependencyScheduler;
pub use store::{CredentialRecord, EngineStore, ExecutionUpdate, Form};
pub use template::resolve;
