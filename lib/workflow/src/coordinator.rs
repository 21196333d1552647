//! Execution coordination.
//!
//! One coordinator invocation owns one execution's lifecycle:
//! load workflow + execution, move the record to `RUNNING`, drive the
//! dependency scheduler one node at a time, record per-node outcomes, and
//! settle on exactly one terminal status. The queue layer guarantees no
//! execution id is processed by two coordinators at once, so all record
//! updates here are single-writer.
//!
//! Event publishing along the way is lossy: failures are logged and never
//! abort the run.

use crate::consumer::QueueMessage;
use crate::context::ExecutionContext;
use crate::error::CoordinatorError;
use crate::event::{EventPublisher, ExecutionEvent};
use crate::execution::ExecutionStatus;
use crate::runner::NodeRunner;
use crate::scheduler::DependencyScheduler;
use crate::store::{EngineStore, ExecutionUpdate};
use chrono::Utc;
use std::sync::Arc;

/// How the coordinator disposed of one queue message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorOutcome {
    /// The execution reached and persisted a terminal status.
    Finished(ExecutionStatus),
    /// The message referenced a missing workflow or execution and was
    /// dropped as poison. The consumer still acknowledges it.
    Poison { reason: String },
}

/// Drives executions claimed from the queue.
pub struct ExecutionCoordinator<S, P, R> {
    store: Arc<S>,
    publisher: Arc<P>,
    runner: Arc<R>,
}

impl<S, P, R> ExecutionCoordinator<S, P, R>
where
    S: EngineStore,
    P: EventPublisher,
    R: NodeRunner,
{
    /// Creates a coordinator over the given store, publisher, and runner.
    pub fn new(store: Arc<S>, publisher: Arc<P>, runner: Arc<R>) -> Self {
        Self {
            store,
            publisher,
            runner,
        }
    }

    /// Processes one claimed queue message to a terminal outcome.
    ///
    /// # Errors
    ///
    /// Returns an error only on store failures; the caller must then leave
    /// the message unacknowledged so it stays claimable.
    pub async fn process(
        &self,
        message: &QueueMessage,
    ) -> Result<CoordinatorOutcome, CoordinatorError> {
        let Some(workflow) = self.store.find_workflow(message.workflow_id).await? else {
            tracing::warn!(workflow_id = %message.workflow_id, "workflow not found, dropping message");
            return Ok(CoordinatorOutcome::Poison {
                reason: format!("workflow not found: {}", message.workflow_id),
            });
        };

        let Some(mut execution) = self.store.find_execution(message.execution_id).await? else {
            tracing::warn!(execution_id = %message.execution_id, "execution not found, dropping message");
            return Ok(CoordinatorOutcome::Poison {
                reason: format!("execution not found: {}", message.execution_id),
            });
        };

        execution.start();
        self.store
            .update_execution(execution.id, ExecutionUpdate::new().status(ExecutionStatus::Running))
            .await?;
        self.publish(ExecutionEvent::ExecutionStarted {
            execution_id: execution.id,
            workflow_id: workflow.id,
            ts: Utc::now(),
        })
        .await;

        let mut context = ExecutionContext::new(execution.output.trigger_payload.clone());
        let mut scheduler = DependencyScheduler::new(&workflow);

        // A non-empty graph with an empty initial ready queue has no
        // runnable entry nodes (every node sits in a cycle). Succeeding
        // with zero tasks would hide the misconfiguration, so fail.
        if workflow.node_count() > 0 && !scheduler.has_ready() {
            tracing::warn!(workflow_id = %workflow.id, "workflow has no runnable entry nodes");
            execution.fail();
            self.store
                .update_execution(
                    execution.id,
                    ExecutionUpdate::new().status(ExecutionStatus::Failed),
                )
                .await?;
            self.publish(ExecutionEvent::ExecutionFinished {
                execution_id: execution.id,
                workflow_id: workflow.id,
                status: ExecutionStatus::Failed,
                tasks_done: execution.tasks_done,
                total_tasks: execution.total_tasks,
                ts: Utc::now(),
            })
            .await;
            return Ok(CoordinatorOutcome::Finished(ExecutionStatus::Failed));
        }

        while let Some(node_id) = scheduler.next_ready() {
            let node = &workflow.nodes[&node_id];
            tracing::info!(execution_id = %execution.id, node_id = %node_id, node_type = %node.node_type, "executing node");

            self.publish(ExecutionEvent::NodeStarted {
                execution_id: execution.id,
                workflow_id: workflow.id,
                node_id: node_id.clone(),
                node_type: node.node_type,
                ts: Utc::now(),
            })
            .await;

            match self.runner.run(&workflow, node, &context).await {
                Ok(result) => {
                    context.record_result(&node_id, result);
                    execution.record_node_success(&node_id);
                    self.store
                        .update_execution(
                            execution.id,
                            ExecutionUpdate::new()
                                .tasks_done(execution.tasks_done)
                                .logs(execution.logs.clone()),
                        )
                        .await?;
                    self.publish(ExecutionEvent::NodeSucceeded {
                        execution_id: execution.id,
                        workflow_id: workflow.id,
                        node_id: node_id.clone(),
                        tasks_done: execution.tasks_done,
                        total_tasks: execution.total_tasks,
                        ts: Utc::now(),
                    })
                    .await;
                    scheduler.mark_completed(&workflow, &node_id);
                }
                Err(error) => {
                    tracing::error!(execution_id = %execution.id, node_id = %node_id, error = %error, "node failed");
                    execution.record_node_failure(&node_id, error.message());
                    self.store
                        .update_execution(
                            execution.id,
                            ExecutionUpdate::new()
                                .status(ExecutionStatus::Failed)
                                .logs(execution.logs.clone()),
                        )
                        .await?;
                    self.publish(ExecutionEvent::NodeFailed {
                        execution_id: execution.id,
                        workflow_id: workflow.id,
                        node_id: node_id.clone(),
                        error: error.message().to_string(),
                        ts: Utc::now(),
                    })
                    .await;
                    self.publish(ExecutionEvent::ExecutionFinished {
                        execution_id: execution.id,
                        workflow_id: workflow.id,
                        status: ExecutionStatus::Failed,
                        tasks_done: execution.tasks_done,
                        total_tasks: execution.total_tasks,
                        ts: Utc::now(),
                    })
                    .await;
                    return Ok(CoordinatorOutcome::Finished(ExecutionStatus::Failed));
                }
            }
        }

        let unscheduled = scheduler.unscheduled();
        if !unscheduled.is_empty() {
            tracing::warn!(
                execution_id = %execution.id,
                nodes = ?unscheduled,
                "nodes unreachable from any entry node were never executed"
            );
        }

        execution.complete();
        self.store
            .update_execution(
                execution.id,
                ExecutionUpdate::new()
                    .status(ExecutionStatus::Success)
                    .tasks_done(execution.tasks_done),
            )
            .await?;
        self.publish(ExecutionEvent::ExecutionFinished {
            execution_id: execution.id,
            workflow_id: workflow.id,
            status: ExecutionStatus::Success,
            tasks_done: execution.tasks_done,
            total_tasks: execution.total_tasks,
            ts: Utc::now(),
        })
        .await;

        tracing::info!(execution_id = %execution.id, tasks_done = execution.tasks_done, "execution finished");
        Ok(CoordinatorOutcome::Finished(ExecutionStatus::Success))
    }

    /// Publishes one event, logging and swallowing failures.
    async fn publish(&self, event: ExecutionEvent) {
        if let Err(error) = self.publisher.publish(&event).await {
            tracing::warn!(error = %error, "failed to publish execution event");
        }
    }
}
