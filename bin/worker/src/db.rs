//! Postgres-backed record store.
//!
//! Implements the engine's [`EngineStore`] contract over the tables owned
//! by the API layer:
//!
//! - `workflows(id, title, user_id, trigger_type, nodes, connections,
//!   webhook, enabled)` with `nodes`/`connections`/`webhook` as JSONB
//! - `executions(id, workflow_id, status, total_tasks, tasks_done, output,
//!   logs, created_at)` with `output`/`logs` as JSONB
//! - `credentials(id, platform, data)` with `data` as JSONB
//! - `forms(id, workflow_id, node_id)`
//!
//! Every store call is one statement, so updates are atomic per record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use weft_core::{CredentialId, ExecutionId, FormId, UserId, WorkflowId};
use weft_workflow::definition::{NodeDefinition, TriggerType, WebhookConfig, Workflow};
use weft_workflow::error::StoreError;
use weft_workflow::execution::{Execution, ExecutionOutput, ExecutionStatus};
use weft_workflow::store::{CredentialRecord, EngineStore, ExecutionUpdate, Form};

/// [`EngineStore`] over a Postgres pool.
pub struct PgEngineStore {
    pool: PgPool,
}

impl PgEngineStore {
    /// Creates a store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable {
        message: e.to_string(),
    }
}

fn malformed(message: impl Into<String>) -> StoreError {
    StoreError::Malformed {
        message: message.into(),
    }
}

fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, StoreError>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| malformed(format!("invalid {what} '{raw}': {e}")))
}

#[derive(FromRow)]
struct WorkflowRow {
    id: String,
    title: String,
    user_id: String,
    trigger_type: String,
    nodes: JsonValue,
    connections: JsonValue,
    webhook: Option<JsonValue>,
    enabled: bool,
}

impl WorkflowRow {
    fn try_into_workflow(self) -> Result<Workflow, StoreError> {
        let id: WorkflowId = parse_id(&self.id, "workflow id")?;
        let user_id: UserId = parse_id(&self.user_id, "user id")?;

        let trigger_type: TriggerType =
            serde_json::from_value(JsonValue::String(self.trigger_type.clone()))
                .map_err(|_| malformed(format!("invalid trigger type '{}'", self.trigger_type)))?;

        let nodes: IndexMap<String, NodeDefinition> = serde_json::from_value(self.nodes)
            .map_err(|e| malformed(format!("invalid nodes for workflow {id}: {e}")))?;
        let connections: IndexMap<String, Vec<String>> = serde_json::from_value(self.connections)
            .map_err(|e| malformed(format!("invalid connections for workflow {id}: {e}")))?;
        let webhook: Option<WebhookConfig> = match self.webhook {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| malformed(format!("invalid webhook for workflow {id}: {e}")))?,
            None => None,
        };

        Ok(Workflow {
            id,
            title: self.title,
            user_id,
            trigger_type,
            nodes,
            connections,
            webhook,
            enabled: self.enabled,
        })
    }
}

#[derive(FromRow)]
struct ExecutionRow {
    id: String,
    workflow_id: String,
    status: String,
    total_tasks: i32,
    tasks_done: i32,
    output: JsonValue,
    logs: JsonValue,
    created_at: DateTime<Utc>,
}

impl ExecutionRow {
    fn try_into_execution(self) -> Result<Execution, StoreError> {
        let id: ExecutionId = parse_id(&self.id, "execution id")?;
        let workflow_id: WorkflowId = parse_id(&self.workflow_id, "workflow id")?;

        let status: ExecutionStatus =
            serde_json::from_value(JsonValue::String(self.status.clone()))
                .map_err(|_| malformed(format!("invalid execution status '{}'", self.status)))?;
        let output: ExecutionOutput = serde_json::from_value(self.output)
            .map_err(|e| malformed(format!("invalid output for execution {id}: {e}")))?;
        let logs: IndexMap<String, String> = serde_json::from_value(self.logs)
            .map_err(|e| malformed(format!("invalid logs for execution {id}: {e}")))?;

        Ok(Execution {
            id,
            workflow_id,
            status,
            total_tasks: self.total_tasks.try_into().unwrap_or(0),
            tasks_done: self.tasks_done.try_into().unwrap_or(0),
            output,
            logs,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialRow {
    id: String,
    platform: String,
    data: JsonValue,
}

#[derive(FromRow)]
struct FormRow {
    id: String,
    workflow_id: String,
    node_id: String,
}

#[async_trait]
impl EngineStore for PgEngineStore {
    async fn find_workflow(&self, id: WorkflowId) -> Result<Option<Workflow>, StoreError> {
        let row: Option<WorkflowRow> = sqlx::query_as(
            r#"
            SELECT id, title, user_id, trigger_type, nodes, connections, webhook, enabled
            FROM workflows
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(WorkflowRow::try_into_workflow).transpose()
    }

    async fn find_execution(&self, id: ExecutionId) -> Result<Option<Execution>, StoreError> {
        let row: Option<ExecutionRow> = sqlx::query_as(
            r#"
            SELECT id, workflow_id, status, total_tasks, tasks_done, output, logs, created_at
            FROM executions
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(ExecutionRow::try_into_execution).transpose()
    }

    async fn update_execution(
        &self,
        id: ExecutionId,
        update: ExecutionUpdate,
    ) -> Result<(), StoreError> {
        let status = update.status.map(|s| s.to_string());
        let tasks_done = update.tasks_done.map(|n| n as i32);
        let logs = update
            .logs
            .map(|logs| serde_json::to_value(logs).unwrap_or(JsonValue::Null));

        sqlx::query(
            r#"
            UPDATE executions
            SET status = COALESCE($2, status),
                tasks_done = COALESCE($3, tasks_done),
                logs = COALESCE($4, logs)
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .bind(status)
        .bind(tasks_done)
        .bind(logs)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn find_credential(
        &self,
        id: CredentialId,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let row: Option<CredentialRow> = sqlx::query_as(
            r#"
            SELECT id, platform, data
            FROM credentials
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(|row| {
            Ok(CredentialRecord {
                id: parse_id(&row.id, "credential id")?,
                platform: row.platform,
                data: row.data,
            })
        })
        .transpose()
    }

    async fn find_form(
        &self,
        workflow_id: WorkflowId,
        node_id: &str,
    ) -> Result<Option<Form>, StoreError> {
        let row: Option<FormRow> = sqlx::query_as(
            r#"
            SELECT id, workflow_id, node_id
            FROM forms
            WHERE workflow_id = $1 AND node_id = $2
            "#,
        )
        .bind(workflow_id.to_string())
        .bind(node_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(|row| {
            let form_id: FormId = parse_id(&row.id, "form id")?;
            let workflow_id: WorkflowId = parse_id(&row.workflow_id, "workflow id")?;
            Ok(Form {
                id: form_id,
                workflow_id,
                node_id: row.node_id,
            })
        })
        .transpose()
    }
}
