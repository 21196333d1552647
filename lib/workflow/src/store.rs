//! Record store contract.
//!
//! The engine never owns persistence: workflows, executions, credentials,
//! and forms live in an external store reached through [`EngineStore`].
//! Every method is an atomic single-record operation, safe under concurrent
//! invocation across worker instances; the engine requires no multi-record
//! transactions.
//!
//! [`InMemoryEngineStore`] backs the engine's own tests and doubles as a
//! reference for what implementations must do.

use crate::definition::Workflow;
use crate::error::StoreError;
use crate::execution::{Execution, ExecutionStatus};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Mutex;
use weft_core::{CredentialId, ExecutionId, FormId, WorkflowId};

/// A stored credential, opaque to the engine.
///
/// `data` is parsed into typed fields at the node-executor boundary, not
/// earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialRecord {
    /// Unique identifier.
    pub id: CredentialId,
    /// Platform this credential authenticates against (e.g. `"Telegram"`).
    pub platform: String,
    /// Secret material as stored.
    pub data: JsonValue,
}

/// A form resource provisioned for one workflow node by the API layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    /// Unique identifier.
    pub id: FormId,
    /// The workflow this form belongs to.
    pub workflow_id: WorkflowId,
    /// The node this form belongs to.
    pub node_id: String,
}

impl Form {
    /// Returns the public URL path for this form.
    #[must_use]
    pub fn url(&self) -> String {
        format!("/forms/{}", self.id.as_ulid())
    }
}

/// A partial field set applied to an execution record.
///
/// Only set fields are written; the rest of the record is untouched. One
/// update call is one atomic read-modify-write on the record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionUpdate {
    pub status: Option<ExecutionStatus>,
    pub tasks_done: Option<u32>,
    pub logs: Option<IndexMap<String, String>>,
}

impl ExecutionUpdate {
    /// Starts an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status field.
    #[must_use]
    pub fn status(mut self, status: ExecutionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the progress counter.
    #[must_use]
    pub fn tasks_done(mut self, tasks_done: u32) -> Self {
        self.tasks_done = Some(tasks_done);
        self
    }

    /// Replaces the log map.
    #[must_use]
    pub fn logs(mut self, logs: IndexMap<String, String>) -> Self {
        self.logs = Some(logs);
        self
    }
}

/// Repository contract the engine consumes.
#[async_trait]
pub trait EngineStore: Send + Sync {
    /// Looks up a workflow definition.
    async fn find_workflow(&self, id: WorkflowId) -> Result<Option<Workflow>, StoreError>;

    /// Looks up an execution record.
    async fn find_execution(&self, id: ExecutionId) -> Result<Option<Execution>, StoreError>;

    /// Applies a partial update to an execution record.
    async fn update_execution(
        &self,
        id: ExecutionId,
        update: ExecutionUpdate,
    ) -> Result<(), StoreError>;

    /// Looks up a credential record.
    async fn find_credential(
        &self,
        id: CredentialId,
    ) -> Result<Option<CredentialRecord>, StoreError>;

    /// Looks up the form provisioned for one workflow node.
    async fn find_form(
        &self,
        workflow_id: WorkflowId,
        node_id: &str,
    ) -> Result<Option<Form>, StoreError>;
}

/// In-memory store for tests and local experiments.
#[derive(Debug, Default)]
pub struct InMemoryEngineStore {
    workflows: Mutex<HashMap<WorkflowId, Workflow>>,
    executions: Mutex<HashMap<ExecutionId, Execution>>,
    credentials: Mutex<HashMap<CredentialId, CredentialRecord>>,
    forms: Mutex<HashMap<(WorkflowId, String), Form>>,
}

impl InMemoryEngineStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a workflow definition.
    pub fn insert_workflow(&self, workflow: Workflow) {
        self.workflows.lock().unwrap().insert(workflow.id, workflow);
    }

    /// Inserts an execution record.
    pub fn insert_execution(&self, execution: Execution) {
        self.executions
            .lock()
            .unwrap()
            .insert(execution.id, execution);
    }

    /// Inserts a credential record.
    pub fn insert_credential(&self, credential: CredentialRecord) {
        self.credentials
            .lock()
            .unwrap()
            .insert(credential.id, credential);
    }

    /// Inserts a form record.
    pub fn insert_form(&self, form: Form) {
        self.forms
            .lock()
            .unwrap()
            .insert((form.workflow_id, form.node_id.clone()), form);
    }

    /// Returns a snapshot of an execution record.
    #[must_use]
    pub fn execution(&self, id: ExecutionId) -> Option<Execution> {
        self.executions.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl EngineStore for InMemoryEngineStore {
    async fn find_workflow(&self, id: WorkflowId) -> Result<Option<Workflow>, StoreError> {
        Ok(self.workflows.lock().unwrap().get(&id).cloned())
    }

    async fn find_execution(&self, id: ExecutionId) -> Result<Option<Execution>, StoreError> {
        Ok(self.executions.lock().unwrap().get(&id).cloned())
    }

    async fn update_execution(
        &self,
        id: ExecutionId,
        update: ExecutionUpdate,
    ) -> Result<(), StoreError> {
        let mut executions = self.executions.lock().unwrap();
        let execution = executions.get_mut(&id).ok_or_else(|| StoreError::Malformed {
            message: format!("execution not found: {id}"),
        })?;

        if let Some(status) = update.status {
            execution.status = status;
        }
        if let Some(tasks_done) = update.tasks_done {
            execution.tasks_done = tasks_done;
        }
        if let Some(logs) = update.logs {
            execution.logs = logs;
        }
        Ok(())
    }

    async fn find_credential(
        &self,
        id: CredentialId,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.credentials.lock().unwrap().get(&id).cloned())
    }

    async fn find_form(
        &self,
        workflow_id: WorkflowId,
        node_id: &str,
    ) -> Result<Option<Form>, StoreError> {
        Ok(self
            .forms
            .lock()
            .unwrap()
            .get(&(workflow_id, node_id.to_string()))
            .cloned())
    }
}
