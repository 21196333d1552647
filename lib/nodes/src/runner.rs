//! The dispatching node runner.

use crate::{chat, email, form, llm};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use weft_ai::backend::ModelProvider;
use weft_ai::memory::ConversationMemory;
use weft_integration::error::CredentialError;
use weft_integration::{ResendMailer, SlackSender, TelegramSender};
use weft_workflow::context::ExecutionContext;
use weft_workflow::definition::{NodeDefinition, NodeType, Workflow};
use weft_workflow::runner::{NodeError, NodeRunner};
use weft_workflow::store::EngineStore;

/// Production [`NodeRunner`]: dispatches each node to its platform
/// executor.
pub struct PlatformNodeRunner<S, M> {
    store: Arc<S>,
    memory: Arc<M>,
    provider: Arc<dyn ModelProvider>,
    telegram: TelegramSender,
    slack: SlackSender,
    resend: ResendMailer,
}

impl<S, M> PlatformNodeRunner<S, M>
where
    S: EngineStore,
    M: ConversationMemory,
{
    /// Creates a runner over the given store, memory, and model provider,
    /// with senders against the public platform APIs.
    pub fn new(store: Arc<S>, memory: Arc<M>, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            store,
            memory,
            provider,
            telegram: TelegramSender::new(),
            slack: SlackSender::new(),
            resend: ResendMailer::new(),
        }
    }

    /// Replaces the Telegram sender (tests, proxies).
    #[must_use]
    pub fn with_telegram(mut self, telegram: TelegramSender) -> Self {
        self.telegram = telegram;
        self
    }

    /// Replaces the Slack sender (tests, proxies).
    #[must_use]
    pub fn with_slack(mut self, slack: SlackSender) -> Self {
        self.slack = slack;
        self
    }

    /// Replaces the Resend mailer (tests, proxies).
    #[must_use]
    pub fn with_resend(mut self, resend: ResendMailer) -> Self {
        self.resend = resend;
        self
    }
}

#[async_trait]
impl<S, M> NodeRunner for PlatformNodeRunner<S, M>
where
    S: EngineStore,
    M: ConversationMemory,
{
    async fn run(
        &self,
        workflow: &Workflow,
        node: &NodeDefinition,
        context: &ExecutionContext,
    ) -> Result<JsonValue, NodeError> {
        match node.node_type {
            NodeType::Telegram => {
                chat::run_telegram(self.store.as_ref(), &self.telegram, node, context).await
            }
            NodeType::Slack => {
                chat::run_slack(self.store.as_ref(), &self.slack, node, context).await
            }
            NodeType::ResendEmail => {
                email::run_resend(self.store.as_ref(), &self.resend, node, context).await
            }
            NodeType::Gemini => {
                llm::run_gemini(
                    self.store.as_ref(),
                    self.memory.as_ref(),
                    self.provider.as_ref(),
                    workflow,
                    node,
                    context,
                )
                .await
            }
            NodeType::Form => form::run_form(self.store.as_ref(), workflow, node).await,
        }
    }
}

/// Fetches a node's credential data, mapping absence to the platform's
/// not-found message.
pub(crate) async fn load_credential_data<S: EngineStore>(
    store: &S,
    node: &NodeDefinition,
    platform: &'static str,
) -> Result<JsonValue, NodeError> {
    let not_found = || NodeError::new(CredentialError::NotFound { platform }.to_string());

    let Some(credentials_id) = node.credentials_id else {
        return Err(not_found());
    };

    match store.find_credential(credentials_id).await {
        Ok(Some(record)) => Ok(record.data),
        Ok(None) => Err(not_found()),
        Err(error) => Err(NodeError::new(error.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::CredentialId;
    use weft_workflow::store::InMemoryEngineStore;

    #[tokio::test]
    async fn missing_reference_reports_platform_not_found() {
        let store = InMemoryEngineStore::new();
        let node = NodeDefinition::new("node1", NodeType::Telegram);

        let error = load_credential_data(&store, &node, "Telegram")
            .await
            .unwrap_err();
        assert_eq!(error.message(), "Telegram credentials not found");
    }

    #[tokio::test]
    async fn dangling_reference_reports_platform_not_found() {
        let store = InMemoryEngineStore::new();
        let node =
            NodeDefinition::new("node1", NodeType::Slack).with_credentials(CredentialId::new());

        let error = load_credential_data(&store, &node, "Slack").await.unwrap_err();
        assert_eq!(error.message(), "Slack credentials not found");
    }
}
