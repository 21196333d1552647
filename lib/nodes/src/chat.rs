//! Chat-message node executors (Telegram, Slack).

use crate::runner::load_credential_data;
use serde_json::Value as JsonValue;
use weft_integration::{SlackCredentials, SlackSender, TelegramCredentials, TelegramSender};
use weft_workflow::context::ExecutionContext;
use weft_workflow::definition::NodeDefinition;
use weft_workflow::runner::NodeError;
use weft_workflow::store::EngineStore;
use weft_workflow::template;

/// Sends a Telegram message, returning `{ message }`.
pub async fn run_telegram<S: EngineStore>(
    store: &S,
    sender: &TelegramSender,
    node: &NodeDefinition,
    context: &ExecutionContext,
) -> Result<JsonValue, NodeError> {
    let data = load_credential_data(store, node, "Telegram").await?;
    let credentials =
        TelegramCredentials::parse(&data).map_err(|e| NodeError::new(e.to_string()))?;

    let template_text = node
        .config_str("message")
        .ok_or_else(|| NodeError::new("Telegram message not configured"))?;
    let message = template::resolve(template_text, context);

    sender
        .send_message(&credentials, &message)
        .await
        .map_err(|e| NodeError::new(format!("Failed to send telegram message: {e}")))?;

    Ok(serde_json::json!({ "message": message }))
}

/// Posts a Slack message, returning `{ channel, text }`.
pub async fn run_slack<S: EngineStore>(
    store: &S,
    sender: &SlackSender,
    node: &NodeDefinition,
    context: &ExecutionContext,
) -> Result<JsonValue, NodeError> {
    let data = load_credential_data(store, node, "Slack").await?;
    let credentials = SlackCredentials::parse(&data).map_err(|e| NodeError::new(e.to_string()))?;

    let channel_template = node
        .config_str("channel")
        .ok_or_else(|| NodeError::new("Slack channel not configured"))?;
    let message_template = node
        .config_str("message")
        .ok_or_else(|| NodeError::new("Slack message not configured"))?;

    let channel = template::resolve(channel_template, context);
    let text = template::resolve(message_template, context);

    sender
        .post_message(&credentials, &channel, &text)
        .await
        .map_err(|e| NodeError::new(format!("Slack send failed: {e}")))?;

    Ok(serde_json::json!({ "channel": channel, "text": text }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::CredentialId;
    use weft_workflow::definition::NodeType;
    use weft_workflow::store::{CredentialRecord, InMemoryEngineStore};

    fn store_with_telegram_credentials(data: JsonValue) -> (InMemoryEngineStore, CredentialId) {
        let store = InMemoryEngineStore::new();
        let id = CredentialId::new();
        store.insert_credential(CredentialRecord {
            id,
            platform: "Telegram".to_string(),
            data,
        });
        (store, id)
    }

    #[tokio::test]
    async fn invalid_credentials_fail_before_any_send() {
        let (store, id) = store_with_telegram_credentials(serde_json::json!({"botToken": "t"}));
        let node = NodeDefinition::new("node1", NodeType::Telegram)
            .with_credentials(id)
            .with_config("message", serde_json::json!("hi"));
        let context = ExecutionContext::new(serde_json::json!({}));

        let error = run_telegram(&store, &TelegramSender::new(), &node, &context)
            .await
            .unwrap_err();
        assert_eq!(error.message(), "Telegram credentials invalid");
    }

    #[tokio::test]
    async fn unconfigured_message_fails() {
        let (store, id) = store_with_telegram_credentials(
            serde_json::json!({"botToken": "t", "chatId": "42"}),
        );
        let node = NodeDefinition::new("node1", NodeType::Telegram).with_credentials(id);
        let context = ExecutionContext::new(serde_json::json!({}));

        let error = run_telegram(&store, &TelegramSender::new(), &node, &context)
            .await
            .unwrap_err();
        assert!(error.message().contains("not configured"));
    }
}
