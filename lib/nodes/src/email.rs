//! Email node executor (Resend).

use crate::runner::load_credential_data;
use serde_json::Value as JsonValue;
use weft_integration::{ResendCredentials, ResendMailer};
use weft_workflow::context::ExecutionContext;
use weft_workflow::definition::NodeDefinition;
use weft_workflow::runner::NodeError;
use weft_workflow::store::EngineStore;
use weft_workflow::template;

/// Sends an email, returning `{ to, subject, body }`.
pub async fn run_resend<S: EngineStore>(
    store: &S,
    mailer: &ResendMailer,
    node: &NodeDefinition,
    context: &ExecutionContext,
) -> Result<JsonValue, NodeError> {
    let data = load_credential_data(store, node, "Email").await?;
    let credentials =
        ResendCredentials::parse(&data).map_err(|e| NodeError::new(e.to_string()))?;

    let to_template = node
        .config_str("to")
        .ok_or_else(|| NodeError::new("Email recipient not configured"))?;
    let subject_template = node
        .config_str("subject")
        .ok_or_else(|| NodeError::new("Email subject not configured"))?;
    let body_template = node
        .config_str("body")
        .ok_or_else(|| NodeError::new("Email body not configured"))?;

    let to = template::resolve(to_template, context);
    let subject = template::resolve(subject_template, context);
    let body = template::resolve(body_template, context);

    mailer
        .send_email(&credentials, &to, &subject, &body)
        .await
        .map_err(|e| NodeError::new(format!("Failed to send Email: {e}")))?;

    Ok(serde_json::json!({ "to": to, "subject": subject, "body": body }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::CredentialId;
    use weft_workflow::definition::NodeType;
    use weft_workflow::store::{CredentialRecord, InMemoryEngineStore};

    #[tokio::test]
    async fn missing_api_key_fails_with_invalid_credentials() {
        let store = InMemoryEngineStore::new();
        let id = CredentialId::new();
        store.insert_credential(CredentialRecord {
            id,
            platform: "ResendEmail".to_string(),
            data: serde_json::json!({}),
        });

        let node = NodeDefinition::new("node2", NodeType::ResendEmail)
            .with_credentials(id)
            .with_config("to", serde_json::json!("a@b.c"))
            .with_config("subject", serde_json::json!("Hi"))
            .with_config("body", serde_json::json!("Hello"));
        let context = ExecutionContext::new(serde_json::json!({}));

        let error = run_resend(&store, &ResendMailer::new(), &node, &context)
            .await
            .unwrap_err();
        assert_eq!(error.message(), "Email credentials invalid");
    }
}
