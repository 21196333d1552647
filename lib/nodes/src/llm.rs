//! LLM node executor (Gemini).
//!
//! Resolves the prompt template, optionally loads the workflow's bounded
//! conversation memory as prior turns, invokes the model (which may call
//! arithmetic tools), and parses the output for structured JSON. With
//! memory enabled, both the prompt and the raw output are appended to the
//! workflow's history after the call.

use crate::runner::load_credential_data;
use serde_json::Value as JsonValue;
use weft_ai::backend::{LlmMessage, LlmRequest, MessageRole, ModelProvider};
use weft_ai::memory::{ConversationMemory, MemoryEntry};
use weft_ai::output::parse_model_output;
use weft_integration::GeminiCredentials;
use weft_workflow::context::ExecutionContext;
use weft_workflow::definition::{NodeDefinition, Workflow};
use weft_workflow::runner::NodeError;
use weft_workflow::store::EngineStore;
use weft_workflow::template;

/// Invokes the model, returning `{ text, query }`.
///
/// `text` is the parsed JSON object when the model produced one, otherwise
/// the raw output string. `query` is the resolved prompt.
pub async fn run_gemini<S, M>(
    store: &S,
    memory: &M,
    provider: &dyn ModelProvider,
    workflow: &Workflow,
    node: &NodeDefinition,
    context: &ExecutionContext,
) -> Result<JsonValue, NodeError>
where
    S: EngineStore,
    M: ConversationMemory,
{
    let data = load_credential_data(store, node, "Gemini").await?;
    let credentials =
        GeminiCredentials::parse(&data).map_err(|e| NodeError::new(e.to_string()))?;

    let prompt_template = node
        .config_str("prompt")
        .ok_or_else(|| NodeError::new("Gemini prompt not configured"))?;
    let prompt = template::resolve(prompt_template, context);

    let use_memory = node.config_bool("memory").unwrap_or(false);

    let mut request = LlmRequest::new(prompt.clone());
    if use_memory {
        let history = memory
            .recent(workflow.id)
            .await
            .map_err(|e| NodeError::new(e.to_string()))?;
        request = request.with_history(
            history
                .into_iter()
                .map(|entry| LlmMessage {
                    role: entry.role,
                    content: entry.content,
                })
                .collect(),
        );
    }

    let backend = provider.backend(&credentials.api_key);
    let response = backend
        .generate(&request)
        .await
        .map_err(|e| NodeError::new(e.to_string()))?;
    let raw = response.content;

    if use_memory {
        // The raw output is remembered, not the parsed form, so later
        // prompts see exactly what the model said.
        memory
            .append(workflow.id, MemoryEntry::new(MessageRole::User, prompt.clone()))
            .await
            .map_err(|e| NodeError::new(e.to_string()))?;
        memory
            .append(
                workflow.id,
                MemoryEntry::new(MessageRole::Assistant, raw.clone()),
            )
            .await
            .map_err(|e| NodeError::new(e.to_string()))?;
    }

    Ok(serde_json::json!({
        "text": parse_model_output(&raw),
        "query": prompt,
    }))
}
