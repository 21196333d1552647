//! Form node executor.
//!
//! Forms are provisioned by the API layer before execution; this executor
//! only resolves the reference. No external call is made.

use serde_json::Value as JsonValue;
use weft_workflow::definition::{NodeDefinition, Workflow};
use weft_workflow::runner::NodeError;
use weft_workflow::store::EngineStore;

/// Resolves the form provisioned for this node, returning
/// `{ formId, url }`.
pub async fn run_form<S: EngineStore>(
    store: &S,
    workflow: &Workflow,
    node: &NodeDefinition,
) -> Result<JsonValue, NodeError> {
    let form = store
        .find_form(workflow.id, &node.id)
        .await
        .map_err(|e| NodeError::new(e.to_string()))?
        .ok_or_else(|| NodeError::new("Form not found for this workflow node"))?;

    Ok(serde_json::json!({
        "formId": form.id,
        "url": form.url(),
    }))
}
