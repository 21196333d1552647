//! Gemini backend.
//!
//! Talks to the Gemini `generateContent` API with function calling: when
//! the model requests a tool, the backend executes it locally, appends the
//! call and its response as turns, and re-invokes the model until it
//! produces text or the round limit is hit.

use crate::backend::{LlmBackend, LlmRequest, LlmResponse, MessageRole, ModelProvider};
use crate::error::LlmError;
use crate::tools;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Upper bound on tool-call rounds within one generation.
const MAX_TOOL_ROUNDS: usize = 10;

const SYSTEM_PROMPT: &str = "You are a helpful AI assistant with access to various tools and functions.\n\
When responding to user requests:\n\
- If the task can be accomplished using available tools, use them appropriately\n\
- Always check whether tools are needed before responding; if no tools are needed, respond naturally with your knowledge\n\
- Always provide clear, helpful responses\n\
- When asked to return JSON, return only valid JSON without extra text or backticks.\n\
Choose the best approach based on what the user is asking for.";

/// Gemini-backed [`LlmBackend`].
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    /// Creates a backend for the given API key and the default model.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Overrides the API base URL (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Builds the initial `contents` array from history plus the prompt.
    fn initial_contents(request: &LlmRequest) -> Vec<JsonValue> {
        let mut contents: Vec<JsonValue> = request
            .history
            .iter()
            .map(|message| {
                let role = match message.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{"text": message.content}],
                })
            })
            .collect();

        contents.push(serde_json::json!({
            "role": "user",
            "parts": [{"text": request.prompt}],
        }));
        contents
    }

    fn tool_declarations() -> JsonValue {
        let declarations: Vec<JsonValue> = tools::definitions()
            .into_iter()
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters,
                })
            })
            .collect();
        serde_json::json!([{"function_declarations": declarations}])
    }

    fn request_body(&self, contents: &[JsonValue], allow_tools: bool) -> JsonValue {
        let mut body = serde_json::json!({
            "system_instruction": {"parts": [{"text": SYSTEM_PROMPT}]},
            "contents": contents,
            "generationConfig": {"temperature": 0.5},
        });
        if allow_tools {
            body["tools"] = Self::tool_declarations();
        }
        body
    }

    async fn invoke(&self, body: &JsonValue) -> Result<JsonValue, LlmError> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Http {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                message: format!("{status}: {detail}"),
            });
        }

        response.json().await.map_err(|e| LlmError::InvalidResponse {
            message: e.to_string(),
        })
    }

    /// Extracts the first candidate's parts from a response body.
    fn candidate_parts(body: &JsonValue) -> Result<&Vec<JsonValue>, LlmError> {
        body["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut contents = Self::initial_contents(request);

        for _ in 0..MAX_TOOL_ROUNDS {
            let body = self.request_body(&contents, request.allow_tools);
            let response = self.invoke(&body).await?;
            let parts = Self::candidate_parts(&response)?;

            if let Some(call) = parts.iter().find_map(|part| part.get("functionCall")) {
                let name = call["name"].as_str().unwrap_or_default().to_string();
                let args = call.get("args").cloned().unwrap_or(JsonValue::Null);
                tracing::debug!(tool = %name, "model requested tool call");

                let result = match tools::dispatch(&name, &args) {
                    Some(result) => serde_json::json!({"result": result}),
                    None => serde_json::json!({"error": format!("unknown tool: {name}")}),
                };

                // Echo the model's call, then answer it, then go again.
                contents.push(serde_json::json!({
                    "role": "model",
                    "parts": [{"functionCall": {"name": name, "args": args}}],
                }));
                contents.push(serde_json::json!({
                    "role": "user",
                    "parts": [{"functionResponse": {"name": name, "response": result}}],
                }));
                continue;
            }

            let text: String = parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<Vec<_>>()
                .join("");
            if text.is_empty() {
                return Err(LlmError::EmptyResponse);
            }
            return Ok(LlmResponse { content: text });
        }

        Err(LlmError::ToolLoopExceeded {
            rounds: MAX_TOOL_ROUNDS,
        })
    }
}

/// [`ModelProvider`] minting Gemini backends.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    base_url: String,
    model: String,
}

impl Default for GeminiProvider {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl GeminiProvider {
    /// Creates a provider for the public API and default model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the API base URL (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl ModelProvider for GeminiProvider {
    fn backend(&self, api_key: &str) -> Box<dyn LlmBackend> {
        Box::new(
            GeminiBackend::new(api_key)
                .with_base_url(self.base_url.clone())
                .with_model(self.model.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LlmMessage;

    #[test]
    fn initial_contents_interleave_history_and_prompt() {
        let request = LlmRequest::new("now").with_history(vec![
            LlmMessage::user("hi"),
            LlmMessage::assistant("hello"),
        ]);
        let contents = GeminiBackend::initial_contents(&request);

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "now");
    }

    #[test]
    fn request_body_includes_tools_only_when_allowed() {
        let backend = GeminiBackend::new("key");
        let contents = vec![serde_json::json!({"role": "user", "parts": [{"text": "hi"}]})];

        let with_tools = backend.request_body(&contents, true);
        assert!(with_tools["tools"][0]["function_declarations"].is_array());

        let without_tools = backend.request_body(&contents, false);
        assert!(without_tools.get("tools").is_none());
    }

    #[test]
    fn endpoint_includes_model() {
        let backend = GeminiBackend::new("key").with_model("gemini-2.0-flash");
        assert!(backend.endpoint().ends_with("models/gemini-2.0-flash:generateContent"));
    }

    #[test]
    fn candidate_parts_rejects_empty_body() {
        let body = serde_json::json!({"candidates": []});
        assert_eq!(
            GeminiBackend::candidate_parts(&body).unwrap_err(),
            LlmError::EmptyResponse
        );
    }

    #[test]
    fn provider_mints_configured_backends() {
        let provider = GeminiProvider::new()
            .with_base_url("http://localhost:8089")
            .with_model("gemini-test");
        // The backend is opaque behind the trait; constructing it must not
        // panic and must be usable as a trait object.
        let _backend: Box<dyn LlmBackend> = provider.backend("key");
    }
}
