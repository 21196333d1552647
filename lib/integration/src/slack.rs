//! Slack Web API integration.

use crate::credential::SlackCredentials;
use crate::error::SendError;
use serde_json::Value as JsonValue;

const DEFAULT_BASE_URL: &str = "https://slack.com/api";

/// Posts messages through the Slack Web API.
#[derive(Debug, Clone)]
pub struct SlackSender {
    client: reqwest::Client,
    base_url: String,
}

impl Default for SlackSender {
    fn default() -> Self {
        Self::new()
    }
}

impl SlackSender {
    /// Creates a sender against the public Web API.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Overrides the API base URL (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builds the `chat.postMessage` request body.
    #[must_use]
    pub fn message_payload(channel: &str, text: &str) -> JsonValue {
        serde_json::json!({
            "channel": channel,
            "text": text,
        })
    }

    /// Posts one message to a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the response is not JSON, or
    /// the API reports `ok: false`.
    pub async fn post_message(
        &self,
        credentials: &SlackCredentials,
        channel: &str,
        text: &str,
    ) -> Result<(), SendError> {
        let url = format!("{}/chat.postMessage", self.base_url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&credentials.bot_token)
            .json(&Self::message_payload(channel, text))
            .send()
            .await
            .map_err(|e| SendError::Http {
                message: e.to_string(),
            })?;

        let body: JsonValue = response.json().await.map_err(|e| SendError::InvalidResponse {
            message: e.to_string(),
        })?;

        if !body["ok"].as_bool().unwrap_or(false) {
            let reason = body["error"]
                .as_str()
                .map_or_else(|| body.to_string(), str::to_string);
            return Err(SendError::Api { message: reason });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_channel_and_text() {
        let payload = SlackSender::message_payload("#alerts", "deploy done");
        assert_eq!(payload["channel"], "#alerts");
        assert_eq!(payload["text"], "deploy done");
    }
}
