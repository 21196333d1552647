//! Telegram Bot API integration.

use crate::credential::TelegramCredentials;
use crate::error::SendError;
use serde_json::Value as JsonValue;

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

/// Sends chat messages through the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct TelegramSender {
    client: reqwest::Client,
    base_url: String,
}

impl Default for TelegramSender {
    fn default() -> Self {
        Self::new()
    }
}

impl TelegramSender {
    /// Creates a sender against the public Bot API.
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

    /// Builds the `sendMessage` request body.
    #[must_use]
    pub fn message_payload(credentials: &TelegramCredentials, text: &str) -> JsonValue {
        serde_json::json!({
            "chat_id": credentials.chat_id,
            "text": text,
        })
    }

    /// Sends one chat message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the response is not JSON, or
    /// the API reports `ok: false`.
    pub async fn send_message(
        &self,
        credentials: &TelegramCredentials,
        text: &str,
    ) -> Result<(), SendError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, credentials.bot_token);
        let response = self
            .client
            .post(url)
            .json(&Self::message_payload(credentials, text))
            .send()
            .await
            .map_err(|e| SendError::Http {
                message: e.to_string(),
            })?;

        tracing::debug!(status = %response.status(), "telegram sendMessage response");

        let body: JsonValue = response.json().await.map_err(|e| SendError::InvalidResponse {
            message: e.to_string(),
        })?;

        if !body["ok"].as_bool().unwrap_or(false) {
            let description = body["description"]
                .as_str()
                .map_or_else(|| body.to_string(), str::to_string);
            return Err(SendError::Api {
                message: description,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> TelegramCredentials {
        TelegramCredentials {
            bot_token: "123:abc".to_string(),
            chat_id: "42".to_string(),
        }
    }

    #[test]
    fn payload_carries_chat_id_and_text() {
        let payload = TelegramSender::message_payload(&credentials(), "hello");
        assert_eq!(payload["chat_id"], "42");
        assert_eq!(payload["text"], "hello");
    }

    #[test]
    fn base_url_override() {
        let sender = TelegramSender::new().with_base_url("http://localhost:9999");
        assert_eq!(sender.base_url, "http://localhost:9999");
    }
}
