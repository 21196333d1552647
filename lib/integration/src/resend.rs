//! Resend email integration.

use crate::credential::ResendCredentials;
use crate::error::SendError;
use serde_json::Value as JsonValue;

const DEFAULT_BASE_URL: &str = "https://api.resend.com";

/// Sender used for accounts without a verified domain.
const ONBOARDING_FROM: &str = "onboarding@resend.dev";

/// Sends email through the Resend API.
#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    base_url: String,
}

impl Default for ResendMailer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResendMailer {
    /// Creates a mailer against the public API.
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

    /// Builds the `/emails` request body. Falls back to the onboarding
    /// sender when the account has no verified domain address.
    #[must_use]
    pub fn email_payload(
        credentials: &ResendCredentials,
        to: &str,
        subject: &str,
        body: &str,
    ) -> JsonValue {
        let from = credentials
            .from_address
            .as_deref()
            .unwrap_or(ONBOARDING_FROM);
        serde_json::json!({
            "from": from,
            "to": to,
            "subject": subject,
            "html": body,
        })
    }

    /// Sends one email.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API answers with a
    /// non-success status.
    pub async fn send_email(
        &self,
        credentials: &ResendCredentials,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), SendError> {
        let url = format!("{}/emails", self.base_url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&credentials.api_key)
            .json(&Self::email_payload(credentials, to, subject, body))
            .send()
            .await
            .map_err(|e| SendError::Http {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(SendError::Api {
                message: format!("{status}: {detail}"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_onboarding_sender_by_default() {
        let credentials = ResendCredentials {
            api_key: "re_123".to_string(),
            from_address: None,
        };
        let payload = ResendMailer::email_payload(&credentials, "a@b.c", "Hi", "<p>hi</p>");
        assert_eq!(payload["from"], ONBOARDING_FROM);
        assert_eq!(payload["to"], "a@b.c");
        assert_eq!(payload["subject"], "Hi");
        assert_eq!(payload["html"], "<p>hi</p>");
    }

    #[test]
    fn payload_prefers_verified_domain_sender() {
        let credentials = ResendCredentials {
            api_key: "re_123".to_string(),
            from_address: Some("ops@example.com".to_string()),
        };
        let payload = ResendMailer::email_payload(&credentials, "a@b.c", "Hi", "body");
        assert_eq!(payload["from"], "ops@example.com");
    }
}
