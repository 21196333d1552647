//! Typed views over stored credential data.
//!
//! Credential records reach the engine as opaque JSON; each platform
//! defines the keys it requires and parses them here. Parsing happens at
//! the executor boundary, never earlier, so a workflow referencing a
//! half-configured credential only fails when the node actually runs.

use crate::error::CredentialError;
use serde_json::Value as JsonValue;

fn required_str(
    data: &JsonValue,
    key: &str,
    platform: &'static str,
) -> Result<String, CredentialError> {
    data.get(key)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(CredentialError::Invalid { platform })
}

fn optional_str(data: &JsonValue, key: &str) -> Option<String> {
    data.get(key)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Telegram Bot API credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramCredentials {
    /// Parses stored credential data.
    ///
    /// # Errors
    ///
    /// Returns an error if `botToken` or `chatId` is missing or empty.
    pub fn parse(data: &JsonValue) -> Result<Self, CredentialError> {
        Ok(Self {
            bot_token: required_str(data, "botToken", "Telegram")?,
            chat_id: required_str(data, "chatId", "Telegram")?,
        })
    }
}

/// Slack bot credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackCredentials {
    pub bot_token: String,
}

impl SlackCredentials {
    /// Parses stored credential data.
    ///
    /// # Errors
    ///
    /// Returns an error if `botToken` is missing or empty.
    pub fn parse(data: &JsonValue) -> Result<Self, CredentialError> {
        Ok(Self {
            bot_token: required_str(data, "botToken", "Slack")?,
        })
    }
}

/// Resend email credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendCredentials {
    pub api_key: String,
    /// Verified sender address, when the account has its own domain.
    pub from_address: Option<String>,
}

impl ResendCredentials {
    /// Parses stored credential data.
    ///
    /// # Errors
    ///
    /// Returns an error if `apiKey` is missing or empty.
    pub fn parse(data: &JsonValue) -> Result<Self, CredentialError> {
        Ok(Self {
            api_key: required_str(data, "apiKey", "Email")?,
            from_address: optional_str(data, "resendDomainMail"),
        })
    }
}

/// Gemini API credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiCredentials {
    pub api_key: String,
}

impl GeminiCredentials {
    /// Parses stored credential data.
    ///
    /// # Errors
    ///
    /// Returns an error if `geminiApiKey` is missing or empty.
    pub fn parse(data: &JsonValue) -> Result<Self, CredentialError> {
        Ok(Self {
            api_key: required_str(data, "geminiApiKey", "Gemini")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telegram_parses_required_keys() {
        let data = serde_json::json!({"botToken": "123:abc", "chatId": "42"});
        let creds = TelegramCredentials::parse(&data).unwrap();
        assert_eq!(creds.bot_token, "123:abc");
        assert_eq!(creds.chat_id, "42");
    }

    #[test]
    fn telegram_rejects_missing_chat_id() {
        let data = serde_json::json!({"botToken": "123:abc"});
        assert_eq!(
            TelegramCredentials::parse(&data),
            Err(CredentialError::Invalid {
                platform: "Telegram"
            })
        );
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let data = serde_json::json!({"botToken": "", "chatId": "42"});
        assert!(TelegramCredentials::parse(&data).is_err());
    }

    #[test]
    fn resend_from_address_is_optional() {
        let bare = serde_json::json!({"apiKey": "re_123"});
        let creds = ResendCredentials::parse(&bare).unwrap();
        assert_eq!(creds.from_address, None);

        let with_domain =
            serde_json::json!({"apiKey": "re_123", "resendDomainMail": "ops@example.com"});
        let creds = ResendCredentials::parse(&with_domain).unwrap();
        assert_eq!(creds.from_address.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn gemini_requires_api_key() {
        assert!(GeminiCredentials::parse(&serde_json::json!({})).is_err());
        let creds =
            GeminiCredentials::parse(&serde_json::json!({"geminiApiKey": "AIza"})).unwrap();
        assert_eq!(creds.api_key, "AIza");
    }

    #[test]
    fn slack_requires_bot_token() {
        assert_eq!(
            SlackCredentials::parse(&serde_json::json!({"botToken": 7})),
            Err(CredentialError::Invalid { platform: "Slack" })
        );
    }
}
