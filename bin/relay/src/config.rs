//! Relay configuration.
//!
//! Loaded from environment variables via the `config` crate, using `__` as
//! the nesting separator (e.g. `NATS__URL`).

use serde::Deserialize;

/// Top-level relay configuration.
#[derive(Debug, Deserialize)]
pub struct RelayConfig {
    /// Address the WebSocket server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// NATS connection settings.
    #[serde(default)]
    pub nats: NatsSettings,
}

/// NATS connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NatsSettings {
    /// NATS server URL.
    #[serde(default = "default_nats_url")]
    pub url: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8082".to_string()
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

impl Default for NatsSettings {
    fn default() -> Self {
        Self {
            url: default_nats_url(),
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
