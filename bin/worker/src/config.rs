//! Worker configuration.
//!
//! Loaded from environment variables via the `config` crate, using `__` as
//! the nesting separator (e.g. `NATS__URL`).

use serde::Deserialize;

/// Top-level worker configuration.
#[derive(Debug, Deserialize)]
pub struct WorkerConfig {
    /// PostgreSQL connection URL for the record store.
    pub database_url: String,

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

impl WorkerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nats_settings_default_to_localhost() {
        let settings = NatsSettings::default();
        assert_eq!(settings.url, "nats://localhost:4222");
    }
}
