//! Configuration types.
//!
//! Loaded once at startup from a JSON file and immutable afterwards —
//! nothing here is a process-wide mutable singleton. Transport
//! credentials can be overridden from the environment so they stay out
//! of the config file.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::resolve::ForwardMapping;

/// Relay configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RelayConfig {
    /// Storage location (bucket equivalent) where the intake service
    /// parks raw messages.
    pub storage_location: String,
    /// Key prefix under which messages are stored. Include any trailing
    /// separator; the message id is appended verbatim.
    #[serde(default)]
    pub storage_key_prefix: String,
    /// Original recipient → forwarding destinations table.
    pub forward_mapping: ForwardMapping,
    /// Outbound SMTP settings.
    #[serde(default)]
    pub transport: TransportConfig,
}

impl RelayConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&text)?;
        if config.forward_mapping.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "forwardMapping".to_string(),
                message: "mapping table is empty, nothing would ever be forwarded".to_string(),
            });
        }
        config.transport.apply_env_overrides();
        Ok(config)
    }
}

/// Outbound SMTP relay settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransportConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl TransportConfig {
    /// Apply `RELAY_SMTP_*` environment overrides on top of the file
    /// values. Unset variables leave the file values alone.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("RELAY_SMTP_HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("RELAY_SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.port = port;
        }
        if let Ok(username) = std::env::var("RELAY_SMTP_USERNAME") {
            self.username = Some(username);
        }
        if let Ok(password) = std::env::var("RELAY_SMTP_PASSWORD") {
            self.password = Some(password);
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    465
}
