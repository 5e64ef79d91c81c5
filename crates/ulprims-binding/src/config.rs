use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors loading an [`AgentConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for this schema.
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration parsed but is inconsistent.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration shared by the orchestrator and every binding.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Broker settings forwarded to transport setup.
    pub mqtt: MqttConfig,
    /// Backend section, passed through untouched to the backend's `activate`.
    pub iota: serde_json::Value,
    /// Bindings to run, by catalog name. Empty selects every built-in.
    pub bindings: Vec<String>,
}

impl AgentConfig {
    /// Parse a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.password.is_some() && self.mqtt.username.is_none() {
            return Err(ConfigError::Invalid(
                "mqtt.password requires mqtt.username".to_string(),
            ));
        }
        Ok(())
    }
}

/// Broker connection settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keepalive_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            username: None,
            password: None,
            keepalive_secs: 60,
        }
    }
}

impl MqttConfig {
    /// Returns `(username, password)` when credentials are configured.
    pub fn credentials(&self) -> Option<(&str, Option<&str>)> {
        self.username
            .as_deref()
            .map(|user| (user, self.password.as_deref()))
    }
}

impl fmt::Debug for MqttConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("keepalive_secs", &self.keepalive_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AgentConfig::from_json_str("{}").expect("empty config should parse");
        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.mqtt.port, 1883);
        assert!(config.mqtt.credentials().is_none());
        assert!(config.bindings.is_empty());
    }

    #[test]
    fn parses_credentials_and_opaque_iota() {
        let config = AgentConfig::from_json_str(
            r#"{
                "mqtt": { "host": "broker", "username": "agent", "password": "s3cret" },
                "iota": { "service": "howtoService", "timestamp": true },
                "bindings": ["loopback"]
            }"#,
        )
        .expect("config should parse");

        assert_eq!(config.mqtt.credentials(), Some(("agent", Some("s3cret"))));
        assert_eq!(config.iota["service"], "howtoService");
        assert_eq!(config.bindings, vec!["loopback".to_string()]);
    }

    #[test]
    fn password_without_username_is_invalid() {
        let err = AgentConfig::from_json_str(r#"{ "mqtt": { "password": "x" } }"#)
            .expect_err("password alone should fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn iota_of_any_shape_is_passed_through() {
        let config = AgentConfig::from_json_str(r#"{ "iota": [3, "x"] }"#)
            .expect("iota is not interpreted");
        assert_eq!(config.iota, serde_json::json!([3, "x"]));
    }

    #[test]
    fn debug_redacts_password() {
        let config = AgentConfig::from_json_str(
            r#"{ "mqtt": { "username": "agent", "password": "s3cret" } }"#,
        )
        .expect("config should parse");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AgentConfig::from_path("/nonexistent/ulprims.json").expect_err("should fail");
        assert!(err.to_string().contains("/nonexistent/ulprims.json"));
    }
}
