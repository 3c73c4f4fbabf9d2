//! Configuration for the SimvarIO daemon
//!
//! Loads configuration from a TOML file: session tuning, logging, and the
//! list of variables to pre-register at startup. The variables list is
//! consumed once at construction and not re-read thereafter.

use crate::catalog::VariableDescriptor;
use crate::error::Result;
use crate::session::SessionConfig;
use crate::types::WireType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub session: SessionSettings,
    pub logging: LoggingConfig,
    /// Variables to pre-register at startup
    #[serde(default)]
    pub variables: Vec<VariableEntry>,
}

/// Session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionSettings {
    /// Client name presented to the engine during the handshake
    pub client_name: String,
    /// Connect retry interval while disconnected, in milliseconds
    pub retry_interval_ms: u64,
    /// Pump/request interval while connected, in milliseconds
    pub poll_interval_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

/// One pre-registered variable.
///
/// A bare name must resolve through the builtin catalog. A name with an
/// explicit unit becomes a custom Float64 descriptor added to the catalog.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VariableEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Default configuration: short poll while connected, a couple of common
    /// telemetry variables pre-registered.
    pub fn defaults() -> Self {
        Self {
            session: SessionSettings {
                client_name: "SimvarIO".to_string(),
                retry_interval_ms: 2000,
                poll_interval_ms: 250,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            variables: vec![
                VariableEntry { name: "TITLE".to_string(), unit: None },
                VariableEntry { name: "PLANE ALTITUDE".to_string(), unit: None },
                VariableEntry { name: "AIRSPEED INDICATED".to_string(), unit: None },
            ],
        }
    }

    /// Session tuning derived from the `[session]` section
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            client_name: self.session.client_name.clone(),
            retry_interval: Duration::from_millis(self.session.retry_interval_ms),
            poll_interval: Duration::from_millis(self.session.poll_interval_ms),
        }
    }

    /// Custom catalog descriptors from variables carrying an explicit unit
    pub fn custom_descriptors(&self) -> Vec<VariableDescriptor> {
        self.variables
            .iter()
            .filter_map(|entry| {
                entry.unit.as_ref().map(|unit| VariableDescriptor {
                    name: entry.name.clone(),
                    unit: unit.clone(),
                    wire_type: WireType::Float64,
                })
            })
            .collect()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::defaults();
        assert_eq!(config.session.client_name, "SimvarIO");
        assert_eq!(config.session.retry_interval_ms, 2000);
        assert_eq!(config.session.poll_interval_ms, 250);
        assert_eq!(config.variables.len(), 3);
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig::defaults();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[session]"));
        assert!(toml_string.contains("[logging]"));
        assert!(toml_string.contains("[[variables]]"));
        assert!(toml_string.contains("client_name = \"SimvarIO\""));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[session]
client_name = "SimListener"
retry_interval_ms = 500
poll_interval_ms = 100

[logging]
level = "debug"

[[variables]]
name = "PLANE ALTITUDE"

[[variables]]
name = "CABIN PRESSURE"
unit = "psi"
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.session.client_name, "SimListener");
        assert_eq!(config.session.retry_interval_ms, 500);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.variables.len(), 2);
        assert_eq!(config.variables[1].unit.as_deref(), Some("psi"));

        let custom = config.custom_descriptors();
        assert_eq!(custom.len(), 1);
        assert_eq!(custom[0].name, "CABIN PRESSURE");
        assert_eq!(custom[0].wire_type, WireType::Float64);
    }

    #[test]
    fn test_session_config_conversion() {
        let config = AppConfig::defaults();
        let session = config.session_config();
        assert_eq!(session.retry_interval, Duration::from_millis(2000));
        assert_eq!(session.poll_interval, Duration::from_millis(250));
    }
}
