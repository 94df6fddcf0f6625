//! Configuration structures for the hand bridge.
//!
//! Two documents feed the bridge: a JSON topology document with a `joints`
//! array (the exact record shape the external config loaders produce), and a
//! TOML runtime document selecting the transport variant and its timing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::HandError;

/// A single joint record from the topology document.
///
/// `slave_index` and `channel_index` are required; every other field falls
/// back to the defaults applied for omitted fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointRecord {
    /// Index into the slave table.
    pub slave_index: usize,
    /// Byte offset within the slave's I/O image.
    pub channel_index: usize,
    /// Display name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Lower calibration bound.
    #[serde(default)]
    pub min_value: i32,
    /// Upper calibration bound.
    #[serde(default = "default_max")]
    pub max_value: i32,
    /// Initial value held before the first write or read.
    #[serde(default)]
    pub default_value: i32,
    /// Display unit label.
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Factor applied to the raw value for display only, never for wire values.
    #[serde(default = "default_conversion")]
    pub conversion_factor: f64,
}

fn default_name() -> String {
    "Joint".into()
}

fn default_max() -> i32 {
    255
}

fn default_unit() -> String {
    "raw".into()
}

fn default_conversion() -> f64 {
    1.0
}

/// Joint topology document: a `joints` array in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandConfig {
    /// Joint records in display/control order.
    #[serde(default)]
    pub joints: Vec<JointRecord>,
}

impl HandConfig {
    /// Load a topology document from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, including a
    /// record missing one of the required index fields.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    /// Parse a topology document from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or a record is missing
    /// `slave_index` or `channel_index`.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(ConfigError::ParseJson)
    }
}

/// Transport selection for the bridge, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// In-memory loopback, no hardware.
    #[default]
    Simulated,
    /// EtherCAT hardware via the SOEM wire port.
    Real,
}

/// Top-level bridge runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Transport variant.
    pub mode: TransportMode,

    /// Adapter to open at startup. None lets the caller pick from
    /// `list_adapters()`.
    pub adapter: Option<String>,

    /// Joint topology document loaded at startup.
    pub joints: Option<PathBuf>,

    /// Bound on the cyclic receive step of the exchange round-trip.
    #[serde(with = "humantime_serde")]
    pub receive_timeout: Duration,

    /// Input polling cadence of the caller loop.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            mode: TransportMode::Simulated,
            adapter: None,
            joints: None,
            receive_timeout: Duration::from_millis(2),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl From<ConfigError> for HandError {
    fn from(e: ConfigError) -> Self {
        HandError::Config(e.to_string())
    }
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_defaults() {
        let config =
            HandConfig::from_json(r#"{"joints": [{"slave_index": 1, "channel_index": 3}]}"#)
                .unwrap();

        assert_eq!(config.joints.len(), 1);
        let record = &config.joints[0];
        assert_eq!(record.slave_index, 1);
        assert_eq!(record.channel_index, 3);
        assert_eq!(record.name, "Joint");
        assert_eq!(record.min_value, 0);
        assert_eq!(record.max_value, 255);
        assert_eq!(record.default_value, 0);
        assert_eq!(record.unit, "raw");
        assert!((record.conversion_factor - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_slave_index_is_config_error() {
        let result = HandConfig::from_json(r#"{"joints": [{"channel_index": 0}]}"#);
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));

        let err: HandError = result.unwrap_err().into();
        assert!(matches!(err, HandError::Config(_)));
    }

    #[test]
    fn test_empty_document_yields_no_joints() {
        let config = HandConfig::from_json("{}").unwrap();
        assert!(config.joints.is_empty());
    }

    #[test]
    fn test_default_bridge_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.mode, TransportMode::Simulated);
        assert_eq!(config.receive_timeout, Duration::from_millis(2));
        assert_eq!(config.poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            mode = "real"
            adapter = "enp3s0"
            receive_timeout = "5ms"
            poll_interval = "50ms"
        "#;

        let config = BridgeConfig::from_toml(toml).unwrap();
        assert_eq!(config.mode, TransportMode::Real);
        assert_eq!(config.adapter.as_deref(), Some("enp3s0"));
        assert_eq!(config.receive_timeout, Duration::from_millis(5));
        assert_eq!(config.poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_roundtrip_toml() {
        let config = BridgeConfig::default();
        let toml = config.to_toml().unwrap();
        let parsed = BridgeConfig::from_toml(&toml).unwrap();
        assert_eq!(config.mode, parsed.mode);
        assert_eq!(config.poll_interval, parsed.poll_interval);
    }
}
