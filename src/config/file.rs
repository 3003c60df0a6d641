//! Configuration file support for kafka-mcp
//!
//! This module provides TOML configuration file parsing and merging with CLI arguments.
//!
//! ## Priority Order
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values
//!
//! ## Example Configuration
//!
//! ```toml
//! # kafka-mcp.toml
//!
//! [kafka]
//! bootstrap_servers = "localhost:9092"
//! client_id = "kafka-mcp"
//!
//! [server]
//! transport = "stdio"
//! log_level = "info"
//!
//! [timeouts]
//! metadata_secs = 10
//! poll_interval_ms = 1000
//!
//! [client.properties]
//! "security.protocol" = "SASL_SSL"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::defaults::CONFIG_FILE_NAME;
use crate::error::{ConfigError, Result};

/// Root configuration structure for TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Cluster endpoint
    pub kafka: KafkaSection,

    /// MCP server settings
    pub server: ServerSection,

    /// Timeouts and polling cadence
    pub timeouts: TimeoutSection,

    /// Raw client properties passed to every handle
    pub client: ClientSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaSection {
    pub bootstrap_servers: Option<String>,
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub transport: Option<String>,
    pub http_addr: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSection {
    pub metadata_secs: Option<u64>,
    pub flush_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub operation_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    /// librdkafka properties such as `security.protocol` or `sasl.mechanisms`
    pub properties: BTreeMap<String, String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Message(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&contents).map_err(|e| {
            ConfigError::Message(format!("Failed to parse config file {:?}: {}", path, e)).into()
        })
    }

    /// Try to load configuration from default locations
    ///
    /// Searches in order:
    /// 1. ./kafka-mcp.toml
    /// 2. ~/.config/kafka-mcp/kafka-mcp.toml
    pub fn load_default() -> Option<Self> {
        let default_paths = [
            PathBuf::from(CONFIG_FILE_NAME),
            dirs::config_dir()
                .map(|p| p.join("kafka-mcp").join(CONFIG_FILE_NAME))
                .unwrap_or_default(),
        ];

        for path in default_paths.iter().filter(|p| !p.as_os_str().is_empty()) {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {:?}", path);
                        return Some(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        None
    }

    /// Generate an example configuration file
    pub fn generate_example() -> String {
        r#"# kafka-mcp Configuration File
# Copy to kafka-mcp.toml and customize as needed
#
# Configuration priority (highest to lowest):
# 1. Command-line arguments
# 2. Environment variables
# 3. This configuration file
# 4. Default values

[kafka]
# Comma-separated broker list (required here or via KAFKA_BOOTSTRAP_SERVERS)
bootstrap_servers = "localhost:9092"

# Client identity reported to the brokers
client_id = "kafka-mcp"

[server]
# "stdio" for desktop agents, "http" for the JSON-RPC/SSE endpoint
transport = "stdio"

# Listen address for the http transport
http_addr = "127.0.0.1:8765"

# Log level (trace, debug, info, warn, error)
log_level = "info"

[timeouts]
# Bound on metadata snapshot fetches
metadata_secs = 10

# Bound on the producer flush after each publish
flush_secs = 10

# Per-call consumer poll wait
poll_interval_ms = 1000

# Request/operation timeout for admin requests
operation_secs = 30

[client.properties]
# Extra librdkafka properties applied to every handle
# "security.protocol" = "SASL_SSL"
# "sasl.mechanisms" = "PLAIN"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_empty_config() {
        let config: ConfigFile = toml::from_str("").unwrap();
        assert!(config.kafka.bootstrap_servers.is_none());
        assert!(config.client.properties.is_empty());
    }

    #[test]
    fn test_parse_kafka_section() {
        let toml = r#"
            [kafka]
            bootstrap_servers = "b1:9092,b2:9092"
            client_id = "agent"
        "#;
        let config: ConfigFile = toml::from_str(toml).unwrap();
        assert_eq!(
            config.kafka.bootstrap_servers,
            Some("b1:9092,b2:9092".to_string())
        );
        assert_eq!(config.kafka.client_id, Some("agent".to_string()));
    }

    #[test]
    fn test_parse_client_properties() {
        let toml = r#"
            [client.properties]
            "security.protocol" = "SASL_SSL"
            "sasl.mechanisms" = "PLAIN"
        "#;
        let config: ConfigFile = toml::from_str(toml).unwrap();
        assert_eq!(
            config.client.properties.get("security.protocol"),
            Some(&"SASL_SSL".to_string())
        );
        assert_eq!(config.client.properties.len(), 2);
    }

    #[test]
    fn test_generated_example_parses() {
        let config: ConfigFile = toml::from_str(&ConfigFile::generate_example()).unwrap();
        assert_eq!(config.server.transport, Some("stdio".to_string()));
        assert_eq!(config.timeouts.poll_interval_ms, Some(1000));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[timeouts]\nflush_secs = 3").unwrap();
        let config = ConfigFile::load(file.path()).unwrap();
        assert_eq!(config.timeouts.flush_secs, Some(3));
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[timeouts\nflush_secs = ").unwrap();
        let err = ConfigFile::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
