//! Configuration module for kafka-mcp
//!
//! This module is organized into submodules:
//! - `defaults` - Default constants and values
//! - `args` - CLI argument definitions
//! - `file` - TOML configuration file
//! - `merge` - Config file / CLI precedence rules

mod args;
mod defaults;
pub mod file;
mod merge;

pub use args::ServerArgs;
pub use defaults::*;
pub use file::ConfigFile;
pub use merge::merge_config_with_args;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, KafkaMcpError, Result};

/// The cluster this process talks to.
///
/// Built once at startup and shared read-only by every handle derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEndpoint {
    bootstrap_servers: String,
    client_id: String,
    /// Extra client properties applied to every handle
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

impl ClusterEndpoint {
    /// Create an endpoint, rejecting an empty broker list
    pub fn new(bootstrap_servers: impl Into<String>, client_id: impl Into<String>) -> Result<Self> {
        let bootstrap_servers = bootstrap_servers.into();
        let brokers: Vec<&str> = bootstrap_servers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if brokers.is_empty() {
            return Err(ConfigError::missing("KAFKA_BOOTSTRAP_SERVERS").into());
        }
        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(KafkaMcpError::config("client_id", "must not be empty"));
        }

        Ok(Self {
            bootstrap_servers: brokers.join(","),
            client_id,
            properties: BTreeMap::new(),
        })
    }

    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    pub fn bootstrap_servers(&self) -> &str {
        &self.bootstrap_servers
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

/// Transport the MCP server speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Stdio,
    Http,
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdio" => Ok(Transport::Stdio),
            "http" => Ok(Transport::Http),
            other => Err(format!(
                "unknown transport '{}', expected 'stdio' or 'http'",
                other
            )),
        }
    }
}

/// Timeouts and cadence of blocking broker calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Bound on each metadata snapshot fetch
    pub metadata: Duration,
    /// Bound on the producer flush after each publish
    pub flush: Duration,
    /// Per-call consumer poll wait
    pub poll_interval: Duration,
    /// Request/operation timeout for admin requests
    pub operation: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            metadata: Duration::from_secs(DEFAULT_METADATA_TIMEOUT_SECS),
            flush: Duration::from_secs(DEFAULT_FLUSH_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            operation: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
        }
    }
}

/// Complete server configuration for kafka-mcp.
///
/// Assembled from CLI flags, environment variables and an optional TOML
/// file (see [`file`]), then validated before any handle is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub endpoint: ClusterEndpoint,
    pub transport: Transport,
    pub http_addr: SocketAddr,
    pub log_level: String,
    pub timeouts: Timeouts,
}

impl ServerConfig {
    /// Build a configuration from parsed (and already merged) arguments
    pub fn from_args(args: ServerArgs) -> Result<Self> {
        Self::from_args_with_properties(args, BTreeMap::new())
    }

    /// Same as [`ServerConfig::from_args`], also applying the raw client properties
    /// from the config file
    pub fn from_args_with_properties(
        args: ServerArgs,
        properties: BTreeMap<String, String>,
    ) -> Result<Self> {
        let bootstrap = args
            .bootstrap_servers
            .ok_or_else(|| ConfigError::missing("KAFKA_BOOTSTRAP_SERVERS"))?;
        let endpoint = ClusterEndpoint::new(bootstrap, args.client_id)?.with_properties(properties);

        let transport = args
            .transport
            .parse::<Transport>()
            .map_err(|e| KafkaMcpError::config("transport", e))?;

        let http_addr = args
            .http_addr
            .parse::<SocketAddr>()
            .map_err(|e| KafkaMcpError::config("http_addr", e.to_string()))?;

        Ok(Self {
            endpoint,
            transport,
            http_addr,
            log_level: args.log_level,
            timeouts: Timeouts {
                metadata: Duration::from_secs(args.metadata_timeout_secs),
                flush: Duration::from_secs(args.flush_timeout_secs),
                poll_interval: Duration::from_millis(args.poll_interval_ms),
                operation: Duration::from_secs(args.operation_timeout_secs),
            },
        })
    }

    /// Build a configuration for an endpoint with default settings
    pub fn for_endpoint(endpoint: ClusterEndpoint) -> Self {
        Self {
            endpoint,
            transport: Transport::Stdio,
            http_addr: DEFAULT_HTTP_SOCKET_ADDR,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            timeouts: Timeouts::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let t = &self.timeouts;
        if t.metadata.is_zero() {
            return Err(KafkaMcpError::config("metadata_timeout_secs", "must be > 0"));
        }
        if t.flush.is_zero() {
            return Err(KafkaMcpError::config("flush_timeout_secs", "must be > 0"));
        }
        if t.poll_interval.is_zero() {
            return Err(KafkaMcpError::config("poll_interval_ms", "must be > 0"));
        }
        if t.operation.is_zero() {
            return Err(KafkaMcpError::config("operation_timeout_secs", "must be > 0"));
        }
        Ok(())
    }
}
