//! Command-line arguments for the kafka-mcp server
//!
//! This module defines the CLI arguments structure using clap. Every flag can
//! also be supplied through the environment.

use clap::Parser;
use std::path::PathBuf;

use super::defaults::*;

/// Command-line arguments for the kafka-mcp server
#[derive(Parser, Debug, Clone)]
#[command(name = "kafka-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP tool server for inspecting and operating Kafka clusters")]
pub struct ServerArgs {
    /// Path to configuration file (TOML format)
    /// If not specified, looks for kafka-mcp.toml in the current directory
    /// and in ~/.config/kafka-mcp/
    #[arg(short, long, env = "KAFKA_MCP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Generate example configuration file and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Comma-separated list of broker addresses (host:port)
    #[arg(long, env = "KAFKA_BOOTSTRAP_SERVERS")]
    pub bootstrap_servers: Option<String>,

    /// Client identity reported to the brokers
    #[arg(long, env = "KAFKA_CLIENT_ID", default_value = DEFAULT_CLIENT_ID)]
    pub client_id: String,

    /// MCP transport: "stdio" or "http"
    #[arg(long, env = "KAFKA_MCP_TRANSPORT", default_value = DEFAULT_TRANSPORT)]
    pub transport: String,

    /// Address to listen on when the HTTP transport is selected
    #[arg(long, env = "KAFKA_MCP_HTTP_ADDR", default_value = DEFAULT_HTTP_ADDR)]
    pub http_addr: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "KAFKA_MCP_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Bound on metadata snapshot fetches, in seconds
    #[arg(long, env = "KAFKA_MCP_METADATA_TIMEOUT_SECS", default_value_t = DEFAULT_METADATA_TIMEOUT_SECS)]
    pub metadata_timeout_secs: u64,

    /// Bound on the producer flush after each publish, in seconds
    #[arg(long, env = "KAFKA_MCP_FLUSH_TIMEOUT_SECS", default_value_t = DEFAULT_FLUSH_TIMEOUT_SECS)]
    pub flush_timeout_secs: u64,

    /// Per-call consumer poll wait, in milliseconds
    #[arg(long, env = "KAFKA_MCP_POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    /// Request/operation timeout for admin requests, in seconds
    #[arg(long, env = "KAFKA_MCP_OPERATION_TIMEOUT_SECS", default_value_t = DEFAULT_OPERATION_TIMEOUT_SECS)]
    pub operation_timeout_secs: u64,
}
