//! Default constants for kafka-mcp configuration
//!
//! These constants define the default values used throughout the configuration
//! system when no explicit value is provided.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Default client identity reported to the brokers
pub const DEFAULT_CLIENT_ID: &str = "kafka-mcp";

/// Default transport for the MCP server
pub const DEFAULT_TRANSPORT: &str = "stdio";

/// Default listen address for the HTTP transport
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8765";

/// Default HTTP socket address (const, no parsing needed)
pub(crate) const DEFAULT_HTTP_SOCKET_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8765);

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Bound on every metadata snapshot fetch, in seconds
pub const DEFAULT_METADATA_TIMEOUT_SECS: u64 = 10;

/// Bound on the producer flush after each publish, in seconds
pub const DEFAULT_FLUSH_TIMEOUT_SECS: u64 = 10;

/// Per-call consumer poll wait in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Request/operation timeout handed to admin requests, in seconds
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;

/// Default record limit for `consume_messages`
pub const DEFAULT_CONSUME_LIMIT: usize = 10;

/// Default wall-clock bound for `consume_messages`, in seconds
pub const DEFAULT_CONSUME_TIMEOUT_SECS: f64 = 10.0;

/// Default offset specification for `consume_messages`
pub const DEFAULT_OFFSET_SPEC: &str = "latest";

/// Prefix of the throwaway group id synthesized for each consumption call
pub const INSPECTOR_GROUP_PREFIX: &str = "kafka-mcp-inspector";

/// Config file name searched in the default locations
pub const CONFIG_FILE_NAME: &str = "kafka-mcp.toml";
