//! Error types for kafka-mcp
//!
//! Validation failures and not-found conditions are normally reported as data
//! by the tool façade. The variants here cover what is left: bad startup
//! configuration, broker client faults and protocol errors at the JSON-RPC
//! boundary.

use thiserror::Error;

mod domain;

pub use domain::{ClientError, ConfigError, ConsumePhase};

/// Result type alias for kafka-mcp operations
pub type Result<T> = std::result::Result<T, KafkaMcpError>;

/// Main error type for kafka-mcp
#[derive(Error, Debug)]
pub enum KafkaMcpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Kafka client error: {0}")]
    Client(#[from] ClientError),

    #[error("Consume failed while {phase}: {detail}")]
    Consume { phase: ConsumePhase, detail: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl KafkaMcpError {
    /// Create a configuration error for a specific setting
    pub fn config(setting: &str, reason: impl Into<String>) -> Self {
        KafkaMcpError::Config(ConfigError::invalid_setting(setting, reason))
    }

    /// Create a validation error
    pub fn validation(detail: impl Into<String>) -> Self {
        KafkaMcpError::Validation(detail.into())
    }

    /// Create a client error with operation context
    ///
    /// # Example
    /// ```ignore
    /// KafkaMcpError::client("fetch metadata", "Local: Broker transport failure")
    /// // produces: "Kafka client error: fetch metadata: Local: Broker transport failure"
    /// ```
    pub fn client(operation: &str, detail: impl Into<String>) -> Self {
        KafkaMcpError::Client(ClientError::operation(operation, detail))
    }

    /// Create a client error for a specific topic/partition
    pub fn client_partition(
        topic: &str,
        partition: i32,
        operation: &str,
        detail: impl Into<String>,
    ) -> Self {
        KafkaMcpError::Client(ClientError::partition(topic, partition, operation, detail))
    }

    /// Tag an error escaping the consumption engine with the phase it came from
    pub fn consume(phase: ConsumePhase, source: impl std::fmt::Display) -> Self {
        KafkaMcpError::Consume {
            phase,
            detail: source.to_string(),
        }
    }

    /// JSON-RPC 2.0 error code for this error
    pub fn jsonrpc_code(&self) -> i32 {
        match self {
            KafkaMcpError::Validation(_) => -32602,
            KafkaMcpError::UnknownTool(_) => -32601,
            KafkaMcpError::Protocol(_) => -32600,
            _ => -32603,
        }
    }

    /// Whether the error means the cluster could not be reached or a handle is unusable
    pub fn is_connectivity(&self) -> bool {
        matches!(self, KafkaMcpError::Client(_) | KafkaMcpError::Consume { .. })
    }
}

impl From<tokio::task::JoinError> for KafkaMcpError {
    fn from(err: tokio::task::JoinError) -> Self {
        KafkaMcpError::Internal(format!("blocking task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_context() {
        let err = KafkaMcpError::client("fetch metadata", "broker down");
        assert_eq!(
            err.to_string(),
            "Kafka client error: fetch metadata: broker down"
        );
        assert!(err.is_connectivity());
    }

    #[test]
    fn test_partition_error_context() {
        let err = KafkaMcpError::client_partition("orders", 3, "fetch watermarks", "timed out");
        assert_eq!(
            err.to_string(),
            "Kafka client error: orders/3: fetch watermarks: timed out"
        );
    }

    #[test]
    fn test_consume_error_carries_phase() {
        let err = KafkaMcpError::consume(ConsumePhase::Assigning, "Local: Erroneous state");
        assert_eq!(
            err.to_string(),
            "Consume failed while assigning partitions: Local: Erroneous state"
        );
    }

    #[test]
    fn test_jsonrpc_codes() {
        assert_eq!(KafkaMcpError::validation("bad").jsonrpc_code(), -32602);
        assert_eq!(
            KafkaMcpError::UnknownTool("nope".into()).jsonrpc_code(),
            -32601
        );
        assert_eq!(
            KafkaMcpError::Internal("boom".into()).jsonrpc_code(),
            -32603
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = KafkaMcpError::config("bootstrap_servers", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Configuration error: bootstrap_servers: must not be empty"
        );
        assert!(!err.is_connectivity());
    }
}
