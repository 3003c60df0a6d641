//! Domain-specific error types for kafka-mcp

use std::fmt;
use thiserror::Error;

/// Structured configuration error domain
#[derive(Debug, Error, Clone)]
pub enum ConfigError {
    #[error("{setting}: {reason}")]
    InvalidSetting { setting: String, reason: String },
    #[error("missing required setting {0}")]
    Missing(String),
    #[error("{0}")]
    Message(String),
}

impl ConfigError {
    pub fn invalid_setting(setting: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            setting: setting.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(setting: impl Into<String>) -> Self {
        Self::Missing(setting.into())
    }
}

/// Structured broker client error domain
#[derive(Debug, Error, Clone)]
pub enum ClientError {
    #[error("{operation}: {detail}")]
    Operation { operation: String, detail: String },
    #[error("{topic}/{partition}: {operation}: {detail}")]
    Partition {
        topic: String,
        partition: i32,
        operation: String,
        detail: String,
    },
}

impl ClientError {
    pub fn operation(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Operation {
            operation: operation.into(),
            detail: detail.into(),
        }
    }

    pub fn partition(
        topic: impl Into<String>,
        partition: i32,
        operation: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Partition {
            topic: topic.into(),
            partition,
            operation: operation.into(),
            detail: detail.into(),
        }
    }
}

/// Phase of the bounded consumption state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumePhase {
    ResolvingPartitions,
    Assigning,
    ResolvingOffsets,
    Seeking,
}

impl fmt::Display for ConsumePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            ConsumePhase::ResolvingPartitions => "resolving partitions",
            ConsumePhase::Assigning => "assigning partitions",
            ConsumePhase::ResolvingOffsets => "resolving offsets",
            ConsumePhase::Seeking => "seeking",
        };
        f.write_str(phase)
    }
}
