//! Resource descriptors for config reads and writes
//!
//! The resource kind arrives as a free-form string from the tool caller and is
//! parsed into a closed enumeration here, before any admin handle exists.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{KafkaMcpError, Result};

/// Configurable entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Topic,
    Broker,
    Group,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Topic, ResourceKind::Broker, ResourceKind::Group];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Topic => "topic",
            ResourceKind::Broker => "broker",
            ResourceKind::Group => "group",
        }
    }

    /// Case-insensitive parse of a caller-supplied kind name
    pub fn resolve(kind: &str) -> Result<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "topic" => Ok(ResourceKind::Topic),
            "broker" => Ok(ResourceKind::Broker),
            "group" => Ok(ResourceKind::Group),
            _ => Err(KafkaMcpError::validation(
                "Invalid resource type. Must be one of [topic, broker, group]",
            )),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = KafkaMcpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::resolve(s)
    }
}

/// A configurable entity: kind plus name
///
/// Broker descriptors always carry a name that parses as a broker id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceDescriptor {
    kind: ResourceKind,
    name: String,
    broker_id: Option<i32>,
}

impl ResourceDescriptor {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(KafkaMcpError::validation(format!(
                "{} resource name must not be empty",
                kind
            )));
        }

        let broker_id = match kind {
            ResourceKind::Broker => Some(name.trim().parse::<i32>().map_err(|_| {
                KafkaMcpError::validation(format!(
                    "Broker resource name must be a numeric broker id, got '{}'",
                    name
                ))
            })?),
            _ => None,
        };

        Ok(Self {
            kind,
            name,
            broker_id,
        })
    }

    /// Resolve a kind string and name in one step
    pub fn parse(kind: &str, name: impl Into<String>) -> Result<Self> {
        Self::new(ResourceKind::resolve(kind)?, name)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn broker_id(&self) -> Option<i32> {
        self.broker_id
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}
