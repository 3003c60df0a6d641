//! Boundary to the broker client library
//!
//! Everything kafka-mcp needs from the cluster goes through the traits in this
//! module. [`kafka`] implements them over librdkafka; [`crate::testing`]
//! provides scripted doubles.
//!
//! Admin handles are async because the client library completes admin
//! requests through futures. Consumer and producer handles are blocking and
//! are driven from `spawn_blocking` by the callers.

pub mod kafka;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::admin::resource::ResourceDescriptor;
use crate::consumer::{ConsumedRecord, PartitionTarget};
use crate::error::Result;

pub use kafka::KafkaClientFactory;

// ─── Metadata ───────────────────────────────────────────────────────

/// One metadata snapshot of the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterMetadata {
    pub cluster_id: Option<String>,
    pub controller_id: Option<i32>,
    pub brokers: Vec<BrokerInfo>,
    pub topics: Vec<TopicMetadata>,
}

impl ClusterMetadata {
    pub fn topic(&self, name: &str) -> Option<&TopicMetadata> {
        self.topics.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokerInfo {
    pub id: i32,
    pub host: String,
    pub port: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMetadata {
    pub name: String,
    pub partitions: Vec<PartitionMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionMetadata {
    pub id: i32,
    pub leader: i32,
    pub replicas: Vec<i32>,
    pub isrs: Vec<i32>,
}

// ─── Admin requests ─────────────────────────────────────────────────

/// Input to topic creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    pub name: String,
    pub num_partitions: i32,
    pub replication_factor: i32,
    pub config: BTreeMap<String, String>,
}

/// Grow a topic to `new_total_count` partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionIncrease {
    pub topic: String,
    pub new_total_count: usize,
}

/// A batch of config-set operations against one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigAlteration {
    pub resource: ResourceDescriptor,
    pub entries: BTreeMap<String, String>,
}

/// Per-target completion of a submitted admin request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion<T> {
    pub target: String,
    pub result: std::result::Result<T, String>,
}

impl<T> Completion<T> {
    pub fn ok(target: impl Into<String>, value: T) -> Self {
        Self {
            target: target.into(),
            result: Ok(value),
        }
    }

    pub fn failed(target: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            result: Err(error.into()),
        }
    }
}

/// One configuration entry as reported by the broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntryInfo {
    pub name: String,
    pub value: Option<String>,
    pub source: String,
    pub is_read_only: bool,
    pub is_default: bool,
}

// ─── Consumer groups ────────────────────────────────────────────────

/// A consumer group as reported by its coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub group_id: String,
    pub state: String,
    pub protocol_type: String,
    pub protocol: String,
    pub coordinator: Option<i32>,
    pub members: Vec<GroupMemberInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMemberInfo {
    pub member_id: String,
    pub client_id: String,
    pub host: String,
    /// Raw consumer-protocol assignment bytes
    pub assignment: Option<Bytes>,
}

// ─── Handles ────────────────────────────────────────────────────────

/// Administrative handle bound to the configured endpoint
#[async_trait]
pub trait AdminHandle: Send + Sync {
    /// Fetch one metadata snapshot, optionally narrowed to a single topic
    async fn fetch_metadata(&self, topic: Option<&str>, timeout: Duration)
        -> Result<ClusterMetadata>;

    async fn create_topics(&self, topics: &[TopicSpec]) -> Result<Vec<Completion<()>>>;

    async fn delete_topics(&self, topics: &[String]) -> Result<Vec<Completion<()>>>;

    async fn create_partitions(
        &self,
        increases: &[PartitionIncrease],
    ) -> Result<Vec<Completion<()>>>;

    async fn describe_configs(
        &self,
        resources: &[ResourceDescriptor],
    ) -> Result<Vec<Completion<Vec<ConfigEntryInfo>>>>;

    async fn alter_configs(
        &self,
        alterations: &[ConfigAlteration],
    ) -> Result<Vec<Completion<()>>>;

    /// List consumer groups, or describe a single one when `group` is given
    async fn fetch_groups(&self, group: Option<&str>, timeout: Duration)
        -> Result<Vec<GroupInfo>>;
}

/// Result of one poll call
#[derive(Debug, Clone, PartialEq)]
pub enum PollResult {
    /// Nothing arrived within the wait
    Empty,
    Record(ConsumedRecord),
    /// The broker flagged this message as bad
    Error(String),
}

/// Blocking consumer handle with manual partition assignment
pub trait ConsumerHandle: Send {
    /// Partition ids of `topic`, or `None` if the topic does not exist
    fn topic_partitions(&self, topic: &str, timeout: Duration) -> Result<Option<Vec<i32>>>;

    /// Assign partitions without engaging the group rebalance protocol
    fn assign(&mut self, topic: &str, partitions: &[i32]) -> Result<()>;

    /// Current (low, high) watermarks of a partition
    fn fetch_watermarks(&self, topic: &str, partition: i32, timeout: Duration)
        -> Result<(i64, i64)>;

    /// Position every assigned partition at its resolved starting offset
    fn seek(&mut self, targets: &[PartitionTarget]) -> Result<()>;

    fn poll(&mut self, wait: Duration) -> PollResult;

    /// Release the handle; called exactly once per handle
    fn close(&mut self);
}

/// A record to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingRecord {
    pub topic: String,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
    pub headers: BTreeMap<String, String>,
}

/// Long-lived producer shared by all publish calls
pub trait ProducerHandle: Send + Sync {
    /// Enqueue a record for delivery
    fn send(&self, record: &OutgoingRecord) -> Result<()>;

    /// Block until queued records are delivered or `timeout` elapses
    fn flush(&self, timeout: Duration) -> Result<()>;
}

/// Auto-offset-reset policy for a consumer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetPolicy {
    Earliest,
    Latest,
}

impl ResetPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetPolicy::Earliest => "earliest",
            ResetPolicy::Latest => "latest",
        }
    }
}

/// Produces handles bound to a single cluster endpoint
pub trait ClientFactory: Send + Sync {
    /// A fresh admin handle; cheap, may be called for every operation
    fn admin(&self) -> Result<Box<dyn AdminHandle>>;

    /// A fresh, independent consumer handle with auto-commit disabled
    fn consumer(&self, group_id: &str, reset: ResetPolicy) -> Result<Box<dyn ConsumerHandle>>;

    /// A new producer; callers keep one per process
    fn producer(&self) -> Result<Box<dyn ProducerHandle>>;
}
