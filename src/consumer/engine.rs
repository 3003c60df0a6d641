//! Bounded consumption
//!
//! One call walks `INIT -> PARTITIONS_RESOLVED -> ASSIGNED -> OFFSETS_SEEKED
//! -> POLLING -> DONE | TIMED_OUT -> CLOSED`. The consumer handle is held by a
//! [`ConsumerLease`], so CLOSED is reached on every path including faults and
//! unwinding.

use bytes::Bytes;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::lease::ConsumerLease;
use super::offset::{OffsetSpec, StartOffset};
use crate::client::{PollResult, ResetPolicy};
use crate::config::{DEFAULT_CONSUME_LIMIT, DEFAULT_CONSUME_TIMEOUT_SECS, INSPECTOR_GROUP_PREFIX};
use crate::context::KafkaContext;
use crate::error::{ConsumePhase, KafkaMcpError, Result};

// ─── Records ────────────────────────────────────────────────────────

/// A partition with its resolved starting offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTarget {
    pub topic: String,
    pub partition: i32,
    pub offset: StartOffset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordHeader {
    pub key: String,
    #[serde(serialize_with = "as_text")]
    pub value: Option<Bytes>,
}

/// One record read by the engine.
///
/// Keys, values and header values serialize as UTF-8 text, with invalid
/// sequences replaced, so undecodable payloads still come back as text. An
/// absent value (a tombstone) serializes as `null` like an absent key, not as
/// a placeholder string such as `"None"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumedRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    #[serde(serialize_with = "as_text")]
    pub key: Option<Bytes>,
    #[serde(serialize_with = "as_text")]
    pub value: Option<Bytes>,
    /// Broker timestamp in milliseconds since the epoch
    pub timestamp: Option<i64>,
    pub headers: Vec<RecordHeader>,
}

impl ConsumedRecord {
    pub fn value_text(&self) -> Option<String> {
        self.value
            .as_ref()
            .map(|v| String::from_utf8_lossy(v).into_owned())
    }

    pub fn key_text(&self) -> Option<String> {
        self.key
            .as_ref()
            .map(|k| String::from_utf8_lossy(k).into_owned())
    }
}

fn as_text<S: Serializer>(bytes: &Option<Bytes>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match bytes {
        Some(bytes) => serializer.serialize_some(&String::from_utf8_lossy(bytes)),
        None => serializer.serialize_none(),
    }
}

// ─── Requests ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ConsumeRequest {
    pub topic: String,
    /// Read a single partition instead of every partition of the topic
    pub partition: Option<i32>,
    pub offset_spec: OffsetSpec,
    /// Maximum number of records returned
    pub limit: usize,
    /// Wall-clock bound on the poll loop
    pub timeout: Duration,
}

impl ConsumeRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            partition: None,
            offset_spec: OffsetSpec::default(),
            limit: DEFAULT_CONSUME_LIMIT,
            timeout: Duration::from_secs_f64(DEFAULT_CONSUME_TIMEOUT_SECS),
        }
    }

    pub fn partition(mut self, partition: i32) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn offset_spec(mut self, spec: &str) -> Self {
        self.offset_spec = OffsetSpec::parse(spec);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Convert a caller-supplied timeout in seconds
pub fn timeout_from_secs(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        KafkaMcpError::validation(format!(
            "timeout must be a finite, non-negative number of seconds, got {}",
            secs
        ))
    })
}

/// Records read, or a marker for a topic that does not exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConsumeOutcome {
    Records(Vec<ConsumedRecord>),
    TopicNotFound { error: String },
}

impl ConsumeOutcome {
    pub fn records(&self) -> &[ConsumedRecord] {
        match self {
            ConsumeOutcome::Records(records) => records,
            ConsumeOutcome::TopicNotFound { .. } => &[],
        }
    }
}

// ─── Clock ──────────────────────────────────────────────────────────

/// Time source for the poll-loop deadline
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// ─── Engine ─────────────────────────────────────────────────────────

/// Drives one consumer handle through a bounded read
pub struct ConsumeEngine {
    poll_interval: Duration,
    metadata_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl ConsumeEngine {
    pub fn new(poll_interval: Duration, metadata_timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            poll_interval,
            metadata_timeout,
            clock,
        }
    }

    /// Run one bounded read and close the handle.
    ///
    /// Faults while resolving partitions, assigning, fetching watermarks or
    /// seeking are returned tagged with their phase. Records the broker flags
    /// as bad are skipped.
    pub fn run(&self, mut lease: ConsumerLease, request: &ConsumeRequest) -> Result<ConsumeOutcome> {
        let topic = request.topic.as_str();

        let partitions = match request.partition {
            Some(partition) => vec![partition],
            None => match lease
                .topic_partitions(topic, self.metadata_timeout)
                .map_err(|e| KafkaMcpError::consume(ConsumePhase::ResolvingPartitions, e))?
            {
                Some(partitions) => partitions,
                None => {
                    debug!(topic, "Topic not found, nothing to consume");
                    lease.release();
                    return Ok(ConsumeOutcome::TopicNotFound {
                        error: format!("Topic '{}' not found", topic),
                    });
                }
            },
        };

        lease
            .assign(topic, &partitions)
            .map_err(|e| KafkaMcpError::consume(ConsumePhase::Assigning, e))?;

        let mut targets = Vec::with_capacity(partitions.len());
        for &partition in &partitions {
            let watermarks = if request.offset_spec.needs_watermarks() {
                Some(
                    lease
                        .fetch_watermarks(topic, partition, self.metadata_timeout)
                        .map_err(|e| KafkaMcpError::consume(ConsumePhase::ResolvingOffsets, e))?,
                )
            } else {
                None
            };
            targets.push(PartitionTarget {
                topic: topic.to_string(),
                partition,
                offset: request.offset_spec.resolve(watermarks, request.limit),
            });
        }
        debug!(topic, ?targets, "Resolved starting offsets");

        lease
            .seek(&targets)
            .map_err(|e| KafkaMcpError::consume(ConsumePhase::Seeking, e))?;

        let started = self.clock.now();
        // A timeout too large to represent as an instant never expires
        let deadline = started.checked_add(request.timeout);
        let mut records = Vec::with_capacity(request.limit.min(1024));
        let mut skipped = 0usize;

        while records.len() < request.limit {
            let now = self.clock.now();
            let wait = match deadline {
                Some(deadline) if now >= deadline => break,
                Some(deadline) => self.poll_interval.min(deadline - now),
                None => self.poll_interval,
            };
            match lease.poll(wait) {
                PollResult::Empty => {}
                PollResult::Record(record) => records.push(record),
                PollResult::Error(error) => {
                    skipped += 1;
                    debug!(topic, %error, "Skipping record flagged by the broker");
                }
            }
        }

        lease.release();
        info!(
            topic,
            offset_spec = %request.offset_spec,
            records = records.len(),
            skipped,
            elapsed_ms = self.clock.now().saturating_duration_since(started).as_millis() as u64,
            "Consumed records"
        );
        Ok(ConsumeOutcome::Records(records))
    }
}

/// A group id no other call will reuse
pub fn inspector_group_id() -> String {
    format!("{}-{}", INSPECTOR_GROUP_PREFIX, uuid::Uuid::new_v4())
}

/// Read a bounded window of records from `request.topic`.
///
/// Each call uses its own consumer handle under a fresh group id with
/// auto-commit disabled, so reads leave no state on the cluster.
pub async fn consume_messages(ctx: &KafkaContext, request: ConsumeRequest) -> Result<ConsumeOutcome> {
    let group_id = inspector_group_id();
    let handle = ctx.consumer(&group_id, ResetPolicy::Latest)?;
    let lease = ConsumerLease::new(handle);
    let engine = ConsumeEngine::new(
        ctx.timeouts().poll_interval,
        ctx.timeouts().metadata,
        ctx.clock(),
    );

    debug!(
        topic = %request.topic,
        partition = ?request.partition,
        group_id = %group_id,
        limit = request.limit,
        "Starting bounded consume"
    );
    tokio::task::spawn_blocking(move || engine.run(lease, &request)).await?
}
