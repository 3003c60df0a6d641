//! Test doubles for the broker client boundary
//!
//! These let the tool surface and the consumption engine run in-process
//! without a cluster.
//!
//! - **MockClientFactory**: hands out the doubles below and counts creations
//! - **MockCluster**: in-memory admin state shared by every `MockAdmin`
//! - **MockConsumer**: scripted consumer with a [`ConsumerTracker`] for assertions
//! - **MockProducer**: records what was sent and flushed
//! - **ManualClock**: a clock that only moves when told to
//!
//! # Example
//!
//! ```rust,ignore
//! use kafka_mcp::testing::{MockClientFactory, MockConsumer};
//!
//! let factory = Arc::new(MockClientFactory::new());
//! factory.cluster().add_topic("orders", 3);
//! let consumer = MockConsumer::new().with_topic(&[0, 1, 2]);
//! let tracker = consumer.tracker();
//! factory.push_consumer(consumer);
//! // ... run consume_messages, then:
//! assert_eq!(tracker.close_calls(), 1);
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::admin::resource::{ResourceDescriptor, ResourceKind};
use crate::client::{
    AdminHandle, BrokerInfo, ClientFactory, ClusterMetadata, Completion, ConfigAlteration,
    ConfigEntryInfo, ConsumerHandle, GroupInfo, OutgoingRecord, PartitionIncrease,
    PartitionMetadata, PollResult, ProducerHandle, ResetPolicy, TopicMetadata, TopicSpec,
};
use crate::consumer::{Clock, ConsumedRecord, PartitionTarget};
use crate::error::{KafkaMcpError, Result};

// ============================================================================
// Clock
// ============================================================================

/// Deterministic clock for deadline tests
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.elapsed.lock()
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Client factory handing out test doubles
pub struct MockClientFactory {
    cluster: Arc<MockCluster>,
    consumers: Mutex<VecDeque<MockConsumer>>,
    producer: MockProducer,
    admin_failure: Mutex<Option<String>>,
    producer_failure: Mutex<Option<String>>,
    group_ids: Mutex<Vec<String>>,
    admins_created: AtomicUsize,
    consumers_created: AtomicUsize,
    producers_created: AtomicUsize,
}

impl MockClientFactory {
    pub fn new() -> Self {
        Self {
            cluster: Arc::new(MockCluster::new()),
            consumers: Mutex::new(VecDeque::new()),
            producer: MockProducer::new(),
            admin_failure: Mutex::new(None),
            producer_failure: Mutex::new(None),
            group_ids: Mutex::new(Vec::new()),
            admins_created: AtomicUsize::new(0),
            consumers_created: AtomicUsize::new(0),
            producers_created: AtomicUsize::new(0),
        }
    }

    pub fn cluster(&self) -> Arc<MockCluster> {
        Arc::clone(&self.cluster)
    }

    /// Queue the consumer returned by the next `consumer()` call
    pub fn push_consumer(&self, consumer: MockConsumer) {
        self.consumers.lock().push_back(consumer);
    }

    /// Shared view of the producer handed out by this factory
    pub fn shared_producer(&self) -> MockProducer {
        self.producer.clone()
    }

    pub fn fail_admin_creation(&self, detail: impl Into<String>) {
        *self.admin_failure.lock() = Some(detail.into());
    }

    pub fn fail_producer_creation(&self, detail: impl Into<String>) {
        *self.producer_failure.lock() = Some(detail.into());
    }

    pub fn admins_created(&self) -> usize {
        self.admins_created.load(Ordering::SeqCst)
    }

    pub fn consumers_created(&self) -> usize {
        self.consumers_created.load(Ordering::SeqCst)
    }

    pub fn producers_created(&self) -> usize {
        self.producers_created.load(Ordering::SeqCst)
    }

    /// Group ids requested for consumer handles, in order
    pub fn consumer_group_ids(&self) -> Vec<String> {
        self.group_ids.lock().clone()
    }
}

impl Default for MockClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientFactory for MockClientFactory {
    fn admin(&self) -> Result<Box<dyn AdminHandle>> {
        if let Some(detail) = self.admin_failure.lock().clone() {
            return Err(KafkaMcpError::client("create admin client", detail));
        }
        self.admins_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockAdmin {
            cluster: Arc::clone(&self.cluster),
        }))
    }

    fn consumer(&self, group_id: &str, _reset: ResetPolicy) -> Result<Box<dyn ConsumerHandle>> {
        self.consumers_created.fetch_add(1, Ordering::SeqCst);
        self.group_ids.lock().push(group_id.to_string());
        let consumer = self.consumers.lock().pop_front().unwrap_or_default();
        Ok(Box::new(consumer))
    }

    fn producer(&self) -> Result<Box<dyn ProducerHandle>> {
        if let Some(detail) = self.producer_failure.lock().clone() {
            return Err(KafkaMcpError::client("create producer", detail));
        }
        self.producers_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.producer.clone()))
    }
}

// ============================================================================
// Admin
// ============================================================================

const UNKNOWN_TOPIC: &str = "Broker: Unknown topic or partition";

/// Default topic configs reported alongside dynamic overrides
const TOPIC_DEFAULTS: &[(&str, &str)] = &[
    ("cleanup.policy", "delete"),
    ("retention.ms", "604800000"),
    ("segment.bytes", "1073741824"),
];

#[derive(Debug)]
struct ClusterState {
    cluster_id: Option<String>,
    controller_id: Option<i32>,
    brokers: Vec<BrokerInfo>,
    topics: BTreeMap<String, i32>,
    configs: BTreeMap<(ResourceKind, String), BTreeMap<String, String>>,
    groups: Vec<GroupInfo>,
    metadata_failure: Option<String>,
    drop_completions: bool,
}

/// In-memory cluster behind every [`MockAdmin`] of a factory
#[derive(Debug)]
pub struct MockCluster {
    state: Mutex<ClusterState>,
    requests: AtomicUsize,
}

impl MockCluster {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClusterState {
                cluster_id: Some("mock-cluster".to_string()),
                controller_id: Some(1),
                brokers: vec![BrokerInfo {
                    id: 1,
                    host: "localhost".to_string(),
                    port: 9092,
                }],
                topics: BTreeMap::new(),
                configs: BTreeMap::new(),
                groups: Vec::new(),
                metadata_failure: None,
                drop_completions: false,
            }),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn add_topic(&self, name: &str, partitions: i32) {
        self.state.lock().topics.insert(name.to_string(), partitions);
    }

    pub fn add_broker(&self, id: i32, host: &str, port: i32) {
        self.state.lock().brokers.push(BrokerInfo {
            id,
            host: host.to_string(),
            port,
        });
    }

    pub fn add_group(&self, group: GroupInfo) {
        self.state.lock().groups.push(group);
    }

    pub fn set_controller(&self, id: Option<i32>) {
        self.state.lock().controller_id = id;
    }

    pub fn partition_count(&self, topic: &str) -> Option<i32> {
        self.state.lock().topics.get(topic).copied()
    }

    /// Make every metadata and group fetch fail with `detail`
    pub fn fail_metadata(&self, detail: impl Into<String>) {
        self.state.lock().metadata_failure = Some(detail.into());
    }

    /// Answer mutating requests without any per-target completion
    pub fn drop_completions(&self) {
        self.state.lock().drop_completions = true;
    }

    /// Number of requests served across all admin handles
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn begin(&self) -> parking_lot::MutexGuard<'_, ClusterState> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.state.lock()
    }
}

impl Default for MockCluster {
    fn default() -> Self {
        Self::new()
    }
}

fn partition_layout(count: i32) -> Vec<PartitionMetadata> {
    (0..count)
        .map(|id| PartitionMetadata {
            id,
            leader: 1,
            replicas: vec![1],
            isrs: vec![1],
        })
        .collect()
}

fn resource_exists(state: &ClusterState, resource: &ResourceDescriptor) -> bool {
    match resource.kind() {
        ResourceKind::Topic => state.topics.contains_key(resource.name()),
        ResourceKind::Broker => state
            .brokers
            .iter()
            .any(|b| Some(b.id) == resource.broker_id()),
        ResourceKind::Group => true,
    }
}

/// Admin handle over a [`MockCluster`]
pub struct MockAdmin {
    cluster: Arc<MockCluster>,
}

#[async_trait]
impl AdminHandle for MockAdmin {
    async fn fetch_metadata(&self, topic: Option<&str>, _timeout: Duration) -> Result<ClusterMetadata> {
        let state = self.cluster.begin();
        if let Some(detail) = &state.metadata_failure {
            return Err(KafkaMcpError::client("fetch metadata", detail.clone()));
        }

        let topics = state
            .topics
            .iter()
            .filter(|(name, _)| topic.map_or(true, |t| t == name.as_str()))
            .map(|(name, count)| TopicMetadata {
                name: name.clone(),
                partitions: partition_layout(*count),
            })
            .collect();

        Ok(ClusterMetadata {
            cluster_id: state.cluster_id.clone(),
            controller_id: state.controller_id,
            brokers: state.brokers.clone(),
            topics,
        })
    }

    async fn create_topics(&self, topics: &[TopicSpec]) -> Result<Vec<Completion<()>>> {
        let mut state = self.cluster.begin();
        if state.drop_completions {
            return Ok(Vec::new());
        }

        let broker_count = state.brokers.len();
        Ok(topics
            .iter()
            .map(|spec| {
                if state.topics.contains_key(&spec.name) {
                    return Completion::failed(
                        &spec.name,
                        format!("Broker: Topic already exists: Topic '{}' already exists.", spec.name),
                    );
                }
                if usize::try_from(spec.replication_factor).unwrap_or(0) > broker_count {
                    return Completion::failed(
                        &spec.name,
                        format!(
                            "Broker: Invalid replication factor: Replication factor: {} larger than available brokers: {}.",
                            spec.replication_factor, broker_count
                        ),
                    );
                }
                state.topics.insert(spec.name.clone(), spec.num_partitions);
                if !spec.config.is_empty() {
                    state
                        .configs
                        .insert((ResourceKind::Topic, spec.name.clone()), spec.config.clone());
                }
                Completion::ok(&spec.name, ())
            })
            .collect())
    }

    async fn delete_topics(&self, topics: &[String]) -> Result<Vec<Completion<()>>> {
        let mut state = self.cluster.begin();
        if state.drop_completions {
            return Ok(Vec::new());
        }

        Ok(topics
            .iter()
            .map(|name| match state.topics.remove(name) {
                Some(_) => {
                    state.configs.remove(&(ResourceKind::Topic, name.clone()));
                    Completion::ok(name, ())
                }
                None => Completion::failed(name, UNKNOWN_TOPIC),
            })
            .collect())
    }

    async fn create_partitions(&self, increases: &[PartitionIncrease]) -> Result<Vec<Completion<()>>> {
        let mut state = self.cluster.begin();
        if state.drop_completions {
            return Ok(Vec::new());
        }

        Ok(increases
            .iter()
            .map(|increase| {
                let requested = i32::try_from(increase.new_total_count).unwrap_or(i32::MAX);
                match state.topics.get_mut(&increase.topic) {
                    None => Completion::failed(&increase.topic, UNKNOWN_TOPIC),
                    Some(current) if requested <= *current => Completion::failed(
                        &increase.topic,
                        format!(
                            "Broker: Invalid partitions: Topic currently has {} partitions, which is higher than or equal to the requested {}.",
                            current, requested
                        ),
                    ),
                    Some(current) => {
                        *current = requested;
                        Completion::ok(&increase.topic, ())
                    }
                }
            })
            .collect())
    }

    async fn describe_configs(
        &self,
        resources: &[ResourceDescriptor],
    ) -> Result<Vec<Completion<Vec<ConfigEntryInfo>>>> {
        let state = self.cluster.begin();

        Ok(resources
            .iter()
            .map(|resource| {
                if !resource_exists(&state, resource) {
                    return Completion::failed(resource.name(), UNKNOWN_TOPIC);
                }

                let dynamic = state
                    .configs
                    .get(&(resource.kind(), resource.name().to_string()))
                    .cloned()
                    .unwrap_or_default();
                let defaults: &[(&str, &str)] = match resource.kind() {
                    ResourceKind::Topic => TOPIC_DEFAULTS,
                    _ => &[],
                };

                let mut entries: BTreeMap<String, ConfigEntryInfo> = defaults
                    .iter()
                    .map(|(name, value)| {
                        (
                            name.to_string(),
                            ConfigEntryInfo {
                                name: name.to_string(),
                                value: Some(value.to_string()),
                                source: "DEFAULT_CONFIG".to_string(),
                                is_read_only: false,
                                is_default: true,
                            },
                        )
                    })
                    .collect();
                for (name, value) in dynamic {
                    entries.insert(
                        name.clone(),
                        ConfigEntryInfo {
                            name,
                            value: Some(value),
                            source: "DYNAMIC_TOPIC_CONFIG".to_string(),
                            is_read_only: false,
                            is_default: false,
                        },
                    );
                }
                Completion::ok(resource.name(), entries.into_values().collect())
            })
            .collect())
    }

    async fn alter_configs(&self, alterations: &[ConfigAlteration]) -> Result<Vec<Completion<()>>> {
        let mut state = self.cluster.begin();
        if state.drop_completions {
            return Ok(Vec::new());
        }

        Ok(alterations
            .iter()
            .map(|alteration| {
                let resource = &alteration.resource;
                if !resource_exists(&state, resource) {
                    return Completion::failed(resource.name(), UNKNOWN_TOPIC);
                }
                state.configs.insert(
                    (resource.kind(), resource.name().to_string()),
                    alteration.entries.clone(),
                );
                Completion::ok(resource.name(), ())
            })
            .collect())
    }

    async fn fetch_groups(&self, group: Option<&str>, _timeout: Duration) -> Result<Vec<GroupInfo>> {
        let state = self.cluster.begin();
        if let Some(detail) = &state.metadata_failure {
            return Err(KafkaMcpError::client("fetch group list", detail.clone()));
        }

        match group {
            None => Ok(state.groups.clone()),
            Some(id) => Ok(vec![state
                .groups
                .iter()
                .find(|g| g.group_id == id)
                .cloned()
                .unwrap_or_else(|| GroupInfo {
                    group_id: id.to_string(),
                    state: "Dead".to_string(),
                    protocol_type: String::new(),
                    protocol: String::new(),
                    coordinator: None,
                    members: Vec::new(),
                })]),
        }
    }
}

// ============================================================================
// Consumer
// ============================================================================

/// Where a [`MockConsumer`] should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerFault {
    TopicPartitions,
    Assign,
    Watermarks,
    Seek,
}

#[derive(Debug, Default)]
struct TrackerState {
    close_calls: AtomicUsize,
    poll_calls: AtomicUsize,
    assigned: Mutex<Vec<i32>>,
    seeks: Mutex<Vec<PartitionTarget>>,
}

/// Observes a [`MockConsumer`] after it has been moved into the code under test
#[derive(Debug, Clone, Default)]
pub struct ConsumerTracker(Arc<TrackerState>);

impl ConsumerTracker {
    pub fn close_calls(&self) -> usize {
        self.0.close_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> usize {
        self.0.poll_calls.load(Ordering::SeqCst)
    }

    pub fn assigned(&self) -> Vec<i32> {
        self.0.assigned.lock().clone()
    }

    /// Targets passed to the last seek
    pub fn seeks(&self) -> Vec<PartitionTarget> {
        self.0.seeks.lock().clone()
    }
}

/// Scripted consumer.
///
/// Polls return the queued results in order and [`PollResult::Empty`] once the
/// script runs out. With a [`ManualClock`] attached every empty poll advances
/// the clock by the requested wait.
#[derive(Default)]
pub struct MockConsumer {
    partitions: Option<Vec<i32>>,
    watermarks: BTreeMap<i32, (i64, i64)>,
    script: VecDeque<PollResult>,
    fault: Option<ConsumerFault>,
    clock: Option<Arc<ManualClock>>,
    tracker: ConsumerTracker,
}

impl MockConsumer {
    /// A consumer that sees no topics
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the queried topic with these partitions
    pub fn with_topic(mut self, partitions: &[i32]) -> Self {
        self.partitions = Some(partitions.to_vec());
        self
    }

    pub fn with_watermarks(mut self, partition: i32, low: i64, high: i64) -> Self {
        self.watermarks.insert(partition, (low, high));
        self
    }

    pub fn with_clock(mut self, clock: Arc<ManualClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn fail_at(mut self, fault: ConsumerFault) -> Self {
        self.fault = Some(fault);
        self
    }

    pub fn push_record(mut self, record: ConsumedRecord) -> Self {
        self.script.push_back(PollResult::Record(record));
        self
    }

    pub fn push_error(mut self, detail: &str) -> Self {
        self.script.push_back(PollResult::Error(detail.to_string()));
        self
    }

    pub fn push_empty(mut self) -> Self {
        self.script.push_back(PollResult::Empty);
        self
    }

    pub fn tracker(&self) -> ConsumerTracker {
        self.tracker.clone()
    }

    fn check(&self, at: ConsumerFault, operation: &str) -> Result<()> {
        if self.fault == Some(at) {
            return Err(KafkaMcpError::client(operation, "injected fault"));
        }
        Ok(())
    }
}

impl ConsumerHandle for MockConsumer {
    fn topic_partitions(&self, _topic: &str, _timeout: Duration) -> Result<Option<Vec<i32>>> {
        self.check(ConsumerFault::TopicPartitions, "fetch metadata")?;
        Ok(self.partitions.clone())
    }

    fn assign(&mut self, _topic: &str, partitions: &[i32]) -> Result<()> {
        self.check(ConsumerFault::Assign, "assign")?;
        *self.tracker.0.assigned.lock() = partitions.to_vec();
        Ok(())
    }

    fn fetch_watermarks(&self, _topic: &str, partition: i32, _timeout: Duration) -> Result<(i64, i64)> {
        self.check(ConsumerFault::Watermarks, "fetch watermarks")?;
        Ok(self.watermarks.get(&partition).copied().unwrap_or((0, 0)))
    }

    fn seek(&mut self, targets: &[PartitionTarget]) -> Result<()> {
        self.check(ConsumerFault::Seek, "seek")?;
        *self.tracker.0.seeks.lock() = targets.to_vec();
        Ok(())
    }

    fn poll(&mut self, wait: Duration) -> PollResult {
        self.tracker.0.poll_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.script.pop_front().unwrap_or(PollResult::Empty);
        if result == PollResult::Empty {
            if let Some(clock) = &self.clock {
                clock.advance(wait);
            }
        }
        result
    }

    fn close(&mut self) {
        self.tracker.0.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Build a text record for scripting a [`MockConsumer`]
pub fn text_record(topic: &str, partition: i32, offset: i64, key: Option<&str>, value: &str) -> ConsumedRecord {
    ConsumedRecord {
        topic: topic.to_string(),
        partition,
        offset,
        key: key.map(|k| Bytes::copy_from_slice(k.as_bytes())),
        value: Some(Bytes::copy_from_slice(value.as_bytes())),
        timestamp: Some(1_700_000_000_000 + offset),
        headers: Vec::new(),
    }
}

// ============================================================================
// Producer
// ============================================================================

#[derive(Debug, Default)]
struct ProducerState {
    sent: Mutex<Vec<OutgoingRecord>>,
    flushes: AtomicUsize,
    send_failure: Mutex<Option<String>>,
}

/// Producer that keeps every record it is given
#[derive(Debug, Clone, Default)]
pub struct MockProducer(Arc<ProducerState>);

impl MockProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingRecord> {
        self.0.sent.lock().clone()
    }

    pub fn flushes(&self) -> usize {
        self.0.flushes.load(Ordering::SeqCst)
    }

    /// Make subsequent sends fail with `detail`
    pub fn fail_sends(&self, detail: impl Into<String>) {
        *self.0.send_failure.lock() = Some(detail.into());
    }
}

impl ProducerHandle for MockProducer {
    fn send(&self, record: &OutgoingRecord) -> Result<()> {
        if let Some(detail) = self.0.send_failure.lock().clone() {
            return Err(KafkaMcpError::client("produce", detail));
        }
        self.0.sent.lock().push(record.clone());
        Ok(())
    }

    fn flush(&self, _timeout: Duration) -> Result<()> {
        self.0.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
