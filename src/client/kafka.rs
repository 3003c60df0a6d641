//! librdkafka-backed implementation of the client boundary
//!
//! Admin requests are submitted through rdkafka's future-based admin API and
//! awaited per target. Metadata and group lookups are blocking librdkafka
//! calls and run on the blocking pool.

use async_trait::async_trait;
use bytes::Bytes;
use rdkafka::admin::{
    AdminClient, AdminOptions, AlterConfig, AlterConfigsResult, ConfigSource, NewPartitions,
    NewTopic, OwnedResourceSpecifier, ResourceSpecifier, TopicReplication, TopicResult,
};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::message::{BorrowedMessage, Header, Headers, Message, OwnedHeaders};
use rdkafka::metadata::Metadata;
use rdkafka::producer::{BaseRecord, DefaultProducerContext, Producer, ThreadedProducer};
use rdkafka::topic_partition_list::{Offset, TopicPartitionList};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{
    AdminHandle, BrokerInfo, ClientFactory, ClusterMetadata, Completion, ConfigAlteration,
    ConfigEntryInfo, ConsumerHandle, GroupInfo, GroupMemberInfo, OutgoingRecord,
    PartitionIncrease, PartitionMetadata, PollResult, ProducerHandle, ResetPolicy, TopicMetadata,
    TopicSpec,
};
use crate::admin::resource::{ResourceDescriptor, ResourceKind};
use crate::config::ClusterEndpoint;
use crate::consumer::{ConsumedRecord, PartitionTarget, RecordHeader, StartOffset};
use crate::error::{KafkaMcpError, Result};

/// Creates librdkafka handles for one cluster endpoint
#[derive(Debug, Clone)]
pub struct KafkaClientFactory {
    endpoint: ClusterEndpoint,
    operation_timeout: Duration,
}

impl KafkaClientFactory {
    pub fn new(endpoint: ClusterEndpoint, operation_timeout: Duration) -> Self {
        Self {
            endpoint,
            operation_timeout,
        }
    }

    pub fn endpoint(&self) -> &ClusterEndpoint {
        &self.endpoint
    }

    fn base_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", self.endpoint.bootstrap_servers())
            .set("client.id", self.endpoint.client_id());
        for (key, value) in self.endpoint.properties() {
            config.set(key, value);
        }
        config
    }
}

impl ClientFactory for KafkaClientFactory {
    fn admin(&self) -> Result<Box<dyn AdminHandle>> {
        let client: AdminClient<DefaultClientContext> = self
            .base_config()
            .create()
            .map_err(|e| KafkaMcpError::client("create admin client", e.to_string()))?;
        Ok(Box::new(KafkaAdmin {
            client: Arc::new(client),
            operation_timeout: self.operation_timeout,
        }))
    }

    fn consumer(&self, group_id: &str, reset: ResetPolicy) -> Result<Box<dyn ConsumerHandle>> {
        let mut config = self.base_config();
        config
            .set("group.id", group_id)
            .set("auto.offset.reset", reset.as_str())
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set("enable.partition.eof", "false");
        let consumer: BaseConsumer = config
            .create()
            .map_err(|e| KafkaMcpError::client("create consumer", e.to_string()))?;
        debug!(group_id, reset = reset.as_str(), "Created consumer handle");
        Ok(Box::new(KafkaConsumer {
            consumer: Some(consumer),
        }))
    }

    fn producer(&self) -> Result<Box<dyn ProducerHandle>> {
        let producer: ThreadedProducer<DefaultProducerContext> = self
            .base_config()
            .create()
            .map_err(|e| KafkaMcpError::client("create producer", e.to_string()))?;
        Ok(Box::new(KafkaProducer { producer }))
    }
}

// ─── Admin ──────────────────────────────────────────────────────────

struct KafkaAdmin {
    client: Arc<AdminClient<DefaultClientContext>>,
    operation_timeout: Duration,
}

impl KafkaAdmin {
    fn options(&self) -> AdminOptions {
        AdminOptions::new()
            .request_timeout(Some(self.operation_timeout))
            .operation_timeout(Some(self.operation_timeout))
    }
}

fn topic_completion(result: TopicResult) -> Completion<()> {
    match result {
        Ok(topic) => Completion::ok(topic, ()),
        Err((topic, code)) => Completion::failed(topic, code.to_string()),
    }
}

fn specifier_name(specifier: &OwnedResourceSpecifier) -> String {
    match specifier {
        OwnedResourceSpecifier::Topic(name) | OwnedResourceSpecifier::Group(name) => name.clone(),
        OwnedResourceSpecifier::Broker(id) => id.to_string(),
    }
}

fn alter_completion(result: AlterConfigsResult) -> Completion<()> {
    match result {
        Ok(specifier) => Completion::ok(specifier_name(&specifier), ()),
        Err((specifier, code)) => Completion::failed(specifier_name(&specifier), code.to_string()),
    }
}

fn specifier(resource: &ResourceDescriptor) -> ResourceSpecifier<'_> {
    match resource.kind() {
        ResourceKind::Topic => ResourceSpecifier::Topic(resource.name()),
        ResourceKind::Group => ResourceSpecifier::Group(resource.name()),
        // Broker descriptors are only constructed with a numeric id
        ResourceKind::Broker => ResourceSpecifier::Broker(resource.broker_id().unwrap_or(-1)),
    }
}

#[allow(unreachable_patterns)]
fn config_source_name(source: &ConfigSource) -> &'static str {
    match source {
        ConfigSource::Unknown => "UNKNOWN_CONFIG",
        ConfigSource::DynamicTopic => "DYNAMIC_TOPIC_CONFIG",
        ConfigSource::DynamicBroker => "DYNAMIC_BROKER_CONFIG",
        ConfigSource::DynamicDefaultBroker => "DYNAMIC_DEFAULT_BROKER_CONFIG",
        ConfigSource::StaticBroker => "STATIC_BROKER_CONFIG",
        ConfigSource::Default => "DEFAULT_CONFIG",
        _ => "UNKNOWN_CONFIG",
    }
}

fn convert_metadata(
    metadata: &Metadata,
    cluster_id: Option<String>,
    controller_id: Option<i32>,
) -> ClusterMetadata {
    let brokers = metadata
        .brokers()
        .iter()
        .map(|b| BrokerInfo {
            id: b.id(),
            host: b.host().to_string(),
            port: b.port(),
        })
        .collect();

    let topics = metadata
        .topics()
        .iter()
        .filter_map(|t| {
            if let Some(err) = t.error() {
                debug!(topic = t.name(), error = ?err, "Skipping topic reported with error");
                return None;
            }
            Some(TopicMetadata {
                name: t.name().to_string(),
                partitions: t
                    .partitions()
                    .iter()
                    .map(|p| PartitionMetadata {
                        id: p.id(),
                        leader: p.leader(),
                        replicas: p.replicas().to_vec(),
                        isrs: p.isr().to_vec(),
                    })
                    .collect(),
            })
        })
        .collect();

    ClusterMetadata {
        cluster_id,
        controller_id,
        brokers,
        topics,
    }
}

fn controller_id(client: &AdminClient<DefaultClientContext>, timeout: Duration) -> Option<i32> {
    let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
    // SAFETY: the native handle stays valid for as long as `client` is borrowed,
    // and rd_kafka_controllerid only reads cached metadata from it.
    let id = unsafe { rdkafka::bindings::rd_kafka_controllerid(client.inner().native_ptr(), timeout_ms) };
    (id >= 0).then_some(id)
}

#[async_trait]
impl AdminHandle for KafkaAdmin {
    async fn fetch_metadata(
        &self,
        topic: Option<&str>,
        timeout: Duration,
    ) -> Result<ClusterMetadata> {
        let client = Arc::clone(&self.client);
        let topic = topic.map(str::to_string);

        tokio::task::spawn_blocking(move || {
            let metadata = client
                .inner()
                .fetch_metadata(topic.as_deref(), timeout)
                .map_err(|e| KafkaMcpError::client("fetch metadata", e.to_string()))?;

            let (cluster_id, controller) = if topic.is_none() {
                (
                    client.inner().fetch_cluster_id(timeout),
                    controller_id(&client, timeout),
                )
            } else {
                (None, None)
            };
            Ok(convert_metadata(&metadata, cluster_id, controller))
        })
        .await?
    }

    async fn create_topics(&self, topics: &[TopicSpec]) -> Result<Vec<Completion<()>>> {
        let new_topics: Vec<NewTopic<'_>> = topics
            .iter()
            .map(|spec| {
                spec.config.iter().fold(
                    NewTopic::new(
                        &spec.name,
                        spec.num_partitions,
                        TopicReplication::Fixed(spec.replication_factor),
                    ),
                    |topic, (key, value)| topic.set(key, value),
                )
            })
            .collect();

        let results = self
            .client
            .create_topics(&new_topics, &self.options())
            .await
            .map_err(|e| KafkaMcpError::client("create topics", e.to_string()))?;
        Ok(results.into_iter().map(topic_completion).collect())
    }

    async fn delete_topics(&self, topics: &[String]) -> Result<Vec<Completion<()>>> {
        let names: Vec<&str> = topics.iter().map(String::as_str).collect();
        let results = self
            .client
            .delete_topics(&names, &self.options())
            .await
            .map_err(|e| KafkaMcpError::client("delete topics", e.to_string()))?;
        Ok(results.into_iter().map(topic_completion).collect())
    }

    async fn create_partitions(
        &self,
        increases: &[PartitionIncrease],
    ) -> Result<Vec<Completion<()>>> {
        let new_partitions: Vec<NewPartitions<'_>> = increases
            .iter()
            .map(|i| NewPartitions::new(&i.topic, i.new_total_count))
            .collect();
        let results = self
            .client
            .create_partitions(&new_partitions, &self.options())
            .await
            .map_err(|e| KafkaMcpError::client("create partitions", e.to_string()))?;
        Ok(results.into_iter().map(topic_completion).collect())
    }

    async fn describe_configs(
        &self,
        resources: &[ResourceDescriptor],
    ) -> Result<Vec<Completion<Vec<ConfigEntryInfo>>>> {
        let specifiers: Vec<ResourceSpecifier<'_>> = resources.iter().map(specifier).collect();
        let results = self
            .client
            .describe_configs(&specifiers, &self.options())
            .await
            .map_err(|e| KafkaMcpError::client("describe configs", e.to_string()))?;

        // Results come back in request order
        Ok(resources
            .iter()
            .zip(results)
            .map(|(resource, result)| match result {
                Ok(config) => Completion::ok(
                    resource.name(),
                    config
                        .entries
                        .into_iter()
                        .map(|entry| ConfigEntryInfo {
                            source: config_source_name(&entry.source).to_string(),
                            name: entry.name,
                            value: entry.value,
                            is_read_only: entry.is_read_only,
                            is_default: entry.is_default,
                        })
                        .collect(),
                ),
                Err(code) => Completion::failed(resource.name(), code.to_string()),
            })
            .collect())
    }

    async fn alter_configs(
        &self,
        alterations: &[ConfigAlteration],
    ) -> Result<Vec<Completion<()>>> {
        let requests: Vec<AlterConfig<'_>> = alterations
            .iter()
            .map(|alteration| {
                alteration.entries.iter().fold(
                    AlterConfig::new(specifier(&alteration.resource)),
                    |request, (key, value)| request.set(key, value),
                )
            })
            .collect();
        let results = self
            .client
            .alter_configs(&requests, &self.options())
            .await
            .map_err(|e| KafkaMcpError::client("alter configs", e.to_string()))?;
        Ok(results.into_iter().map(alter_completion).collect())
    }

    async fn fetch_groups(
        &self,
        group: Option<&str>,
        timeout: Duration,
    ) -> Result<Vec<GroupInfo>> {
        let client = Arc::clone(&self.client);
        let group = group.map(str::to_string);

        tokio::task::spawn_blocking(move || {
            let list = client
                .inner()
                .fetch_group_list(group.as_deref(), timeout)
                .map_err(|e| KafkaMcpError::client("fetch group list", e.to_string()))?;

            Ok(list
                .groups()
                .iter()
                .map(|g| GroupInfo {
                    group_id: g.name().to_string(),
                    state: g.state().to_string(),
                    protocol_type: g.protocol_type().to_string(),
                    protocol: g.protocol().to_string(),
                    // librdkafka does not expose the answering coordinator
                    coordinator: None,
                    members: g
                        .members()
                        .iter()
                        .map(|m| GroupMemberInfo {
                            member_id: m.id().to_string(),
                            client_id: m.client_id().to_string(),
                            host: m.client_host().to_string(),
                            assignment: m.assignment().map(Bytes::copy_from_slice),
                        })
                        .collect(),
                })
                .collect())
        })
        .await?
    }
}

// ─── Consumer ───────────────────────────────────────────────────────

struct KafkaConsumer {
    consumer: Option<BaseConsumer>,
}

impl KafkaConsumer {
    fn live(&self) -> Result<&BaseConsumer> {
        self.consumer
            .as_ref()
            .ok_or_else(|| KafkaMcpError::client("consumer", "handle already closed"))
    }
}

fn to_offset(offset: StartOffset) -> Offset {
    match offset {
        StartOffset::Beginning => Offset::Beginning,
        StartOffset::End => Offset::End,
        StartOffset::At(offset) => Offset::Offset(offset),
    }
}

fn convert_message(message: &BorrowedMessage<'_>) -> ConsumedRecord {
    let headers = message
        .headers()
        .map(|headers| {
            headers
                .iter()
                .map(|h| RecordHeader {
                    key: h.key.to_string(),
                    value: h.value.map(Bytes::copy_from_slice),
                })
                .collect()
        })
        .unwrap_or_default();

    ConsumedRecord {
        topic: message.topic().to_string(),
        partition: message.partition(),
        offset: message.offset(),
        key: message.key().map(Bytes::copy_from_slice),
        value: message.payload().map(Bytes::copy_from_slice),
        timestamp: message.timestamp().to_millis(),
        headers,
    }
}

impl ConsumerHandle for KafkaConsumer {
    fn topic_partitions(&self, topic: &str, timeout: Duration) -> Result<Option<Vec<i32>>> {
        let metadata = self
            .live()?
            .fetch_metadata(Some(topic), timeout)
            .map_err(|e| KafkaMcpError::client("fetch metadata", e.to_string()))?;

        Ok(metadata
            .topics()
            .iter()
            .find(|t| t.name() == topic && t.error().is_none())
            .map(|t| t.partitions().iter().map(|p| p.id()).collect()))
    }

    fn assign(&mut self, topic: &str, partitions: &[i32]) -> Result<()> {
        let mut tpl = TopicPartitionList::with_capacity(partitions.len());
        for &partition in partitions {
            tpl.add_partition(topic, partition);
        }
        self.live()?
            .assign(&tpl)
            .map_err(|e| KafkaMcpError::client("assign", e.to_string()))
    }

    fn fetch_watermarks(
        &self,
        topic: &str,
        partition: i32,
        timeout: Duration,
    ) -> Result<(i64, i64)> {
        self.live()?
            .fetch_watermarks(topic, partition, timeout)
            .map_err(|e| KafkaMcpError::client_partition(topic, partition, "fetch watermarks", e.to_string()))
    }

    fn seek(&mut self, targets: &[PartitionTarget]) -> Result<()> {
        // Re-assigning with explicit offsets positions partitions that have not
        // started fetching yet, where a plain seek would be rejected.
        let mut tpl = TopicPartitionList::with_capacity(targets.len());
        for target in targets {
            tpl.add_partition_offset(&target.topic, target.partition, to_offset(target.offset))
                .map_err(|e| {
                    KafkaMcpError::client_partition(&target.topic, target.partition, "seek", e.to_string())
                })?;
        }
        self.live()?
            .assign(&tpl)
            .map_err(|e| KafkaMcpError::client("seek", e.to_string()))
    }

    fn poll(&mut self, wait: Duration) -> PollResult {
        let Some(consumer) = self.consumer.as_ref() else {
            return PollResult::Error("handle already closed".to_string());
        };
        match consumer.poll(wait) {
            None => PollResult::Empty,
            Some(Ok(message)) => PollResult::Record(convert_message(&message)),
            Some(Err(e)) => PollResult::Error(e.to_string()),
        }
    }

    fn close(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            if let Err(e) = consumer.unassign() {
                warn!(error = %e, "Failed to unassign consumer before close");
            }
        }
    }
}

// ─── Producer ───────────────────────────────────────────────────────

struct KafkaProducer {
    producer: ThreadedProducer<DefaultProducerContext>,
}

impl ProducerHandle for KafkaProducer {
    fn send(&self, record: &OutgoingRecord) -> Result<()> {
        let mut base = BaseRecord::<[u8], [u8]>::to(&record.topic);
        if let Some(key) = &record.key {
            base = base.key(key.as_ref());
        }
        if let Some(value) = &record.value {
            base = base.payload(value.as_ref());
        }
        if !record.headers.is_empty() {
            let headers = record.headers.iter().fold(
                OwnedHeaders::new_with_capacity(record.headers.len()),
                |headers, (key, value)| {
                    headers.insert(Header {
                        key,
                        value: Some(value.as_bytes()),
                    })
                },
            );
            base = base.headers(headers);
        }

        self.producer
            .send(base)
            .map_err(|(e, _)| KafkaMcpError::client("produce", e.to_string()))
    }

    fn flush(&self, timeout: Duration) -> Result<()> {
        self.producer
            .flush(timeout)
            .map_err(|e| KafkaMcpError::client("flush", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_config_carries_endpoint() {
        let mut properties = std::collections::BTreeMap::new();
        properties.insert("security.protocol".to_string(), "SASL_SSL".to_string());
        let endpoint = ClusterEndpoint::new("b1:9092,b2:9092", "agent")
            .unwrap()
            .with_properties(properties);
        let factory = KafkaClientFactory::new(endpoint, Duration::from_secs(30));

        let config = factory.base_config();
        assert_eq!(config.get("bootstrap.servers"), Some("b1:9092,b2:9092"));
        assert_eq!(config.get("client.id"), Some("agent"));
        assert_eq!(config.get("security.protocol"), Some("SASL_SSL"));
    }

    #[test]
    fn test_offset_mapping() {
        assert_eq!(to_offset(StartOffset::Beginning), Offset::Beginning);
        assert_eq!(to_offset(StartOffset::End), Offset::End);
        assert_eq!(to_offset(StartOffset::At(42)), Offset::Offset(42));
    }

    #[test]
    fn test_config_source_names() {
        assert_eq!(
            config_source_name(&ConfigSource::DynamicTopic),
            "DYNAMIC_TOPIC_CONFIG"
        );
        assert_eq!(config_source_name(&ConfigSource::Default), "DEFAULT_CONFIG");
    }

    #[test]
    fn test_specifier_name() {
        assert_eq!(
            specifier_name(&OwnedResourceSpecifier::Topic("orders".into())),
            "orders"
        );
        assert_eq!(specifier_name(&OwnedResourceSpecifier::Broker(3)), "3");
    }
}
