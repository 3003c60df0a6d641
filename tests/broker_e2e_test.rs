//! Tests against a live Kafka cluster
//!
//! Ignored by default. Run with a reachable broker:
//!
//! ```bash
//! KAFKA_BOOTSTRAP_SERVERS=localhost:9092 cargo test --test broker_e2e_test -- --ignored
//! ```

use std::time::Duration;

use kafka_mcp::admin::{self, CreateTopicRequest};
use kafka_mcp::config::ClusterEndpoint;
use kafka_mcp::consumer::{consume_messages, ConsumeRequest};
use kafka_mcp::producer::{produce_message, ProduceRequest};
use kafka_mcp::{cluster, KafkaContext, ServerConfig};

fn live_context() -> KafkaContext {
    let bootstrap =
        std::env::var("KAFKA_BOOTSTRAP_SERVERS").unwrap_or_else(|_| "localhost:9092".to_string());
    let endpoint = ClusterEndpoint::new(bootstrap, "kafka-mcp-e2e").unwrap();
    KafkaContext::new(&ServerConfig::for_endpoint(endpoint))
}

fn unique_topic(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

#[tokio::test]
#[ignore = "requires a running Kafka broker"]
async fn test_live_topic_lifecycle() {
    let ctx = live_context();
    let topic = unique_topic("e2e-lifecycle");

    let mut request = CreateTopicRequest::new(&topic);
    request.num_partitions = Some(2);
    let outcome = admin::create_topic(&ctx, request).await.unwrap();
    assert!(outcome.is_success(), "{}", outcome.detail());

    // Metadata propagation is asynchronous on the broker
    tokio::time::sleep(Duration::from_millis(500)).await;

    let report = admin::describe_topic(&ctx, &topic).await.unwrap();
    assert!(report.is_found());

    let grown = admin::create_partitions(&ctx, &topic, 3).await.unwrap();
    assert!(grown.is_success(), "{}", grown.detail());

    let deleted = admin::delete_topic(&ctx, &topic).await.unwrap();
    assert!(deleted.is_success(), "{}", deleted.detail());
}

#[tokio::test]
#[ignore = "requires a running Kafka broker"]
async fn test_live_produce_then_consume_latest() {
    let ctx = live_context();
    let topic = unique_topic("e2e-consume");

    let outcome = admin::create_topic(&ctx, CreateTopicRequest::new(&topic))
        .await
        .unwrap();
    assert!(outcome.is_success(), "{}", outcome.detail());
    tokio::time::sleep(Duration::from_millis(500)).await;

    for i in 0..8 {
        let request = ProduceRequest::new(&topic, format!("message-{}", i)).key("k");
        let sent = produce_message(&ctx, request).await.unwrap();
        assert!(sent.is_success(), "{}", sent.detail());
    }

    let request = ConsumeRequest::new(&topic)
        .offset_spec("latest")
        .limit(5)
        .timeout(Duration::from_secs(10));
    let outcome = consume_messages(&ctx, request).await.unwrap();
    let values: Vec<String> = outcome
        .records()
        .iter()
        .filter_map(|r| r.value_text())
        .collect();
    assert_eq!(
        values,
        vec!["message-3", "message-4", "message-5", "message-6", "message-7"]
    );

    admin::delete_topic(&ctx, &topic).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Kafka broker"]
async fn test_live_produce_then_consume_earliest() {
    let ctx = live_context();
    let topic = unique_topic("e2e-earliest");

    let mut request = CreateTopicRequest::new(&topic);
    request.num_partitions = Some(1);
    request.replication_factor = Some(1);
    let created = admin::create_topic(&ctx, request).await.unwrap();
    assert!(created.is_success(), "{}", created.detail());
    tokio::time::sleep(Duration::from_millis(500)).await;

    let sent = produce_message(&ctx, ProduceRequest::new(&topic, "hello").key("k"))
        .await
        .unwrap();
    assert!(sent.is_success(), "{}", sent.detail());

    let request = ConsumeRequest::new(&topic)
        .offset_spec("earliest")
        .limit(1)
        .timeout(Duration::from_secs(10));
    let outcome = consume_messages(&ctx, request).await.unwrap();
    let records = outcome.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].value_text().as_deref(), Some("hello"));
    assert_eq!(records[0].key_text().as_deref(), Some("k"));

    admin::delete_topic(&ctx, &topic).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Kafka broker"]
async fn test_live_alter_then_describe_configs() {
    let ctx = live_context();
    let topic = unique_topic("e2e-configs");

    let created = admin::create_topic(&ctx, CreateTopicRequest::new(&topic))
        .await
        .unwrap();
    assert!(created.is_success(), "{}", created.detail());
    tokio::time::sleep(Duration::from_millis(500)).await;

    let configs = [("retention.ms".to_string(), "1000".to_string())].into();
    let altered = admin::alter_configs(&ctx, "topic", &topic, configs)
        .await
        .unwrap();
    assert!(altered.is_success(), "{}", altered.detail());

    let report = admin::describe_configs(&ctx, "topic", &topic).await.unwrap();
    let retention = report.entry("retention.ms").unwrap();
    assert_eq!(retention.value.as_deref(), Some("1000"));
    assert!(!retention.is_default);

    let missing = admin::delete_topic(&ctx, &unique_topic("e2e-missing"))
        .await
        .unwrap();
    assert!(!missing.is_success());

    admin::delete_topic(&ctx, &topic).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Kafka broker"]
async fn test_live_cluster_description() {
    let ctx = live_context();
    let summary = cluster::describe_cluster(&ctx).await.unwrap();
    assert!(!summary.brokers.is_empty());
}
