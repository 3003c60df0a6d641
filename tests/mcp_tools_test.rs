//! End-to-end tests of the tool surface against the in-memory cluster
//!
//! Every request goes through `McpServer::handle_message`, the same path the
//! stdio and HTTP transports take.

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use kafka_mcp::client::{GroupInfo, GroupMemberInfo};
use kafka_mcp::config::{ClusterEndpoint, Timeouts};
use kafka_mcp::mcp::{JsonRpcRequest, McpServer};
use kafka_mcp::testing::{text_record, MockClientFactory, MockConsumer};
use kafka_mcp::KafkaContext;
use serde_json::{json, Value};

fn setup() -> (Arc<MockClientFactory>, McpServer) {
    let factory = Arc::new(MockClientFactory::new());
    let ctx = KafkaContext::with_factory(
        ClusterEndpoint::new("localhost:9092", "mcp-test").unwrap(),
        Timeouts::default(),
        factory.clone(),
    );
    (factory, McpServer::new(Arc::new(ctx)))
}

/// Call a tool and return (isError, parsed JSON payload)
async fn call(server: &McpServer, name: &str, arguments: Value) -> (bool, Value) {
    let request: JsonRpcRequest = serde_json::from_value(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    }))
    .unwrap();

    let response = server.handle_message(request).await.unwrap();
    let response = serde_json::to_value(response).unwrap();
    assert!(
        response.get("error").is_none(),
        "unexpected JSON-RPC error: {}",
        response
    );

    let result = &response["result"];
    let text = result["content"][0]["text"].as_str().unwrap();
    (
        result["isError"].as_bool().unwrap_or(false),
        serde_json::from_str(text).unwrap(),
    )
}

#[tokio::test]
async fn test_create_then_describe_topic() {
    let (_factory, server) = setup();

    let (is_error, created) = call(
        &server,
        "create_topic",
        json!({ "topic_name": "orders", "num_partitions": 3 }),
    )
    .await;
    assert!(!is_error);
    assert_eq!(created["status"], "succeeded");
    assert_eq!(created["detail"], "Topic 'orders' created successfully");

    let (is_error, described) =
        call(&server, "describe_topic", json!({ "topic_name": "orders" })).await;
    assert!(!is_error);
    assert_eq!(described["name"], "orders");
    assert_eq!(described["partition_count"], 3);
    let ids: Vec<i64> = described["partitions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![0, 1, 2]);

    let (_, topics) = call(&server, "list_topics", json!({})).await;
    assert_eq!(topics, json!(["orders"]));
}

#[tokio::test]
async fn test_describe_is_repeatable() {
    let (factory, server) = setup();
    factory.cluster().add_topic("events", 2);

    let (_, first) = call(&server, "describe_topic", json!({ "topic_name": "events" })).await;
    let (_, second) = call(&server, "describe_topic", json!({ "topic_name": "events" })).await;
    assert_eq!(first, second);

    let (_, first) = call(
        &server,
        "describe_configs",
        json!({ "resource_type": "topic", "resource_name": "events" }),
    )
    .await;
    let (_, second) = call(
        &server,
        "describe_configs",
        json!({ "resource_type": "topic", "resource_name": "events" }),
    )
    .await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_describe_missing_topic_is_marker() {
    let (_factory, server) = setup();

    let (is_error, report) =
        call(&server, "describe_topic", json!({ "topic_name": "ghost" })).await;
    assert!(is_error);
    assert_eq!(report["error"], "Topic 'ghost' not found");
}

#[tokio::test]
async fn test_delete_missing_topic_names_it() {
    let (_factory, server) = setup();

    let (is_error, outcome) =
        call(&server, "delete_topic", json!({ "topic_name": "ghost" })).await;
    assert!(is_error);
    assert_eq!(outcome["status"], "failed");
    assert!(outcome["detail"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn test_create_partitions_grows_topic() {
    let (factory, server) = setup();
    factory.cluster().add_topic("orders", 2);

    let (is_error, outcome) = call(
        &server,
        "create_partitions",
        json!({ "topic_name": "orders", "new_total_count": 5 }),
    )
    .await;
    assert!(!is_error);
    assert_eq!(outcome["detail"], "Partitions for 'orders' increased to 5");
    assert_eq!(factory.cluster().partition_count("orders"), Some(5));

    // Shrinking is refused by the broker
    let (is_error, outcome) = call(
        &server,
        "create_partitions",
        json!({ "topic_name": "orders", "new_total_count": 3 }),
    )
    .await;
    assert!(is_error);
    assert!(outcome["detail"]
        .as_str()
        .unwrap()
        .starts_with("Failed to create partitions for 'orders'"));
}

#[tokio::test]
async fn test_alter_then_describe_configs() {
    let (factory, server) = setup();
    factory.cluster().add_topic("orders", 1);

    let (is_error, outcome) = call(
        &server,
        "alter_configs",
        json!({
            "resource_type": "TOPIC",
            "resource_name": "orders",
            "configs": { "retention.ms": 3600000 }
        }),
    )
    .await;
    assert!(!is_error);
    assert_eq!(
        outcome["detail"],
        "Configs for topic 'orders' updated successfully"
    );

    let (is_error, configs) = call(
        &server,
        "describe_configs",
        json!({ "resource_type": "topic", "resource_name": "orders" }),
    )
    .await;
    assert!(!is_error);
    assert_eq!(configs["retention.ms"]["value"], "3600000");
    assert_eq!(configs["retention.ms"]["is_default"], false);
    assert_eq!(configs["cleanup.policy"]["is_default"], true);
}

#[tokio::test]
async fn test_invalid_resource_type_creates_no_admin() {
    let (factory, server) = setup();

    let (is_error, report) = call(
        &server,
        "describe_configs",
        json!({ "resource_type": "cluster", "resource_name": "x" }),
    )
    .await;
    assert!(is_error);
    assert!(report["error"]
        .as_str()
        .unwrap()
        .contains("Invalid resource type"));

    let (is_error, outcome) = call(
        &server,
        "alter_configs",
        json!({
            "resource_type": "broker",
            "resource_name": "not-a-number",
            "configs": { "log.retention.hours": "1" }
        }),
    )
    .await;
    assert!(is_error);
    assert_eq!(outcome["status"], "failed");

    assert_eq!(factory.admins_created(), 0);
}

#[tokio::test]
async fn test_missing_completion_is_unknown_error() {
    let (factory, server) = setup();
    factory.cluster().drop_completions();

    let (is_error, outcome) =
        call(&server, "create_topic", json!({ "topic_name": "orders" })).await;
    assert!(is_error);
    assert_eq!(outcome["target"], "orders");
    assert_eq!(outcome["detail"], "Unknown error");
}

#[tokio::test]
async fn test_describe_cluster_and_brokers() {
    let (factory, server) = setup();
    factory.cluster().add_broker(2, "kafka-2", 9093);
    factory.cluster().add_topic("a", 1);

    let (_, cluster) = call(&server, "describe_cluster", json!({})).await;
    assert_eq!(cluster["cluster_id"], "mock-cluster");
    assert_eq!(cluster["controller_id"], 1);
    assert_eq!(cluster["topic_count"], 1);

    let (_, brokers) = call(&server, "describe_brokers", json!({})).await;
    assert_eq!(brokers.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_produce_reuses_one_producer() {
    let (factory, server) = setup();
    let tracker = factory.shared_producer();

    for i in 0..3 {
        let (is_error, outcome) = call(
            &server,
            "produce_message",
            json!({
                "topic_name": "orders",
                "value": format!("payload-{}", i),
                "key": "k",
                "headers": { "source": "test" }
            }),
        )
        .await;
        assert!(!is_error);
        assert_eq!(outcome["detail"], "Message sent successfully");
    }

    assert_eq!(factory.producers_created(), 1);
    assert_eq!(tracker.sent().len(), 3);
    assert_eq!(tracker.flushes(), 3);
}

#[tokio::test]
async fn test_produce_failure_is_reported() {
    let (factory, server) = setup();
    factory.shared_producer().fail_sends("Local: Queue full");

    let (is_error, outcome) = call(
        &server,
        "produce_message",
        json!({ "topic_name": "orders", "value": "v" }),
    )
    .await;
    assert!(is_error);
    assert!(outcome["detail"]
        .as_str()
        .unwrap()
        .starts_with("Failed to produce message"));
}

#[tokio::test]
async fn test_consume_through_tool() {
    let (factory, server) = setup();
    let consumer = MockConsumer::new()
        .with_topic(&[0])
        .with_watermarks(0, 0, 2)
        .push_record(text_record("orders", 0, 0, Some("a"), "first"))
        .push_record(text_record("orders", 0, 1, None, "second"));
    let tracker = consumer.tracker();
    factory.push_consumer(consumer);

    let (is_error, records) = call(
        &server,
        "consume_messages",
        json!({ "topic_name": "orders", "limit": 2, "timeout": 1.0 }),
    )
    .await;
    assert!(!is_error);
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["key"], "a");
    assert_eq!(records[1]["key"], Value::Null);
    assert_eq!(records[1]["value"], "second");
    assert_eq!(tracker.close_calls(), 1);
}

#[tokio::test]
async fn test_consume_missing_topic_is_marker() {
    let (factory, server) = setup();
    let consumer = MockConsumer::new();
    let tracker = consumer.tracker();
    factory.push_consumer(consumer);

    let (is_error, report) = call(
        &server,
        "consume_messages",
        json!({ "topic_name": "ghost", "timeout": 0.5 }),
    )
    .await;
    assert!(is_error);
    assert_eq!(report["error"], "Topic 'ghost' not found");
    assert_eq!(tracker.close_calls(), 1);
}

/// Consumer-protocol assignment for one topic
fn assignment(topic: &str, partitions: &[i32]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_i16(0);
    buf.put_i32(1);
    buf.put_i16(topic.len() as i16);
    buf.put_slice(topic.as_bytes());
    buf.put_i32(partitions.len() as i32);
    for &partition in partitions {
        buf.put_i32(partition);
    }
    buf.put_i32(-1);
    buf.freeze()
}

#[tokio::test]
async fn test_consumer_groups() {
    let (factory, server) = setup();
    factory.cluster().add_group(GroupInfo {
        group_id: "billing".to_string(),
        state: "Stable".to_string(),
        protocol_type: "consumer".to_string(),
        protocol: "range".to_string(),
        coordinator: Some(1),
        members: vec![GroupMemberInfo {
            member_id: "member-1".to_string(),
            client_id: "billing-app".to_string(),
            host: "/10.0.0.7".to_string(),
            assignment: Some(assignment("invoices", &[0, 2])),
        }],
    });
    factory.cluster().add_group(GroupInfo {
        group_id: "legacy".to_string(),
        state: String::new(),
        protocol_type: String::new(),
        protocol: String::new(),
        coordinator: None,
        members: Vec::new(),
    });

    let (_, groups) = call(&server, "list_consumer_groups", json!({})).await;
    assert_eq!(
        groups,
        json!([
            { "group_id": "billing", "is_simple": false, "state": "Stable" },
            { "group_id": "legacy", "is_simple": true, "state": "UNKNOWN" }
        ])
    );

    let (is_error, group) =
        call(&server, "describe_consumer_group", json!({ "group_id": "billing" })).await;
    assert!(!is_error);
    assert_eq!(group["protocol"], "range");
    assert_eq!(group["coordinator"]["id"], 1);
    assert_eq!(
        group["members"][0]["assignment"],
        json!([
            { "topic": "invoices", "partition": 0 },
            { "topic": "invoices", "partition": 2 }
        ])
    );

    let (is_error, missing) =
        call(&server, "describe_consumer_group", json!({ "group_id": "nobody" })).await;
    assert!(is_error);
    assert_eq!(
        missing["error"],
        "Failed to describe group 'nobody': group not found"
    );
}

#[tokio::test]
async fn test_bad_arguments_are_invalid_params() {
    let (_factory, server) = setup();
    let request: JsonRpcRequest = serde_json::from_value(json!({
        "jsonrpc": "2.0",
        "id": 9,
        "method": "tools/call",
        "params": { "name": "create_partitions", "arguments": { "topic_name": "orders" } }
    }))
    .unwrap();

    let response = serde_json::to_value(server.handle_message(request).await.unwrap()).unwrap();
    assert_eq!(response["error"]["code"], -32602);
}
