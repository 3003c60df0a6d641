//! MCP tool definitions and dispatch
//!
//! Topic administration:
//! - list_topics, describe_topic, create_topic, delete_topic, create_partitions
//!
//! Configuration:
//! - describe_configs, alter_configs
//!
//! Cluster:
//! - describe_cluster, describe_brokers
//!
//! Consumers and producers:
//! - list_consumer_groups, describe_consumer_group, consume_messages, produce_message

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::admin::resource::ResourceKind;
use crate::admin::{self, CreateTopicRequest};
use crate::cluster;
use crate::config::{DEFAULT_CONSUME_LIMIT, DEFAULT_CONSUME_TIMEOUT_SECS, DEFAULT_OFFSET_SPEC};
use crate::consumer::{self, timeout_from_secs, ConsumeOutcome, ConsumeRequest, GroupReport, OffsetSpec};
use crate::context::KafkaContext;
use crate::error::{KafkaMcpError, Result};
use crate::mcp::{ToolCallResult, ToolDefinition};
use crate::producer::{self, ProduceRequest};

fn tool(name: &str, description: &str, input_schema: serde_json::Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn no_arguments() -> serde_json::Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

fn topic_name_property() -> serde_json::Value {
    serde_json::json!({ "type": "string", "description": "Name of the topic" })
}

fn string_map_property(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "description": description,
        "additionalProperties": { "type": "string" }
    })
}

fn resource_type_property() -> serde_json::Value {
    let kinds: Vec<&str> = ResourceKind::ALL.iter().map(ResourceKind::as_str).collect();
    serde_json::json!({
        "type": "string",
        "description": format!("Kind of resource, one of {} (case insensitive)", kinds.join(", "))
    })
}

/// Return all available MCP tool definitions
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        tool(
            "list_topics",
            "Returns a list of all topic names in the cluster.",
            no_arguments(),
        ),
        tool(
            "describe_topic",
            "Returns partition, leader, replica and in-sync replica details for a topic.",
            serde_json::json!({
                "type": "object",
                "properties": { "topic_name": topic_name_property() },
                "required": ["topic_name"]
            }),
        ),
        tool(
            "create_topic",
            "Creates a new topic.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "topic_name": topic_name_property(),
                    "num_partitions": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Number of partitions (default: 1)"
                    },
                    "replication_factor": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Replication factor (default: 1)"
                    },
                    "config": string_map_property("Optional topic configuration, e.g. {\"retention.ms\": \"60000\"}")
                },
                "required": ["topic_name"]
            }),
        ),
        tool(
            "delete_topic",
            "Deletes a topic.",
            serde_json::json!({
                "type": "object",
                "properties": { "topic_name": topic_name_property() },
                "required": ["topic_name"]
            }),
        ),
        tool(
            "create_partitions",
            "Increases the number of partitions for a topic. Partition count can only be increased, not decreased.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "topic_name": topic_name_property(),
                    "new_total_count": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "New total number of partitions (not a delta)"
                    }
                },
                "required": ["topic_name", "new_total_count"]
            }),
        ),
        tool(
            "describe_configs",
            "Get configs for a topic, broker or group, with source, read-only and default flags per entry.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "resource_type": resource_type_property(),
                    "resource_name": {
                        "type": "string",
                        "description": "Topic name, numeric broker id, or group id"
                    }
                },
                "required": ["resource_type", "resource_name"]
            }),
        ),
        tool(
            "alter_configs",
            "Update configs for a topic, broker or group.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "resource_type": resource_type_property(),
                    "resource_name": {
                        "type": "string",
                        "description": "Topic name, numeric broker id, or group id"
                    },
                    "configs": string_map_property("Config key-value pairs to set")
                },
                "required": ["resource_type", "resource_name", "configs"]
            }),
        ),
        tool(
            "describe_cluster",
            "Returns the cluster id, controller id, brokers and topic count.",
            no_arguments(),
        ),
        tool(
            "describe_brokers",
            "Returns a list of brokers with their id, host and port.",
            no_arguments(),
        ),
        tool(
            "list_consumer_groups",
            "Lists all consumer groups with their state.",
            no_arguments(),
        ),
        tool(
            "describe_consumer_group",
            "Describes a consumer group: state, protocol, members and their partition assignments.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "group_id": { "type": "string", "description": "Consumer group id" }
                },
                "required": ["group_id"]
            }),
        ),
        tool(
            "consume_messages",
            "Reads a bounded number of messages from a topic without committing offsets. \
             offset_spec 'latest' returns the last `limit` messages of each partition.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "topic_name": topic_name_property(),
                    "partition": {
                        "type": "integer",
                        "description": "Read only this partition (default: all partitions)"
                    },
                    "offset_spec": {
                        "type": "string",
                        "description": "'earliest', 'latest', or an explicit offset; anything else reads only new messages",
                        "default": DEFAULT_OFFSET_SPEC
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "Maximum number of messages",
                        "default": DEFAULT_CONSUME_LIMIT
                    },
                    "timeout": {
                        "type": "number",
                        "minimum": 0,
                        "description": "Seconds to wait for messages",
                        "default": DEFAULT_CONSUME_TIMEOUT_SECS
                    }
                },
                "required": ["topic_name"]
            }),
        ),
        tool(
            "produce_message",
            "Produces a message to a topic and waits for delivery.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "topic_name": topic_name_property(),
                    "value": { "type": "string", "description": "Message value" },
                    "key": { "type": "string", "description": "Optional message key" },
                    "headers": string_map_property("Optional message headers")
                },
                "required": ["topic_name", "value"]
            }),
        ),
    ]
}

// ─── Arguments ──────────────────────────────────────────────────────

/// Accept a JSON object whose scalar values become strings.
///
/// Agents often send config values as numbers or booleans.
fn string_map<'de, D>(deserializer: D) -> std::result::Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    raw.map(|map| {
        map.into_iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => Ok((key, s)),
                serde_json::Value::Number(n) => Ok((key, n.to_string())),
                serde_json::Value::Bool(b) => Ok((key, b.to_string())),
                other => Err(<D::Error as serde::de::Error>::custom(format!(
                    "value for '{}' must be a string, number or boolean, got {}",
                    key, other
                ))),
            })
            .collect()
    })
    .transpose()
}

#[derive(Debug, Deserialize)]
struct TopicArgs {
    topic_name: String,
}

#[derive(Debug, Deserialize)]
struct CreateTopicArgs {
    topic_name: String,
    #[serde(default)]
    num_partitions: Option<i32>,
    #[serde(default)]
    replication_factor: Option<i32>,
    #[serde(default, deserialize_with = "string_map")]
    config: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct CreatePartitionsArgs {
    topic_name: String,
    new_total_count: i64,
}

#[derive(Debug, Deserialize)]
struct DescribeConfigsArgs {
    resource_type: String,
    resource_name: String,
}

#[derive(Debug, Deserialize)]
struct AlterConfigsArgs {
    resource_type: String,
    resource_name: String,
    #[serde(default, deserialize_with = "string_map")]
    configs: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct GroupArgs {
    group_id: String,
}

#[derive(Debug, Deserialize)]
struct ConsumeArgs {
    topic_name: String,
    #[serde(default)]
    partition: Option<i32>,
    #[serde(default)]
    offset_spec: Option<String>,
    #[serde(default)]
    limit: Option<i64>,
    #[serde(default)]
    timeout: Option<f64>,
}

impl ConsumeArgs {
    fn into_request(self) -> Result<ConsumeRequest> {
        let limit = match self.limit {
            None => DEFAULT_CONSUME_LIMIT,
            Some(limit) => usize::try_from(limit).map_err(|_| {
                KafkaMcpError::validation(format!("limit must be >= 0, got {}", limit))
            })?,
        };
        let timeout = timeout_from_secs(self.timeout.unwrap_or(DEFAULT_CONSUME_TIMEOUT_SECS))?;

        let mut request = ConsumeRequest::new(self.topic_name).limit(limit).timeout(timeout);
        request.partition = self.partition;
        request.offset_spec = self
            .offset_spec
            .as_deref()
            .map(OffsetSpec::parse)
            .unwrap_or_default();
        Ok(request)
    }
}

#[derive(Debug, Deserialize)]
struct ProduceArgs {
    topic_name: String,
    value: String,
    #[serde(default)]
    key: Option<String>,
    #[serde(default, deserialize_with = "string_map")]
    headers: Option<BTreeMap<String, String>>,
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: serde_json::Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        serde_json::json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| KafkaMcpError::validation(format!("Invalid arguments for {}: {}", tool, e)))
}

// ─── Dispatch ───────────────────────────────────────────────────────

/// Execute a tool by name
pub async fn execute_tool(
    name: &str,
    arguments: serde_json::Value,
    ctx: &KafkaContext,
) -> Result<ToolCallResult> {
    debug!(tool = name, "Executing tool");
    match name {
        "list_topics" => ToolCallResult::json(&admin::list_topics(ctx).await?, false),
        "describe_topic" => {
            let args: TopicArgs = parse_args(name, arguments)?;
            let report = admin::describe_topic(ctx, &args.topic_name).await?;
            ToolCallResult::json(&report, !report.is_found())
        }
        "create_topic" => {
            let args: CreateTopicArgs = parse_args(name, arguments)?;
            let outcome = admin::create_topic(
                ctx,
                CreateTopicRequest {
                    topic_name: args.topic_name,
                    num_partitions: args.num_partitions,
                    replication_factor: args.replication_factor,
                    config: args.config,
                },
            )
            .await?;
            ToolCallResult::json(&outcome, !outcome.is_success())
        }
        "delete_topic" => {
            let args: TopicArgs = parse_args(name, arguments)?;
            let outcome = admin::delete_topic(ctx, &args.topic_name).await?;
            ToolCallResult::json(&outcome, !outcome.is_success())
        }
        "create_partitions" => {
            let args: CreatePartitionsArgs = parse_args(name, arguments)?;
            let outcome =
                admin::create_partitions(ctx, &args.topic_name, args.new_total_count).await?;
            ToolCallResult::json(&outcome, !outcome.is_success())
        }
        "describe_configs" => {
            let args: DescribeConfigsArgs = parse_args(name, arguments)?;
            let report =
                admin::describe_configs(ctx, &args.resource_type, &args.resource_name).await?;
            ToolCallResult::json(&report, report.is_error())
        }
        "alter_configs" => {
            let args: AlterConfigsArgs = parse_args(name, arguments)?;
            let outcome = admin::alter_configs(
                ctx,
                &args.resource_type,
                &args.resource_name,
                args.configs.unwrap_or_default(),
            )
            .await?;
            ToolCallResult::json(&outcome, !outcome.is_success())
        }
        "describe_cluster" => ToolCallResult::json(&cluster::describe_cluster(ctx).await?, false),
        "describe_brokers" => ToolCallResult::json(&cluster::describe_brokers(ctx).await?, false),
        "list_consumer_groups" => {
            ToolCallResult::json(&consumer::list_consumer_groups(ctx).await?, false)
        }
        "describe_consumer_group" => {
            let args: GroupArgs = parse_args(name, arguments)?;
            let report = consumer::describe_consumer_group(ctx, &args.group_id).await?;
            ToolCallResult::json(&report, matches!(report, GroupReport::Error { .. }))
        }
        "consume_messages" => {
            let args: ConsumeArgs = parse_args(name, arguments)?;
            let outcome = consumer::consume_messages(ctx, args.into_request()?).await?;
            ToolCallResult::json(
                &outcome,
                matches!(outcome, ConsumeOutcome::TopicNotFound { .. }),
            )
        }
        "produce_message" => {
            let args: ProduceArgs = parse_args(name, arguments)?;
            let request = ProduceRequest {
                topic: args.topic_name,
                value: args.value,
                key: args.key,
                headers: args.headers.unwrap_or_default(),
            };
            let outcome = producer::produce_message(ctx, request).await?;
            ToolCallResult::json(&outcome, !outcome.is_success())
        }
        _ => Err(KafkaMcpError::UnknownTool(name.to_string())),
    }
}
