//! Administrative operations
//!
//! Every mutating action follows the same cycle: validate and build the typed
//! request, submit it as one batch to a fresh admin handle, await the
//! per-target completion and translate it into an [`OperationOutcome`].
//! Validation failures and missing resources are reported as data. Only
//! connectivity faults surface as `Err`.

pub mod resource;

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::client::{Completion, ConfigAlteration, PartitionIncrease, PartitionMetadata, TopicSpec};
use crate::context::KafkaContext;
use crate::error::{KafkaMcpError, Result};
use resource::ResourceDescriptor;

// ─── Outcomes ───────────────────────────────────────────────────────

/// Result of one admin submit/await cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationOutcome {
    Succeeded { target: String, detail: String },
    Failed { target: String, detail: String },
}

impl OperationOutcome {
    pub fn succeeded(target: impl Into<String>, detail: impl Into<String>) -> Self {
        OperationOutcome::Succeeded {
            target: target.into(),
            detail: detail.into(),
        }
    }

    pub fn failed(target: impl Into<String>, detail: impl Into<String>) -> Self {
        OperationOutcome::Failed {
            target: target.into(),
            detail: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Succeeded { .. })
    }

    pub fn target(&self) -> &str {
        match self {
            OperationOutcome::Succeeded { target, .. } | OperationOutcome::Failed { target, .. } => {
                target
            }
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            OperationOutcome::Succeeded { detail, .. } | OperationOutcome::Failed { detail, .. } => {
                detail
            }
        }
    }
}

/// The admin actions that report an [`OperationOutcome`]
#[derive(Debug, Clone, Copy)]
enum AdminAction<'a> {
    CreateTopic,
    DeleteTopic,
    CreatePartitions { new_total_count: usize },
    AlterConfigs { resource: &'a ResourceDescriptor },
}

impl AdminAction<'_> {
    fn succeeded(&self, target: &str) -> String {
        match self {
            AdminAction::CreateTopic => format!("Topic '{}' created successfully", target),
            AdminAction::DeleteTopic => format!("Topic '{}' deleted successfully", target),
            AdminAction::CreatePartitions { new_total_count } => {
                format!("Partitions for '{}' increased to {}", target, new_total_count)
            }
            AdminAction::AlterConfigs { resource } => {
                format!("Configs for {} updated successfully", resource)
            }
        }
    }

    fn failed(&self, target: &str, error: &str) -> String {
        match self {
            AdminAction::CreateTopic => format!("Failed to create topic '{}': {}", target, error),
            AdminAction::DeleteTopic => format!("Failed to delete topic '{}': {}", target, error),
            AdminAction::CreatePartitions { .. } => {
                format!("Failed to create partitions for '{}': {}", target, error)
            }
            AdminAction::AlterConfigs { resource } => {
                format!("Failed to alter configs for {}: {}", resource, error)
            }
        }
    }
}

/// Translate the completion for `target` into an outcome.
///
/// A batch of one that reports no completion yields a generic failure rather
/// than an error.
fn settle(action: AdminAction<'_>, target: &str, completions: Vec<Completion<()>>) -> OperationOutcome {
    let completion = completions
        .into_iter()
        .reduce(|found, next| if found.target == target { found } else { next });

    let outcome = match completion {
        Some(Completion {
            target: done,
            result: Ok(()),
        }) => OperationOutcome::succeeded(done.clone(), action.succeeded(&done)),
        Some(Completion {
            target: done,
            result: Err(error),
        }) => OperationOutcome::failed(done.clone(), action.failed(&done, &error)),
        None => {
            warn!(resource = target, "Admin request completed without a per-target result");
            OperationOutcome::failed(target, "Unknown error")
        }
    };

    info!(
        resource = outcome.target(),
        outcome = if outcome.is_success() { "succeeded" } else { "failed" },
        "{}",
        outcome.detail()
    );
    outcome
}

fn validation_detail(err: KafkaMcpError) -> String {
    match err {
        KafkaMcpError::Validation(detail) => detail,
        other => other.to_string(),
    }
}

// ─── Topics ─────────────────────────────────────────────────────────

/// Names of every topic visible in one metadata snapshot
pub async fn list_topics(ctx: &KafkaContext) -> Result<Vec<String>> {
    let admin = ctx.admin()?;
    let metadata = admin.fetch_metadata(None, ctx.timeouts().metadata).await?;
    Ok(metadata.topics.into_iter().map(|t| t.name).collect())
}

/// Partition layout of one topic, or a not-found marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TopicReport {
    Found {
        name: String,
        partitions: Vec<PartitionMetadata>,
        partition_count: usize,
    },
    NotFound {
        error: String,
    },
}

impl TopicReport {
    pub fn is_found(&self) -> bool {
        matches!(self, TopicReport::Found { .. })
    }
}

pub async fn describe_topic(ctx: &KafkaContext, topic_name: &str) -> Result<TopicReport> {
    let admin = ctx.admin()?;
    let metadata = admin
        .fetch_metadata(Some(topic_name), ctx.timeouts().metadata)
        .await?;

    let Some(topic) = metadata.topic(topic_name) else {
        debug!(topic = topic_name, "Topic not present in metadata");
        return Ok(TopicReport::NotFound {
            error: format!("Topic '{}' not found", topic_name),
        });
    };

    let mut partitions = topic.partitions.clone();
    partitions.sort_by_key(|p| p.id);
    Ok(TopicReport::Found {
        name: topic.name.clone(),
        partition_count: partitions.len(),
        partitions,
    })
}

/// Topic creation parameters as supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct CreateTopicRequest {
    pub topic_name: String,
    /// Defaults to 1
    pub num_partitions: Option<i32>,
    /// Defaults to 1
    pub replication_factor: Option<i32>,
    pub config: Option<BTreeMap<String, String>>,
}

impl CreateTopicRequest {
    pub fn new(topic_name: impl Into<String>) -> Self {
        Self {
            topic_name: topic_name.into(),
            ..Default::default()
        }
    }

    fn into_spec(self) -> std::result::Result<TopicSpec, String> {
        if self.topic_name.trim().is_empty() {
            return Err("topic name must not be empty".to_string());
        }
        let num_partitions = self.num_partitions.unwrap_or(1);
        if num_partitions < 1 {
            return Err(format!("num_partitions must be >= 1, got {}", num_partitions));
        }
        let replication_factor = self.replication_factor.unwrap_or(1);
        if replication_factor < 1 {
            return Err(format!(
                "replication_factor must be >= 1, got {}",
                replication_factor
            ));
        }
        Ok(TopicSpec {
            name: self.topic_name,
            num_partitions,
            replication_factor,
            config: self.config.unwrap_or_default(),
        })
    }
}

pub async fn create_topic(ctx: &KafkaContext, request: CreateTopicRequest) -> Result<OperationOutcome> {
    let target = request.topic_name.clone();
    let spec = match request.into_spec() {
        Ok(spec) => spec,
        Err(reason) => {
            return Ok(OperationOutcome::failed(
                &target,
                AdminAction::CreateTopic.failed(&target, &reason),
            ))
        }
    };

    debug!(
        topic = %spec.name,
        partitions = spec.num_partitions,
        replication = spec.replication_factor,
        "Creating topic"
    );
    let admin = ctx.admin()?;
    let completions = admin.create_topics(std::slice::from_ref(&spec)).await?;
    Ok(settle(AdminAction::CreateTopic, &target, completions))
}

/// Delete a topic. A missing topic surfaces as a broker-reported failure.
pub async fn delete_topic(ctx: &KafkaContext, topic_name: &str) -> Result<OperationOutcome> {
    let admin = ctx.admin()?;
    let completions = admin.delete_topics(&[topic_name.to_string()]).await?;
    Ok(settle(AdminAction::DeleteTopic, topic_name, completions))
}

/// Grow `topic_name` to `new_total_count` partitions.
///
/// The count is a new total, not a delta. Shrinking is left to the broker to
/// reject.
pub async fn create_partitions(
    ctx: &KafkaContext,
    topic_name: &str,
    new_total_count: i64,
) -> Result<OperationOutcome> {
    let action = AdminAction::CreatePartitions {
        new_total_count: usize::try_from(new_total_count).unwrap_or(0),
    };
    if new_total_count < 1 {
        return Ok(OperationOutcome::failed(
            topic_name,
            action.failed(
                topic_name,
                &format!("new_total_count must be >= 1, got {}", new_total_count),
            ),
        ));
    }

    let admin = ctx.admin()?;
    let increase = PartitionIncrease {
        topic: topic_name.to_string(),
        new_total_count: usize::try_from(new_total_count).unwrap_or(usize::MAX),
    };
    let completions = admin.create_partitions(&[increase]).await?;
    Ok(settle(action, topic_name, completions))
}

// ─── Configs ────────────────────────────────────────────────────────

/// One described config entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigValue {
    pub value: Option<String>,
    pub source: String,
    pub is_read_only: bool,
    pub is_default: bool,
}

/// Config entries keyed by name, or an error marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigsReport {
    Entries(BTreeMap<String, ConfigValue>),
    Error { error: String },
}

impl ConfigsReport {
    pub fn is_error(&self) -> bool {
        matches!(self, ConfigsReport::Error { .. })
    }

    pub fn entry(&self, name: &str) -> Option<&ConfigValue> {
        match self {
            ConfigsReport::Entries(entries) => entries.get(name),
            ConfigsReport::Error { .. } => None,
        }
    }
}

pub async fn describe_configs(
    ctx: &KafkaContext,
    resource_type: &str,
    resource_name: &str,
) -> Result<ConfigsReport> {
    let resource = match ResourceDescriptor::parse(resource_type, resource_name) {
        Ok(resource) => resource,
        Err(err) => {
            return Ok(ConfigsReport::Error {
                error: validation_detail(err),
            })
        }
    };

    let admin = ctx.admin()?;
    let completions = admin.describe_configs(std::slice::from_ref(&resource)).await?;

    let Some(completion) = completions.into_iter().next() else {
        return Ok(ConfigsReport::Error {
            error: format!("Failed to describe configs for {}: Unknown error", resource_name),
        });
    };

    match completion.result {
        Ok(entries) => {
            debug!(resource = %resource, entries = entries.len(), "Described configs");
            Ok(ConfigsReport::Entries(
                entries
                    .into_iter()
                    .map(|entry| {
                        (
                            entry.name,
                            ConfigValue {
                                value: entry.value,
                                source: entry.source,
                                is_read_only: entry.is_read_only,
                                is_default: entry.is_default,
                            },
                        )
                    })
                    .collect(),
            ))
        }
        Err(error) => {
            warn!(resource = %resource, %error, "Describe configs failed");
            Ok(ConfigsReport::Error {
                error: format!("Failed to describe configs for {}: {}", resource_name, error),
            })
        }
    }
}

/// Apply `configs` to one resource as a single alter request
pub async fn alter_configs(
    ctx: &KafkaContext,
    resource_type: &str,
    resource_name: &str,
    configs: BTreeMap<String, String>,
) -> Result<OperationOutcome> {
    let resource = match ResourceDescriptor::parse(resource_type, resource_name) {
        Ok(resource) => resource,
        Err(err) => return Ok(OperationOutcome::failed(resource_name, validation_detail(err))),
    };

    let admin = ctx.admin()?;
    let alteration = ConfigAlteration {
        resource: resource.clone(),
        entries: configs,
    };
    let completions = admin.alter_configs(std::slice::from_ref(&alteration)).await?;
    Ok(settle(
        AdminAction::AlterConfigs {
            resource: &resource,
        },
        resource.name(),
        completions,
    ))
}
