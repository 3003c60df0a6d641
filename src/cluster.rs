//! Read-only cluster introspection over one metadata snapshot

use serde::Serialize;

use crate::client::BrokerInfo;
use crate::context::KafkaContext;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterSummary {
    pub cluster_id: Option<String>,
    pub controller_id: Option<i32>,
    pub brokers: Vec<BrokerInfo>,
    pub topic_count: usize,
}

pub async fn describe_cluster(ctx: &KafkaContext) -> Result<ClusterSummary> {
    let admin = ctx.admin()?;
    let metadata = admin.fetch_metadata(None, ctx.timeouts().metadata).await?;

    Ok(ClusterSummary {
        cluster_id: metadata.cluster_id,
        controller_id: metadata.controller_id,
        topic_count: metadata.topics.len(),
        brokers: metadata.brokers,
    })
}

pub async fn describe_brokers(ctx: &KafkaContext) -> Result<Vec<BrokerInfo>> {
    let admin = ctx.admin()?;
    let metadata = admin.fetch_metadata(None, ctx.timeouts().metadata).await?;
    Ok(metadata.brokers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serializes_missing_controller_as_null() {
        let summary = ClusterSummary {
            cluster_id: Some("abc".into()),
            controller_id: None,
            brokers: vec![BrokerInfo {
                id: 1,
                host: "localhost".into(),
                port: 9092,
            }],
            topic_count: 0,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["controller_id"].is_null());
        assert_eq!(json["brokers"][0]["port"], 9092);
    }
}
