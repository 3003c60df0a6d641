//! Publishing records through the shared producer

use bytes::Bytes;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::admin::OperationOutcome;
use crate::client::OutgoingRecord;
use crate::context::KafkaContext;
use crate::error::Result;

/// A text record to publish
#[derive(Debug, Clone, Default)]
pub struct ProduceRequest {
    pub topic: String,
    pub value: String,
    pub key: Option<String>,
    pub headers: BTreeMap<String, String>,
}

impl ProduceRequest {
    pub fn new(topic: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    fn into_record(self) -> OutgoingRecord {
        OutgoingRecord {
            topic: self.topic,
            // Empty strings are sent as absent, matching null keys and tombstones
            key: self.key.filter(|k| !k.is_empty()).map(Bytes::from),
            value: Some(self.value).filter(|v| !v.is_empty()).map(Bytes::from),
            headers: self.headers,
        }
    }
}

/// Publish one record and flush.
///
/// Send and flush failures are reported as a failed outcome. Failing to create
/// the shared producer is returned as an error.
pub async fn produce_message(ctx: &KafkaContext, request: ProduceRequest) -> Result<OperationOutcome> {
    let producer = ctx.producer()?;
    let flush_timeout = ctx.timeouts().flush;
    let topic = request.topic.clone();
    let record = request.into_record();

    let sent = tokio::task::spawn_blocking(move || {
        producer.send(&record)?;
        producer.flush(flush_timeout)
    })
    .await?;

    Ok(match sent {
        Ok(()) => {
            debug!(topic = %topic, "Message sent");
            OperationOutcome::succeeded(&topic, "Message sent successfully")
        }
        Err(e) => {
            warn!(topic = %topic, error = %e, "Produce failed");
            OperationOutcome::failed(&topic, format!("Failed to produce message: {}", e))
        }
    })
}
