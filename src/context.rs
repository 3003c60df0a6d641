//! Per-process Kafka context
//!
//! [`KafkaContext`] is built once at startup and handed to every operation.
//! It owns the endpoint configuration, the factory that creates client handles
//! and the one producer shared by all publish calls.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

use crate::client::{
    AdminHandle, ClientFactory, ConsumerHandle, KafkaClientFactory, ProducerHandle, ResetPolicy,
};
use crate::config::{ClusterEndpoint, ServerConfig, Timeouts};
use crate::consumer::{Clock, SystemClock};
use crate::error::Result;

pub struct KafkaContext {
    endpoint: ClusterEndpoint,
    timeouts: Timeouts,
    factory: Arc<dyn ClientFactory>,
    clock: Arc<dyn Clock>,
    producer: Mutex<Option<Arc<dyn ProducerHandle>>>,
}

impl KafkaContext {
    /// Context backed by librdkafka handles for the configured cluster
    pub fn new(config: &ServerConfig) -> Self {
        let factory = KafkaClientFactory::new(config.endpoint.clone(), config.timeouts.operation);
        Self::with_factory(config.endpoint.clone(), config.timeouts, Arc::new(factory))
    }

    /// Context over an arbitrary handle factory
    pub fn with_factory(
        endpoint: ClusterEndpoint,
        timeouts: Timeouts,
        factory: Arc<dyn ClientFactory>,
    ) -> Self {
        Self {
            endpoint,
            timeouts,
            factory,
            clock: Arc::new(SystemClock),
            producer: Mutex::new(None),
        }
    }

    /// Replace the clock that bounds consumption deadlines
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn endpoint(&self) -> &ClusterEndpoint {
        &self.endpoint
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// A fresh admin handle
    pub fn admin(&self) -> Result<Box<dyn AdminHandle>> {
        self.factory.admin()
    }

    /// A fresh consumer handle under `group_id`
    pub fn consumer(&self, group_id: &str, reset: ResetPolicy) -> Result<Box<dyn ConsumerHandle>> {
        self.factory.consumer(group_id, reset)
    }

    /// The shared producer, created on first use.
    ///
    /// A failed creation is returned to the caller and retried on the next
    /// call. Once created the producer is never replaced.
    pub fn producer(&self) -> Result<Arc<dyn ProducerHandle>> {
        let mut slot = self.producer.lock();
        if let Some(producer) = slot.as_ref() {
            return Ok(Arc::clone(producer));
        }

        let producer: Arc<dyn ProducerHandle> = Arc::from(self.factory.producer()?);
        info!(
            bootstrap = self.endpoint.bootstrap_servers(),
            client_id = self.endpoint.client_id(),
            "Created shared producer"
        );
        *slot = Some(Arc::clone(&producer));
        Ok(producer)
    }
}

impl std::fmt::Debug for KafkaContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaContext")
            .field("endpoint", &self.endpoint)
            .field("timeouts", &self.timeouts)
            .field("producer_ready", &self.producer.lock().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockClientFactory;

    fn context(factory: Arc<MockClientFactory>) -> KafkaContext {
        KafkaContext::with_factory(
            ClusterEndpoint::new("localhost:9092", "test").unwrap(),
            Timeouts::default(),
            factory,
        )
    }

    #[test]
    fn test_producer_is_created_once() {
        let factory = Arc::new(MockClientFactory::new());
        let ctx = context(Arc::clone(&factory));

        let first = ctx.producer().unwrap();
        let second = ctx.producer().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.producers_created(), 1);
    }

    #[test]
    fn test_admin_handles_are_fresh() {
        let factory = Arc::new(MockClientFactory::new());
        let ctx = context(Arc::clone(&factory));

        ctx.admin().unwrap();
        ctx.admin().unwrap();
        assert_eq!(factory.admins_created(), 2);
    }

    #[test]
    fn test_failed_producer_creation_propagates() {
        let factory = Arc::new(MockClientFactory::new());
        factory.fail_producer_creation("Local: Invalid argument");
        let ctx = context(Arc::clone(&factory));

        let err = ctx.producer().err().unwrap();
        assert!(err.is_connectivity());
    }
}
