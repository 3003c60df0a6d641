#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

//! # kafka-mcp
//!
//! kafka-mcp exposes administrative, producing and consuming operations on a
//! Kafka cluster as Model Context Protocol tools, so an agent can inspect
//! topology, manage topics and configuration, publish records and read back
//! bounded windows of records without speaking the Kafka protocol itself.
//!
//! ## Running
//!
//! ```bash
//! # stdio transport, for agents that spawn the server
//! $ KAFKA_BOOTSTRAP_SERVERS=localhost:9092 kafka-mcp
//!
//! # HTTP transport with an SSE response stream
//! $ kafka-mcp --bootstrap-servers localhost:9092 --transport http --http-addr 127.0.0.1:8765
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use kafka_mcp::config::ClusterEndpoint;
//! use kafka_mcp::{admin, consumer, KafkaContext, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> kafka_mcp::Result<()> {
//!     let endpoint = ClusterEndpoint::new("localhost:9092", "kafka-mcp")?;
//!     let ctx = KafkaContext::new(&ServerConfig::for_endpoint(endpoint));
//!
//!     let topics = admin::list_topics(&ctx).await?;
//!     println!("{:?}", topics);
//!
//!     let request = consumer::ConsumeRequest::new("events").offset_spec("latest").limit(5);
//!     let outcome = consumer::consume_messages(&ctx, request).await?;
//!     println!("{} records", outcome.records().len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`config`]: endpoint and server configuration, CLI arguments, TOML file
//! - [`client`]: boundary traits to the broker client and the librdkafka implementation
//! - [`context`]: the per-process [`KafkaContext`] passed to every operation
//! - [`admin`]: topic, partition and config administration
//! - [`cluster`]: cluster and broker introspection
//! - [`consumer`]: bounded consumption and consumer group inspection
//! - [`producer`]: publishing records
//! - [`mcp`]: JSON-RPC tool surface with stdio and HTTP transports
//! - [`testing`]: in-process doubles of the client boundary
//! - [`error`]: error types and Result alias

pub mod admin;
pub mod client;
pub mod cluster;
pub mod config;
pub mod consumer;
pub mod context;
pub mod error;
pub mod mcp;
pub mod producer;
pub mod testing;

pub use admin::OperationOutcome;
pub use config::{ClusterEndpoint, ServerArgs, ServerConfig};
pub use context::KafkaContext;
pub use error::{KafkaMcpError, Result};
