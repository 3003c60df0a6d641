//! kafka-mcp - Kafka administration and inspection tools for MCP agents

use clap::Parser;
use kafka_mcp::config::{merge_config_with_args, ConfigFile, Transport};
use kafka_mcp::mcp::{server, transport::StdioTransport, McpServer};
use kafka_mcp::{KafkaContext, KafkaMcpError, Result, ServerArgs, ServerConfig};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    if let Err(e) = run() {
        eprintln!("kafka-mcp failed: {e}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<()> {
    let mut args = ServerArgs::parse();

    if args.generate_config {
        println!("{}", ConfigFile::generate_example());
        return Ok(());
    }

    // Load configuration file if specified or from default locations
    let config_file = match args.config {
        Some(ref path) => Some(ConfigFile::load(path)?),
        None => ConfigFile::load_default(),
    };

    // CLI and environment take precedence over the file
    if let Some(ref config) = config_file {
        args = merge_config_with_args(args, config);
    }

    // stdout carries the JSON-RPC stream, so logs always go to stderr
    let log_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
        .with(log_filter)
        .init();

    let properties = config_file
        .map(|file| file.client.properties)
        .unwrap_or_default();
    let config = match ServerConfig::from_args_with_properties(args, properties) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to create configuration");
            return Err(e);
        }
    };

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return Err(KafkaMcpError::Internal(format!(
                "Failed to create Tokio runtime: {}",
                e
            )));
        }
    };

    runtime.block_on(serve(config))
}

async fn serve(config: ServerConfig) -> Result<()> {
    info!(
        bootstrap = config.endpoint.bootstrap_servers(),
        client_id = config.endpoint.client_id(),
        transport = ?config.transport,
        version = env!("CARGO_PKG_VERSION"),
        "Starting kafka-mcp"
    );

    let ctx = Arc::new(KafkaContext::new(&config));
    let mcp = Arc::new(McpServer::new(ctx));

    match config.transport {
        Transport::Stdio => StdioTransport::new(mcp).run().await,
        Transport::Http => server::serve(mcp, config.http_addr).await,
    }
}
