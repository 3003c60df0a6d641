//! Stdio transport for MCP
//!
//! Reads newline-delimited JSON-RPC messages and writes one response line per
//! request. Notifications get no reply. Nothing else may be written to
//! stdout while this transport runs, so logging goes to stderr.

use crate::error::Result;
use crate::mcp::{JsonRpcRequest, JsonRpcResponse, McpServer};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

/// Stdio transport for MCP (used by desktop agents that spawn the server)
pub struct StdioTransport {
    server: Arc<McpServer>,
}

impl StdioTransport {
    pub fn new(server: Arc<McpServer>) -> Self {
        Self { server }
    }

    /// Run the stdio transport loop, reading JSON-RPC from stdin and writing to stdout
    pub async fn run(&self) -> Result<()> {
        info!("MCP stdio transport ready");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve requests from `reader` until EOF
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                debug!("stdin closed");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                Ok(request) => self.server.handle_message(request).await,
                Err(e) => Some(JsonRpcResponse::error(
                    None,
                    -32700,
                    format!("Parse error: {}", e),
                )),
            };

            if let Some(response) = response {
                let response_json = serde_json::to_string(&response)?;
                writer.write_all(response_json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClusterEndpoint, Timeouts};
    use crate::context::KafkaContext;
    use crate::testing::MockClientFactory;

    fn transport() -> StdioTransport {
        let ctx = KafkaContext::with_factory(
            ClusterEndpoint::new("localhost:9092", "test").unwrap(),
            Timeouts::default(),
            Arc::new(MockClientFactory::new()),
        );
        StdioTransport::new(Arc::new(McpServer::new(Arc::new(ctx))))
    }

    async fn exchange(input: &str) -> Vec<serde_json::Value> {
        let mut output = Vec::new();
        transport()
            .serve(BufReader::new(input.as_bytes()), &mut output)
            .await
            .unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_one_line_per_request() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"clientInfo":{"name":"t","version":"1"}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        );
        let responses = exchange(input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "kafka-mcp");
        assert_eq!(responses[1]["id"], 2);
    }

    #[tokio::test]
    async fn test_parse_error() {
        let responses = exchange("{not json}\n").await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["error"]["code"], -32700);
    }
}
