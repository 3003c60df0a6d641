//! Model Context Protocol (MCP) server
//!
//! Exposes the admin, cluster, consumer and producer operations as MCP tools
//! over JSON-RPC 2.0, so an agent can inspect and manage a Kafka cluster
//! through tool calls.
//!
//! ## Transports
//!
//! - stdio: newline-delimited JSON-RPC on stdin/stdout (desktop agents)
//! - HTTP: JSON-RPC POST endpoint plus an SSE stream of responses

pub mod server;
pub mod tools;
pub mod transport;

use crate::context::KafkaContext;
use crate::error::{KafkaMcpError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// MCP protocol revision spoken by this server
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name reported in `serverInfo`
pub const SERVER_NAME: &str = "kafka-mcp";

// ─── JSON-RPC Types ─────────────────────────────────────────────────

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl JsonRpcRequest {
    /// Notifications carry no id and expect no response
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<serde_json::Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
        }
    }
}

// ─── MCP Types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(default, rename = "listChanged")]
    pub list_changed: bool,
}

/// MCP tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// MCP tool call result content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolResultContent {
    #[serde(rename = "text")]
    Text { text: String },
}

/// Result of calling a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolResultContent>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Render `value` as pretty-printed JSON text
    pub fn json<T: Serialize>(value: &T, is_error: bool) -> Result<Self> {
        Ok(Self {
            content: vec![ToolResultContent::Text {
                text: serde_json::to_string_pretty(value)?,
            }],
            is_error,
        })
    }

    /// Text of the first content block
    pub fn text(&self) -> &str {
        match self.content.first() {
            Some(ToolResultContent::Text { text }) => text,
            None => "",
        }
    }
}

// ─── MCP Server ─────────────────────────────────────────────────────

/// Dispatches JSON-RPC requests to the tool surface
pub struct McpServer {
    ctx: Arc<KafkaContext>,
    server_info: ServerInfo,
    capabilities: ServerCapabilities,
    client_info: RwLock<Option<ClientInfo>>,
}

impl McpServer {
    pub fn new(ctx: Arc<KafkaContext>) -> Self {
        Self {
            ctx,
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            client_info: RwLock::new(None),
        }
    }

    pub fn context(&self) -> &Arc<KafkaContext> {
        &self.ctx
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// The client that last sent `initialize`, if any
    pub async fn client_info(&self) -> Option<ClientInfo> {
        self.client_info.read().await.clone()
    }

    /// Handle one incoming message; notifications produce no response
    pub async fn handle_message(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "Received notification");
            return None;
        }
        Some(self.handle_request(request).await)
    }

    /// Handle an incoming JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        if request.jsonrpc != "2.0" {
            let e = KafkaMcpError::Protocol(format!(
                "Unsupported JSON-RPC version '{}'",
                request.jsonrpc
            ));
            return JsonRpcResponse::error(request.id, e.jsonrpc_code(), e.to_string());
        }

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params).await,
            "tools/list" => Ok(self.handle_tools_list()),
            "tools/call" => self.handle_tools_call(request.params).await,
            "ping" => Ok(serde_json::json!({})),
            method if method.starts_with("notifications/") => Ok(serde_json::json!({})),
            method => {
                return JsonRpcResponse::error(
                    request.id,
                    -32601,
                    format!("Method not found: {}", method),
                )
            }
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => {
                warn!(method = %request.method, error = %e, "Request failed");
                JsonRpcResponse::error(request.id, e.jsonrpc_code(), e.to_string())
            }
        }
    }

    async fn handle_initialize(&self, params: serde_json::Value) -> Result<serde_json::Value> {
        let client_info: Option<ClientInfo> =
            serde_json::from_value(params.get("clientInfo").cloned().unwrap_or_default()).ok();
        if let Some(client) = &client_info {
            info!(client = %client.name, version = %client.version, "MCP client connected");
        }
        *self.client_info.write().await = client_info;

        Ok(serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": self.capabilities,
            "serverInfo": self.server_info,
        }))
    }

    fn handle_tools_list(&self) -> serde_json::Value {
        serde_json::json!({ "tools": tools::get_tool_definitions() })
    }

    async fn handle_tools_call(&self, params: serde_json::Value) -> Result<serde_json::Value> {
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| KafkaMcpError::validation("Missing tool name"))?;
        let arguments = params.get("arguments").cloned().unwrap_or_default();

        let result = tools::execute_tool(name, arguments, &self.ctx).await?;
        Ok(serde_json::to_value(result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClusterEndpoint, Timeouts};
    use crate::testing::MockClientFactory;

    fn server() -> McpServer {
        let ctx = KafkaContext::with_factory(
            ClusterEndpoint::new("localhost:9092", "test").unwrap(),
            Timeouts::default(),
            Arc::new(MockClientFactory::new()),
        );
        McpServer::new(Arc::new(ctx))
    }

    #[test]
    fn test_jsonrpc_request_deserialize() {
        let json = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
        let req: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.method, "initialize");
        assert!(!req.is_notification());
    }

    #[test]
    fn test_notification_has_no_id() {
        let json = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        let req: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert!(req.is_notification());
        assert!(req.params.is_null());
    }

    #[test]
    fn test_jsonrpc_response_error() {
        let resp =
            JsonRpcResponse::error(Some(serde_json::json!(1)), -32600, "Invalid request".into());
        assert!(resp.result.is_none());
        assert_eq!(resp.error.as_ref().unwrap().code, -32600);
    }

    #[test]
    fn test_tool_result_is_pretty_json() {
        let result = ToolCallResult::json(&serde_json::json!({"a": 1}), false).unwrap();
        assert_eq!(result.text(), "{\n  \"a\": 1\n}");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["isError"], false);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version_is_invalid_request() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"1.0","id":3,"method":"ping"}"#).unwrap();
        let resp = server().handle_request(req).await;
        let error = resp.error.unwrap();
        assert_eq!(error.code, -32600);
        assert!(error.message.contains("Unsupported JSON-RPC version '1.0'"));
        assert_eq!(resp.id, Some(serde_json::json!(3)));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let req: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":4,"method":"resources/list"}"#).unwrap();
        let resp = server().handle_request(req).await;
        assert_eq!(resp.error.unwrap().code, -32601);
    }
}
