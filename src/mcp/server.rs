//! MCP HTTP Server using Axum
//!
//! Provides HTTP/SSE endpoints for the MCP protocol,
//! compatible with MCP client libraries.

use crate::error::Result;
use crate::mcp::{JsonRpcRequest, McpServer, PROTOCOL_VERSION, SERVER_NAME};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// State shared with Axum handlers
#[derive(Clone)]
pub struct McpApiState {
    pub server: Arc<McpServer>,
    pub event_tx: broadcast::Sender<String>,
}

/// Create the MCP API router
pub fn create_mcp_router(server: Arc<McpServer>) -> Router {
    let (event_tx, _) = broadcast::channel(256);
    let state = McpApiState { server, event_tx };

    Router::new()
        .route("/mcp/v1", post(handle_jsonrpc))
        .route("/mcp/v1/sse", get(handle_sse))
        .route("/mcp/v1/health", get(handle_health))
        .with_state(state)
}

/// Serve the MCP router on `addr` until Ctrl-C
pub async fn serve(server: Arc<McpServer>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "MCP HTTP transport listening");

    axum::serve(listener, create_mcp_router(server))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    info!("MCP HTTP transport stopped");
    Ok(())
}

/// Handle JSON-RPC POST requests
async fn handle_jsonrpc(
    State(state): State<McpApiState>,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    let Some(response) = state.server.handle_message(request).await else {
        return StatusCode::ACCEPTED.into_response();
    };

    // Broadcast response as SSE event for any listening clients
    if let Ok(json) = serde_json::to_string(&response) {
        let _ = state.event_tx.send(json);
    }

    Json(response).into_response()
}

/// Handle SSE connections for MCP responses
async fn handle_sse(
    State(state): State<McpApiState>,
) -> Sse<impl futures_util::Stream<Item = std::result::Result<Event, Infallible>>> {
    let mut rx = state.event_tx.subscribe();

    let stream = async_stream::stream! {
        let endpoint_msg = serde_json::json!({
            "endpoint": "/mcp/v1"
        });
        yield Ok(Event::default()
            .event("endpoint")
            .data(endpoint_msg.to_string()));

        loop {
            match rx.recv().await {
                Ok(data) => {
                    yield Ok(Event::default()
                        .event("message")
                        .data(data));
                }
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!("SSE client lagged by {} messages", count);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Health check endpoint for MCP server
async fn handle_health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "protocol": "mcp",
            "version": PROTOCOL_VERSION,
            "server": SERVER_NAME,
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClusterEndpoint, Timeouts};
    use crate::context::KafkaContext;
    use crate::testing::MockClientFactory;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn router() -> Router {
        let ctx = KafkaContext::with_factory(
            ClusterEndpoint::new("localhost:9092", "test").unwrap(),
            Timeouts::default(),
            Arc::new(MockClientFactory::new()),
        );
        create_mcp_router(Arc::new(McpServer::new(Arc::new(ctx))))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/mcp/v1")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::get("/mcp/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["server"], "kafka-mcp");
    }

    #[tokio::test]
    async fn test_tools_list_over_http() {
        let response = router()
            .oneshot(post_json(r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["result"]["tools"].as_array().unwrap().len(), 13);
    }

    #[tokio::test]
    async fn test_notification_is_accepted_without_body() {
        let response = router()
            .oneshot(post_json(
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
