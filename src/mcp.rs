//! MCP Protocol Handler
//!
//! Implements JSON-RPC 2.0 over stdio for Model Context Protocol.
//! Reference: https://modelcontextprotocol.io/specification

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::ToolError;
use crate::tools::ToolRegistry;

/// Protocol revision advertised in `initialize`
pub const PROTOCOL_VERSION: &str = "2025-06-18";

pub const SERVER_NAME: &str = "Contoso Customer API as Tools";

pub const SERVER_INSTRUCTIONS: &str = "All customer, billing and knowledge data is accessible ONLY via the declared \
tools below. Return values follow the declared output schemas. Always call the most \
specific tool that answers the user's question.";

/// JSON-RPC 2.0 Request
#[derive(Debug, Clone, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    /// `None` only when the member is absent; an explicit `null` is still a request
    #[serde(default, deserialize_with = "deserialize_present_id")]
    pub id: Option<serde_json::Value>,
}

fn deserialize_present_id<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, Serialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Clone, Serialize)]
pub struct McpError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl McpResponse {
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(McpError {
                code,
                message: message.into(),
                data: None,
            }),
            id,
        }
    }

    /// Error response carrying the tool error kind in `data`
    pub fn tool_error(id: Option<serde_json::Value>, tool: &str, err: &ToolError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(McpError {
                code: err.code(),
                message: format!("Tool '{}' failed: {}", tool, err),
                data: Some(serde_json::json!({
                    "kind": err.kind(),
                    "tool": tool
                })),
            }),
            id,
        }
    }

    /// Notification (no id, no response expected)
    pub fn notification() -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: None,
            id: None,
        }
    }

    fn is_notification(&self) -> bool {
        self.id.is_none() && self.result.is_none() && self.error.is_none()
    }
}

/// MCP Error Codes
pub mod error_codes {
    // JSON-RPC standard errors
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // MCP custom errors (-32000 to -32099)
    pub const TOOL_NOT_FOUND: i32 = -32000;
    pub const RESOURCE_NOT_FOUND: i32 = -32002;
    pub const DATASTORE_UNAVAILABLE: i32 = -32003;
    pub const TIMEOUT: i32 = -32004;
}

/// MCP Server
pub struct McpServer {
    tools: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create new MCP server
    pub fn new(config: &Config) -> Self {
        Self::with_registry(ToolRegistry::new(config))
    }

    pub fn with_registry(tools: ToolRegistry) -> Self {
        Self {
            tools: Arc::new(tools),
        }
    }

    /// Run the MCP server (stdio mode)
    pub async fn run(&self) -> anyhow::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve newline-delimited JSON-RPC until EOF
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        info!("MCP server ready, waiting for requests...");

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                info!("Client disconnected (EOF)");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            debug!("← {}", trimmed);

            let response = match serde_json::from_str::<McpRequest>(trimmed) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    error!("Parse error: {}", e);
                    McpResponse::error(None, error_codes::PARSE_ERROR, format!("Parse error: {}", e))
                }
            };

            // Don't send response for notifications
            if response.is_notification() {
                continue;
            }

            let response_json = serde_json::to_string(&response)?;
            debug!("→ {}", response_json);

            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        Ok(())
    }

    /// Handle a single MCP request
    pub async fn handle_request(&self, request: McpRequest) -> McpResponse {
        if request.jsonrpc != "2.0" {
            return McpResponse::error(
                request.id,
                error_codes::INVALID_REQUEST,
                format!("Unsupported jsonrpc version: {}", request.jsonrpc),
            );
        }

        // Notifications never get a response
        if request.id.is_none() {
            debug!("Received notification: {}", request.method);
            return McpResponse::notification();
        }

        match request.method.as_str() {
            // Lifecycle
            "initialize" => self.handle_initialize(request.id),
            "shutdown" => {
                info!("Shutdown requested");
                McpResponse::success(request.id, serde_json::json!({}))
            }

            // Tools
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,

            // Ping
            "ping" => McpResponse::success(request.id, serde_json::json!({})),

            // Unknown
            method => {
                warn!("Unknown method: {}", method);
                McpResponse::error(
                    request.id,
                    error_codes::METHOD_NOT_FOUND,
                    format!("Method not found: {}", method),
                )
            }
        }
    }

    /// Handle initialize
    fn handle_initialize(&self, id: Option<serde_json::Value>) -> McpResponse {
        McpResponse::success(
            id,
            serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {
                        "listChanged": false
                    }
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                },
                "instructions": SERVER_INSTRUCTIONS
            }),
        )
    }

    /// Handle tools/list
    fn handle_tools_list(&self, id: Option<serde_json::Value>) -> McpResponse {
        let tools = self.tools.list_definitions();
        McpResponse::success(id, serde_json::json!({ "tools": tools }))
    }

    /// Handle tools/call
    async fn handle_tools_call(
        &self,
        id: Option<serde_json::Value>,
        params: serde_json::Value,
    ) -> McpResponse {
        let name = match params.get("name").and_then(|v| v.as_str()) {
            Some(n) => n,
            None => {
                return McpResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "Missing 'name' parameter",
                )
            }
        };

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or(serde_json::json!({}));

        match self.tools.call(name, arguments).await {
            Ok(result) => {
                let text = result.to_string();
                let structured = if result.is_object() {
                    result
                } else {
                    serde_json::json!({ "result": result })
                };
                McpResponse::success(
                    id,
                    serde_json::json!({
                        "content": [{
                            "type": "text",
                            "text": text
                        }],
                        "structuredContent": structured
                    }),
                )
            }
            Err(e) => {
                warn!("Tool '{}' failed: {}", name, e);
                McpResponse::tool_error(id, name, &e)
            }
        }
    }
}
