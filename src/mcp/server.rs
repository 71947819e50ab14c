//! MCP server implementation
//!
//! Implements the Model Context Protocol server that exposes the weather
//! tools via newline-delimited JSON-RPC on stdio.

use crate::mcp::protocol::*;
use crate::mcp::tools;
use crate::nws::WeatherSource;
use anyhow::Result;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{
    AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead, FramedWrite, LinesCodec,
};
use tracing::{debug, error, info, warn};

const SERVER_NAME: &str = "wxmcp";
const MAX_LINE_LENGTH: usize = 1024 * 1024;
const INSTRUCTIONS: &str = "Weather forecasts and alerts from the US National Weather Service. \
     Use get_alerts with a two-letter state code for active alerts. \
     Use get_forecast with latitude and longitude for the upcoming forecast.";

pub struct McpServer {
    source: Arc<dyn WeatherSource>,
    initialized: AtomicBool,
}

impl McpServer {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self {
            source,
            initialized: AtomicBool::new(false),
        }
    }

    /// Run the MCP server on stdin/stdout until the client disconnects
    pub async fn run(&self) -> Result<()> {
        info!("MCP server starting on stdio");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve newline-delimited JSON-RPC over any reader/writer pair
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = FramedRead::new(
            reader,
            AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), b"\n".to_vec(), MAX_LINE_LENGTH),
        );
        let mut sink = FramedWrite::new(writer, LinesCodec::new());
        let mut after_error = false;

        loop {
            let frame = match lines.next().await {
                Some(frame) => frame,
                // A decode error pauses the stream for exactly one poll
                None if after_error => {
                    after_error = false;
                    continue;
                }
                None => break,
            };
            after_error = false;

            let line = match frame {
                Ok(bytes) => match String::from_utf8(bytes.to_vec()) {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("Discarding message that is not UTF-8: {}", e);
                        let response = JsonRpcResponse::failure(
                            Value::Null,
                            JsonRpcError::new(PARSE_ERROR, "Parse error: input is not valid UTF-8"),
                        );
                        sink.send(serde_json::to_string(&response)?).await?;
                        continue;
                    }
                },
                Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => {
                    warn!("Discarding message longer than {} bytes", MAX_LINE_LENGTH);
                    after_error = true;
                    let response = JsonRpcResponse::failure(
                        Value::Null,
                        JsonRpcError::new(INVALID_REQUEST, "Message too large"),
                    );
                    sink.send(serde_json::to_string(&response)?).await?;
                    continue;
                }
                Err(AnyDelimiterCodecError::Io(e)) => {
                    error!("Failed to read line: {}", e);
                    return Err(e.into());
                }
            };

            let line = line.trim();

            // Skip empty lines
            if line.is_empty() {
                continue;
            }

            debug!("Received message: {}", line);

            if let Some(response) = self.handle_message(line).await {
                sink.send(serde_json::to_string(&response)?).await?;
                debug!("Sent response");
            }
        }

        info!("Client closed connection");
        Ok(())
    }

    /// Handle one JSON-RPC message; notifications produce no response
    pub async fn handle_message(&self, content: &str) -> Option<JsonRpcResponse> {
        let raw: Value = match serde_json::from_str(content) {
            Ok(raw) => raw,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(PARSE_ERROR, format!("Parse error: {}", e)),
                ));
            }
        };

        // Valid JSON that is not a request object
        let raw_id = raw.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    raw_id,
                    JsonRpcError::new(INVALID_REQUEST, format!("Invalid request: {}", e)),
                ));
            }
        };

        if request.is_notification() {
            debug!("Notification: {}", request.method);
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(
                    INVALID_REQUEST,
                    format!("Unsupported jsonrpc version: {}", request.jsonrpc),
                ),
            ));
        }

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_call_tool(request.params).await,
            _ => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            )),
        };

        Some(match result {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn handle_initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = match params {
            Some(params) => serde_json::from_value(params).map_err(|e| {
                JsonRpcError::new(INVALID_PARAMS, format!("Invalid initialize params: {}", e))
            })?,
            None => InitializeParams::default(),
        };

        if let Some(client) = &params.client_info {
            info!(
                "Initializing for client {} {}",
                client.name,
                client.version.as_deref().unwrap_or("")
            );
        }
        if let Some(version) = &params.protocol_version {
            if version != PROTOCOL_VERSION {
                debug!("Client requested protocol {}, offering {}", version, PROTOCOL_VERSION);
            }
        }

        self.initialized.store(true, Ordering::SeqCst);

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(serde_json::json!({})),
                ..Default::default()
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        };

        serde_json::to_value(result).map_err(|e| {
            JsonRpcError::new(INTERNAL_ERROR, format!("Failed to serialize result: {}", e))
        })
    }

    fn handle_list_tools(&self) -> Result<Value, JsonRpcError> {
        let result = ListToolsResult {
            tools: tools::get_tool_definitions(),
        };

        serde_json::to_value(result).map_err(|e| {
            JsonRpcError::new(INTERNAL_ERROR, format!("Failed to serialize tools: {}", e))
        })
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(JsonRpcError::new(INTERNAL_ERROR, "Server not initialized"));
        }

        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| {
                JsonRpcError::new(INVALID_PARAMS, format!("Invalid tool call params: {}", e))
            })?;

        let result =
            tools::call_tool(&params.name, params.arguments, Arc::clone(&self.source)).await;

        serde_json::to_value(result).map_err(|e| {
            JsonRpcError::new(
                INTERNAL_ERROR,
                format!("Failed to serialize tool result: {}", e),
            )
        })
    }
}
