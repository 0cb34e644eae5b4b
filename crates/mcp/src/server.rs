//! MCP server loop over a line-delimited byte stream.

use std::future::Future;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::protocol::{
    CallToolParams, CallToolResult, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult,
    METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION, RequestId, ServerCapabilities, ServerInfo,
    Tool, ToolsCapability,
};

/// Maximum accepted request line (1MB).
pub const MAX_LINE_SIZE: usize = 1024 * 1024;

/// The application side of the server: a tool catalogue plus a way to call tools.
///
/// `call_tool` has no error channel. Tool failures are reported inside the
/// returned [`CallToolResult`] with `is_error` set.
pub trait Handler: Send + Sync {
    /// Identity reported in the initialize response.
    fn server_info(&self) -> ServerInfo;

    /// Tools advertised by tools/list, in order.
    fn list_tools(&self) -> Vec<Tool>;

    /// Execute one tools/call request.
    fn call_tool(&self, params: CallToolParams) -> impl Future<Output = CallToolResult> + Send;
}

/// MCP server that processes one request at a time.
pub struct Server<H> {
    handler: H,
}

impl<H: Handler> Server<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Serve on the process's stdin and stdout until stdin closes.
    pub async fn serve_stdio(&self) -> Result<()> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.run(stdin, stdout).await
    }

    /// Read requests from `reader` and write responses to `writer` until EOF.
    ///
    /// Each request is handled to completion before the next line is read,
    /// so responses come out in request order.
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();

        loop {
            let response = match read_frame(&mut reader, &mut buf).await? {
                Frame::Eof => {
                    info!("client disconnected");
                    break;
                }
                Frame::Oversized(size) => {
                    warn!(size, "request line too large");
                    Some(JsonRpcResponse::failure(
                        None,
                        JsonRpcError::new(
                            INVALID_REQUEST,
                            format!("request too large: {size} bytes (max {MAX_LINE_SIZE})"),
                        ),
                    ))
                }
                Frame::Line => match std::str::from_utf8(&buf) {
                    Ok(line) => {
                        let message = line.trim();
                        if message.is_empty() {
                            continue;
                        }
                        debug!(request = message, "received");
                        self.handle_message(message).await
                    }
                    Err(e) => {
                        warn!(error = %e, "request line is not valid UTF-8");
                        Some(JsonRpcResponse::failure(
                            None,
                            JsonRpcError::new(PARSE_ERROR, format!("parse error: {e}")),
                        ))
                    }
                },
            };

            if let Some(response) = response {
                let response_json = serde_json::to_string(&response)?;
                debug!(response = %response_json, "sending");
                writer.write_all(response_json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle a single JSON-RPC message, returning the response if one is owed.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "failed to parse request");
                return Some(JsonRpcResponse::failure(
                    None,
                    JsonRpcError::new(PARSE_ERROR, format!("parse error: {e}")),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                request.id,
                JsonRpcError::new(INVALID_REQUEST, "jsonrpc must be \"2.0\""),
            ));
        }

        let Some(id) = request.id else {
            self.handle_notification(&request.method);
            return None;
        };

        Some(self.handle_request(id, &request.method, request.params).await)
    }

    fn handle_notification(&self, method: &str) {
        match method {
            "notifications/initialized" => info!("client initialized"),
            "notifications/cancelled" => debug!("request cancelled by client"),
            _ => debug!(method, "ignoring notification"),
        }
    }

    async fn handle_request(
        &self,
        id: RequestId,
        method: &str,
        params: Option<Value>,
    ) -> JsonRpcResponse {
        let result = match method {
            "initialize" => self.initialize(),
            "ping" => Ok(Value::Object(Default::default())),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(params).await,
            _ => {
                warn!(method, "unknown method");
                Err(JsonRpcError::new(
                    METHOD_NOT_FOUND,
                    format!("method not found: {method}"),
                ))
            }
        };

        match result {
            Ok(value) => JsonRpcResponse::success(Some(id), value),
            Err(error) => JsonRpcResponse::failure(Some(id), error),
        }
    }

    fn initialize(&self) -> std::result::Result<Value, JsonRpcError> {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: self.handler.server_info(),
        };
        info!(server = %result.server_info.name, "initializing");
        to_value(result)
    }

    fn list_tools(&self) -> std::result::Result<Value, JsonRpcError> {
        to_value(ListToolsResult {
            tools: self.handler.list_tools(),
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = match params {
            Some(p) => serde_json::from_value(p)
                .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("invalid params: {e}")))?,
            None => return Err(JsonRpcError::new(INVALID_PARAMS, "missing params")),
        };

        to_value(self.handler.call_tool(params).await)
    }
}

/// Outcome of reading one request line.
enum Frame {
    Eof,
    /// A complete line is in the buffer.
    Line,
    /// The line exceeded [`MAX_LINE_SIZE`] and was discarded. Holds its size.
    Oversized(usize),
}

/// Read one line into `buf`, holding at most `MAX_LINE_SIZE + 1` bytes.
async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let limit = MAX_LINE_SIZE as u64 + 1;
    if (&mut *reader).take(limit).read_until(b'\n', buf).await? == 0 {
        return Ok(Frame::Eof);
    }
    if buf.last() == Some(&b'\n') || buf.len() <= MAX_LINE_SIZE {
        return Ok(Frame::Line);
    }

    // Skip the remainder of the oversized line.
    let mut size = buf.len();
    buf.clear();
    loop {
        let (consumed, done) = {
            let chunk = reader.fill_buf().await?;
            match chunk.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (chunk.len(), chunk.is_empty()),
            }
        };
        reader.consume(consumed);
        size += consumed;
        if done {
            break;
        }
    }
    Ok(Frame::Oversized(size))
}

fn to_value(value: impl serde::Serialize) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("serialization error: {e}")))
}
