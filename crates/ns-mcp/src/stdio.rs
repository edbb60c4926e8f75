//! MCP over newline-delimited JSON-RPC 2.0.
//!
//! One JSON message per line in each direction. Lines are decoded into rmcp's
//! `ClientJsonRpcMessage` and answered with `ServerJsonRpcMessage`. `tools/call` requests run
//! concurrently; every other request is answered inline. Replies are written by the read loop
//! itself, so a line on the output stream is never interleaved with another.

use crate::dispatch::Dispatcher;
use crate::error::Result;
use rmcp::model::{
    ClientJsonRpcMessage, ClientRequest, ErrorCode, ErrorData, Implementation, InitializeResult,
    JsonObject, JsonRpcError, JsonRpcRequest, JsonRpcResponse, JsonRpcVersion2_0,
    ListToolsResult, ProtocolVersion, RequestId, ServerCapabilities, ServerJsonRpcMessage,
    ServerResult,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt as _, AsyncRead, AsyncWrite, AsyncWriteExt as _, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub const SERVER_NAME: &str = "unrelated-ns-mcp";

/// Methods this server implements; a malformed request for one of them is `INVALID_PARAMS`.
const KNOWN_METHODS: [&str; 4] = ["initialize", "ping", "tools/list", "tools/call"];

enum Incoming {
    Ignore,
    Reply(ServerJsonRpcMessage),
    /// Unparsable line. The reply carries `id: null`, which `RequestId` cannot express.
    ParseError(ErrorData),
    CallTool {
        id: RequestId,
        name: String,
        arguments: Option<JsonObject>,
    },
}

/// Serve requests from `reader` until it reaches EOF or `shutdown` resolves.
///
/// In-flight tool calls are drained and their replies written before returning.
///
/// # Errors
///
/// Returns an error if reading from `reader` or writing to `writer` fails.
pub async fn serve<R, W, S>(
    dispatcher: Arc<Dispatcher>,
    reader: R,
    mut writer: W,
    shutdown: S,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = BufReader::new(reader).lines();
    let mut in_flight: JoinSet<ServerJsonRpcMessage> = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("input closed");
                    break;
                };
                match classify(&dispatcher, &line) {
                    Incoming::Ignore => {}
                    Incoming::Reply(reply) => write_json_line(&mut writer, &reply).await?,
                    Incoming::ParseError(error) => {
                        let reply = json!({ "jsonrpc": "2.0", "id": null, "error": error });
                        write_json_line(&mut writer, &reply).await?;
                    }
                    Incoming::CallTool { id, name, arguments } => {
                        in_flight.spawn(run_tool_call(dispatcher.clone(), id, name, arguments));
                    }
                }
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                write_joined(&mut writer, joined).await?;
            }
            () = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        write_joined(&mut writer, joined).await?;
    }
    writer.flush().await?;
    Ok(())
}

fn classify(dispatcher: &Dispatcher, line: &str) -> Incoming {
    let line = line.trim();
    if line.is_empty() {
        return Incoming::Ignore;
    }

    let raw: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "unparsable input line");
            return Incoming::ParseError(ErrorData::new(
                ErrorCode::PARSE_ERROR,
                format!("Parse error: {e}"),
                None,
            ));
        }
    };
    let method = raw.get("method").and_then(Value::as_str).unwrap_or_default();

    let message = match serde_json::from_value::<ClientJsonRpcMessage>(raw.clone()) {
        Ok(m) => m,
        Err(e) => return reject_unrecognized(&raw, method, &e),
    };

    match message {
        ClientJsonRpcMessage::Request(JsonRpcRequest { id, request, .. }) => {
            handle_request(dispatcher, id, request, method)
        }
        ClientJsonRpcMessage::Notification(_) => {
            debug!(method, "notification");
            Incoming::Ignore
        }
        // Client responses and errors need no reply.
        _ => Incoming::Ignore,
    }
}

fn handle_request(
    dispatcher: &Dispatcher,
    id: RequestId,
    request: ClientRequest,
    method: &str,
) -> Incoming {
    let result = match request {
        ClientRequest::InitializeRequest(req) => {
            ServerResult::InitializeResult(initialize_result(req.params.protocol_version))
        }
        ClientRequest::PingRequest(_) => ServerResult::empty(()),
        ClientRequest::ListToolsRequest(_) => ServerResult::ListToolsResult(ListToolsResult {
            tools: dispatcher.list_tools().to_vec(),
            ..Default::default()
        }),
        ClientRequest::CallToolRequest(req) => {
            return Incoming::CallTool {
                id,
                name: req.params.name.to_string(),
                arguments: req.params.arguments,
            };
        }
        _ => {
            let error = ErrorData::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
                None,
            );
            return Incoming::Reply(error_message(id, error));
        }
    };
    Incoming::Reply(ServerJsonRpcMessage::Response(JsonRpcResponse {
        jsonrpc: JsonRpcVersion2_0,
        id,
        result,
    }))
}

/// Valid JSON that is not a message rmcp recognizes: an unknown method, or a known one with
/// malformed params. Only requests (with a usable id) get an answer.
fn reject_unrecognized(raw: &Value, method: &str, e: &serde_json::Error) -> Incoming {
    let id = raw
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());
    let Some(id) = id.filter(|_| !method.is_empty()) else {
        debug!(error = %e, "ignoring unrecognized message");
        return Incoming::Ignore;
    };

    let error = if KNOWN_METHODS.contains(&method) {
        ErrorData::invalid_params(format!("Invalid {method} request: {e}"), None)
    } else {
        ErrorData::new(
            ErrorCode::METHOD_NOT_FOUND,
            format!("Method not found: {method}"),
            None,
        )
    };
    Incoming::Reply(error_message(id, error))
}

/// Run one tool call in its own task so a panic maps to an internal error for that id only.
async fn run_tool_call(
    dispatcher: Arc<Dispatcher>,
    id: RequestId,
    name: String,
    arguments: Option<JsonObject>,
) -> ServerJsonRpcMessage {
    let task = tokio::spawn(async move { dispatcher.call_tool(&name, arguments).await });
    match task.await {
        Ok(Ok(result)) => ServerJsonRpcMessage::Response(JsonRpcResponse {
            jsonrpc: JsonRpcVersion2_0,
            id,
            result: ServerResult::CallToolResult(result),
        }),
        Ok(Err(error)) => error_message(id, error),
        Err(e) => {
            warn!(error = %e, "tool call task failed");
            error_message(
                id,
                ErrorData::internal_error("Internal error while executing tool", None),
            )
        }
    }
}

async fn write_joined<W: AsyncWrite + Unpin>(
    writer: &mut W,
    joined: std::result::Result<ServerJsonRpcMessage, tokio::task::JoinError>,
) -> Result<()> {
    match joined {
        Ok(reply) => write_json_line(writer, &reply).await,
        Err(e) => {
            warn!(error = %e, "tool call dropped without a reply");
            Ok(())
        }
    }
}

fn initialize_result(protocol_version: ProtocolVersion) -> InitializeResult {
    InitializeResult {
        protocol_version,
        capabilities: ServerCapabilities::builder().enable_tools().build(),
        server_info: Implementation {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Implementation::from_build_env()
        },
        ..Default::default()
    }
}

fn error_message(id: RequestId, error: ErrorData) -> ServerJsonRpcMessage {
    ServerJsonRpcMessage::Error(JsonRpcError {
        jsonrpc: JsonRpcVersion2_0,
        id,
        error,
    })
}

async fn write_json_line<W, T>(writer: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut buf = serde_json::to_vec(message)?;
    buf.push(b'\n');
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}
