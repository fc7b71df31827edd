//! Model Context Protocol method dispatch.
//!
//! Transport-agnostic: takes a decoded JSON-RPC request and produces the
//! response, or nothing for notifications.

pub mod types;

use serde_json::{json, Value};

use crate::state::AppState;
use crate::tools;
use types::{CallToolParams, InitializeParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse};

pub const SERVER_NAME: &str = "chess-mcp-server";

/// Newest first
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

const INSTRUCTIONS: &str = "Chess tools backed by Stockfish and the Lichess API. \
Positions are FEN strings and moves are UCI (e2e4, e7e8q). \
Evaluations are reported from White's perspective.";

/// Handle one request. Returns None for notifications.
pub async fn handle_request(state: &AppState, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    let Some(id) = request.id else {
        tracing::debug!(method = %request.method, "MCP notification");
        return None;
    };
    if id.is_null() {
        return Some(JsonRpcResponse::failure(
            Value::Null,
            JsonRpcError::invalid_request("id must not be null"),
        ));
    }

    tracing::debug!(method = %request.method, "MCP request");

    let outcome = match request.method.as_str() {
        "initialize" => Ok(initialize(request.params)),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": tools::list() })),
        "tools/call" => call_tool(state, request.params).await,
        other => Err(JsonRpcError::method_not_found(other)),
    };

    Some(match outcome {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(error) => JsonRpcResponse::failure(id, error),
    })
}

fn initialize(params: Option<Value>) -> Value {
    let params: InitializeParams = params
        .and_then(|p| serde_json::from_value(p).ok())
        .unwrap_or_default();

    let protocol_version = params
        .protocol_version
        .as_deref()
        .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0]);

    json!({
        "protocolVersion": protocol_version,
        "capabilities": {
            "tools": { "listChanged": false }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        },
        "instructions": INSTRUCTIONS
    })
}

async fn call_tool(state: &AppState, params: Option<Value>) -> Result<Value, JsonRpcError> {
    let params: CallToolParams = params
        .ok_or_else(|| JsonRpcError::invalid_params("missing params"))
        .and_then(|p| serde_json::from_value(p).map_err(JsonRpcError::invalid_params))?;

    let arguments = params.arguments.unwrap_or_else(|| json!({}));
    tracing::info!(tool = %params.name, "Tool call");

    let output = tools::call(state, &params.name, arguments)
        .await
        .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)))?;

    Ok(json!({
        "content": [{ "type": "text", "text": output.payload.to_string() }],
        "structuredContent": output.payload,
        "isError": output.is_error
    }))
}
