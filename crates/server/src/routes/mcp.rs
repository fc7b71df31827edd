use axum::{body::Bytes, http::StatusCode, response::IntoResponse, response::Response, Extension, Json};
use serde_json::Value;

use crate::mcp::{self, types::JsonRpcError, types::JsonRpcRequest, types::JsonRpcResponse, types::JSONRPC_VERSION};
use crate::state::AppState;

/// POST /mcp
/// One JSON-RPC message per request; responses are plain JSON.
pub async fn mcp_post(Extension(state): Extension<AppState>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return reply(JsonRpcResponse::failure(Value::Null, JsonRpcError::parse_error(e))),
    };

    if value.is_array() {
        return reply(JsonRpcResponse::failure(
            Value::Null,
            JsonRpcError::invalid_request("batch requests are not supported"),
        ));
    }

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => return reply(JsonRpcResponse::failure(id, JsonRpcError::invalid_request(e))),
    };

    if request.jsonrpc != JSONRPC_VERSION {
        return reply(JsonRpcResponse::failure(
            id,
            JsonRpcError::invalid_request(format!("unsupported jsonrpc version {}", request.jsonrpc)),
        ));
    }

    match mcp::handle_request(&state, request).await {
        Some(response) => reply(response),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// GET /mcp
/// No server-initiated stream is offered.
pub async fn mcp_get() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}

fn reply(response: JsonRpcResponse) -> Response {
    Json(response).into_response()
}
