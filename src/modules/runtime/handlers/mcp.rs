//! MCP (Model Context Protocol) handler

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use neo4j_mcp_types::runtime::{error_codes, McpError, McpRequest, McpResponse};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{prompts, resources, tools};
use crate::state::{
    AppState, MCP_LATEST_PROTOCOL_VERSION, MCP_SESSION_ID_HEADER,
    MCP_SUPPORTED_PROTOCOL_VERSIONS,
};

const SERVER_NAME: &str = "neo4j-mcp";

/// Handler for MCP protocol requests
pub struct McpHandler;

impl McpHandler {
    /// Handle one JSON-RPC message; notifications get no response
    pub async fn dispatch(state: &AppState, request: McpRequest) -> Option<McpResponse> {
        let id = request.id.clone().unwrap_or(Value::Null);

        if request.jsonrpc != "2.0" {
            return Some(McpResponse::error(
                id,
                error_codes::INVALID_REQUEST,
                "Invalid JSON-RPC version",
            ));
        }

        if request.is_notification() {
            debug!("MCP notification: method={}", request.method);
            return None;
        }

        debug!("MCP request: method={}", request.method);

        let result = match request.method.as_str() {
            "initialize" => Ok(Self::initialize(&request.params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tools::definitions() })),
            "tools/call" => Self::tools_call(state, request.params).await,
            "resources/list" => Ok(json!({ "resources": resources::definitions() })),
            "resources/read" => match request.params.get("uri").and_then(Value::as_str) {
                Some(uri) => resources::read(state, uri).await,
                None => Err(invalid_params("Missing resource uri")),
            },
            "prompts/list" => Ok(json!({ "prompts": prompts::definitions() })),
            "prompts/get" => match request.params.get("name").and_then(Value::as_str) {
                Some(name) => prompts::get(name),
                None => Err(invalid_params("Missing prompt name")),
            },
            _ => Err(McpError {
                code: error_codes::METHOD_NOT_FOUND,
                message: format!("Method not found: {}", request.method),
                data: None,
            }),
        };

        Some(match result {
            Ok(result) => McpResponse::success(id, result),
            Err(error) => McpResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: None,
                error: Some(error),
            },
        })
    }

    /// Handle one line of the stdio transport
    pub async fn dispatch_line(state: &AppState, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<McpRequest>(line) {
            Ok(request) => Self::dispatch(state, request).await?,
            Err(e) => McpResponse::error(
                Value::Null,
                error_codes::PARSE_ERROR,
                format!("Parse error: {}", e),
            ),
        };
        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Failed to serialize MCP response: {}", e);
                None
            }
        }
    }

    /// Handle POST /mcp (JSON-RPC 2.0)
    pub async fn handle_rpc(
        State(state): State<AppState>,
        headers: HeaderMap,
        Json(request): Json<McpRequest>,
    ) -> Response {
        let session_id = headers
            .get(MCP_SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(id) = &session_id {
            if request.method != "initialize" && state.mcp_sessions.get(id).await.is_none() {
                return (StatusCode::NOT_FOUND, "Unknown MCP session").into_response();
            }
        }

        let initialize = request.method == "initialize";
        let protocol = negotiated_version(&request.params);

        let Some(response) = Self::dispatch(&state, request).await else {
            return StatusCode::ACCEPTED.into_response();
        };

        let status = match &response.error {
            Some(error) if error.code == error_codes::INVALID_REQUEST => StatusCode::BAD_REQUEST,
            _ => StatusCode::OK,
        };

        let mut http_response = (status, Json(response)).into_response();
        if initialize && status == StatusCode::OK {
            let id = state.mcp_sessions.create(protocol).await;
            info!(session = %id, protocol, "MCP session started");
            if let Ok(value) = HeaderValue::from_str(&id) {
                http_response
                    .headers_mut()
                    .insert(MCP_SESSION_ID_HEADER, value);
            }
        }
        http_response
    }

    /// Handle DELETE /mcp (session termination)
    pub async fn handle_delete(State(state): State<AppState>, headers: HeaderMap) -> Response {
        let Some(id) = headers
            .get(MCP_SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
        else {
            return (StatusCode::BAD_REQUEST, "Missing Mcp-Session-Id header").into_response();
        };

        if state.mcp_sessions.remove(id).await {
            info!(session = %id, "MCP session terminated");
            (StatusCode::OK, Json(json!({"message": "Session terminated"}))).into_response()
        } else {
            (StatusCode::NOT_FOUND, "Unknown MCP session").into_response()
        }
    }

    fn initialize(params: &Value) -> Value {
        json!({
            "protocolVersion": negotiated_version(params),
            "capabilities": {
                "tools": {},
                "resources": {},
                "prompts": {}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    async fn tools_call(state: &AppState, params: Value) -> Result<Value, McpError> {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return Err(invalid_params("Missing tool name"));
        };
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
        tools::call(state, name, arguments).await
    }
}

/// The client's requested version when supported, otherwise the latest
fn negotiated_version(params: &Value) -> &'static str {
    params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .and_then(|requested| {
            MCP_SUPPORTED_PROTOCOL_VERSIONS
                .iter()
                .copied()
                .find(|v| *v == requested)
        })
        .unwrap_or(MCP_LATEST_PROTOCOL_VERSION)
}

fn invalid_params(message: &str) -> McpError {
    McpError {
        code: error_codes::INVALID_PARAMS,
        message: message.to_string(),
        data: None,
    }
}
