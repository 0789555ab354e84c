//! MCP tools: query execution, schema and diagnostics

use neo4j_mcp_core::{NormalizedError, QueryRequest, QueryResult};
use neo4j_mcp_types::runtime::{error_codes, McpError, QueryToolArgs, SchemaToolArgs};
use neo4j_mcp_types::QueryMode;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use crate::state::AppState;

const RUN_READ_QUERY: &str = "run_read_query";
const RUN_WRITE_QUERY: &str = "run_write_query";
const RUN_QUERY: &str = "run_query";
const GET_SCHEMA: &str = "get_schema";
const TEST_CONNECTION: &str = "test_connection";

/// Tool descriptors returned by `tools/list`
pub fn definitions() -> Vec<Value> {
    let query_properties = || {
        json!({
            "query": {
                "type": "string",
                "description": "Cypher query text; pass dynamic values as $parameters"
            },
            "parameters": {
                "type": "object",
                "description": "Query parameters bound by name"
            },
            "database": {
                "type": "string",
                "description": "Target database (defaults to the configured database)"
            }
        })
    };

    let mut run_query_properties = query_properties();
    if let Some(props) = run_query_properties.as_object_mut() {
        props.insert(
            "read_only".to_string(),
            json!({
                "type": "boolean",
                "description": "Run in a read session (default true)",
                "default": true
            }),
        );
    }

    vec![
        json!({
            "name": RUN_READ_QUERY,
            "description": "Execute a read-only Cypher query. Queries containing write clauses are rejected.",
            "inputSchema": {
                "type": "object",
                "properties": query_properties(),
                "required": ["query"]
            }
        }),
        json!({
            "name": RUN_WRITE_QUERY,
            "description": "Execute a Cypher query that may create, update or delete data, and return update counters.",
            "inputSchema": {
                "type": "object",
                "properties": query_properties(),
                "required": ["query"]
            }
        }),
        json!({
            "name": RUN_QUERY,
            "description": "Execute a Cypher query in the mode selected by read_only (default true).",
            "inputSchema": {
                "type": "object",
                "properties": run_query_properties,
                "required": ["query"]
            }
        }),
        json!({
            "name": GET_SCHEMA,
            "description": "Get node labels with counts, relationship types and property keys.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "database": {
                        "type": "string",
                        "description": "Target database (defaults to the configured database)"
                    }
                }
            }
        }),
        json!({
            "name": TEST_CONNECTION,
            "description": "Test the connection and report server version, edition and latency.",
            "inputSchema": {
                "type": "object",
                "properties": {}
            }
        }),
    ]
}

/// Dispatch one `tools/call`
///
/// Protocol problems (unknown tool, malformed arguments) are `Err`. Failures
/// of the tool itself are a successful result flagged with `isError`.
pub async fn call(state: &AppState, name: &str, arguments: Value) -> Result<Value, McpError> {
    info!(tool = name, "Tool call");

    let outcome = match name {
        RUN_READ_QUERY => {
            let args: QueryToolArgs = parse_args(name, arguments)?;
            run(state, request(args, QueryMode::Read))
                .await
                .map(|result| query_output(result, false))
        }
        RUN_WRITE_QUERY => {
            let args: QueryToolArgs = parse_args(name, arguments)?;
            run(state, request(args, QueryMode::Write))
                .await
                .map(|result| query_output(result, true))
        }
        RUN_QUERY => {
            let args: QueryToolArgs = parse_args(name, arguments)?;
            let read_only = args.read_only.unwrap_or(true);
            run(state, request(args, QueryMode::Explicit { read_only }))
                .await
                .map(|result| {
                    let mut output = query_output(result, !read_only);
                    output.insert(
                        "type".to_string(),
                        json!(if read_only { "read" } else { "write" }),
                    );
                    output
                })
        }
        GET_SCHEMA => {
            let args: SchemaToolArgs = parse_args(name, arguments)?;
            state
                .schema
                .get_schema(args.database.as_deref())
                .await
                .map(|snapshot| to_object(&snapshot))
        }
        TEST_CONNECTION => {
            let report = state.diagnostics.test_connection().await;
            Ok(to_object(&report))
        }
        _ => {
            return Err(McpError {
                code: error_codes::INVALID_PARAMS,
                message: format!("Unknown tool: {}", name),
                data: None,
            })
        }
    };

    Ok(match outcome {
        Ok(output) => tool_result(&Value::Object(output), false),
        Err(err) => {
            if err.kind.is_client_error() {
                warn!(tool = name, kind = %err.kind, "Tool call rejected: {}", err.message);
            } else {
                error!(tool = name, kind = %err.kind, "Tool call failed: {}", err.message);
            }
            tool_result(&json!({ "error": err }), true)
        }
    })
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, McpError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| McpError {
        code: error_codes::INVALID_PARAMS,
        message: format!("Invalid arguments for {}: {}", tool, e),
        data: None,
    })
}

fn request(args: QueryToolArgs, mode: QueryMode) -> QueryRequest {
    QueryRequest::new(args.query, mode)
        .with_parameters(args.parameters.unwrap_or_default())
        .on_database(args.database)
}

async fn run(state: &AppState, request: QueryRequest) -> Result<QueryResult, NormalizedError> {
    state.executor.execute(request).await
}

fn query_output(result: QueryResult, with_counters: bool) -> Map<String, Value> {
    let count = result.count();
    let mut output = Map::new();
    if with_counters {
        output.insert("counters".to_string(), json!(result.counters));
    }
    output.insert(
        "records".to_string(),
        Value::Array(result.records.into_iter().map(Value::Object).collect()),
    );
    output.insert("columns".to_string(), json!(result.columns));
    output.insert("count".to_string(), json!(count));
    output
}

fn to_object<T: serde::Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        Ok(other) => Map::from_iter([("value".to_string(), other)]),
        Err(e) => Map::from_iter([("error".to_string(), json!(e.to_string()))]),
    }
}

fn tool_result(payload: &Value, is_error: bool) -> Value {
    let text = serde_json::to_string_pretty(payload).unwrap_or_default();
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error
    })
}
