//! MCP (Model Context Protocol) server implementation

use phaserdocs::{
    get_api_reference_schema, read_documentation_schema, search_documentation_schema, DocsTool,
    GetApiReferenceParams, ReadDocumentationParams, SearchDocumentationParams,
    GET_API_REFERENCE_DESCRIPTION, READ_DOCUMENTATION_DESCRIPTION,
    SEARCH_DOCUMENTATION_DESCRIPTION,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use tracing::{debug, info};

/// JSON-RPC 2.0 request
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// MCP Server implementation
struct McpServer {
    tool: DocsTool,
}

impl McpServer {
    fn new(tool: DocsTool) -> Self {
        Self { tool }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, "Handling request");
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            "notifications/initialized" => {
                // This is a notification, no response needed
                JsonRpcResponse::success(request.id, json!(null))
            }
            _ => JsonRpcResponse::error(
                request.id,
                -32601,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "phaserdocs",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "tools": [
                    {
                        "name": "read_documentation",
                        "description": READ_DOCUMENTATION_DESCRIPTION,
                        "inputSchema": read_documentation_schema()
                    },
                    {
                        "name": "search_documentation",
                        "description": SEARCH_DOCUMENTATION_DESCRIPTION,
                        "inputSchema": search_documentation_schema()
                    },
                    {
                        "name": "get_api_reference",
                        "description": GET_API_REFERENCE_DESCRIPTION,
                        "inputSchema": get_api_reference_schema()
                    }
                ]
            }),
        )
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        let tool_name = params
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let outcome = match tool_name {
            "read_documentation" => match serde_json::from_value::<ReadDocumentationParams>(arguments)
            {
                Ok(args) => self.tool.read_documentation(args).await,
                Err(e) => {
                    return JsonRpcResponse::error(id, -32602, format!("Invalid arguments: {e}"));
                }
            },
            "search_documentation" => {
                match serde_json::from_value::<SearchDocumentationParams>(arguments) {
                    Ok(args) => match self.tool.search_documentation(args).await {
                        Ok(results) => {
                            Ok(serde_json::to_string_pretty(&results).unwrap_or_default())
                        }
                        Err(e) => Err(e),
                    },
                    Err(e) => {
                        return JsonRpcResponse::error(
                            id,
                            -32602,
                            format!("Invalid arguments: {e}"),
                        );
                    }
                }
            }
            "get_api_reference" => match serde_json::from_value::<GetApiReferenceParams>(arguments)
            {
                Ok(args) => self.tool.get_api_reference(args).await,
                Err(e) => {
                    return JsonRpcResponse::error(id, -32602, format!("Invalid arguments: {e}"));
                }
            },
            other => {
                return JsonRpcResponse::error(id, -32602, format!("Unknown tool: {other}"));
            }
        };

        match outcome {
            Ok(text) => JsonRpcResponse::success(
                id,
                json!({
                    "content": [{
                        "type": "text",
                        "text": text
                    }]
                }),
            ),
            Err(e) => JsonRpcResponse::success(
                id,
                json!({
                    "content": [{
                        "type": "text",
                        "text": format!("Error: {e}")
                    }],
                    "isError": true
                }),
            ),
        }
    }
}

/// Run the MCP server over stdio
pub async fn run_server(tool: DocsTool) {
    let server = McpServer::new(tool);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    info!("MCP server listening on stdio");

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading stdin: {e}");
                continue;
            }
        };

        if line.is_empty() {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                let response = JsonRpcResponse::error(None, -32700, format!("Parse error: {e}"));
                let json = serde_json::to_string(&response).unwrap_or_default();
                let _ = writeln!(stdout, "{json}");
                let _ = stdout.flush();
                continue;
            }
        };

        // Skip notifications (no id)
        if request.id.is_none() && request.method.starts_with("notifications/") {
            continue;
        }

        let response = server.handle_request(request).await;
        let json = serde_json::to_string(&response).unwrap_or_default();
        let _ = writeln!(stdout, "{json}");
        let _ = stdout.flush();
    }
}
