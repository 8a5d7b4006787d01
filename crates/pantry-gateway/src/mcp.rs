//! MCP request handling and the newline-delimited stdio loop.

use crate::jsonrpc::{
    JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR,
};
use pantry::pantry_core::{PromptDefinition, ToolError, ToolRequest};
use pantry::pantry_tools::ToolExecutor;
use pantry::Pantry;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "pantry";

#[derive(Debug, Deserialize)]
struct GetPromptParams {
    name: String,
}

pub struct McpServer {
    tools: Arc<dyn ToolExecutor>,
    prompts: Vec<PromptDefinition>,
}

impl McpServer {
    pub fn new(tools: Arc<dyn ToolExecutor>, prompts: Vec<PromptDefinition>) -> Self {
        Self { tools, prompts }
    }

    pub fn from_pantry(pantry: Pantry) -> Self {
        let (registry, prompts) = pantry.into_parts();
        Self::new(Arc::new(registry), prompts)
    }

    /// Returns `None` for notifications.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "notification received");
            return None;
        }
        let id = request.id.clone();
        let params = request.params.unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, self.list_tools()),
            "tools/call" => self.call_tool(id, params).await,
            "prompts/list" => JsonRpcResponse::success(id, self.list_prompts()),
            "prompts/get" => self.get_prompt(id, params),
            other => {
                warn!(method = other, "unknown method");
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {other}"))
            }
        };
        Some(response)
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {"listChanged": false},
                "prompts": {"listChanged": false}
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    fn list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .definitions()
            .into_iter()
            .map(|tool| {
                let mut entry = Map::new();
                entry.insert("name".to_string(), Value::String(tool.name));
                if let Some(description) = tool.description {
                    entry.insert("description".to_string(), Value::String(description));
                }
                entry.insert("inputSchema".to_string(), tool.input_schema);
                Value::Object(entry)
            })
            .collect();
        json!({ "tools": tools })
    }

    async fn call_tool(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        let request: ToolRequest = match serde_json::from_value(params) {
            Ok(request) => request,
            Err(e) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {e}"))
            }
        };
        info!(tool = %request.tool_name, "tool call");

        let arguments = Value::Object(request.arguments);
        match self.tools.call(&request.tool_name, arguments).await {
            Ok(output) => JsonRpcResponse::success(
                id,
                json!({
                    "content": [{"type": "text", "text": output.text}],
                    "isError": output.is_error
                }),
            ),
            Err(ToolError::UnknownTool(name)) => {
                JsonRpcResponse::error(id, INVALID_PARAMS, format!("Unknown tool: {name}"))
            }
            Err(err @ ToolError::InvalidArguments(_)) => {
                JsonRpcResponse::error(id, INVALID_PARAMS, err.to_string())
            }
            Err(err) => JsonRpcResponse::error(id, INTERNAL_ERROR, err.to_string()),
        }
    }

    fn list_prompts(&self) -> Value {
        let prompts: Vec<Value> = self
            .prompts
            .iter()
            .map(|prompt| {
                json!({
                    "name": prompt.name,
                    "description": prompt.description,
                    "arguments": []
                })
            })
            .collect();
        json!({ "prompts": prompts })
    }

    fn get_prompt(&self, id: Option<Value>, params: Value) -> JsonRpcResponse {
        let params: GetPromptParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {e}"))
            }
        };
        match self.prompts.iter().find(|prompt| prompt.name == params.name) {
            Some(prompt) => JsonRpcResponse::success(
                id,
                json!({
                    "description": prompt.description,
                    "messages": [{
                        "role": "user",
                        "content": {"type": "text", "text": prompt.text}
                    }]
                }),
            ),
            None => JsonRpcResponse::error(
                id,
                INVALID_PARAMS,
                format!("Unknown prompt: {}", params.name),
            ),
        }
    }

    /// Parses one line from the transport and produces the reply, if any.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let message: Value = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                warn!("invalid JSON-RPC message: {e}");
                return Some(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error"));
            }
        };
        let id = message.get("id").cloned();
        // A present-but-null id is neither a call nor a notification.
        if id == Some(Value::Null) {
            warn!("JSON-RPC request with null id");
            return Some(JsonRpcResponse::error(None, INVALID_REQUEST, "Invalid Request"));
        }
        match serde_json::from_value::<JsonRpcRequest>(message) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!("malformed JSON-RPC request: {e}");
                Some(JsonRpcResponse::error(id, INVALID_REQUEST, "Invalid Request"))
            }
        }
    }
}

/// Reads requests line by line until EOF, answering each before reading
/// the next.
pub async fn serve<R, W>(server: &McpServer, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = server.handle_line(&line).await {
            let mut encoded = serde_json::to_vec(&response)?;
            encoded.push(b'\n');
            writer.write_all(&encoded).await?;
            writer.flush().await?;
        }
    }
    info!("stdin closed, shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_adapter_instacart::InstacartClient;
    use pantry_adapter_spoonacular::SpoonacularClient;
    use pantry_store::{AttributeValue, BackendHandle, MemoryStore, Record};

    fn server(backend: BackendHandle) -> McpServer {
        McpServer::from_pantry(Pantry::from_parts(
            backend,
            SpoonacularClient::new(None).unwrap(),
            InstacartClient::new(None).unwrap(),
        ))
    }

    async fn exchange(server: &McpServer, input: &str) -> Vec<Value> {
        let mut output = Vec::new();
        serve(server, input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn handshake_and_listing() {
        let server = server(BackendHandle::unavailable("test"));
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{}}\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"prompts/list\"}\n",
        );
        let replies = exchange(&server, input).await;

        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0]["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(replies[0]["result"]["serverInfo"]["name"], "pantry");
        let tools = replies[1]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 9);
        assert!(tools
            .iter()
            .any(|t| t["name"] == "validate_age" && t["inputSchema"]["required"][0] == "age"));
        assert_eq!(replies[2]["result"]["prompts"][0]["name"], "collect_user_info");
    }

    #[tokio::test]
    async fn tool_call_returns_text_content() {
        let server = server(BackendHandle::unavailable("test"));
        let replies = exchange(
            &server,
            "{\"jsonrpc\":\"2.0\",\"id\":\"a\",\"method\":\"tools/call\",\"params\":{\"name\":\"validate_height_and_calculate_bmi\",\"arguments\":{\"age\":30,\"weight_kg\":100,\"height_cm\":160}}}\n",
        )
        .await;

        assert_eq!(replies[0]["id"], "a");
        assert_eq!(replies[0]["result"]["isError"], false);
        let text = replies[0]["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("- BMI: 39.1 (obese)"));
    }

    #[tokio::test]
    async fn store_lookup_through_the_transport() {
        let store = MemoryStore::new().with_item(
            "identity",
            Record::from([("userId".to_string(), AttributeValue::String("u1".to_string()))]),
        );
        let server = server(BackendHandle::available(store));
        let replies = exchange(
            &server,
            "{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"tools/call\",\"params\":{\"name\":\"get_dynamodb_item\",\"arguments\":{\"table_name\":\"identity\",\"key\":{\"userId\":\"u1\"}}}}\n",
        )
        .await;
        let text = replies[0]["result"]["content"][0]["text"].as_str().unwrap();
        assert_eq!(text, "{\n  \"userId\": \"u1\"\n}");
    }

    #[tokio::test]
    async fn dispatch_failures_are_protocol_errors() {
        let server = server(BackendHandle::unavailable("test"));
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"launch_rocket\",\"arguments\":{}}}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/call\",\"params\":{\"name\":\"validate_age\",\"arguments\":{\"age\":\"old\"}}}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"resources/list\"}\n",
            "not json\n",
            "{\"jsonrpc\":\"2.0\",\"id\":4}\n",
        );
        let replies = exchange(&server, input).await;

        assert_eq!(replies[0]["error"]["code"], INVALID_PARAMS);
        assert_eq!(replies[0]["error"]["message"], "Unknown tool: launch_rocket");
        assert_eq!(replies[1]["error"]["code"], INVALID_PARAMS);
        assert_eq!(replies[2]["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(replies[3]["error"]["code"], PARSE_ERROR);
        assert!(replies[3]["id"].is_null());
        assert_eq!(replies[4]["error"]["code"], INVALID_REQUEST);
        assert_eq!(replies[4]["id"], 4);
    }

    #[tokio::test]
    async fn null_id_is_answered_not_dropped() {
        let server = server(BackendHandle::unavailable("test"));
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":null,\"method\":\"ping\"}\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n",
        );
        let replies = exchange(&server, input).await;

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["error"]["code"], INVALID_REQUEST);
        assert!(replies[0]["id"].is_null());
        assert_eq!(replies[1]["id"], 7);
        assert!(replies[1].get("error").is_none());
    }

    #[tokio::test]
    async fn prompt_get_returns_a_user_message() {
        let server = server(BackendHandle::unavailable("test"));
        let replies = exchange(
            &server,
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"prompts/get\",\"params\":{\"name\":\"collect_user_info\"}}\n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"prompts/get\",\"params\":{\"name\":\"nope\"}}\n",
        )
        .await;
        assert_eq!(replies[0]["result"]["messages"][0]["role"], "user");
        assert!(replies[0]["result"]["messages"][0]["content"]["text"]
            .as_str()
            .unwrap()
            .contains("Age (in years)"));
        assert_eq!(replies[1]["error"]["code"], INVALID_PARAMS);
    }
}
