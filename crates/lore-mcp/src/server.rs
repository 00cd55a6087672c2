//! The stdio JSON-RPC loop and request dispatch.

use crate::error::McpResult;
use crate::protocol::*;
use crate::tools::tool_definitions;
use lore_config::Config;
use lore_ollama::{OllamaClient, OllamaResult};
use lore_query::QueryService;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// Embeds search queries so `search_knowledge` can rank by similarity.
pub struct QueryEmbedder {
    client: OllamaClient,
    model: String,
}

impl QueryEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn from_config(config: &Config) -> McpResult<Self> {
        let client = OllamaClient::from_config(&config.ollama)?;
        Ok(Self::new(client, config.ollama.embedding_model.clone()))
    }

    pub async fn embed(&self, text: &str) -> OllamaResult<Vec<f32>> {
        self.client.embed(&self.model, text).await
    }
}

/// MCP server over a query service.
pub struct McpServer {
    pub(crate) query: QueryService,
    pub(crate) embedder: Option<QueryEmbedder>,
    name: String,
    version: String,
}

impl McpServer {
    pub fn new(query: QueryService, name: impl Into<String>) -> Self {
        Self {
            query,
            embedder: None,
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_embedder(mut self, embedder: QueryEmbedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Serve on the process's stdin and stdout until stdin closes.
    pub async fn serve_stdio(&self) -> McpResult<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        self.serve(stdin, &mut stdout).await
    }

    /// Read one request per line from `reader` and write responses to `writer`.
    pub async fn serve<R, W>(&self, mut reader: R, writer: &mut W) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("MCP server '{}' ready on stdio", self.name);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) => self.handle_line(line).await,
                Err(e) => {
                    warn!("Dropping line that is not UTF-8: {}", e);
                    let failure = JsonRpcResponse::failure(
                        Value::Null,
                        PARSE_ERROR,
                        format!("Parse error: request is not valid UTF-8 ({})", e),
                    );
                    Some(serde_json::to_string(&failure)?)
                }
            };

            if let Some(response) = response {
                writer.write_all(response.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!("stdin closed, MCP server shutting down");
        Ok(())
    }

    /// Handle one raw line. Returns the serialized response, if any.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        debug!("MCP recv: {}", trimmed);

        let response = match serde_json::from_str::<Value>(trimmed) {
            Err(e) => {
                warn!("Parse error: {}", e);
                Some(JsonRpcResponse::failure(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
            Ok(value) => {
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                match serde_json::from_value::<JsonRpcRequest>(value) {
                    Ok(request) => self.handle_request(request).await,
                    Err(e) => Some(JsonRpcResponse::failure(
                        id,
                        INVALID_REQUEST,
                        format!("Invalid request: {}", e),
                    )),
                }
            }
        }?;

        let encoded = serde_json::to_string(&response).unwrap_or_else(|e| {
            format!(
                "{{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{{\"code\":-32603,\"message\":\"Serialize error: {}\"}}}}",
                e
            )
        });
        debug!("MCP send: {} bytes", encoded.len());
        Some(encoded)
    }

    /// Dispatch a request. Notifications never get a response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!("Notification: {}", request.method);
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": self.name, "version": self.version}
                }),
            ),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": tool_definitions() })),
            "tools/call" => self.handle_tool_call(id, request.params).await,
            other => JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {}", other)),
        };

        Some(response)
    }

    async fn handle_tool_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params = params.unwrap_or(Value::Null);
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::failure(id, INVALID_PARAMS, "tools/call requires a string 'name'");
        };
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
        if !(arguments.is_object() || arguments.is_null()) {
            return JsonRpcResponse::failure(id, INVALID_PARAMS, "'arguments' must be an object");
        }

        let (payload, is_error) = match self.call_tool(name, arguments).await {
            Ok(result) => (result, false),
            Err(e) => {
                warn!("Tool {} failed: {}", name, e.message);
                (e.to_json(), true)
            }
        };

        let text = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
        JsonRpcResponse::success(
            id,
            json!({
                "content": [{"type": "text", "text": text}],
                "isError": is_error
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lore_core::{Chunk, ChunkPosition, Extraction, ExtractionContent, ExtractionDraft, Severity, Source, SourceType};
    use lore_db::Database;

    struct Fixture {
        server: McpServer,
        source: Source,
        extraction: Extraction,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let source = Source::new(SourceType::Book, "Release It");
        db.create_source(&source).unwrap();

        let chunk = Chunk::new(source.id.clone(), 0, "Integration points without timeouts hang threads.")
            .with_position(ChunkPosition::new().with_chapter("Stability").with_page(12));
        db.create_chunks(std::slice::from_ref(&chunk)).unwrap();

        let extraction = Extraction::from_draft(
            ExtractionDraft {
                title: "Missing timeouts".to_string(),
                topics: vec!["reliability".to_string()],
                confidence: 0.9,
                content: ExtractionContent::Warning {
                    pitfall: "Calls without timeouts".to_string(),
                    symptoms: vec![],
                    mitigation: "Always set timeouts".to_string(),
                    severity: Severity::High,
                },
            },
            &chunk,
        );
        db.create_extractions(std::slice::from_ref(&extraction)).unwrap();

        Fixture {
            server: McpServer::new(QueryService::with_defaults(db), "lore-test"),
            source,
            extraction,
        }
    }

    async fn call(server: &McpServer, line: &str) -> Value {
        let response = server.handle_line(line).await.expect("expected a response");
        serde_json::from_str(&response).unwrap()
    }

    async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> (Value, bool) {
        let request = json!({
            "jsonrpc": "2.0", "id": 7, "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        });
        let response = call(server, &request.to_string()).await;
        let result = &response["result"];
        let text = result["content"][0]["text"].as_str().unwrap();
        (serde_json::from_str(text).unwrap(), result["isError"].as_bool().unwrap())
    }

    #[tokio::test]
    async fn test_initialize() {
        let f = fixture();
        let response = call(&f.server, r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#).await;
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], "lore-test");
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let f = fixture();
        let line = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        assert!(f.server.handle_line(line).await.is_none());
        assert!(f.server.handle_line("   ").await.is_none());
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let f = fixture();

        let unknown = call(&f.server, r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#).await;
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

        let malformed = call(&f.server, "{not json").await;
        assert_eq!(malformed["error"]["code"], PARSE_ERROR);
        assert!(malformed["id"].is_null());

        let no_method = call(&f.server, r#"{"jsonrpc":"2.0","id":3}"#).await;
        assert_eq!(no_method["error"]["code"], INVALID_REQUEST);
        assert_eq!(no_method["id"], 3);

        let no_name = call(&f.server, r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{}}"#).await;
        assert_eq!(no_name["error"]["code"], INVALID_PARAMS);

        let bad_args = call(
            &f.server,
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"list_sources","arguments":[1]}}"#,
        )
        .await;
        assert_eq!(bad_args["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_ping_and_tools_list() {
        let f = fixture();
        let ping = call(&f.server, r#"{"jsonrpc":"2.0","id":"a","method":"ping"}"#).await;
        assert_eq!(ping["id"], "a");
        assert!(ping["result"].is_object());

        let list = call(&f.server, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        let tools = list["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 11);
        assert!(tools[0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_search_knowledge_fulltext() {
        let f = fixture();
        let (payload, is_error) = call_tool(&f.server, "search_knowledge", json!({"query": "timeouts"})).await;
        assert!(!is_error);
        assert_eq!(payload["mode"], "fulltext");
        assert!(payload.get("notice").is_none());

        let results = payload["results"].as_array().unwrap();
        let extraction = results.iter().find(|r| r["kind"] == "extraction").unwrap();
        assert_eq!(extraction["source_title"], "Release It");
        assert_eq!(extraction["extraction_type"], "warning");
        assert_eq!(extraction["position"]["page"], 12);
        assert!(results.iter().any(|r| r["kind"] == "chunk"));
    }

    #[tokio::test]
    async fn test_search_falls_back_when_embedding_fails() {
        let f = fixture();
        let client = OllamaClient::new("http://127.0.0.1:9").unwrap();
        let server = f.server.with_embedder(QueryEmbedder::new(client, "nomic-embed-text"));

        let (payload, is_error) = call_tool(&server, "search_knowledge", json!({"query": "timeouts"})).await;
        assert!(!is_error);
        assert_eq!(payload["mode"], "fulltext");
        assert!(payload["notice"].as_str().unwrap().contains("full-text"));
        assert!(payload["count"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_type_tools() {
        let f = fixture();
        let (payload, is_error) = call_tool(&f.server, "get_warnings", json!({"topic": "reliability"})).await;
        assert!(!is_error);
        assert_eq!(payload["type"], "warning");
        assert_eq!(payload["count"], 1);
        assert_eq!(payload["results"][0]["content"]["mitigation"], "Always set timeouts");

        let (payload, _) = call_tool(&f.server, "get_decisions", Value::Null).await;
        assert_eq!(payload["count"], 0);
    }

    #[tokio::test]
    async fn test_get_extraction_and_sources() {
        let f = fixture();
        let (payload, is_error) =
            call_tool(&f.server, "get_extraction", json!({"id": &f.extraction.id[..8]})).await;
        assert!(!is_error);
        assert_eq!(payload["title"], "Missing timeouts");
        assert_eq!(payload["position"]["chapter"], "Stability");

        let (payload, _) = call_tool(&f.server, "list_sources", json!({"status": "pending"})).await;
        assert_eq!(payload["count"], 1);
        assert_eq!(payload["sources"][0]["id"], f.source.id.as_str());
        assert_eq!(payload["sources"][0]["extraction_count"], 1);
    }

    #[tokio::test]
    async fn test_tool_errors_are_structured() {
        let f = fixture();

        let (payload, is_error) = call_tool(&f.server, "get_extraction", json!({"id": "missing"})).await;
        assert!(is_error);
        assert_eq!(payload["error"]["code"], "not_found");
        assert_eq!(payload["error"]["retryable"], false);
        assert!(payload["error"]["hint"].is_string());

        let (payload, is_error) = call_tool(&f.server, "search_knowledge", json!({})).await;
        assert!(is_error);
        assert_eq!(payload["error"]["code"], "invalid_arguments");

        let (payload, _) = call_tool(&f.server, "search_knowledge", json!({"query": " "})).await;
        assert_eq!(payload["error"]["code"], "invalid_arguments");

        let (payload, _) = call_tool(&f.server, "list_sources", json!({"status": "done"})).await;
        assert_eq!(payload["error"]["code"], "invalid_arguments");

        let (payload, _) = call_tool(
            &f.server,
            "compare_sources",
            json!({"topic": "reliability", "source_ids": [f.source.id]}),
        )
        .await;
        assert_eq!(payload["error"]["code"], "invalid_arguments");

        let (payload, _) = call_tool(&f.server, "delete_everything", json!({})).await;
        assert_eq!(payload["error"]["code"], "unknown_tool");
    }

    #[tokio::test]
    async fn test_serve_loop() {
        let f = fixture();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n"
        );
        let mut output: Vec<u8> = Vec::new();
        f.server.serve(input.as_bytes(), &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["id"], 2);
    }

    #[tokio::test]
    async fn test_serve_survives_invalid_utf8() {
        let f = fixture();
        let mut input: Vec<u8> = br#"{"jsonrpc":"2.0","id":1,"method":"ping","params":{"x":""#.to_vec();
        input.extend_from_slice(&[0xff, 0xfe]);
        input.extend_from_slice(b"\"}}\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);

        let mut output: Vec<u8> = Vec::new();
        f.server.serve(input.as_slice(), &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["error"]["code"], PARSE_ERROR);
        assert!(first["id"].is_null());

        // The final line has no newline and is still answered
        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["id"], 2);
        assert!(second["result"].is_object());
    }
}
