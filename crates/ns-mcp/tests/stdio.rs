use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, DuplexStream, Lines};
use tokio::task::JoinHandle;
use unrelated_ns_api::{GatewayConfig, NsApiClient, RateLimitConfig};
use unrelated_ns_mcp::{Dispatcher, serve};
use unrelated_test_support::{MockNsApi, MockResponse};

struct Session {
    input: DuplexStream,
    output: Lines<BufReader<DuplexStream>>,
    server: JoinHandle<unrelated_ns_mcp::Result<()>>,
}

impl Session {
    fn start(mock: &MockNsApi) -> anyhow::Result<Self> {
        let config = GatewayConfig::new(mock.api_url(), "test-token")
            .with_timeout(Duration::from_secs(5))
            .with_rate_limit(RateLimitConfig::disabled());
        let dispatcher = Arc::new(Dispatcher::new(NsApiClient::new(config)?));

        let (input, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, output) = tokio::io::duplex(64 * 1024);
        let server = tokio::spawn(serve(
            dispatcher,
            server_in,
            server_out,
            std::future::pending::<()>(),
        ));

        Ok(Self {
            input,
            output: BufReader::new(output).lines(),
            server,
        })
    }

    async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.input.write_all(line.as_bytes()).await?;
        self.input.write_all(b"\n").await?;
        Ok(())
    }

    async fn send(&mut self, msg: &Value) -> anyhow::Result<()> {
        self.send_raw(&msg.to_string()).await
    }

    async fn recv(&mut self) -> anyhow::Result<Value> {
        let line = tokio::time::timeout(Duration::from_secs(5), self.output.next_line())
            .await??
            .ok_or_else(|| anyhow::anyhow!("server closed output"))?;
        Ok(serde_json::from_str(&line)?)
    }

    async fn request(&mut self, id: i64, method: &str, params: Value) -> anyhow::Result<Value> {
        let mut msg = json!({ "jsonrpc": "2.0", "id": id, "method": method });
        if !params.is_null() {
            msg["params"] = params;
        }
        self.send(&msg).await?;
        self.recv().await
    }

    async fn close(self) -> anyhow::Result<()> {
        drop(self.input);
        self.server.await??;
        Ok(())
    }
}

fn tool_body(reply: &Value) -> Value {
    let text = reply["result"]["content"][0]["text"]
        .as_str()
        .expect("text content");
    serde_json::from_str(text).expect("tool reply is JSON")
}

#[tokio::test]
async fn handshake_and_tool_listing() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;
    let mut s = Session::start(&mock)?;

    let init = s
        .request(
            1,
            "initialize",
            json!({
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "test", "version": "0" }
            }),
        )
        .await?;
    assert_eq!(init["id"], 1);
    assert_eq!(init["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(init["result"]["serverInfo"]["name"], "unrelated-ns-mcp");

    s.send(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
        .await?;

    let pong = s.request(2, "ping", Value::Null).await?;
    assert_eq!(pong, json!({ "jsonrpc": "2.0", "id": 2, "result": {} }));

    let list = s.request(3, "tools/list", Value::Null).await?;
    let tools = list["result"]["tools"].as_array().expect("tools array");
    assert_eq!(tools.len(), 23);
    let login = tools
        .iter()
        .find(|t| t["name"] == "login_agent")
        .expect("login_agent listed");
    assert_eq!(
        login["inputSchema"]["required"],
        json!(["domain", "queueId", "agentId"])
    );
    assert_eq!(login["annotations"]["readOnlyHint"], false);

    s.close().await
}

#[tokio::test]
async fn tool_call_round_trip() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;
    mock.on_get(
        "/domains/example.com",
        MockResponse::json(json!({ "domain": "example.com", "description": "Example" })),
    );
    let mut s = Session::start(&mock)?;

    let reply = s
        .request(
            7,
            "tools/call",
            json!({ "name": "get_domain", "arguments": { "domain": "example.com" } }),
        )
        .await?;
    assert_eq!(reply["id"], 7);
    assert!(reply.get("error").is_none(), "{reply}");
    let body = tool_body(&reply);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Retrieved domain details for example.com");
    assert_eq!(body["data"]["description"], "Example");

    s.close().await
}

#[tokio::test]
async fn protocol_errors_use_json_rpc_codes() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;
    let mut s = Session::start(&mock)?;

    s.send_raw("{not json").await?;
    let parse = s.recv().await?;
    assert_eq!(parse["id"], Value::Null);
    assert_eq!(parse["error"]["code"], -32700);

    let unknown_method = s.request(1, "resources/list", json!({})).await?;
    assert_eq!(unknown_method["error"]["code"], -32601);

    let unknown_tool = s
        .request(2, "tools/call", json!({ "name": "nope", "arguments": {} }))
        .await?;
    assert_eq!(unknown_tool["error"]["code"], -32601);

    let missing = s
        .request(
            3,
            "tools/call",
            json!({ "name": "get_user", "arguments": { "domain": "example.com" } }),
        )
        .await?;
    assert_eq!(missing["error"]["code"], -32602);
    assert!(
        missing["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("userId"))
    );

    assert_eq!(mock.request_count(), 0);
    s.close().await
}

#[tokio::test]
async fn in_flight_calls_are_answered_before_exit() -> anyhow::Result<()> {
    let mock = MockNsApi::start().await?;
    mock.on_get("/domains", MockResponse::json(json!([{ "domain": "a" }, { "domain": "b" }])));
    mock.on_get("/domains/a/agents", MockResponse::json(json!([])));
    let mut s = Session::start(&mock)?;

    s.send(&json!({
        "jsonrpc": "2.0", "id": "a", "method": "tools/call",
        "params": { "name": "get_domains", "arguments": {} }
    }))
    .await?;
    s.send(&json!({
        "jsonrpc": "2.0", "id": "b", "method": "tools/call",
        "params": { "name": "get_agents", "arguments": { "domain": "a" } }
    }))
    .await?;

    let mut replies = vec![s.recv().await?, s.recv().await?];
    replies.sort_by_key(|r| r["id"].as_str().unwrap_or_default().to_string());
    assert_eq!(tool_body(&replies[0])["message"], "Retrieved 2 domains");
    assert_eq!(
        tool_body(&replies[1])["message"],
        "Retrieved 0 agents for domain a"
    );

    s.close().await
}
