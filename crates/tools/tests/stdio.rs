use std::sync::Arc;

use graph::testing::{FakeGraph, Reply};
use serde_json::{Value, json};
use tools::Dispatcher;

async fn exchange(fake: FakeGraph, lines: &[Value]) -> Vec<Value> {
    let server = mcp::Server::new(Dispatcher::new(Arc::new(fake)));
    let input: String = lines.iter().map(|line| format!("{line}\n")).collect();
    exchange_raw(server, input.as_bytes()).await
}

async fn exchange_raw(server: mcp::Server<Dispatcher<FakeGraph>>, input: &[u8]) -> Vec<Value> {
    let mut output = Vec::new();
    server.run(input, &mut output).await.unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn call(id: u64, name: &str, arguments: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments},
    })
}

#[tokio::test]
async fn handshake_then_list() {
    let responses = exchange(
        FakeGraph::new(),
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        ],
    )
    .await;

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "graph-mcp");
    assert_eq!(responses[0]["result"]["protocolVersion"], mcp::PROTOCOL_VERSION);

    let tools = responses[1]["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 16);
    assert_eq!(tools[0]["name"], "get_intune_devices");
    assert_eq!(tools[1]["inputSchema"]["required"], json!(["query"]));
}

#[tokio::test]
async fn tool_call_returns_text_content() {
    let fake = FakeGraph::new().route(
        "/users",
        Reply::collection(vec![json!({
            "displayName": "Ada Lovelace",
            "userPrincipalName": "ada@contoso.com",
            "accountEnabled": true,
        })]),
    );

    let responses = exchange(fake, &[call(7, "get_users", json!({}))]).await;

    assert_eq!(responses[0]["id"], 7);
    let result = &responses[0]["result"];
    assert!(result.get("isError").is_none());
    assert_eq!(result["content"][0]["type"], "text");
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Found 1 users:"));
    assert!(text.contains("Ada Lovelace"));
}

#[tokio::test]
async fn tool_failures_stay_inside_the_result() {
    let responses = exchange(
        FakeGraph::new(),
        &[
            call(1, "totally_bogus", json!({})),
            call(2, "lookup_device_ring", json!({})),
        ],
    )
    .await;

    for response in &responses {
        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
    }
    assert_eq!(
        responses[0]["result"]["content"][0]["text"],
        "Unknown tool: totally_bogus"
    );
    assert_eq!(responses[1]["result"]["content"][0]["text"], "DeviceId required");
}

#[tokio::test]
async fn protocol_errors_use_json_rpc_codes() {
    let server = mcp::Server::new(Dispatcher::new(Arc::new(FakeGraph::new())));
    let input = concat!(
        "not json\n",
        "{\"jsonrpc\":\"2.0\",\"id\":\"a\",\"method\":\"resources/list\"}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":\"b\",\"method\":\"tools/call\"}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":\"c\",\"method\":\"ping\"}\n",
    );

    let responses = exchange_raw(server, input.as_bytes()).await;

    assert_eq!(responses.len(), 4);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert_eq!(responses[1]["id"], "a");
    assert_eq!(responses[1]["error"]["code"], -32601);
    assert_eq!(responses[2]["error"]["code"], -32602);
    assert_eq!(responses[3]["id"], "c");
    assert_eq!(responses[3]["result"], json!({}));
}

#[tokio::test]
async fn responses_follow_request_order() {
    let fake = FakeGraph::new()
        .route("/groups", Reply::collection(vec![]))
        .route("/deviceManagement/managedDevices", Reply::collection(vec![]));

    let responses = exchange(
        fake,
        &[
            call(3, "get_groups", json!({})),
            call(1, "get_intune_devices", json!({})),
            call(2, "get_intune_device", json!({"deviceId": "missing"})),
        ],
    )
    .await;

    let ids: Vec<_> = responses.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(3), json!(1), json!(2)]);
    assert_eq!(
        responses[2]["result"]["content"][0]["text"],
        "Device with ID missing not found."
    );
}

#[tokio::test]
async fn invalid_utf8_line_does_not_stop_the_server() {
    let server = mcp::Server::new(Dispatcher::new(Arc::new(FakeGraph::new())));
    let mut input = b"\xff\xfe garbage\n".to_vec();
    input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":5,\"method\":\"ping\"}\n");

    let responses = exchange_raw(server, &input).await;

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], Value::Null);
    assert_eq!(responses[0]["error"]["code"], -32700);
    assert_eq!(responses[1]["id"], 5);
    assert_eq!(responses[1]["result"], json!({}));
}
