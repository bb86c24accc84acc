//! MCP Tool Call Integration Tests
//!
//! Drives the server through JSON-RPC requests against a seeded database.

mod common;

use common::seeded_store;
use contoso_mcp::embeddings::ZeroEmbeddingProvider;
use contoso_mcp::mcp::error_codes;
use contoso_mcp::{McpRequest, McpServer, ToolRegistry};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn create_test_server() -> (McpServer, TempDir) {
    let (store, temp) = seeded_store();
    let registry = ToolRegistry::with_parts(
        store,
        Arc::new(ZeroEmbeddingProvider::default()),
        Duration::from_secs(10),
    );
    (McpServer::with_registry(registry), temp)
}

fn call(id: i64, name: &str, arguments: serde_json::Value) -> McpRequest {
    McpRequest {
        jsonrpc: "2.0".to_string(),
        method: "tools/call".to_string(),
        params: json!({ "name": name, "arguments": arguments }),
        id: Some(json!(id)),
    }
}

#[tokio::test]
async fn test_tools_list() {
    let (server, _temp) = create_test_server();

    let resp = server
        .handle_request(McpRequest {
            jsonrpc: "2.0".to_string(),
            method: "tools/list".to_string(),
            params: serde_json::Value::Null,
            id: Some(json!(1)),
        })
        .await;

    let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();
    assert_eq!(tools.len(), 4);
    assert!(tools.iter().all(|t| t["inputSchema"].is_object() && t["outputSchema"].is_object()));
}

#[tokio::test]
async fn test_subscription_detail_call() {
    let (server, _temp) = create_test_server();

    let resp = server
        .handle_request(call(2, "get_subscription_detail", json!({ "subscription_id": 10 })))
        .await;
    let result = resp.result.unwrap();

    let structured = &result["structuredContent"];
    assert_eq!(structured["invoices"][0]["outstanding"], json!(60.0));
    assert_eq!(structured["invoices"][0]["payments"].as_array().unwrap().len(), 2);

    let text = result["content"][0]["text"].as_str().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(text).unwrap();
    assert_eq!(&parsed, structured);
}

#[tokio::test]
async fn test_list_results_are_wrapped() {
    let (server, _temp) = create_test_server();

    let resp = server.handle_request(call(3, "get_all_customers", json!({}))).await;
    let result = resp.result.unwrap();
    assert_eq!(result["structuredContent"]["result"].as_array().unwrap().len(), 2);

    let resp = server
        .handle_request(call(4, "get_invoice_payments", json!({ "invoice_id": 77 })))
        .await;
    assert_eq!(resp.result.unwrap()["structuredContent"]["result"], json!([]));
}

#[tokio::test]
async fn test_not_found_is_distinguishable() {
    let (server, _temp) = create_test_server();

    let resp = server
        .handle_request(call(5, "get_customer_detail", json!({ "customer_id": 42 })))
        .await;
    assert!(resp.result.is_none());

    let err = resp.error.unwrap();
    assert_eq!(err.code, error_codes::RESOURCE_NOT_FOUND);
    assert_eq!(err.data.unwrap()["kind"], "not_found");
    assert!(err.message.contains("Customer 42 not found"));
}

#[tokio::test]
async fn test_invalid_arguments() {
    let (server, _temp) = create_test_server();

    let resp = server
        .handle_request(call(6, "get_subscription_detail", json!({ "subscription_id": "ten" })))
        .await;
    let err = resp.error.unwrap();
    assert_eq!(err.code, error_codes::INVALID_PARAMS);
    assert_eq!(err.data.unwrap()["kind"], "invalid_params");
}

#[tokio::test]
async fn test_unknown_tool() {
    let (server, _temp) = create_test_server();

    let resp = server.handle_request(call(7, "search_knowledge_base", json!({}))).await;
    assert_eq!(resp.error.unwrap().code, error_codes::TOOL_NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_calls() {
    let (server, _temp) = create_test_server();
    let server = Arc::new(server);

    let mut handles = Vec::new();
    for i in 0..8 {
        let server = server.clone();
        handles.push(tokio::spawn(async move {
            server
                .handle_request(call(100 + i, "get_subscription_detail", json!({ "subscription_id": 10 })))
                .await
        }));
    }

    for handle in handles {
        let resp = handle.await.unwrap();
        assert!(resp.error.is_none());
    }
}
