use memory_core::db::{open_db, open_db_in_memory};
use memory_mcp::{KeyArgs, ListMemoriesArgs, MemoryServer, StoreMemoryArgs};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use serde_json::{json, Value};

fn envelope(result: &CallToolResult) -> Value {
    let wire = serde_json::to_value(result).unwrap();
    let text = wire["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

fn store(key: &str, value: &str, metadata: Option<&str>) -> Parameters<StoreMemoryArgs> {
    Parameters(StoreMemoryArgs {
        key: key.to_string(),
        value: value.to_string(),
        metadata: metadata.map(str::to_string),
    })
}

fn key(key: &str) -> Parameters<KeyArgs> {
    Parameters(KeyArgs {
        key: key.to_string(),
    })
}

#[tokio::test]
async fn tool_calls_round_trip_through_the_server() {
    let server = MemoryServer::new(open_db_in_memory().unwrap());

    let stored = server
        .store_memory(store("k", "v", Some(r#"{"tag":"x"}"#)))
        .await
        .unwrap();
    assert_ne!(stored.is_error, Some(true));
    assert_eq!(
        envelope(&stored),
        json!({"success": true, "message": "Memory stored successfully", "key": "k"})
    );

    let loaded = server.retrieve_memory(key("k")).await.unwrap();
    assert_eq!(envelope(&loaded)["metadata"], json!({"tag": "x"}));

    let listed = server
        .list_memories(Parameters(ListMemoriesArgs::default()))
        .await
        .unwrap();
    assert_eq!(envelope(&listed)["count"], json!(1));

    let deleted = server.delete_memory(key("k")).await.unwrap();
    assert_eq!(envelope(&deleted)["success"], json!(true));

    let missing = server.retrieve_memory(key("k")).await.unwrap();
    assert_eq!(missing.is_error, Some(true));
    assert_eq!(
        envelope(&missing),
        json!({"success": false, "message": "Memory not found: k"})
    );
}

#[tokio::test]
async fn validation_failures_are_error_results_not_protocol_errors() {
    let server = MemoryServer::new(open_db_in_memory().unwrap());

    let rejected = server
        .store_memory(store("k", "v", Some("not valid json")))
        .await
        .unwrap();
    assert_eq!(rejected.is_error, Some(true));
    assert_eq!(envelope(&rejected)["success"], json!(false));

    let missing = server.retrieve_memory(key("k")).await.unwrap();
    assert_eq!(missing.is_error, Some(true));
}

#[tokio::test]
async fn clones_share_one_connection() {
    let dir = tempfile::tempdir().unwrap();
    let server = MemoryServer::new(open_db(dir.path().join("memory.db")).unwrap());
    let other = server.clone();

    server.store_memory(store("shared", "v", None)).await.unwrap();
    let loaded = other.retrieve_memory(key("shared")).await.unwrap();
    assert_eq!(envelope(&loaded)["value"], json!("v"));
}
