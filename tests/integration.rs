//! Integration tests for the MCP tool sets.

use std::sync::Arc;

use serde_json::{json, Map, Value as JsonValue};
use resource_mcp::{
    AuditLog, BaseDirectory, DocumentStore, DocumentTools, FileStore, FileTools, McpError,
    McpServer, StoreSession, ToolHandler,
};

/// Create a document tool set over an in-memory database.
fn document_tools() -> DocumentTools {
    let session = StoreSession::cache().expect("Failed to create cache database");
    DocumentTools::new(DocumentStore::new(session))
}

/// Create a file tool set rooted in a fresh temp directory.
fn file_tools() -> (tempfile::TempDir, FileTools) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let base = BaseDirectory::new(dir.path().join("output")).expect("Failed to create base dir");
    let audit = AuditLog::to_file(dir.path().join("file_operations.log"));
    (dir, FileTools::new(FileStore::new(Arc::new(base), audit)))
}

/// Helper to dispatch a tool call.
fn call_tool<H: ToolHandler>(handler: &mut H, name: &str, args: JsonValue) -> JsonValue {
    let args_map: Map<String, JsonValue> = match args {
        JsonValue::Object(m) => m,
        _ => Map::new(),
    };
    handler
        .call(name, args_map)
        .unwrap_or_else(|e| panic!("Tool {} failed: {}", name, e))
}

/// Helper to dispatch a tool call and expect an error.
fn call_tool_err<H: ToolHandler>(handler: &mut H, name: &str, args: JsonValue) -> McpError {
    let args_map: Map<String, JsonValue> = match args {
        JsonValue::Object(m) => m,
        _ => Map::new(),
    };
    handler
        .call(name, args_map)
        .expect_err(&format!("Expected tool {} to fail", name))
}

// =============================================================================
// Document Tools
// =============================================================================

#[test]
fn test_document_lifecycle() {
    let mut tools = document_tools();

    let id = call_tool(
        &mut tools,
        "insert_document",
        json!({"database_name": "app", "collection_name": "things", "document": "{\"x\": 1}"}),
    );
    assert!(id.as_str().is_some_and(|s| !s.is_empty()));

    let found = call_tool(
        &mut tools,
        "find_documents",
        json!({"database_name": "app", "collection_name": "things", "query": "{\"x\": 1}"}),
    );
    let docs = found.as_array().expect("Expected array");
    assert!(!docs.is_empty());
    assert!(docs.iter().any(|d| d["x"] == json!(1)));
    assert_eq!(docs[0]["_id"], id);

    let deleted = call_tool(
        &mut tools,
        "delete_documents",
        json!({"database_name": "app", "collection_name": "things", "query": "{\"x\": 1}"}),
    );
    assert_eq!(deleted, json!(1));

    let count = call_tool(
        &mut tools,
        "count_documents",
        json!({"database_name": "app", "collection_name": "things", "query": "{\"x\": 1}"}),
    );
    assert_eq!(count, json!(0));
}

#[test]
fn test_update_preserves_unmentioned_fields() {
    let mut tools = document_tools();

    call_tool(
        &mut tools,
        "insert_document",
        json!({"database_name": "app", "collection_name": "things", "document": {"x": 1}}),
    );

    let modified = call_tool(
        &mut tools,
        "update_document",
        json!({"database_name": "app", "collection_name": "things", "query": "{\"x\": 1}", "update": "{\"y\": 2}"}),
    );
    assert_eq!(modified, json!(1));

    let found = call_tool(
        &mut tools,
        "find_documents",
        json!({"database_name": "app", "collection_name": "things"}),
    );
    let doc = &found.as_array().expect("Expected array")[0];
    assert_eq!(doc["x"], json!(1));
    assert_eq!(doc["y"], json!(2));

    // Same update again changes nothing.
    let modified = call_tool(
        &mut tools,
        "update_document",
        json!({"database_name": "app", "collection_name": "things", "query": {"x": 1}, "update": {"y": 2}}),
    );
    assert_eq!(modified, json!(0));

    let modified = call_tool(
        &mut tools,
        "update_document",
        json!({"database_name": "app", "collection_name": "things", "query": {"x": 99}, "update": {"y": 3}}),
    );
    assert_eq!(modified, json!(0));
}

#[test]
fn test_find_default_limit() {
    let mut tools = document_tools();

    for i in 0..12 {
        call_tool(
            &mut tools,
            "insert_document",
            json!({"database_name": "app", "collection_name": "many", "document": {"i": i}}),
        );
    }

    let found = call_tool(
        &mut tools,
        "find_documents",
        json!({"database_name": "app", "collection_name": "many"}),
    );
    assert_eq!(found.as_array().map(|a| a.len()), Some(10));

    let found = call_tool(
        &mut tools,
        "find_documents",
        json!({"database_name": "app", "collection_name": "many", "query": "{\"i\": {\"$lt\": 3}}", "limit": 50}),
    );
    assert_eq!(found.as_array().map(|a| a.len()), Some(3));

    let found = call_tool(
        &mut tools,
        "find_documents",
        json!({"database_name": "app", "collection_name": "many", "limit": 0}),
    );
    assert_eq!(found.as_array().map(|a| a.len()), Some(12));

    let count = call_tool(
        &mut tools,
        "count_documents",
        json!({"database_name": "app", "collection_name": "many"}),
    );
    assert_eq!(count, json!(12));

    let err = call_tool_err(
        &mut tools,
        "find_documents",
        json!({"database_name": "app", "collection_name": "many", "limit": -5}),
    );
    assert!(matches!(err, McpError::InvalidArg { ref name, .. } if name == "limit"));
}

#[test]
fn test_insert_with_numeric_id() {
    let mut tools = document_tools();

    let id = call_tool(
        &mut tools,
        "insert_document",
        json!({"database_name": "app", "collection_name": "things", "document": "{\"_id\": 7, \"x\": 1}"}),
    );
    assert_eq!(id, json!(7));

    let found = call_tool(
        &mut tools,
        "find_documents",
        json!({"database_name": "app", "collection_name": "things", "query": {"_id": 7}}),
    );
    assert_eq!(found, json!([{"_id": 7, "x": 1}]));

    let err = call_tool_err(
        &mut tools,
        "insert_document",
        json!({"database_name": "app", "collection_name": "things", "document": {"_id": 7}}),
    );
    assert!(matches!(err, McpError::InvalidArg { .. }));
}

#[test]
fn test_failed_update_changes_nothing() {
    let mut tools = document_tools();

    call_tool(
        &mut tools,
        "insert_document",
        json!({"database_name": "app", "collection_name": "things", "document": {"_id": "a", "x": {}}}),
    );
    call_tool(
        &mut tools,
        "insert_document",
        json!({"database_name": "app", "collection_name": "things", "document": {"_id": "b", "x": 1}}),
    );

    let err = call_tool_err(
        &mut tools,
        "update_document",
        json!({"database_name": "app", "collection_name": "things", "query": "{}", "update": "{\"x.y\": 1}"}),
    );
    assert!(matches!(err, McpError::MalformedInput { ref what, .. } if what == "update"));

    let found = call_tool(
        &mut tools,
        "find_documents",
        json!({"database_name": "app", "collection_name": "things", "query": {"_id": "a"}}),
    );
    assert_eq!(found, json!([{"_id": "a", "x": {}}]));
}

#[test]
fn test_list_databases_and_collections() {
    let mut tools = document_tools();

    call_tool(
        &mut tools,
        "insert_document",
        json!({"database_name": "inventory", "collection_name": "parts", "document": {"sku": "a1"}}),
    );

    let databases = call_tool(&mut tools, "list_databases", json!({}));
    let databases = databases.as_array().expect("Expected array");
    assert!(databases.iter().any(|d| d.as_str() == Some("inventory")));

    let collections = call_tool(&mut tools, "list_collections", json!({"database_name": "inventory"}));
    let collections = collections.as_array().expect("Expected array");
    assert!(collections.iter().any(|c| c.as_str() == Some("parts")));

    let missing = call_tool(&mut tools, "list_collections", json!({"database_name": "absent"}));
    assert_eq!(missing, json!([]));
}

#[test]
fn test_collections_are_isolated() {
    let mut tools = document_tools();

    call_tool(
        &mut tools,
        "insert_document",
        json!({"database_name": "a", "collection_name": "c1", "document": {"v": 1}}),
    );
    call_tool(
        &mut tools,
        "insert_document",
        json!({"database_name": "b", "collection_name": "c1", "document": {"v": 1}}),
    );

    call_tool(
        &mut tools,
        "delete_documents",
        json!({"database_name": "a", "collection_name": "c1", "query": "{}"}),
    );

    let count = call_tool(
        &mut tools,
        "count_documents",
        json!({"database_name": "b", "collection_name": "c1"}),
    );
    assert_eq!(count, json!(1));
}

#[test]
fn test_malformed_document_input() {
    let mut tools = document_tools();

    let err = call_tool_err(
        &mut tools,
        "insert_document",
        json!({"database_name": "app", "collection_name": "things", "document": "{not json"}),
    );
    assert!(matches!(err, McpError::MalformedInput { .. }));

    let err = call_tool_err(
        &mut tools,
        "insert_document",
        json!({"database_name": "app", "collection_name": "things", "document": "[1, 2]"}),
    );
    assert!(matches!(err, McpError::MalformedInput { .. }));

    let err = call_tool_err(
        &mut tools,
        "find_documents",
        json!({"database_name": "app", "collection_name": "things", "query": "{\"x\":"}),
    );
    assert!(matches!(err, McpError::MalformedInput { .. }));

    let err = call_tool_err(
        &mut tools,
        "update_document",
        json!({"database_name": "app", "collection_name": "things", "query": "{}"}),
    );
    assert!(matches!(err, McpError::MissingArg(ref arg) if arg == "update"));
}

#[test]
fn test_greeting_resource() {
    let tools = document_tools();
    let text = tools
        .read_resource("greeting://World")
        .expect("greeting should be served")
        .expect("greeting should succeed");
    assert_eq!(text, "Hello Hi, World!");
    assert!(tools.read_resource("other://x").is_none());
    assert_eq!(tools.resource_templates().len(), 1);
}

#[test]
fn test_document_server_round_trip() {
    let mut server = McpServer::new(document_tools());

    let line = json!({
        "jsonrpc": "2.0",
        "id": 7,
        "method": "tools/call",
        "params": {
            "name": "count_documents",
            "arguments": {"database_name": "app", "collection_name": "empty"}
        }
    })
    .to_string();
    let out = server.handle_line(&line).unwrap().expect("Expected a response");
    let resp: JsonValue = serde_json::from_str(&out).unwrap();
    assert_eq!(resp["id"], json!(7));
    assert_eq!(resp["result"]["content"][0]["text"], json!("0"));
}

// =============================================================================
// File Tools
// =============================================================================

#[test]
fn test_create_read_round_trip() {
    let (_dir, mut tools) = file_tools();

    for content in ["", "plain", "multi\nline\n", "unicode: åäö ✓"] {
        call_tool(&mut tools, "create_file", json!({"path": "notes/file.txt", "content": content}));
        let read = call_tool(&mut tools, "read_file", json!({"path": "notes/file.txt"}));
        assert_eq!(read, json!(content));
    }
}

#[test]
fn test_create_without_content_writes_empty_file() {
    let (_dir, mut tools) = file_tools();

    call_tool(&mut tools, "create_file", json!({"path": "empty.txt"}));
    let read = call_tool(&mut tools, "read_file", json!({"path": "empty.txt"}));
    assert_eq!(read, json!(""));
}

#[test]
fn test_create_directory_twice() {
    let (_dir, mut tools) = file_tools();

    call_tool(&mut tools, "create_directory", json!({"path": "reports/2024"}));
    call_tool(&mut tools, "create_directory", json!({"path": "reports/2024"}));

    let dirs = call_tool(&mut tools, "list_directories", json!({"directory": "reports"}));
    assert_eq!(dirs, json!(["2024"]));
}

#[test]
fn test_set_base_directory_visibility() {
    let (dir, mut tools) = file_tools();
    let new_base = dir.path().join("fresh");

    let set = call_tool(
        &mut tools,
        "set_base_directory",
        json!({"path": new_base.to_str().unwrap()}),
    );
    let canonical = std::fs::canonicalize(dir.path().join("fresh")).unwrap();
    assert_eq!(set, json!(canonical.display().to_string()));

    let got = call_tool(&mut tools, "get_base_directory", json!({}));
    assert_eq!(got, set);

    call_tool(&mut tools, "create_file", json!({"path": "inside.txt", "content": "here"}));
    assert_eq!(std::fs::read_to_string(canonical.join("inside.txt")).unwrap(), "here");

    let files = call_tool(&mut tools, "list_files", json!({}));
    assert_eq!(files, json!(["inside.txt"]));
}

#[test]
fn test_use_base_directory_false() {
    let (dir, mut tools) = file_tools();
    let absolute = dir.path().join("abs.txt");
    let absolute = absolute.to_str().unwrap();

    call_tool(
        &mut tools,
        "create_file",
        json!({"path": absolute, "content": "outside", "use_base_directory": false}),
    );
    let read = call_tool(
        &mut tools,
        "read_file",
        json!({"path": absolute, "use_base_directory": false}),
    );
    assert_eq!(read, json!("outside"));

    let err = call_tool_err(&mut tools, "read_file", json!({"path": "../abs.txt"}));
    assert!(matches!(err, McpError::InvalidArg { .. }));
}

#[test]
fn test_append_and_delete() {
    let (_dir, mut tools) = file_tools();

    call_tool(&mut tools, "create_file", json!({"path": "log.txt", "content": "one"}));
    call_tool(&mut tools, "append_to_file", json!({"path": "log.txt", "content": "two"}));
    let read = call_tool(&mut tools, "read_file", json!({"path": "log.txt"}));
    assert_eq!(read, json!("one\ntwo"));

    let err = call_tool_err(&mut tools, "append_to_file", json!({"path": "no/such/dir.txt", "content": "x"}));
    assert!(matches!(err, McpError::NotFound { .. }));

    call_tool(&mut tools, "delete_file", json!({"path": "log.txt"}));
    let err = call_tool_err(&mut tools, "delete_file", json!({"path": "log.txt"}));
    assert!(matches!(err, McpError::NotFound { .. }));
    let err = call_tool_err(&mut tools, "read_file", json!({"path": "log.txt"}));
    assert!(matches!(err, McpError::NotFound { .. }));
}

#[test]
fn test_list_missing_directory() {
    let (_dir, mut tools) = file_tools();

    let err = call_tool_err(&mut tools, "list_files", json!({"directory": "ghost"}));
    assert!(matches!(err, McpError::NotFound { .. }));
    let err = call_tool_err(&mut tools, "list_directories", json!({"directory": "ghost"}));
    assert!(matches!(err, McpError::NotFound { .. }));
}

#[test]
fn test_apply_modifications_order() {
    let (_dir, mut tools) = file_tools();

    call_tool(&mut tools, "create_file", json!({"path": "p.txt", "content": "foo baz"}));
    let result = call_tool(
        &mut tools,
        "apply_modifications",
        json!({"path": "p.txt", "modifications": "[{\"search\": \"foo\", \"replace\": \"bar\"}, {\"append\": \"end\"}]"}),
    );
    assert_eq!(result["applied"], json!(2));
    let read = call_tool(&mut tools, "read_file", json!({"path": "p.txt"}));
    assert_eq!(read, json!("bar baz\nend"));

    call_tool(&mut tools, "create_file", json!({"path": "q.txt", "content": "foo baz"}));
    call_tool(
        &mut tools,
        "apply_modifications",
        json!({"path": "q.txt", "modifications": [{"append": "foo"}, {"search": "foo", "replace": "bar"}]}),
    );
    let read = call_tool(&mut tools, "read_file", json!({"path": "q.txt"}));
    assert_eq!(read, json!("bar baz\nbar"));
}

#[test]
fn test_apply_modifications_skips_unknown_steps() {
    let (_dir, mut tools) = file_tools();

    call_tool(&mut tools, "create_file", json!({"path": "u.txt", "content": "unchanged"}));
    let result = call_tool(
        &mut tools,
        "apply_modifications",
        json!({"path": "u.txt", "modifications": "[{\"unused\": \"value\"}]"}),
    );
    assert_eq!(result["skipped"], json!(1));
    let read = call_tool(&mut tools, "read_file", json!({"path": "u.txt"}));
    assert_eq!(read, json!("unchanged"));
}

#[test]
fn test_apply_modifications_errors() {
    let (_dir, mut tools) = file_tools();

    let err = call_tool_err(
        &mut tools,
        "apply_modifications",
        json!({"path": "absent.txt", "modifications": "[{\"append\": \"x\"}]"}),
    );
    assert!(matches!(err, McpError::NotFound { .. }));

    call_tool(&mut tools, "create_file", json!({"path": "e.txt", "content": "x"}));
    let err = call_tool_err(
        &mut tools,
        "apply_modifications",
        json!({"path": "e.txt", "modifications": "[{\"append\": "}),
    );
    assert!(matches!(err, McpError::MalformedInput { .. }));
}

#[test]
fn test_modify_file_with_empty_search() {
    let (_dir, mut tools) = file_tools();

    call_tool(&mut tools, "create_file", json!({"path": "e.txt", "content": "abc"}));
    call_tool(&mut tools, "modify_file", json!({"path": "e.txt", "search": "", "replace": "x"}));
    let read = call_tool(&mut tools, "read_file", json!({"path": "e.txt"}));
    assert_eq!(read, json!("xaxbxcx"));
}

#[test]
fn test_wrongly_typed_flags_are_rejected() {
    let (_dir, mut tools) = file_tools();

    let err = call_tool_err(
        &mut tools,
        "create_file",
        json!({"path": "f.txt", "content": "x", "use_base_directory": "false"}),
    );
    assert!(matches!(err, McpError::InvalidArg { ref name, .. } if name == "use_base_directory"));

    let err = call_tool_err(&mut tools, "create_file", json!({"path": "f.txt", "content": 42}));
    assert!(matches!(err, McpError::InvalidArg { ref name, .. } if name == "content"));
}

#[test]
fn test_modify_file() {
    let (_dir, mut tools) = file_tools();

    call_tool(&mut tools, "create_file", json!({"path": "m.txt", "content": "a-a-a"}));
    call_tool(&mut tools, "modify_file", json!({"path": "m.txt", "search": "-", "replace": "+"}));
    let read = call_tool(&mut tools, "read_file", json!({"path": "m.txt"}));
    assert_eq!(read, json!("a+a+a"));
}

#[test]
fn test_generate_text() {
    let (_dir, mut tools) = file_tools();

    let text = call_tool(
        &mut tools,
        "generate_text",
        json!({"template": "Report for {team}: {count} items", "variables": {"team": "ops", "count": 3}}),
    );
    assert_eq!(text, json!("Report for ops: 3 items"));
}

#[test]
fn test_file_operations_are_audited() {
    let (dir, mut tools) = file_tools();

    call_tool(&mut tools, "create_file", json!({"path": "a.txt", "content": "x"}));
    call_tool_err(&mut tools, "read_file", json!({"path": "b.txt"}));

    let log = std::fs::read_to_string(dir.path().join("file_operations.log")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("create_file a.txt ok"));
    assert!(lines[1].contains("read_file b.txt error:"));
}

#[test]
fn test_unknown_tool() {
    let (_dir, mut tools) = file_tools();
    let err = call_tool_err(&mut tools, "launch_rockets", json!({}));
    assert!(matches!(err, McpError::UnknownTool(_)));
}

#[test]
fn test_tools_list_names() {
    let (_dir, tools) = file_tools();
    let names: Vec<&str> = tools.tools().iter().map(|t| t.name.as_str()).collect();
    for expected in [
        "get_base_directory",
        "set_base_directory",
        "list_files",
        "list_directories",
        "create_file",
        "read_file",
        "append_to_file",
        "delete_file",
        "create_directory",
        "modify_file",
        "apply_modifications",
        "generate_text",
    ] {
        assert!(names.contains(&expected), "missing tool {}", expected);
    }
}
