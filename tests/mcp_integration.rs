//! Integration tests for MCP protocol handling.
//!
//! These tests drive the dispatcher with raw JSON-RPC text, the way the
//! transport does, and check both the replies and the resulting store state.

use std::sync::Arc;

use codebase_view_mcp::mcp::protocol::{parse_message, ErrorCode, RequestId};
use codebase_view_mcp::mcp::{JsonRpcReply, ProtocolDispatcher};
use codebase_view_mcp::metadata::{LineRange, MetadataStore, Priority};
use serde_json::{json, Value};

fn dispatcher() -> ProtocolDispatcher {
    ProtocolDispatcher::new(Arc::new(MetadataStore::in_memory()))
}

fn send(dispatcher: &ProtocolDispatcher, request: &Value) -> JsonRpcReply {
    dispatcher
        .handle(&request.to_string())
        .expect("request should get a reply")
}

fn reply_text(reply: &JsonRpcReply) -> String {
    reply.result().expect("expected success")["content"][0]["text"]
        .as_str()
        .expect("text content")
        .to_string()
}

// =============================================================================
// Protocol Parsing Tests
// =============================================================================

#[test]
fn test_parse_initialize_request() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {
                "name": "test-client",
                "version": "1.0.0"
            }
        }
    }"#;

    let req = parse_message(json).unwrap();
    assert_eq!(req.method, "initialize");
    assert_eq!(req.id, Some(RequestId::from(1)));
    assert!(!req.is_notification());
}

#[test]
fn test_parse_notification() {
    let json = r#"{
        "jsonrpc": "2.0",
        "method": "notifications/initialized"
    }"#;

    let req = parse_message(json).unwrap();
    assert!(req.is_notification());
    assert!(dispatcher().handle(json).is_none());
}

// =============================================================================
// Dispatch Scenarios
// =============================================================================

#[test]
fn test_malformed_body_is_parse_error_with_null_id() {
    let reply = dispatcher().handle(r#"{"jsonrpc": "2.0", "id": 5, "method": "#).unwrap();

    let error = reply.error().unwrap();
    assert_eq!(error.code, -32700);
    assert_eq!(error.message, "Parse error");

    let wire: Value = serde_json::to_value(&reply).unwrap();
    assert!(wire["id"].is_null());
    assert_eq!(wire["jsonrpc"], "2.0");
}

#[test]
fn test_unknown_method_names_method() {
    let reply = send(
        &dispatcher(),
        &json!({"jsonrpc": "2.0", "id": "x1", "method": "sampling/createMessage"}),
    );
    let error = reply.error().unwrap();
    assert_eq!(error.code, -32601);
    assert!(error.message.contains("sampling/createMessage"));
    assert_eq!(reply.id(), Some(&RequestId::from("x1")));
}

#[test]
fn test_submit_test_metadata_scenario() {
    let dispatcher = dispatcher();
    let reply = send(
        &dispatcher,
        &json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": {
                "name": "submit-test-metadata",
                "arguments": {
                    "sourceFile": "a.go",
                    "tests": [{
                        "testFile": "a_test.go",
                        "testName": "TestA",
                        "comment": "c",
                        "lineRange": {"start": 1, "end": 5},
                        "coveredLines": {"start": 10, "end": 12}
                    }]
                }
            }
        }),
    );

    let text = reply_text(&reply);
    assert!(text.contains("a.go"));
    assert!(text.contains("1 tests"));

    let meta = dispatcher.store().get_test_metadata("a.go").unwrap();
    assert_eq!(meta.tests.len(), 1);
    assert_eq!(meta.tests[0].test_name, "TestA");
    assert_eq!(meta.tests[0].covered_lines, LineRange::new(10, 12));
}

#[test]
fn test_submission_without_id_is_stored() {
    let dispatcher = dispatcher();
    let reply = send(
        &dispatcher,
        &json!({
            "jsonrpc": "2.0",
            "method": "tools/call",
            "params": {
                "name": "submit-test-metadata",
                "arguments": {
                    "sourceFile": "a.go",
                    "tests": [{
                        "testFile": "a_test.go",
                        "testName": "TestA",
                        "comment": "c",
                        "lineRange": {"start": 1, "end": 5},
                        "coveredLines": {"start": 10, "end": 12}
                    }]
                }
            }
        }),
    );

    assert!(reply_text(&reply).contains("1 tests"));
    assert!(reply.id().is_none());
    let meta = dispatcher.store().get_test_metadata("a.go").unwrap();
    assert_eq!(meta.tests[0].test_name, "TestA");
}

#[test]
fn test_wrong_typed_envelope_is_parse_error() {
    let reply = dispatcher()
        .handle(r#"{"jsonrpc": "2.0", "id": 1, "method": 5}"#)
        .unwrap();
    assert_eq!(reply.error().unwrap().code, -32700);
    assert!(reply.id().is_none());
}

#[test]
fn test_resubmission_merges() {
    let dispatcher = dispatcher();
    let submit = |tests: Value| {
        send(
            &dispatcher,
            &json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {
                    "name": "submit-test-metadata",
                    "arguments": {"sourceFile": "lib.rs", "tests": tests}
                }
            }),
        )
    };

    let test = |name: &str, end: u32| {
        json!({
            "testFile": "tests/lib.rs",
            "testName": name,
            "comment": "checks parsing",
            "lineRange": {"start": 1, "end": 9},
            "coveredLines": {"start": 20, "end": end}
        })
    };

    assert!(submit(json!([test("parses_empty", 21), test("parses_long", 30)]))
        .result()
        .is_some());
    assert!(submit(json!([test("parses_empty", 25), test("rejects_bad", 40)]))
        .result()
        .is_some());

    let tests = dispatcher.store().get_test_metadata("lib.rs").unwrap().tests;
    assert_eq!(tests.len(), 3);
    let empty = tests.iter().find(|t| t.test_name == "parses_empty").unwrap();
    assert_eq!(empty.covered_lines.end, 25);
}

#[test]
fn test_suggest_missing_tests() {
    let dispatcher = dispatcher();
    let reply = send(
        &dispatcher,
        &json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": {
                "name": "suggest-missing-tests",
                "arguments": {
                    "sourceFile": "src/cache.rs",
                    "suggestions": [{
                        "targetLines": {"start": 40, "end": 48},
                        "reason": "eviction path never runs in tests",
                        "suggestedName": "evicts_oldest_entry",
                        "testSkeleton": "#[test]\nfn evicts_oldest_entry() {}",
                        "priority": "high"
                    }]
                }
            }
        }),
    );

    assert!(reply_text(&reply).contains("1 test suggestions"));
    let suggestions = dispatcher.store().get_suggestions("src/cache.rs");
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].priority, Priority::High);
}

#[test]
fn test_unknown_tool_is_internal_error() {
    let dispatcher = dispatcher();
    let reply = send(
        &dispatcher,
        &json!({
            "jsonrpc": "2.0",
            "id": 6,
            "method": "tools/call",
            "params": {"name": "nonexistent-tool", "arguments": {}}
        }),
    );

    let error = reply.error().unwrap();
    assert_eq!(error.code, ErrorCode::InternalError.code());
    assert!(error.message.contains("unknown tool: nonexistent-tool"));
    assert_eq!(reply.id(), Some(&RequestId::from(6)));
}

#[test]
fn test_bad_batch_is_rejected_atomically() {
    let dispatcher = dispatcher();
    let reply = send(
        &dispatcher,
        &json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": {
                "name": "submit-test-metadata",
                "arguments": {
                    "sourceFile": "a.go",
                    "tests": [
                        {
                            "testFile": "a_test.go",
                            "testName": "TestGood",
                            "comment": "fine",
                            "lineRange": {"start": 1, "end": 5},
                            "coveredLines": {"start": 10, "end": 12}
                        },
                        {
                            "testFile": "a_test.go",
                            "testName": "TestBad",
                            "comment": "reversed",
                            "lineRange": {"start": 9, "end": 2},
                            "coveredLines": {"start": 10, "end": 12}
                        }
                    ]
                }
            }
        }),
    );

    assert_eq!(reply.error().unwrap().code, -32603);
    assert!(dispatcher.store().get_test_metadata("a.go").is_none());
}

#[test]
fn test_prompts_round_trip() {
    let dispatcher = dispatcher();

    let list = send(
        &dispatcher,
        &json!({"jsonrpc": "2.0", "id": 8, "method": "prompts/list"}),
    );
    let prompts = &list.result().unwrap()["prompts"];
    assert_eq!(prompts[0]["name"], "codebase-tests-review");
    assert_eq!(prompts[0]["arguments"][1]["name"], "filePath");

    let get = send(
        &dispatcher,
        &json!({
            "jsonrpc": "2.0",
            "id": 9,
            "method": "prompts/get",
            "params": {
                "name": "codebase-tests-review",
                "arguments": {"functionName": "Merge", "filePath": "store.go"}
            }
        }),
    );
    let text = get.result().unwrap()["messages"][0]["content"]["text"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(text.contains("Merge"));
    assert!(text.contains("store.go"));
    assert!(text.contains("submit-test-metadata"));

    let unknown = send(
        &dispatcher,
        &json!({
            "jsonrpc": "2.0",
            "id": 10,
            "method": "prompts/get",
            "params": {"name": "nope", "arguments": {}}
        }),
    );
    assert_eq!(unknown.error().unwrap().code, -32603);
}
