//! Integration tests for the stdio JSON-RPC transport and the CLI
//! surface, driven through the real binary.

mod common;

use common::TestEnv;
use predicates::prelude::*;
use serde_json::json;

// === CLI surface ===

#[test]
fn test_version_flag() {
    let env = TestEnv::new();
    env.orchestra()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("orchestra-mcp"))
        .stdout(predicate::str::contains("commit"));
}

#[test]
fn test_short_version_flag() {
    let env = TestEnv::new();
    env.orchestra().arg("-v").assert().success();
}

#[test]
fn test_help_flag() {
    let env = TestEnv::new();
    env.orchestra()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--workspace"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_init_scaffolds_workspace() {
    let env = TestEnv::new();
    env.orchestra()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Orchestra MCP initialized!"));
    assert!(env.workspace.path().join(".mcp.json").is_file());
    assert!(env.workspace.path().join(".projects/.events").is_dir());
    assert!(env
        .workspace
        .path()
        .join(".claude/skills/project-planner/SKILL.md")
        .is_file());
    assert!(env.workspace.path().join("CLAUDE.md").is_file());
}

#[test]
fn test_init_failure_exits_nonzero() {
    let mut cmd = assert_cmd::Command::new(env!("CARGO_BIN_EXE_orchestra-mcp"));
    cmd.args(["--workspace", "/dev/null/not-a-directory", "init"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

// === Stdio transport dispatch (scenario S5) ===

#[test]
fn test_initialize_then_tools_list_in_order() {
    let env = TestEnv::new();
    let responses = env.rpc(&[
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
    ]);
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[1]["id"], 2);

    let init = &responses[0]["result"];
    assert_eq!(init["protocolVersion"], "2024-11-05");
    assert_eq!(init["serverInfo"]["name"], "orchestra-mcp");
    assert!(init["capabilities"]["tools"].is_object());
    assert!(init["capabilities"]["resources"].is_object());
    assert!(init["capabilities"]["prompts"].is_object());

    let tools = responses[1]["result"]["tools"].as_array().unwrap();
    assert!(!tools.is_empty());
    assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
}

#[test]
fn test_unknown_method_error_code() {
    let env = TestEnv::new();
    let responses = env.rpc(&[json!({"jsonrpc": "2.0", "id": 3, "method": "unknown"})]);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["error"]["code"], -32601);
    assert_eq!(responses[0]["error"]["message"], "method not found: unknown");
}

#[test]
fn test_ping_and_string_id_echo() {
    let env = TestEnv::new();
    let responses = env.rpc(&[json!({"jsonrpc": "2.0", "id": "abc", "method": "ping"})]);
    assert_eq!(responses[0]["id"], "abc");
    assert_eq!(responses[0]["result"], json!({}));
}

#[test]
fn test_parse_error_skipped_loop_continues() {
    let env = TestEnv::new();
    let output = env
        .orchestra()
        .write_stdin("this is not json\n{\"jsonrpc\":\"2.0\",\"id\":4,\"method\":\"ping\"}\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 1, "bad line produces no response");
    let response: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(response["id"], 4);
}

#[test]
fn test_notification_produces_no_output_line() {
    let env = TestEnv::new();
    let responses = env.rpc(&[
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        json!({"jsonrpc": "2.0", "id": 5, "method": "ping"}),
    ]);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], 5);
}

#[test]
fn test_tool_call_schema_violation() {
    let env = TestEnv::new();
    let responses = env.rpc(&[TestEnv::tool_request(
        6,
        "create_project",
        json!({"description": "missing name"}),
    )]);
    assert_eq!(responses[0]["error"]["code"], -32602);
    assert_eq!(
        responses[0]["error"]["message"],
        "missing required parameter: name"
    );
}

#[test]
fn test_unknown_tool_error() {
    let env = TestEnv::new();
    let responses = env.rpc(&[TestEnv::tool_request(7, "no_such_tool", json!({}))]);
    assert_eq!(responses[0]["error"]["code"], -32601);
    assert_eq!(responses[0]["error"]["message"], "unknown tool: no_such_tool");
}

#[test]
fn test_namespaced_alias_call() {
    let env = TestEnv::new();
    let responses = env.rpc(&[TestEnv::tool_request(
        8,
        "orchestra.create_project",
        json!({"name": "Alias App"}),
    )]);
    let text = responses[0]["result"]["content"][0]["text"].as_str().unwrap();
    let value: serde_json::Value = serde_json::from_str(text).unwrap();
    assert_eq!(value["slug"], "alias-app");
}

// === Resources over the wire (scenario S6) ===

#[test]
fn test_resource_template_matching() {
    let env = TestEnv::new();
    common::seed_hierarchy(&env);
    let responses = env.rpc(&[
        json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "resources/read",
               "params": {"uri": "toon://project/test-app/task/TA-1/TA-2/TA-3"}}),
        json!({"jsonrpc": "2.0", "id": 3, "method": "resources/read",
               "params": {"uri": "toon://project/test-app/task/TA-1/TA-2"}}),
    ]);
    let resources = responses[0]["result"]["resources"].as_array().unwrap();
    assert_eq!(resources.len(), 3);

    let text = responses[1]["result"]["contents"][0]["text"].as_str().unwrap();
    let task: serde_json::Value = serde_json::from_str(text).unwrap();
    assert_eq!(task["id"], "TA-3");

    // Fewer segments than the template: no match
    assert_eq!(responses[2]["error"]["code"], -32601);
}
