//! Common test utilities for orchestra-mcp integration tests.
//!
//! Provides `TestEnv`, an isolated workspace plus helpers for driving
//! the real binary over its stdio JSON-RPC transport.

#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::{json, Value};
pub use tempfile::TempDir;

/// An isolated workspace directory and a handle to the binary.
pub struct TestEnv {
    pub workspace: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            workspace: TempDir::new().unwrap(),
        }
    }

    /// A Command for the orchestra-mcp binary targeting this workspace.
    pub fn orchestra(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_orchestra-mcp"));
        cmd.args(["--workspace", self.workspace.path().to_str().unwrap()]);
        cmd
    }

    /// Send JSON-RPC requests as stdin lines to one server process and
    /// return the response lines, in order.
    pub fn rpc(&self, requests: &[Value]) -> Vec<Value> {
        let input: String = requests
            .iter()
            .map(|r| format!("{}\n", r))
            .collect();
        let output = self
            .orchestra()
            .write_stdin(input)
            .output()
            .expect("failed to run orchestra-mcp");
        assert!(
            output.status.success(),
            "server exited with {:?}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| serde_json::from_str(l).expect("response line is not JSON"))
            .collect()
    }

    /// Build a tools/call request with the given ID.
    pub fn tool_request(id: u64, name: &str, arguments: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments},
        })
    }

    /// Call a single tool in its own server process and return the
    /// (text, is_error) pair from its result. State persists in the
    /// workspace between calls.
    pub fn call_tool(&self, name: &str, arguments: Value) -> (String, bool) {
        let responses = self.rpc(&[Self::tool_request(1, name, arguments)]);
        assert_eq!(responses.len(), 1, "expected one response");
        let result = &responses[0]["result"];
        assert!(
            !result.is_null(),
            "tool call failed at the protocol level: {}",
            responses[0]
        );
        let text = result["content"][0]["text"].as_str().unwrap_or("").to_string();
        let is_error = result["isError"].as_bool().unwrap_or(false);
        (text, is_error)
    }

    /// Like `call_tool`, asserting success and parsing the text as JSON.
    pub fn call_tool_json(&self, name: &str, arguments: Value) -> Value {
        let (text, is_error) = self.call_tool(name, arguments);
        assert!(!is_error, "{} returned error: {}", name, text);
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Seed a project with one epic, story, and task (TA-1/TA-2/TA-3).
pub fn seed_hierarchy(env: &TestEnv) {
    env.call_tool_json(
        "create_project",
        json!({"name": "Test App", "description": "A test"}),
    );
    env.call_tool_json("create_epic", json!({"project": "test-app", "title": "Auth"}));
    env.call_tool_json(
        "create_story",
        json!({"project": "test-app", "epic_id": "TA-1", "title": "Login", "user_story": "As a user I want to log in"}),
    );
    env.call_tool_json(
        "create_task",
        json!({"project": "test-app", "epic_id": "TA-1", "story_id": "TA-2", "title": "API", "type": "task"}),
    );
}

/// The standard epic/story/task selector for the seeded hierarchy.
pub fn selector() -> Value {
    json!({"project": "test-app", "epic_id": "TA-1", "story_id": "TA-2", "task_id": "TA-3"})
}

/// Selector with one extra field set.
pub fn selector_with(key: &str, value: Value) -> Value {
    let mut args = selector();
    args[key] = value;
    args
}
