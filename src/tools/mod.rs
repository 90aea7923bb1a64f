//! Store operation tool handlers.
//!
//! Each submodule contributes one tool family; [`build_server`] assembles
//! the full registry. Handlers read the free-form argument map
//! positionally - the dispatcher has already validated it against the
//! tool's input schema - and report domain failures in-band through
//! `ToolResult::is_error`.

pub mod artifacts;
pub mod bugfix;
pub mod claude;
pub mod epic;
pub mod lifecycle;
pub mod memory;
pub mod prd;
pub mod project;
pub mod prompts;
pub mod readme;
pub mod resources;
pub mod story;
pub mod task;
pub mod usage;
pub mod workflow;

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::engine::Bridge;
use crate::mcp::{ContentBlock, InputSchema, McpServer, Tool, ToolDefinition, ToolResult};

/// Server name advertised by `initialize`.
pub const SERVER_NAME: &str = "orchestra-mcp";

/// Namespace under which every built-in tool is aliased
/// (`orchestra.<name>` resolves to `<name>`).
pub const NAMESPACE: &str = "orchestra";

/// The free-form argument map handed to every tool handler.
pub type Args = Map<String, Value>;

/// Build the full MCP server: all tool families, resources, and prompts.
pub fn build_server(ws: &Path, bridge: Arc<Bridge>) -> McpServer {
    let mut server = McpServer::new(SERVER_NAME, env!("CARGO_PKG_VERSION"));
    server.register_tools(project::tools(ws));
    server.register_tools(epic::tools(ws));
    server.register_tools(story::tools(ws));
    server.register_tools(task::tools(ws));
    server.register_tools(workflow::tools(ws));
    server.register_tools(lifecycle::tools(ws));
    server.register_tools(prd::tools(ws));
    server.register_tools(bugfix::tools(ws));
    server.register_tools(artifacts::tools(ws));
    server.register_tools(usage::tools(ws));
    server.register_tools(claude::tools(ws));
    server.register_tools(readme::tools(ws));
    server.register_tools(memory::tools(ws, bridge));
    server.register_resources(resources::resources(ws));
    server.register_prompts(prompts::prompts(ws));
    server
}

/// Construct a namespaced tool from its parts.
pub(crate) fn tool<F>(name: &str, description: &str, schema: InputSchema, handler: F) -> Tool
where
    F: Fn(&Args) -> crate::Result<ToolResult> + Send + Sync + 'static,
{
    Tool {
        definition: ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: schema,
        },
        namespace: Some(NAMESPACE.to_string()),
        handler: Box::new(handler),
    }
}

/// A string argument, empty if absent or of the wrong type.
pub(crate) fn arg_str<'a>(args: &'a Args, key: &str) -> &'a str {
    args.get(key).and_then(Value::as_str).unwrap_or("")
}

/// A string argument as an owned Option, None if absent or empty.
pub(crate) fn arg_opt(args: &Args, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// An integer argument (JSON numbers arrive as f64 too), 0 if absent.
pub(crate) fn arg_u64(args: &Args, key: &str) -> u64 {
    match args.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// A float argument, 0.0 if absent.
pub(crate) fn arg_f64(args: &Args, key: &str) -> f64 {
    args.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Whether a key is present at all (used for partial updates).
pub(crate) fn has(args: &Args, key: &str) -> bool {
    args.contains_key(key)
}

/// The strings of an array argument, skipping non-string items.
pub(crate) fn arg_string_array(args: &Args, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Allocate the next issue ID for a project: `<KEY>-<N>` where N is the
/// current summary count plus one.
pub(crate) fn next_issue_id(summary: &crate::models::ProjectSummary) -> String {
    format!(
        "{}-{}",
        crate::ids::derive_key(&summary.project),
        summary.issue_count() + 1
    )
}

/// A plain text tool result.
pub(crate) fn text_result(text: impl Into<String>) -> ToolResult {
    ToolResult {
        content: vec![ContentBlock::text(text)],
        is_error: false,
    }
}

/// A JSON-formatted tool result.
pub(crate) fn json_result<T: Serialize>(value: &T) -> ToolResult {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    text_result(text)
}

/// An in-band error tool result.
pub(crate) fn error_result(message: impl Into<String>) -> ToolResult {
    ToolResult {
        content: vec![ContentBlock::text(message)],
        is_error: true,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use serde_json::json;

    /// Run a named tool against a server with the given JSON arguments.
    pub fn call(server: &McpServer, name: &str, arguments: Value) -> ToolResult {
        let tool = server
            .find_tool(name)
            .unwrap_or_else(|| panic!("tool not registered: {}", name));
        let args = match arguments {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        (tool.handler)(&args).expect("handler should not hard-fail")
    }

    /// The text of a tool result's first content block.
    pub fn result_text(result: &ToolResult) -> &str {
        result
            .content
            .first()
            .map(|c| c.text.as_str())
            .unwrap_or("")
    }

    /// Parse a tool result's text as JSON.
    pub fn result_json(result: &ToolResult) -> Value {
        serde_json::from_str(result_text(result)).unwrap_or(json!(null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_build_server_registers_catalog() {
        let temp = TempDir::new().unwrap();
        let bridge = Arc::new(Bridge::local(temp.path().to_path_buf()));
        let server = build_server(temp.path(), bridge);
        assert_eq!(server.tool_count(), 47);
        assert_eq!(server.resource_definitions().len(), 3);
        assert_eq!(server.prompt_definitions().len(), 3);
        // Spot-check a few names across families
        for name in [
            "create_project",
            "list_epics",
            "update_story",
            "delete_task",
            "get_next_task",
            "advance_task",
            "reject_task",
            "start_prd_session",
            "split_prd",
            "report_bug",
            "save_plan",
            "record_usage",
            "list_skills",
            "regenerate_readme",
            "save_memory",
        ] {
            assert!(server.find_tool(name).is_some(), "missing tool {}", name);
        }
    }

    #[test]
    fn test_every_tool_aliased_under_namespace() {
        let temp = TempDir::new().unwrap();
        let bridge = Arc::new(Bridge::local(temp.path().to_path_buf()));
        let server = build_server(temp.path(), bridge);
        assert!(server.find_tool("orchestra.create_project").is_some());
        assert!(server.find_tool("orchestra.get_next_task").is_some());
    }

    #[test]
    fn test_arg_helpers() {
        let args: Args = match json!({
            "s": "text", "n": 7, "f": 1.5, "empty": "", "arr": ["a", 3, "b"],
        }) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        assert_eq!(arg_str(&args, "s"), "text");
        assert_eq!(arg_str(&args, "missing"), "");
        assert_eq!(arg_opt(&args, "empty"), None);
        assert_eq!(arg_u64(&args, "n"), 7);
        assert_eq!(arg_u64(&args, "f"), 1);
        assert_eq!(arg_f64(&args, "f"), 1.5);
        assert!(has(&args, "empty"));
        assert!(!has(&args, "missing"));
        assert_eq!(arg_string_array(&args, "arr"), vec!["a", "b"]);
    }
}
