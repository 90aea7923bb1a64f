//! Built-in MCP prompts: guided instruction templates rendered from
//! project state.

use std::path::{Path, PathBuf};

use crate::mcp::{
    ContentBlock, Prompt, PromptArgument, PromptDefinition, PromptMessage,
};
use crate::models::{Issue, ProjectSummary, Status};
use crate::paths;
use crate::toon;
use crate::Error;

/// All built-in prompts.
pub fn prompts(ws: &Path) -> Vec<Prompt> {
    vec![
        create_prd(),
        review_task(ws.to_path_buf()),
        plan_sprint(ws.to_path_buf()),
    ]
}

fn argument(name: &str, description: &str, required: bool) -> PromptArgument {
    PromptArgument {
        name: name.to_string(),
        description: Some(description.to_string()),
        required,
    }
}

fn user_message(text: String) -> PromptMessage {
    PromptMessage {
        role: "user".to_string(),
        content: ContentBlock::text(text),
    }
}

fn create_prd() -> Prompt {
    Prompt {
        definition: PromptDefinition {
            name: "create_prd".to_string(),
            title: Some("Create PRD".to_string()),
            description: Some("Guided product requirements document creation".to_string()),
            arguments: vec![
                argument("project_name", "Name of the project", true),
                argument("description", "Brief project description", false),
            ],
        },
        handler: Box::new(|args| {
            let name = args.get("project_name").cloned().unwrap_or_default();
            let description = args
                .get("description")
                .filter(|d| !d.is_empty())
                .cloned()
                .unwrap_or_else(|| "No description provided".to_string());
            let text = format!(
                "Create a Product Requirements Document for {:?}.\nDescription: {}\n\n\
                 Include: 1) Problem statement 2) Target users 3) Core features \
                 4) Success metrics 5) Technical constraints 6) Timeline",
                name, description
            );
            Ok((format!("Create a PRD for {}", name), vec![user_message(text)]))
        }),
    }
}

fn review_task(ws: PathBuf) -> Prompt {
    Prompt {
        definition: PromptDefinition {
            name: "review_task".to_string(),
            title: Some("Review Task".to_string()),
            description: Some("Generate a code review prompt for a specific task".to_string()),
            arguments: vec![
                argument("project", "Project slug", true),
                argument("epic_id", "Epic ID", true),
                argument("story_id", "Story ID", true),
                argument("task_id", "Task ID to review", true),
            ],
        },
        handler: Box::new(move |args| {
            let get = |key: &str| args.get(key).cloned().unwrap_or_default();
            let path = paths::task_path(
                &ws,
                &get("project"),
                &get("epic_id"),
                &get("story_id"),
                &get("task_id"),
            );
            let task: Issue = toon::parse_file(&path)
                .map_err(|e| Error::NotFound(format!("task not found: {}", e)))?;
            let text = format!(
                "Review the implementation for task {}: {}\n\nDescription: {}\n\n\
                 Check: code quality, error handling, test coverage, security, patterns.",
                task.id,
                task.title,
                task.description.as_deref().unwrap_or("")
            );
            Ok((format!("Review: {}", task.title), vec![user_message(text)]))
        }),
    }
}

fn plan_sprint(ws: PathBuf) -> Prompt {
    Prompt {
        definition: PromptDefinition {
            name: "plan_sprint".to_string(),
            title: Some("Plan Sprint".to_string()),
            description: Some(
                "Generate a sprint planning prompt with current backlog".to_string(),
            ),
            arguments: vec![argument("project", "Project slug", true)],
        },
        handler: Box::new(move |args| {
            let slug = args.get("project").cloned().unwrap_or_default();
            let summary: ProjectSummary = toon::parse_file(&paths::summary_path(&ws, &slug))
                .map_err(|e| Error::NotFound(format!("project not found: {}", e)))?;
            let backlog: Vec<String> = summary
                .tasks
                .iter()
                .filter(|t| matches!(t.status, Status::Backlog | Status::Todo))
                .map(|t| format!("- [{}] {} ({})", t.id, t.title, t.status))
                .collect();
            let text = format!(
                "Plan the next sprint for {}.\n\nBacklog items:\n{}\n\n\
                 Prioritize by impact and dependencies. Group into a focused sprint.",
                summary.project,
                backlog.join("\n")
            );
            Ok((
                format!("Sprint Planning: {}", summary.project),
                vec![user_message(text)],
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::Bridge;
    use crate::mcp::{JsonRpcRequest, McpServer};
    use crate::tools::build_server;
    use crate::tools::test_support::call;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> (TempDir, McpServer) {
        let temp = TempDir::new().unwrap();
        let bridge = Arc::new(Bridge::local(temp.path().to_path_buf()));
        let server = build_server(temp.path(), bridge);
        call(&server, "create_project", json!({"name": "Test App"}));
        (temp, server)
    }

    fn get_prompt(server: &McpServer, name: &str, arguments: Value) -> crate::mcp::JsonRpcResponse {
        server
            .handle_request(&JsonRpcRequest {
                jsonrpc: "2.0".to_string(),
                id: json!(1),
                method: "prompts/get".to_string(),
                params: Some(json!({"name": name, "arguments": arguments})),
            })
            .unwrap()
    }

    #[test]
    fn test_prompts_listed() {
        let (_temp, server) = setup();
        let resp = server
            .handle_request(&JsonRpcRequest {
                jsonrpc: "2.0".to_string(),
                id: json!(1),
                method: "prompts/list".to_string(),
                params: None,
            })
            .unwrap();
        let prompts = resp.result.unwrap()["prompts"].clone();
        let names: Vec<&str> = prompts
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p["name"].as_str())
            .collect();
        assert_eq!(names, vec!["create_prd", "plan_sprint", "review_task"]);
    }

    #[test]
    fn test_create_prd_prompt_defaults_description() {
        let (_temp, server) = setup();
        let resp = get_prompt(&server, "create_prd", json!({"project_name": "Orchestra"}));
        let result = resp.result.unwrap();
        assert_eq!(result["description"], "Create a PRD for Orchestra");
        let text = result["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.contains("No description provided"));
        assert_eq!(result["messages"][0]["role"], "user");
    }

    #[test]
    fn test_review_task_prompt_loads_task() {
        let (_temp, server) = setup();
        call(
            &server,
            "create_epic",
            json!({"project": "test-app", "title": "Auth"}),
        );
        call(
            &server,
            "create_story",
            json!({"project": "test-app", "epic_id": "TA-1", "title": "Login", "user_story": "..."}),
        );
        call(
            &server,
            "create_task",
            json!({"project": "test-app", "epic_id": "TA-1", "story_id": "TA-2", "title": "API", "type": "task", "description": "build it"}),
        );
        let resp = get_prompt(
            &server,
            "review_task",
            json!({"project": "test-app", "epic_id": "TA-1", "story_id": "TA-2", "task_id": "TA-3"}),
        );
        let result = resp.result.unwrap();
        assert_eq!(result["description"], "Review: API");
        let text = result["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.contains("task TA-3: API"));
        assert!(text.contains("build it"));
    }

    #[test]
    fn test_review_task_prompt_missing_task() {
        let (_temp, server) = setup();
        let resp = get_prompt(
            &server,
            "review_task",
            json!({"project": "test-app", "epic_id": "X", "story_id": "Y", "task_id": "Z"}),
        );
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32000);
        assert!(err.message.contains("task not found"));
    }

    #[test]
    fn test_plan_sprint_prompt_includes_backlog() {
        let (_temp, server) = setup();
        call(
            &server,
            "create_epic",
            json!({"project": "test-app", "title": "Auth"}),
        );
        call(
            &server,
            "create_story",
            json!({"project": "test-app", "epic_id": "TA-1", "title": "Login", "user_story": "..."}),
        );
        call(
            &server,
            "create_task",
            json!({"project": "test-app", "epic_id": "TA-1", "story_id": "TA-2", "title": "API", "type": "task"}),
        );
        let resp = get_prompt(&server, "plan_sprint", json!({"project": "test-app"}));
        let result = resp.result.unwrap();
        let text = result["messages"][0]["content"]["text"].as_str().unwrap();
        assert!(text.contains("- [TA-3] API (backlog)"));
    }
}
