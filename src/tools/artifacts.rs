//! Plan document tools: front-matter Markdown files under `plans/`.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::ids;
use crate::mcp::{InputSchema, Tool};
use crate::paths;

use super::{arg_str, error_result, json_result, tool};

/// Plan/artifact management tools.
pub fn tools(ws: &Path) -> Vec<Tool> {
    vec![save_plan(ws.to_path_buf()), list_plans(ws.to_path_buf())]
}

fn plans_dir(ws: &Path, slug: &str) -> PathBuf {
    paths::project_dir(ws, slug).join("plans")
}

fn save_plan(ws: PathBuf) -> Tool {
    tool(
        "save_plan",
        "Save a plan document as markdown",
        InputSchema::object(
            json!({
                "project": {"type": "string", "description": "Project slug"},
                "title": {"type": "string", "description": "Plan title"},
                "content": {"type": "string", "description": "Markdown content"},
                "issue_id": {"type": "string", "description": "Related issue ID"},
            }),
            &["project", "title", "content"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let title = arg_str(args, "title");
            let issue_id = arg_str(args, "issue_id");
            let dir = plans_dir(&ws, slug);
            if let Err(e) = fs::create_dir_all(&dir) {
                return Ok(error_result(e.to_string()));
            }
            let filename = format!("{}.md", ids::slugify(title));
            let mut header = format!("---\ntitle: {}\ncreated: {}\n", title, ids::now());
            if !issue_id.is_empty() {
                header.push_str(&format!("issue_id: {}\n", issue_id));
            }
            header.push_str("---\n\n");
            let path = dir.join(&filename);
            if let Err(e) = fs::write(&path, format!("{}{}", header, arg_str(args, "content"))) {
                return Ok(error_result(e.to_string()));
            }
            Ok(json_result(&json!({
                "file": filename,
                "path": path.display().to_string(),
            })))
        },
    )
}

fn list_plans(ws: PathBuf) -> Tool {
    tool(
        "list_plans",
        "List all plan documents for a project",
        InputSchema::object(
            json!({"project": {"type": "string", "description": "Project slug"}}),
            &["project"],
        ),
        move |args| {
            let dir = plans_dir(&ws, arg_str(args, "project"));
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(json_result(&Vec::<serde_json::Value>::new()));
                }
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let mut files: Vec<PathBuf> = entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
                .collect();
            files.sort();
            let plans: Vec<serde_json::Value> = files
                .iter()
                .filter_map(|path| {
                    let file = path.file_name()?.to_str()?.to_string();
                    let content = fs::read_to_string(path).ok()?;
                    let front = parse_front_matter(&content);
                    let mut plan = serde_json::Map::new();
                    plan.insert("file".to_string(), json!(file));
                    plan.insert("title".to_string(), json!(front.title));
                    if let Some(issue_id) = front.issue_id {
                        plan.insert("issue_id".to_string(), json!(issue_id));
                    }
                    if let Some(created) = front.created {
                        plan.insert("created".to_string(), json!(created));
                    }
                    Some(serde_json::Value::Object(plan))
                })
                .collect();
            Ok(json_result(&plans))
        },
    )
}

#[derive(Default)]
struct FrontMatter {
    title: String,
    created: Option<String>,
    issue_id: Option<String>,
}

/// Extract recognized keys from the leading `---` front-matter block.
/// Everything outside the block, and unrecognized keys, are ignored.
fn parse_front_matter(content: &str) -> FrontMatter {
    let mut front = FrontMatter::default();
    let mut in_block = false;
    for line in content.lines() {
        if line == "---" {
            if in_block {
                break;
            }
            in_block = true;
            continue;
        }
        if !in_block {
            continue;
        }
        if let Some(title) = line.strip_prefix("title: ") {
            front.title = title.to_string();
        } else if let Some(created) = line.strip_prefix("created: ") {
            front.created = Some(created.to_string());
        } else if let Some(issue_id) = line.strip_prefix("issue_id: ") {
            front.issue_id = Some(issue_id.to_string());
        }
    }
    front
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Bridge;
    use crate::tools::build_server;
    use crate::tools::test_support::{call, result_json};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> (TempDir, crate::mcp::McpServer) {
        let temp = TempDir::new().unwrap();
        let bridge = Arc::new(Bridge::local(temp.path().to_path_buf()));
        let server = build_server(temp.path(), bridge);
        call(&server, "create_project", json!({"name": "Test App"}));
        (temp, server)
    }

    #[test]
    fn test_save_plan_slugifies_filename() {
        let (temp, server) = setup();
        let result = result_json(&call(
            &server,
            "save_plan",
            json!({
                "project": "test-app",
                "title": "Sprint One Plan!",
                "content": "# Goals\n\n- ship",
                "issue_id": "TA-1",
            }),
        ));
        assert_eq!(result["file"], "sprint-one-plan.md");

        let content = fs::read_to_string(
            plans_dir(temp.path(), "test-app").join("sprint-one-plan.md"),
        )
        .unwrap();
        assert!(content.starts_with("---\ntitle: Sprint One Plan!\n"));
        assert!(content.contains("issue_id: TA-1\n"));
        assert!(content.ends_with("# Goals\n\n- ship"));
    }

    #[test]
    fn test_list_plans_parses_front_matter() {
        let (_temp, server) = setup();
        call(
            &server,
            "save_plan",
            json!({"project": "test-app", "title": "Alpha", "content": "a", "issue_id": "TA-1"}),
        );
        call(
            &server,
            "save_plan",
            json!({"project": "test-app", "title": "Beta", "content": "b"}),
        );
        let plans = result_json(&call(&server, "list_plans", json!({"project": "test-app"})));
        let list = plans.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["title"], "Alpha");
        assert_eq!(list[0]["issue_id"], "TA-1");
        assert!(list[0]["created"].as_str().unwrap().ends_with('Z'));
        assert_eq!(list[1]["title"], "Beta");
        assert!(list[1].get("issue_id").is_none());
    }

    #[test]
    fn test_list_plans_empty() {
        let (_temp, server) = setup();
        let plans = result_json(&call(&server, "list_plans", json!({"project": "test-app"})));
        assert_eq!(plans, json!([]));
    }

    #[test]
    fn test_parse_front_matter_ignores_body() {
        let front = parse_front_matter("---\ntitle: X\n---\n\ntitle: not me\n");
        assert_eq!(front.title, "X");
        assert!(front.created.is_none());
    }
}
