//! Bug reporting and request logging tools.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::json;

use crate::ids;
use crate::mcp::{InputSchema, Tool};
use crate::models::{Issue, IssueKind, Priority, ProjectSummary, RequestLog, RequestLogItem, Status};
use crate::paths;
use crate::store::{self, ChildAction};
use crate::toon;

use super::{arg_str, error_result, json_result, tool};

/// Bug reporting and request logging tools.
pub fn tools(ws: &Path) -> Vec<Tool> {
    vec![report_bug(ws.to_path_buf()), log_request(ws.to_path_buf())]
}

fn report_bug(ws: PathBuf) -> Tool {
    tool(
        "report_bug",
        "Report a bug under a story",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "story_id": {"type": "string"},
                "title": {"type": "string"},
                "severity": {"type": "string", "enum": ["critical", "high", "medium", "low"]},
                "steps": {"type": "string", "description": "Steps to reproduce"},
                "expected": {"type": "string"},
                "actual": {"type": "string"},
            }),
            &["project", "story_id", "title", "severity"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let story_id = arg_str(args, "story_id");
            let title = arg_str(args, "title");
            let severity = match Priority::from_str(arg_str(args, "severity")) {
                Ok(p) => p,
                Err(e) => return Ok(error_result(e.to_string())),
            };

            let mut description = format!("**Type:** Bug\n**Severity:** {}\n", severity);
            let steps = arg_str(args, "steps");
            if !steps.is_empty() {
                description.push_str(&format!("\n**Steps:**\n{}\n", steps));
            }
            let expected = arg_str(args, "expected");
            if !expected.is_empty() {
                description.push_str(&format!("\n**Expected:** {}\n", expected));
            }
            let actual = arg_str(args, "actual");
            if !actual.is_empty() {
                description.push_str(&format!("\n**Actual:** {}\n", actual));
            }

            let issues = paths::scan_all_issues(&ws, slug);
            let Some(story) = issues
                .iter()
                .find(|i| i.data.id == story_id && i.kind == IssueKind::Story)
            else {
                return Ok(error_result(format!("story not found: {}", story_id)));
            };
            let story_path = story.path.clone();

            let bug_id = format!("BUG-{}", issues.len() + 1);
            let mut bug = Issue::new(bug_id.clone(), IssueKind::Bug, title.to_string());
            bug.status = Status::Todo;
            bug.description = Some(description);
            bug.priority = Some(severity);

            let tasks_dir = match story_path.parent() {
                Some(dir) => dir.join("tasks"),
                None => return Ok(error_result("story path has no parent directory")),
            };
            if let Err(e) = fs::create_dir_all(&tasks_dir) {
                return Ok(error_result(e.to_string()));
            }
            if let Err(e) = toon::write_file(&tasks_dir.join(format!("{}.toon", bug_id)), &bug) {
                return Ok(error_result(e.to_string()));
            }
            let _ = store::update_parent_children(&story_path, ChildAction::Add, bug.as_child());
            let summary_file = paths::summary_path(&ws, slug);
            if let Ok(mut summary) = toon::parse_file::<ProjectSummary>(&summary_file) {
                store::update_summary(&mut summary, &bug);
                summary.updated_at = Some(ids::now());
                let _ = toon::write_file(&summary_file, &summary);
            }
            Ok(json_result(&json!({"id": bug_id, "status": "created"})))
        },
    )
}

fn log_request(ws: PathBuf) -> Tool {
    tool(
        "log_request",
        "Log a feature request or suggestion",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "type": {"type": "string", "enum": ["feature", "bug", "improvement", "question"]},
                "description": {"type": "string"},
            }),
            &["project", "type", "description"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let kind = arg_str(args, "type");
            if !matches!(kind, "feature" | "bug" | "improvement" | "question") {
                return Ok(error_result(format!("unknown request type: {}", kind)));
            }
            let path = paths::project_dir(&ws, slug).join("requests.toon");
            let mut log: RequestLog = toon::parse_file(&path).unwrap_or_default();
            log.project = slug.to_string();
            log.requests.push(RequestLogItem {
                id: format!("REQ-{}", log.requests.len() + 1),
                kind: kind.to_string(),
                date: ids::now(),
                description: arg_str(args, "description").to_string(),
                status: "new".to_string(),
            });
            if let Err(e) = toon::write_file(&path, &log) {
                return Ok(error_result(e.to_string()));
            }
            Ok(json_result(&json!({
                "status": "logged",
                "count": log.requests.len(),
            })))
        },
    )
}
