//! Lifecycle tools: the evidence-gated advance and rejection with
//! automatic bug creation.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};

use crate::ids;
use crate::mcp::{InputSchema, Tool};
use crate::models::{Issue, IssueKind, Priority, ProjectSummary, Status};
use crate::paths;
use crate::store::{self, ChildAction};
use crate::toon;
use crate::workflow;
use crate::workflow::events::{self, TransitionEvent};

use super::{arg_str, error_result, json_result, next_issue_id, tool};

/// Advance/reject lifecycle tools.
pub fn tools(ws: &Path) -> Vec<Tool> {
    vec![advance_task(ws.to_path_buf()), reject_task(ws.to_path_buf())]
}

fn advance_task(ws: PathBuf) -> Tool {
    tool(
        "advance_task",
        "Advance task to next lifecycle stage. Gated transitions (from in-progress, in-testing, in-docs, in-review) require 'evidence' describing work done.",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "epic_id": {"type": "string"},
                "story_id": {"type": "string"},
                "task_id": {"type": "string"},
                "evidence": {"type": "string", "description": "Required for gated transitions. Describe tests run, docs written, or review findings."},
            }),
            &["project", "epic_id", "story_id", "task_id"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let epic_id = arg_str(args, "epic_id");
            let story_id = arg_str(args, "story_id");
            let task_id = arg_str(args, "task_id");
            let evidence = arg_str(args, "evidence");
            let task_file = paths::task_path(&ws, slug, epic_id, story_id, task_id);
            let mut task: Issue = match toon::parse_file(&task_file) {
                Ok(t) => t,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let Some(next) = workflow::advance_target(task.status) else {
                return Ok(error_result(format!(
                    "cannot advance {} from {}",
                    task_id, task.status
                )));
            };
            if let Some(gate) = workflow::gate_requirement(task.status) {
                if evidence.is_empty() {
                    return Ok(error_result(format!(
                        "GATE BLOCKED: Cannot advance {} from '{}' without evidence.\nRequired: {}\nProvide 'evidence' parameter describing work done at this stage.",
                        task_id, task.status, gate
                    )));
                }
            }
            let from = task.status;
            task.status = next;
            task.updated_at = Some(ids::now());
            let _ = toon::write_file(&task_file, &task);
            events::emit(&TransitionEvent {
                project: slug.to_string(),
                epic_id: Some(epic_id.to_string()),
                story_id: Some(story_id.to_string()),
                task_id: Some(task_id.to_string()),
                kind: task.kind,
                from: from.to_string(),
                to: next.to_string(),
                time: task.updated_at.clone().unwrap_or_default(),
            });
            store::cascade_parents(&ws, slug, epic_id, story_id, &task);

            let mut result = Map::new();
            result.insert("task".to_string(), json!(task));
            result.insert("from".to_string(), json!(from.to_string()));
            result.insert("to".to_string(), json!(next.to_string()));
            if !evidence.is_empty() {
                result.insert("evidence".to_string(), json!(evidence));
            }
            if let Some(hint) = workflow::gate_hint(next) {
                result.insert("gate".to_string(), json!(hint));
            }
            Ok(json_result(&Value::Object(result)))
        },
    )
}

fn reject_task(ws: PathBuf) -> Tool {
    tool(
        "reject_task",
        "Reject task from review, auto-creates bug",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "epic_id": {"type": "string"},
                "story_id": {"type": "string"},
                "task_id": {"type": "string"},
                "reason": {"type": "string", "description": "Rejection reason"},
            }),
            &["project", "epic_id", "story_id", "task_id"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let epic_id = arg_str(args, "epic_id");
            let story_id = arg_str(args, "story_id");
            let task_id = arg_str(args, "task_id");
            let reason = arg_str(args, "reason");
            let task_file = paths::task_path(&ws, slug, epic_id, story_id, task_id);
            let mut task: Issue = match toon::parse_file(&task_file) {
                Ok(t) => t,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            if !workflow::is_valid(task.status, Status::Rejected) {
                return Ok(error_result(format!(
                    "cannot reject {} from {} (must be in-review)",
                    task_id, task.status
                )));
            }
            let from = task.status;
            task.status = Status::Rejected;
            task.updated_at = Some(ids::now());
            let _ = toon::write_file(&task_file, &task);
            events::emit(&TransitionEvent {
                project: slug.to_string(),
                epic_id: Some(epic_id.to_string()),
                story_id: Some(story_id.to_string()),
                task_id: Some(task_id.to_string()),
                kind: task.kind,
                from: from.to_string(),
                to: Status::Rejected.to_string(),
                time: task.updated_at.clone().unwrap_or_default(),
            });
            let bug = match create_rejection_bug(&ws, slug, epic_id, story_id, &task, reason) {
                Ok(bug) => bug,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            store::cascade_parents(&ws, slug, epic_id, story_id, &task);
            Ok(json_result(&json!({
                "rejected": task,
                "bug_created": bug,
            })))
        },
    )
}

/// Spawn the follow-up bug under the same story, with a fresh ID, high
/// priority, and a description pointing back at the rejected task.
fn create_rejection_bug(
    ws: &Path,
    slug: &str,
    epic_id: &str,
    story_id: &str,
    task: &Issue,
    reason: &str,
) -> crate::Result<Issue> {
    let summary_file = paths::summary_path(ws, slug);
    let mut summary: ProjectSummary = toon::parse_file(&summary_file)?;
    let id = next_issue_id(&summary);
    let mut description = format!("Rejected from {}: {}", task.id, task.title);
    if !reason.is_empty() {
        description.push_str("\n\nReason: ");
        description.push_str(reason);
    }
    let mut bug = Issue::new(id.clone(), IssueKind::Bug, format!("Fix: {}", task.title));
    bug.description = Some(description);
    bug.priority = Some(Priority::High);

    let tasks_dir = paths::project_dir(ws, slug)
        .join("epics")
        .join(epic_id)
        .join("stories")
        .join(story_id)
        .join("tasks");
    fs::create_dir_all(&tasks_dir)?;
    toon::write_file(&tasks_dir.join(format!("{}.toon", id)), &bug)?;

    let story_file = paths::story_path(ws, slug, epic_id, story_id);
    let _ = store::update_parent_children(&story_file, ChildAction::Add, bug.as_child());
    store::update_summary(&mut summary, &bug);
    summary.updated_at = Some(ids::now());
    let _ = toon::write_file(&summary_file, &summary);
    Ok(bug)
}
