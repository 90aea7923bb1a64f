//! Workflow tools: next-task selection, current-task cascade, completion,
//! search, and project-wide status rollups.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::json;

use crate::ids;
use crate::mcp::{InputSchema, Tool};
use crate::models::{Issue, IssueKind, ProjectSummary, Status};
use crate::paths::{self, ScannedTask};
use crate::store::{self, ChildAction};
use crate::toon;
use crate::workflow;
use crate::workflow::events::{self, TransitionEvent};

use super::{arg_opt, arg_str, error_result, json_result, text_result, tool};

/// All workflow management tools.
pub fn tools(ws: &Path) -> Vec<Tool> {
    vec![
        get_next_task(ws.to_path_buf()),
        set_current_task(ws.to_path_buf()),
        complete_task(ws.to_path_buf()),
        search_issues(ws.to_path_buf()),
        get_workflow_status(ws.to_path_buf()),
    ]
}

fn project_schema() -> InputSchema {
    InputSchema::object(json!({"project": {"type": "string"}}), &["project"])
}

fn task_selector_schema() -> InputSchema {
    InputSchema::object(
        json!({
            "project": {"type": "string"},
            "epic_id": {"type": "string"},
            "story_id": {"type": "string"},
            "task_id": {"type": "string"},
        }),
        &["project", "epic_id", "story_id", "task_id"],
    )
}

/// Hotfixes beat bugs beat tasks.
fn type_rank(kind: IssueKind) -> u8 {
    match kind {
        IssueKind::Hotfix => 0,
        IssueKind::Bug => 1,
        IssueKind::Task => 2,
        _ => 3,
    }
}

/// Work already started ranks first, then fresh work, then the pipeline
/// states waiting on their next stage.
fn status_rank(status: Status) -> Option<u8> {
    match status {
        Status::InProgress => Some(0),
        Status::Todo => Some(1),
        Status::Backlog => Some(2),
        Status::ReadyForTesting => Some(3),
        Status::ReadyForDocs => Some(4),
        Status::Documented => Some(5),
        _ => None,
    }
}

fn get_next_task(ws: PathBuf) -> Tool {
    tool(
        "get_next_task",
        "Get highest priority actionable task",
        project_schema(),
        move |args| {
            let tasks = paths::scan_all_tasks(&ws, arg_str(args, "project"));
            let mut actionable: Vec<(&ScannedTask, u8, u8)> = tasks
                .iter()
                .filter_map(|t| {
                    status_rank(t.data.status).map(|rank| (t, type_rank(t.data.kind), rank))
                })
                .collect();
            if actionable.is_empty() {
                return Ok(text_result("no actionable tasks"));
            }
            actionable.sort_by_key(|(_, type_rank, status_rank)| (*type_rank, *status_rank));
            Ok(json_result(&actionable[0].0.data))
        },
    )
}

fn set_current_task(ws: PathBuf) -> Tool {
    tool(
        "set_current_task",
        "Set task to in-progress, cascade parents",
        task_selector_schema(),
        move |args| {
            let slug = arg_str(args, "project");
            let epic_id = arg_str(args, "epic_id");
            let story_id = arg_str(args, "story_id");
            let task_id = arg_str(args, "task_id");
            let task_file = paths::task_path(&ws, slug, epic_id, story_id, task_id);
            let mut task: Issue = match toon::parse_file(&task_file) {
                Ok(t) => t,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            if !workflow::is_valid(task.status, Status::InProgress) {
                return Ok(error_result(format!(
                    "cannot transition {} -> in-progress from {}",
                    task_id, task.status
                )));
            }
            let from = task.status;
            task.status = Status::InProgress;
            task.updated_at = Some(ids::now());
            if let Err(e) = toon::write_file(&task_file, &task) {
                return Ok(error_result(e.to_string()));
            }
            events::emit(&TransitionEvent {
                project: slug.to_string(),
                epic_id: Some(epic_id.to_string()),
                story_id: Some(story_id.to_string()),
                task_id: Some(task_id.to_string()),
                kind: task.kind,
                from: from.to_string(),
                to: Status::InProgress.to_string(),
                time: task.updated_at.clone().unwrap_or_default(),
            });

            // Pull the story along when it has not been started yet.
            let story_file = paths::story_path(&ws, slug, epic_id, story_id);
            let mut story = Issue::default();
            if let Ok(mut parsed) = toon::parse_file::<Issue>(&story_file) {
                if matches!(parsed.status, Status::Backlog | Status::Todo) {
                    parsed.status = Status::InProgress;
                    parsed.updated_at = Some(ids::now());
                    let _ = toon::write_file(&story_file, &parsed);
                }
                let _ =
                    store::update_parent_children(&story_file, ChildAction::Update, task.as_child());
                story = toon::parse_file(&story_file).unwrap_or(parsed);
            }

            // And the epic above it.
            let epic_file = paths::epic_path(&ws, slug, epic_id);
            let mut epic = Issue::default();
            if let Ok(mut parsed) = toon::parse_file::<Issue>(&epic_file) {
                if matches!(parsed.status, Status::Backlog | Status::Todo) {
                    parsed.status = Status::InProgress;
                    parsed.updated_at = Some(ids::now());
                    let _ = toon::write_file(&epic_file, &parsed);
                }
                let _ =
                    store::update_parent_children(&epic_file, ChildAction::Update, story.as_child());
                epic = toon::parse_file(&epic_file).unwrap_or(parsed);
            }

            let summary_file = paths::summary_path(&ws, slug);
            if let Ok(mut summary) = toon::parse_file::<ProjectSummary>(&summary_file) {
                store::update_summary(&mut summary, &task);
                if !story.id.is_empty() {
                    store::update_summary(&mut summary, &story);
                }
                if !epic.id.is_empty() {
                    store::update_summary(&mut summary, &epic);
                }
                summary.updated_at = Some(ids::now());
                let _ = toon::write_file(&summary_file, &summary);
            }
            Ok(json_result(&task))
        },
    )
}

fn complete_task(ws: PathBuf) -> Tool {
    tool(
        "complete_task",
        "Complete task, cascade done if all siblings done",
        task_selector_schema(),
        move |args| {
            let slug = arg_str(args, "project");
            let epic_id = arg_str(args, "epic_id");
            let story_id = arg_str(args, "story_id");
            let task_id = arg_str(args, "task_id");
            let task_file = paths::task_path(&ws, slug, epic_id, story_id, task_id);
            let mut task: Issue = match toon::parse_file(&task_file) {
                Ok(t) => t,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            if !workflow::is_valid(task.status, Status::ReadyForTesting) {
                return Ok(error_result(format!(
                    "cannot complete {} from {} (needs in-progress state)",
                    task_id, task.status
                )));
            }
            let from = task.status;
            task.status = Status::ReadyForTesting;
            task.updated_at = Some(ids::now());
            if let Err(e) = toon::write_file(&task_file, &task) {
                return Ok(error_result(e.to_string()));
            }
            events::emit(&TransitionEvent {
                project: slug.to_string(),
                epic_id: Some(epic_id.to_string()),
                story_id: Some(story_id.to_string()),
                task_id: Some(task_id.to_string()),
                kind: task.kind,
                from: from.to_string(),
                to: Status::ReadyForTesting.to_string(),
                time: task.updated_at.clone().unwrap_or_default(),
            });
            store::cascade_parents(&ws, slug, epic_id, story_id, &task);
            Ok(json_result(&task))
        },
    )
}

fn search_issues(ws: PathBuf) -> Tool {
    tool(
        "search",
        "Search issues by text, optional type filter",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "query": {"type": "string"},
                "type": {"type": "string", "enum": ["epic", "story", "task", "bug", "hotfix"]},
            }),
            &["project", "query"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let query = arg_str(args, "query").to_lowercase();
            let type_filter = match arg_opt(args, "type") {
                None => None,
                Some(raw) => match IssueKind::from_str(&raw) {
                    Ok(kind) => Some(kind),
                    Err(e) => return Ok(error_result(e.to_string())),
                },
            };
            let matches: Vec<Issue> = paths::scan_all_issues(&ws, slug)
                .into_iter()
                .filter(|issue| type_filter.map_or(true, |k| issue.data.kind == k))
                .filter(|issue| {
                    let text = format!(
                        "{} {}",
                        issue.data.title,
                        issue.data.description.as_deref().unwrap_or("")
                    )
                    .to_lowercase();
                    text.contains(&query)
                })
                .map(|issue| issue.data)
                .collect();
            Ok(json_result(&matches))
        },
    )
}

fn get_workflow_status(ws: PathBuf) -> Tool {
    tool(
        "get_workflow_status",
        "Get workflow stats: counts, blocked, completion %",
        project_schema(),
        move |args| {
            let tasks = paths::scan_all_tasks(&ws, arg_str(args, "project"));
            let mut by_status: BTreeMap<&'static str, usize> = BTreeMap::new();
            let mut by_type: BTreeMap<&'static str, usize> = BTreeMap::new();
            let mut blocked = Vec::new();
            let mut in_progress = Vec::new();
            let mut ready = Vec::new();
            let mut testing = Vec::new();
            let mut documenting = Vec::new();
            let mut reviewing = Vec::new();
            let mut done = 0usize;
            for task in &tasks {
                *by_status.entry(task.data.status.as_str()).or_default() += 1;
                *by_type.entry(task.data.kind.as_str()).or_default() += 1;
                if workflow::is_completed(task.data.status) {
                    done += 1;
                }
                let id = task.data.id.clone();
                match task.data.status {
                    Status::Blocked => blocked.push(id),
                    Status::InProgress => in_progress.push(id),
                    Status::Todo => ready.push(id),
                    Status::ReadyForTesting | Status::InTesting => testing.push(id),
                    Status::ReadyForDocs | Status::InDocs => documenting.push(id),
                    Status::Documented | Status::InReview => reviewing.push(id),
                    _ => {}
                }
            }
            let total = tasks.len();
            let pct = if total > 0 {
                done as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            Ok(json_result(&json!({
                "total": total,
                "done": done,
                "completion_pct": format!("{:.1}", pct),
                "by_status": by_status,
                "by_type": by_type,
                "blocked": blocked,
                "in_progress": in_progress,
                "ready": ready,
                "testing": testing,
                "documenting": documenting,
                "reviewing": reviewing,
            })))
        },
    )
}
