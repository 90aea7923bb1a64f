//! Task management tools. Tasks, bugs, and hotfixes all live under a
//! story and share the same entity shape.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::json;

use crate::ids;
use crate::mcp::{InputSchema, Tool};
use crate::models::{Issue, IssueChild, IssueKind, ProjectSummary};
use crate::paths;
use crate::store::{self, ChildAction};
use crate::toon;
use crate::workflow::events::{self, TransitionEvent};

use super::epic::{apply_issue_update, parse_priority};
use super::{arg_opt, arg_str, error_result, json_result, next_issue_id, text_result, tool};

/// All task management tools.
pub fn tools(ws: &Path) -> Vec<Tool> {
    vec![
        list_tasks(ws.to_path_buf()),
        create_task(ws.to_path_buf()),
        get_task(ws.to_path_buf()),
        update_task(ws.to_path_buf()),
        delete_task(ws.to_path_buf()),
    ]
}

fn task_selector_schema(extra: serde_json::Value) -> InputSchema {
    let mut properties = json!({
        "project": {"type": "string"},
        "epic_id": {"type": "string"},
        "story_id": {"type": "string"},
        "task_id": {"type": "string"},
    });
    if let (Some(base), Some(more)) = (properties.as_object_mut(), extra.as_object()) {
        for (k, v) in more {
            base.insert(k.clone(), v.clone());
        }
    }
    InputSchema::object(properties, &["project", "epic_id", "story_id", "task_id"])
}

fn list_tasks(ws: PathBuf) -> Tool {
    tool(
        "list_tasks",
        "List tasks in a story",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "epic_id": {"type": "string"},
                "story_id": {"type": "string"},
            }),
            &["project", "epic_id", "story_id"],
        ),
        move |args| {
            let dir = paths::project_dir(&ws, arg_str(args, "project"))
                .join("epics")
                .join(arg_str(args, "epic_id"))
                .join("stories")
                .join(arg_str(args, "story_id"))
                .join("tasks");
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(json_result(&Vec::<Issue>::new()));
                }
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let mut files: Vec<PathBuf> = entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "toon"))
                .collect();
            files.sort();
            let tasks: Vec<Issue> = files
                .iter()
                .filter_map(|p| toon::parse_file(p).ok())
                .collect();
            Ok(json_result(&tasks))
        },
    )
}

fn create_task(ws: PathBuf) -> Tool {
    tool(
        "create_task",
        "Create a task/bug/hotfix under a story",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "epic_id": {"type": "string"},
                "story_id": {"type": "string"},
                "title": {"type": "string"},
                "type": {"type": "string", "enum": ["task", "bug", "hotfix"]},
                "description": {"type": "string"},
                "priority": {"type": "string"},
            }),
            &["project", "epic_id", "story_id", "title", "type"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let epic_id = arg_str(args, "epic_id");
            let story_id = arg_str(args, "story_id");
            let kind = match IssueKind::from_str(arg_str(args, "type")) {
                Ok(k @ (IssueKind::Task | IssueKind::Bug | IssueKind::Hotfix)) => k,
                Ok(other) => {
                    return Ok(error_result(format!(
                        "type must be task, bug, or hotfix (got {})",
                        other
                    )));
                }
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let summary_file = paths::summary_path(&ws, slug);
            let mut summary: ProjectSummary = match toon::parse_file(&summary_file) {
                Ok(s) => s,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let story_file = paths::story_path(&ws, slug, epic_id, story_id);
            if !paths::file_exists(&story_file) {
                return Ok(error_result(format!("story not found: {}", story_id)));
            }
            let priority = match parse_priority(args) {
                Ok(p) => p,
                Err(msg) => return Ok(error_result(msg)),
            };
            let id = next_issue_id(&summary);
            let tasks_dir = paths::project_dir(&ws, slug)
                .join("epics")
                .join(epic_id)
                .join("stories")
                .join(story_id)
                .join("tasks");
            if let Err(e) = fs::create_dir_all(&tasks_dir) {
                return Ok(error_result(e.to_string()));
            }
            let mut task = Issue::new(id.clone(), kind, arg_str(args, "title").to_string());
            task.description = arg_opt(args, "description");
            task.priority = priority;
            if let Err(e) = toon::write_file(&tasks_dir.join(format!("{}.toon", id)), &task) {
                return Ok(error_result(e.to_string()));
            }
            let _ = store::update_parent_children(&story_file, ChildAction::Add, task.as_child());
            store::update_summary(&mut summary, &task);
            summary.updated_at = Some(ids::now());
            let _ = toon::write_file(&summary_file, &summary);
            Ok(json_result(&task))
        },
    )
}

fn get_task(ws: PathBuf) -> Tool {
    tool(
        "get_task",
        "Get task details",
        task_selector_schema(json!({})),
        move |args| {
            let path = paths::task_path(
                &ws,
                arg_str(args, "project"),
                arg_str(args, "epic_id"),
                arg_str(args, "story_id"),
                arg_str(args, "task_id"),
            );
            match toon::parse_file::<Issue>(&path) {
                Ok(task) => Ok(json_result(&task)),
                Err(e) => Ok(error_result(e.to_string())),
            }
        },
    )
}

fn update_task(ws: PathBuf) -> Tool {
    tool(
        "update_task",
        "Update task with workflow validation",
        task_selector_schema(json!({
            "title": {"type": "string"},
            "description": {"type": "string"},
            "status": {"type": "string"},
            "priority": {"type": "string"},
        })),
        move |args| {
            let slug = arg_str(args, "project");
            let epic_id = arg_str(args, "epic_id");
            let story_id = arg_str(args, "story_id");
            let task_id = arg_str(args, "task_id");
            let path = paths::task_path(&ws, slug, epic_id, story_id, task_id);
            let mut task: Issue = match toon::parse_file(&path) {
                Ok(t) => t,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let old_status = task.status;
            if let Err(result) = apply_issue_update(&mut task, args) {
                return Ok(result);
            }
            task.updated_at = Some(ids::now());
            if let Err(e) = toon::write_file(&path, &task) {
                return Ok(error_result(e.to_string()));
            }
            if old_status != task.status {
                events::emit(&TransitionEvent {
                    project: slug.to_string(),
                    epic_id: Some(epic_id.to_string()),
                    story_id: Some(story_id.to_string()),
                    task_id: Some(task_id.to_string()),
                    kind: task.kind,
                    from: old_status.to_string(),
                    to: task.status.to_string(),
                    time: task.updated_at.clone().unwrap_or_default(),
                });
            }
            let story_file = paths::story_path(&ws, slug, epic_id, story_id);
            let _ = store::update_parent_children(&story_file, ChildAction::Update, task.as_child());
            let summary_file = paths::summary_path(&ws, slug);
            if let Ok(mut summary) = toon::parse_file::<ProjectSummary>(&summary_file) {
                store::update_summary(&mut summary, &task);
                summary.updated_at = Some(ids::now());
                let _ = toon::write_file(&summary_file, &summary);
            }
            Ok(json_result(&task))
        },
    )
}

fn delete_task(ws: PathBuf) -> Tool {
    tool(
        "delete_task",
        "Delete a task",
        task_selector_schema(json!({})),
        move |args| {
            let slug = arg_str(args, "project");
            let epic_id = arg_str(args, "epic_id");
            let story_id = arg_str(args, "story_id");
            let task_id = arg_str(args, "task_id");
            let path = paths::task_path(&ws, slug, epic_id, story_id, task_id);
            if let Err(e) = fs::remove_file(&path) {
                return Ok(error_result(e.to_string()));
            }
            let story_file = paths::story_path(&ws, slug, epic_id, story_id);
            let _ = store::update_parent_children(
                &story_file,
                ChildAction::Remove,
                IssueChild {
                    id: task_id.to_string(),
                    ..Default::default()
                },
            );
            let summary_file = paths::summary_path(&ws, slug);
            if let Ok(mut summary) = toon::parse_file::<ProjectSummary>(&summary_file) {
                store::remove_entry(&mut summary.tasks, task_id);
                summary.updated_at = Some(ids::now());
                let _ = toon::write_file(&summary_file, &summary);
            }
            Ok(text_result(format!("deleted task {}", task_id)))
        },
    )
}
