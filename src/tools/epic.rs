//! Epic management tools.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::json;

use crate::ids;
use crate::mcp::{InputSchema, Tool};
use crate::models::{Issue, IssueKind, Priority, ProjectSummary, Status};
use crate::paths;
use crate::store;
use crate::toon;
use crate::workflow;
use crate::workflow::events::{self, TransitionEvent};

use super::{arg_opt, arg_str, error_result, has, json_result, next_issue_id, text_result, tool};

/// All epic management tools.
pub fn tools(ws: &Path) -> Vec<Tool> {
    vec![
        list_epics(ws.to_path_buf()),
        create_epic(ws.to_path_buf()),
        get_epic(ws.to_path_buf()),
        update_epic(ws.to_path_buf()),
        delete_epic(ws.to_path_buf()),
    ]
}

fn list_epics(ws: PathBuf) -> Tool {
    tool(
        "list_epics",
        "List epics in a project",
        InputSchema::object(
            json!({"project": {"type": "string", "description": "Project slug"}}),
            &["project"],
        ),
        move |args| {
            let epics_dir = paths::project_dir(&ws, arg_str(args, "project")).join("epics");
            let entries = match fs::read_dir(&epics_dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(json_result(&Vec::<Issue>::new()));
                }
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let mut epics: Vec<Issue> = entries
                .flatten()
                .filter(|e| e.path().is_dir())
                .filter_map(|e| toon::parse_file::<Issue>(&e.path().join("epic.toon")).ok())
                .filter(|issue| issue.kind == IssueKind::Epic)
                .collect();
            epics.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(json_result(&epics))
        },
    )
}

fn create_epic(ws: PathBuf) -> Tool {
    tool(
        "create_epic",
        "Create a new epic",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "title": {"type": "string"},
                "description": {"type": "string"},
                "priority": {"type": "string", "enum": ["low", "medium", "high", "critical"]},
            }),
            &["project", "title"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let summary_file = paths::summary_path(&ws, slug);
            let mut summary: ProjectSummary = match toon::parse_file(&summary_file) {
                Ok(s) => s,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let priority = match parse_priority(args) {
                Ok(p) => p,
                Err(msg) => return Ok(error_result(msg)),
            };
            let id = next_issue_id(&summary);
            let epic_dir = paths::project_dir(&ws, slug).join("epics").join(&id);
            if let Err(e) = fs::create_dir_all(epic_dir.join("stories")) {
                return Ok(error_result(e.to_string()));
            }
            let mut issue = Issue::new(id, IssueKind::Epic, arg_str(args, "title").to_string());
            issue.description = arg_opt(args, "description");
            issue.priority = priority;
            if let Err(e) = toon::write_file(&epic_dir.join("epic.toon"), &issue) {
                return Ok(error_result(e.to_string()));
            }
            store::update_summary(&mut summary, &issue);
            summary.updated_at = Some(ids::now());
            let _ = toon::write_file(&summary_file, &summary);
            Ok(json_result(&issue))
        },
    )
}

fn get_epic(ws: PathBuf) -> Tool {
    tool(
        "get_epic",
        "Get epic details",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "epic_id": {"type": "string"},
            }),
            &["project", "epic_id"],
        ),
        move |args| {
            let path = paths::epic_path(&ws, arg_str(args, "project"), arg_str(args, "epic_id"));
            match toon::parse_file::<Issue>(&path) {
                Ok(issue) => Ok(json_result(&issue)),
                Err(e) => Ok(error_result(e.to_string())),
            }
        },
    )
}

fn update_epic(ws: PathBuf) -> Tool {
    tool(
        "update_epic",
        "Update epic fields",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "epic_id": {"type": "string"},
                "title": {"type": "string"},
                "description": {"type": "string"},
                "status": {"type": "string"},
                "priority": {"type": "string"},
            }),
            &["project", "epic_id"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let epic_id = arg_str(args, "epic_id");
            let path = paths::epic_path(&ws, slug, epic_id);
            let mut issue: Issue = match toon::parse_file(&path) {
                Ok(i) => i,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let old_status = issue.status;
            if let Err(result) = apply_issue_update(&mut issue, args) {
                return Ok(result);
            }
            issue.updated_at = Some(ids::now());
            if let Err(e) = toon::write_file(&path, &issue) {
                return Ok(error_result(e.to_string()));
            }
            if old_status != issue.status {
                events::emit(&TransitionEvent {
                    project: slug.to_string(),
                    epic_id: Some(epic_id.to_string()),
                    story_id: None,
                    task_id: None,
                    kind: issue.kind,
                    from: old_status.to_string(),
                    to: issue.status.to_string(),
                    time: issue.updated_at.clone().unwrap_or_default(),
                });
            }
            let summary_file = paths::summary_path(&ws, slug);
            if let Ok(mut summary) = toon::parse_file::<ProjectSummary>(&summary_file) {
                store::update_summary(&mut summary, &issue);
                summary.updated_at = Some(ids::now());
                let _ = toon::write_file(&summary_file, &summary);
            }
            Ok(json_result(&issue))
        },
    )
}

fn delete_epic(ws: PathBuf) -> Tool {
    tool(
        "delete_epic",
        "Delete epic and all children",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "epic_id": {"type": "string"},
            }),
            &["project", "epic_id"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let epic_id = arg_str(args, "epic_id");
            let epic_dir = paths::project_dir(&ws, slug).join("epics").join(epic_id);
            if !epic_dir.is_dir() {
                return Ok(error_result(format!("epic not found: {}", epic_id)));
            }
            // Collect descendant IDs before removal; directory names are
            // the IDs (path-ID agreement).
            let mut story_ids = Vec::new();
            let mut task_ids = Vec::new();
            if let Ok(stories) = fs::read_dir(epic_dir.join("stories")) {
                for story in stories.flatten().filter(|e| e.path().is_dir()) {
                    if let Ok(name) = story.file_name().into_string() {
                        story_ids.push(name);
                    }
                    if let Ok(tasks) = fs::read_dir(story.path().join("tasks")) {
                        for task in tasks.flatten() {
                            let p = task.path();
                            if p.extension().is_some_and(|ext| ext == "toon") {
                                if let Some(stem) = p.file_stem().and_then(|s| s.to_str()) {
                                    task_ids.push(stem.to_string());
                                }
                            }
                        }
                    }
                }
            }
            if let Err(e) = fs::remove_dir_all(&epic_dir) {
                return Ok(error_result(e.to_string()));
            }
            let summary_file = paths::summary_path(&ws, slug);
            if let Ok(mut summary) = toon::parse_file::<ProjectSummary>(&summary_file) {
                store::remove_entry(&mut summary.epics, epic_id);
                for id in &story_ids {
                    store::remove_entry(&mut summary.stories, id);
                }
                for id in &task_ids {
                    store::remove_entry(&mut summary.tasks, id);
                }
                summary.updated_at = Some(ids::now());
                let _ = toon::write_file(&summary_file, &summary);
            }
            Ok(text_result(format!("deleted epic {}", epic_id)))
        },
    )
}

/// Parse the optional `priority` argument.
pub(crate) fn parse_priority(args: &super::Args) -> Result<Option<Priority>, String> {
    match arg_opt(args, "priority") {
        None => Ok(None),
        Some(p) => Priority::from_str(&p).map(Some).map_err(|e| e.to_string()),
    }
}

/// Apply title/description/status/priority updates from the argument map,
/// validating any status change against the transition table. On an
/// invalid transition, returns the error tool result to hand back.
pub(crate) fn apply_issue_update(
    issue: &mut Issue,
    args: &super::Args,
) -> Result<(), crate::mcp::ToolResult> {
    if has(args, "status") {
        let raw = arg_str(args, "status");
        let new_status = Status::from_str(raw).map_err(|e| error_result(e.to_string()))?;
        if !workflow::is_valid(issue.status, new_status) {
            return Err(error_result(format!(
                "invalid transition {} -> {}, valid: [{}]",
                issue.status,
                new_status,
                workflow::next_states_label(issue.status)
            )));
        }
        issue.status = new_status;
    }
    if has(args, "title") {
        issue.title = arg_str(args, "title").to_string();
    }
    if has(args, "description") {
        issue.description = arg_opt(args, "description");
    }
    if has(args, "priority") {
        issue.priority = parse_priority(args).map_err(error_result)?;
    }
    Ok(())
}
