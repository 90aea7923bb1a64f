//! Story management tools.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::ids;
use crate::mcp::{InputSchema, Tool};
use crate::models::{Issue, IssueKind, ProjectSummary};
use crate::paths;
use crate::store::{self, ChildAction};
use crate::toon;
use crate::workflow::events::{self, TransitionEvent};

use super::epic::{apply_issue_update, parse_priority};
use super::{arg_opt, arg_str, error_result, json_result, next_issue_id, text_result, tool};

/// All story management tools.
pub fn tools(ws: &Path) -> Vec<Tool> {
    vec![
        list_stories(ws.to_path_buf()),
        create_story(ws.to_path_buf()),
        get_story(ws.to_path_buf()),
        update_story(ws.to_path_buf()),
        delete_story(ws.to_path_buf()),
    ]
}

fn list_stories(ws: PathBuf) -> Tool {
    tool(
        "list_stories",
        "List stories in an epic",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "epic_id": {"type": "string"},
            }),
            &["project", "epic_id"],
        ),
        move |args| {
            let dir = paths::project_dir(&ws, arg_str(args, "project"))
                .join("epics")
                .join(arg_str(args, "epic_id"))
                .join("stories");
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(json_result(&Vec::<Issue>::new()));
                }
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let mut stories: Vec<Issue> = entries
                .flatten()
                .filter(|e| e.path().is_dir())
                .filter_map(|e| toon::parse_file::<Issue>(&e.path().join("story.toon")).ok())
                .collect();
            stories.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(json_result(&stories))
        },
    )
}

fn create_story(ws: PathBuf) -> Tool {
    tool(
        "create_story",
        "Create a story under an epic",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "epic_id": {"type": "string"},
                "title": {"type": "string"},
                "user_story": {"type": "string", "description": "As a... I want... So that..."},
                "priority": {"type": "string"},
            }),
            &["project", "epic_id", "title", "user_story"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let epic_id = arg_str(args, "epic_id");
            let summary_file = paths::summary_path(&ws, slug);
            let mut summary: ProjectSummary = match toon::parse_file(&summary_file) {
                Ok(s) => s,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let epic_file = paths::epic_path(&ws, slug, epic_id);
            if !paths::file_exists(&epic_file) {
                return Ok(error_result(format!("epic not found: {}", epic_id)));
            }
            let priority = match parse_priority(args) {
                Ok(p) => p,
                Err(msg) => return Ok(error_result(msg)),
            };
            let id = next_issue_id(&summary);
            let story_dir = paths::project_dir(&ws, slug)
                .join("epics")
                .join(epic_id)
                .join("stories")
                .join(&id);
            if let Err(e) = fs::create_dir_all(story_dir.join("tasks")) {
                return Ok(error_result(e.to_string()));
            }
            let mut issue = Issue::new(id, IssueKind::Story, arg_str(args, "title").to_string());
            issue.description = arg_opt(args, "user_story");
            issue.priority = priority;
            if let Err(e) = toon::write_file(&story_dir.join("story.toon"), &issue) {
                return Ok(error_result(e.to_string()));
            }
            let _ = store::update_parent_children(&epic_file, ChildAction::Add, issue.as_child());
            store::update_summary(&mut summary, &issue);
            summary.updated_at = Some(ids::now());
            let _ = toon::write_file(&summary_file, &summary);
            Ok(json_result(&issue))
        },
    )
}

fn get_story(ws: PathBuf) -> Tool {
    tool(
        "get_story",
        "Get story with child tasks",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "epic_id": {"type": "string"},
                "story_id": {"type": "string"},
            }),
            &["project", "epic_id", "story_id"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let epic_id = arg_str(args, "epic_id");
            let story_id = arg_str(args, "story_id");
            let story_file = paths::story_path(&ws, slug, epic_id, story_id);
            let mut issue: Issue = match toon::parse_file(&story_file) {
                Ok(i) => i,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            // Rebuild children from the task files on disk; the stored
            // list is denormalized and this view is authoritative.
            let tasks_dir = story_file.parent().map(|p| p.join("tasks"));
            if let Some(tasks_dir) = tasks_dir {
                let mut children = Vec::new();
                if let Ok(entries) = fs::read_dir(&tasks_dir) {
                    let mut files: Vec<PathBuf> = entries
                        .flatten()
                        .map(|e| e.path())
                        .filter(|p| p.extension().is_some_and(|ext| ext == "toon"))
                        .collect();
                    files.sort();
                    for file in files {
                        if let Ok(task) = toon::parse_file::<Issue>(&file) {
                            children.push(task.as_child());
                        }
                    }
                }
                issue.children = children;
            }
            Ok(json_result(&issue))
        },
    )
}

fn update_story(ws: PathBuf) -> Tool {
    tool(
        "update_story",
        "Update story fields",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "epic_id": {"type": "string"},
                "story_id": {"type": "string"},
                "title": {"type": "string"},
                "description": {"type": "string"},
                "status": {"type": "string"},
                "priority": {"type": "string"},
            }),
            &["project", "epic_id", "story_id"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let epic_id = arg_str(args, "epic_id");
            let story_id = arg_str(args, "story_id");
            let path = paths::story_path(&ws, slug, epic_id, story_id);
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
                    story_id: Some(story_id.to_string()),
                    task_id: None,
                    kind: issue.kind,
                    from: old_status.to_string(),
                    to: issue.status.to_string(),
                    time: issue.updated_at.clone().unwrap_or_default(),
                });
            }
            let epic_file = paths::epic_path(&ws, slug, epic_id);
            let _ =
                store::update_parent_children(&epic_file, ChildAction::Update, issue.as_child());
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

fn delete_story(ws: PathBuf) -> Tool {
    tool(
        "delete_story",
        "Delete story and all tasks",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "epic_id": {"type": "string"},
                "story_id": {"type": "string"},
            }),
            &["project", "epic_id", "story_id"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let epic_id = arg_str(args, "epic_id");
            let story_id = arg_str(args, "story_id");
            let story_dir = paths::project_dir(&ws, slug)
                .join("epics")
                .join(epic_id)
                .join("stories")
                .join(story_id);
            if !story_dir.is_dir() {
                return Ok(error_result(format!("story not found: {}", story_id)));
            }
            let mut task_ids = Vec::new();
            if let Ok(tasks) = fs::read_dir(story_dir.join("tasks")) {
                for task in tasks.flatten() {
                    let p = task.path();
                    if p.extension().is_some_and(|ext| ext == "toon") {
                        if let Some(stem) = p.file_stem().and_then(|s| s.to_str()) {
                            task_ids.push(stem.to_string());
                        }
                    }
                }
            }
            if let Err(e) = fs::remove_dir_all(&story_dir) {
                return Ok(error_result(e.to_string()));
            }
            let epic_file = paths::epic_path(&ws, slug, epic_id);
            let _ = store::update_parent_children(
                &epic_file,
                ChildAction::Remove,
                crate::models::IssueChild {
                    id: story_id.to_string(),
                    ..Default::default()
                },
            );
            let summary_file = paths::summary_path(&ws, slug);
            if let Ok(mut summary) = toon::parse_file::<ProjectSummary>(&summary_file) {
                store::remove_entry(&mut summary.stories, story_id);
                for id in &task_ids {
                    store::remove_entry(&mut summary.tasks, id);
                }
                summary.updated_at = Some(ids::now());
                let _ = toon::write_file(&summary_file, &summary);
            }
            Ok(text_result(format!("deleted story {}", story_id)))
        },
    )
}
