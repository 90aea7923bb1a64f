//! Project management tools.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::ids;
use crate::mcp::{InputSchema, Tool};
use crate::models::ProjectSummary;
use crate::paths;
use crate::toon;

use super::{arg_opt, arg_str, error_result, json_result, text_result, tool};

/// All project management tools.
pub fn tools(ws: &Path) -> Vec<Tool> {
    vec![
        list_projects(ws.to_path_buf()),
        create_project(ws.to_path_buf()),
        get_project_status(ws.to_path_buf()),
        read_prd(ws.to_path_buf()),
        write_prd(ws.to_path_buf()),
    ]
}

fn project_schema() -> InputSchema {
    InputSchema::object(
        json!({"project": {"type": "string", "description": "Project slug"}}),
        &["project"],
    )
}

fn list_projects(ws: PathBuf) -> Tool {
    tool(
        "list_projects",
        "List all projects",
        InputSchema::empty(),
        move |_args| {
            let dir = paths::projects_dir(&ws);
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(json_result(&Vec::<ProjectSummary>::new()));
                }
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let mut projects: Vec<ProjectSummary> = entries
                .flatten()
                .filter(|e| e.path().is_dir())
                .filter_map(|e| toon::parse_file(&e.path().join("project-status.toon")).ok())
                .collect();
            projects.sort_by(|a: &ProjectSummary, b: &ProjectSummary| a.slug.cmp(&b.slug));
            Ok(json_result(&projects))
        },
    )
}

fn create_project(ws: PathBuf) -> Tool {
    tool(
        "create_project",
        "Create a new project with PRD",
        InputSchema::object(
            json!({
                "name": {"type": "string", "description": "Project name"},
                "description": {"type": "string", "description": "Project description"},
            }),
            &["name"],
        ),
        move |args| {
            let name = arg_str(args, "name");
            let slug = ids::slugify(name);
            if slug.is_empty() {
                return Ok(error_result("project name produces an empty slug"));
            }
            let dir = paths::project_dir(&ws, &slug);
            if paths::file_exists(&dir) {
                return Ok(error_result(format!("project {:?} already exists", slug)));
            }
            if let Err(e) = fs::create_dir_all(dir.join("epics")) {
                return Ok(error_result(e.to_string()));
            }
            let summary = ProjectSummary {
                project: name.to_string(),
                slug: slug.clone(),
                description: arg_opt(args, "description"),
                created_at: ids::now(),
                ..Default::default()
            };
            if let Err(e) = toon::write_file(&paths::summary_path(&ws, &slug), &summary) {
                return Ok(error_result(e.to_string()));
            }
            let prd = format!(
                "# {}\n\n{}\n",
                name,
                summary.description.as_deref().unwrap_or("")
            );
            if let Err(e) = fs::write(dir.join("prd.md"), prd) {
                return Ok(error_result(e.to_string()));
            }
            Ok(json_result(&json!({
                "slug": slug,
                "key": ids::derive_key(name),
                "status": "created",
            })))
        },
    )
}

fn get_project_status(ws: PathBuf) -> Tool {
    tool(
        "get_project_status",
        "Get project status and summary",
        project_schema(),
        move |args| {
            let path = paths::summary_path(&ws, arg_str(args, "project"));
            match toon::parse_file::<ProjectSummary>(&path) {
                Ok(summary) => Ok(json_result(&summary)),
                Err(e) => Ok(error_result(e.to_string())),
            }
        },
    )
}

fn read_prd(ws: PathBuf) -> Tool {
    tool(
        "read_prd",
        "Read project PRD document",
        project_schema(),
        move |args| {
            let path = paths::project_dir(&ws, arg_str(args, "project")).join("prd.md");
            match fs::read_to_string(&path) {
                Ok(content) => Ok(text_result(content)),
                Err(e) => Ok(error_result(e.to_string())),
            }
        },
    )
}

fn write_prd(ws: PathBuf) -> Tool {
    tool(
        "write_prd",
        "Write/update project PRD document",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "content": {"type": "string", "description": "PRD markdown"},
            }),
            &["project", "content"],
        ),
        move |args| {
            let path = paths::project_dir(&ws, arg_str(args, "project")).join("prd.md");
            match fs::write(&path, arg_str(args, "content")) {
                Ok(()) => Ok(text_result("PRD updated")),
                Err(e) => Ok(error_result(e.to_string())),
            }
        },
    )
}
