//! Built-in MCP resources: read-only project views addressed by
//! `toon://` URI templates.

use std::fs;
use std::path::{Path, PathBuf};

use crate::mcp::{Resource, ResourceContent, ResourceDefinition};
use crate::models::{Issue, ProjectSummary};
use crate::paths;
use crate::toon;
use crate::Error;

/// All built-in resources.
pub fn resources(ws: &Path) -> Vec<Resource> {
    vec![
        project_prd(ws.to_path_buf()),
        project_status(ws.to_path_buf()),
        task_detail(ws.to_path_buf()),
    ]
}

/// Extract a named `{param}` from a URI given its pattern.
fn extract_param(pattern: &str, uri: &str, name: &str) -> String {
    let wanted = format!("{{{}}}", name);
    pattern
        .split('/')
        .zip(uri.split('/'))
        .find(|(p, _)| *p == wanted)
        .map(|(_, u)| u.to_string())
        .unwrap_or_default()
}

fn project_prd(ws: PathBuf) -> Resource {
    const PATTERN: &str = "toon://project/{slug}/prd";
    Resource {
        definition: ResourceDefinition {
            uri: PATTERN.to_string(),
            name: "project_prd".to_string(),
            title: Some("Project PRD Document".to_string()),
            description: Some("The Product Requirements Document for a project".to_string()),
            mime_type: Some("text/markdown".to_string()),
        },
        handler: Box::new(move |uri| {
            let slug = extract_param(PATTERN, uri, "slug");
            let path = paths::project_dir(&ws, &slug).join("prd.md");
            let text = fs::read_to_string(&path)
                .map_err(|e| Error::NotFound(format!("prd not found for {}: {}", slug, e)))?;
            Ok(vec![ResourceContent {
                uri: uri.to_string(),
                mime_type: Some("text/markdown".to_string()),
                text: Some(text),
            }])
        }),
    }
}

fn project_status(ws: PathBuf) -> Resource {
    const PATTERN: &str = "toon://project/{slug}/status";
    Resource {
        definition: ResourceDefinition {
            uri: PATTERN.to_string(),
            name: "project_status".to_string(),
            title: Some("Project Status".to_string()),
            description: Some(
                "Current project status with epic/story/task summaries".to_string(),
            ),
            mime_type: Some("application/json".to_string()),
        },
        handler: Box::new(move |uri| {
            let slug = extract_param(PATTERN, uri, "slug");
            let summary: ProjectSummary = toon::parse_file(&paths::summary_path(&ws, &slug))?;
            let text = serde_json::to_string_pretty(&summary)?;
            Ok(vec![ResourceContent {
                uri: uri.to_string(),
                mime_type: Some("application/json".to_string()),
                text: Some(text),
            }])
        }),
    }
}

fn task_detail(ws: PathBuf) -> Resource {
    const PATTERN: &str = "toon://project/{slug}/task/{epicId}/{storyId}/{taskId}";
    Resource {
        definition: ResourceDefinition {
            uri: PATTERN.to_string(),
            name: "task_detail".to_string(),
            title: Some("Task Detail".to_string()),
            description: Some("Full detail of a specific task".to_string()),
            mime_type: Some("application/json".to_string()),
        },
        handler: Box::new(move |uri| {
            let slug = extract_param(PATTERN, uri, "slug");
            let epic_id = extract_param(PATTERN, uri, "epicId");
            let story_id = extract_param(PATTERN, uri, "storyId");
            let task_id = extract_param(PATTERN, uri, "taskId");
            let task: Issue =
                toon::parse_file(&paths::task_path(&ws, &slug, &epic_id, &story_id, &task_id))?;
            let text = serde_json::to_string_pretty(&task)?;
            Ok(vec![ResourceContent {
                uri: uri.to_string(),
                mime_type: Some("application/json".to_string()),
                text: Some(text),
            }])
        }),
    }
}
