//! Project README generation from the issue tree.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::mcp::{InputSchema, Tool};
use crate::models::{IssueKind, ProjectSummary, Status};
use crate::paths::{self, ScannedIssue};
use crate::toon;

use super::{arg_str, error_result, text_result, tool};

/// README generation tool.
pub fn tools(ws: &Path) -> Vec<Tool> {
    vec![regenerate_readme(ws.to_path_buf())]
}

/// A shields.io badge for a status, colored by workflow stage.
fn status_badge(status: Status) -> String {
    let label = status.as_str().replace('-', "--");
    let color = match status {
        Status::Done => "green",
        Status::InProgress => "blue",
        Status::InReview => "orange",
        Status::Blocked => "red",
        _ => "lightgrey",
    };
    format!(
        "![{}](https://img.shields.io/badge/-{}-{})",
        status.as_str(),
        label,
        color
    )
}

fn write_table(out: &mut String, title: &str, items: &[&ScannedIssue]) {
    if items.is_empty() {
        return;
    }
    let _ = write!(out, "## {}\n\n| ID | Title | Status |\n|---|---|---|\n", title);
    for item in items {
        let _ = writeln!(
            out,
            "| {} | {} | {} |",
            item.data.id,
            item.data.title,
            status_badge(item.data.status)
        );
    }
    out.push('\n');
}

fn regenerate_readme(ws: PathBuf) -> Tool {
    tool(
        "regenerate_readme",
        "Regenerate project README from issues",
        InputSchema::object(
            json!({"project": {"type": "string", "description": "Project slug"}}),
            &["project"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let summary: ProjectSummary = match toon::parse_file(&paths::summary_path(&ws, slug)) {
                Ok(s) => s,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let issues = paths::scan_all_issues(&ws, slug);
            let mut out = format!("# {}\n\n", summary.project);
            if let Some(description) = &summary.description {
                let _ = write!(out, "{}\n\n", description);
            }
            let project_badge = match summary.status {
                crate::models::ProjectState::Active => "active",
                crate::models::ProjectState::Archived => "archived",
            };
            let _ = write!(
                out,
                "**Status:** ![{0}](https://img.shields.io/badge/-{0}-lightgrey)\n\n",
                project_badge
            );

            let epics: Vec<&ScannedIssue> =
                issues.iter().filter(|i| i.kind == IssueKind::Epic).collect();
            let stories: Vec<&ScannedIssue> =
                issues.iter().filter(|i| i.kind == IssueKind::Story).collect();
            let tasks: Vec<&ScannedIssue> = issues
                .iter()
                .filter(|i| !matches!(i.kind, IssueKind::Epic | IssueKind::Story))
                .collect();
            write_table(&mut out, "Epics", &epics);
            write_table(&mut out, "Stories", &stories);
            write_table(&mut out, "Tasks", &tasks);

            let path = paths::project_dir(&ws, slug).join("README.md");
            if let Err(e) = fs::write(&path, out) {
                return Ok(error_result(e.to_string()));
            }
            Ok(text_result("README.md regenerated"))
        },
    )
}
