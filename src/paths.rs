//! Workspace path construction and directory scans.
//!
//! The on-disk layout under a workspace root:
//!
//! ```text
//! .projects/<slug>/
//!   project-status.toon
//!   prd.md, prd-session.toon, requests.toon
//!   plans/<slug>.md
//!   .memory/chunks.toon, .memory/sessions/
//!   epics/<E>/epic.toon
//!   epics/<E>/stories/<S>/story.toon
//!   epics/<E>/stories/<S>/tasks/<T>.toon
//! .projects/.events/hook-events.toon
//! .projects/usage.toon
//! ```
//!
//! There are no persistent indexes; every listing walks the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{Issue, IssueKind};
use crate::toon;

/// The `.projects` directory under the workspace root.
pub fn projects_dir(ws: &Path) -> PathBuf {
    ws.join(".projects")
}

/// The directory for a specific project.
pub fn project_dir(ws: &Path, slug: &str) -> PathBuf {
    ws.join(".projects").join(slug)
}

/// Path to a project's summary file.
pub fn summary_path(ws: &Path, slug: &str) -> PathBuf {
    project_dir(ws, slug).join("project-status.toon")
}

/// Path to an epic's entity file.
pub fn epic_path(ws: &Path, slug: &str, epic_id: &str) -> PathBuf {
    project_dir(ws, slug)
        .join("epics")
        .join(epic_id)
        .join("epic.toon")
}

/// Path to a story's entity file.
pub fn story_path(ws: &Path, slug: &str, epic_id: &str, story_id: &str) -> PathBuf {
    project_dir(ws, slug)
        .join("epics")
        .join(epic_id)
        .join("stories")
        .join(story_id)
        .join("story.toon")
}

/// Path to a task's entity file.
pub fn task_path(ws: &Path, slug: &str, epic_id: &str, story_id: &str, task_id: &str) -> PathBuf {
    project_dir(ws, slug)
        .join("epics")
        .join(epic_id)
        .join("stories")
        .join(story_id)
        .join("tasks")
        .join(format!("{}.toon", task_id))
}

/// Whether a file or directory exists.
pub fn file_exists(path: &Path) -> bool {
    path.exists()
}

/// A task found during directory scanning, tagged with its ancestry.
#[derive(Debug, Clone)]
pub struct ScannedTask {
    pub data: Issue,
    pub epic_id: String,
    pub story_id: String,
    pub path: PathBuf,
}

/// Any issue found during directory scanning.
#[derive(Debug, Clone)]
pub struct ScannedIssue {
    pub data: Issue,
    pub kind: IssueKind,
    pub path: PathBuf,
}

/// Subdirectory names under `dir`, sorted for deterministic listings.
fn subdirs(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| e.path().is_dir())
                .filter_map(|e| e.file_name().into_string().ok())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// `.toon` file stems under `dir`, sorted.
fn toon_stems(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .filter(|e| e.path().is_file())
                .filter_map(|e| {
                    let p = e.path();
                    if p.extension().is_some_and(|ext| ext == "toon") {
                        p.file_stem()
                            .and_then(|s| s.to_str())
                            .map(|s| s.to_string())
                    } else {
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Walk the project directory and return every task file found.
pub fn scan_all_tasks(ws: &Path, slug: &str) -> Vec<ScannedTask> {
    let mut tasks = Vec::new();
    let epics_dir = project_dir(ws, slug).join("epics");
    for epic_id in subdirs(&epics_dir) {
        let stories_dir = epics_dir.join(&epic_id).join("stories");
        for story_id in subdirs(&stories_dir) {
            let tasks_dir = stories_dir.join(&story_id).join("tasks");
            for stem in toon_stems(&tasks_dir) {
                let path = tasks_dir.join(format!("{}.toon", stem));
                if let Ok(data) = toon::parse_file::<Issue>(&path) {
                    tasks.push(ScannedTask {
                        data,
                        epic_id: epic_id.clone(),
                        story_id: story_id.clone(),
                        path,
                    });
                }
            }
        }
    }
    tasks
}

/// Walk the project directory and return every epic, story, and task.
pub fn scan_all_issues(ws: &Path, slug: &str) -> Vec<ScannedIssue> {
    let mut issues = Vec::new();
    let epics_dir = project_dir(ws, slug).join("epics");
    for epic_id in subdirs(&epics_dir) {
        let epic_file = epics_dir.join(&epic_id).join("epic.toon");
        if let Ok(data) = toon::parse_file::<Issue>(&epic_file) {
            issues.push(ScannedIssue {
                data,
                kind: IssueKind::Epic,
                path: epic_file,
            });
        }
        let stories_dir = epics_dir.join(&epic_id).join("stories");
        for story_id in subdirs(&stories_dir) {
            let story_file = stories_dir.join(&story_id).join("story.toon");
            if let Ok(data) = toon::parse_file::<Issue>(&story_file) {
                issues.push(ScannedIssue {
                    data,
                    kind: IssueKind::Story,
                    path: story_file,
                });
            }
            let tasks_dir = stories_dir.join(&story_id).join("tasks");
            for stem in toon_stems(&tasks_dir) {
                let path = tasks_dir.join(format!("{}.toon", stem));
                if let Ok(data) = toon::parse_file::<Issue>(&path) {
                    let kind = data.kind;
                    issues.push(ScannedIssue { data, kind, path });
                }
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use tempfile::TempDir;

    fn write_issue(path: &Path, id: &str, kind: IssueKind) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let issue = Issue::new(id.to_string(), kind, format!("{} title", id));
        toon::write_file(path, &issue).unwrap();
    }

    fn seed_project(ws: &Path) {
        write_issue(&epic_path(ws, "demo", "D-1"), "D-1", IssueKind::Epic);
        write_issue(&story_path(ws, "demo", "D-1", "D-2"), "D-2", IssueKind::Story);
        write_issue(
            &task_path(ws, "demo", "D-1", "D-2", "D-3"),
            "D-3",
            IssueKind::Task,
        );
        write_issue(
            &task_path(ws, "demo", "D-1", "D-2", "D-4"),
            "D-4",
            IssueKind::Bug,
        );
    }

    #[test]
    fn test_project_dir_layout() {
        let ws = Path::new("/tmp/ws");
        assert_eq!(
            project_dir(ws, "test-app"),
            PathBuf::from("/tmp/ws/.projects/test-app")
        );
        assert!(task_path(ws, "p", "E", "S", "T")
            .ends_with(".projects/p/epics/E/stories/S/tasks/T.toon"));
    }

    #[test]
    fn test_scan_all_tasks() {
        let temp = TempDir::new().unwrap();
        seed_project(temp.path());
        let tasks = scan_all_tasks(temp.path(), "demo");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].epic_id, "D-1");
        assert_eq!(tasks[0].story_id, "D-2");
        assert_eq!(tasks[0].data.id, "D-3");
        assert_eq!(tasks[1].data.kind, IssueKind::Bug);
    }

    #[test]
    fn test_scan_all_issues() {
        let temp = TempDir::new().unwrap();
        seed_project(temp.path());
        let issues = scan_all_issues(temp.path(), "demo");
        assert_eq!(issues.len(), 4);
        assert_eq!(issues[0].kind, IssueKind::Epic);
        assert_eq!(issues[1].kind, IssueKind::Story);
        assert!(issues.iter().all(|i| i.data.status == Status::Backlog));
    }

    #[test]
    fn test_scan_empty_project() {
        let temp = TempDir::new().unwrap();
        assert!(scan_all_tasks(temp.path(), "missing").is_empty());
        assert!(scan_all_issues(temp.path(), "missing").is_empty());
    }

    #[test]
    fn test_scan_skips_non_toon_files() {
        let temp = TempDir::new().unwrap();
        seed_project(temp.path());
        let tasks_dir = project_dir(temp.path(), "demo")
            .join("epics/D-1/stories/D-2/tasks");
        fs::write(tasks_dir.join("notes.md"), "not a task").unwrap();
        assert_eq!(scan_all_tasks(temp.path(), "demo").len(), 2);
    }
}
