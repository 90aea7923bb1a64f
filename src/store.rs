//! Denormalized hierarchy maintenance.
//!
//! Parent child-lists, the project summary, and the entity files form a
//! triangle of agreement. The entity file is the source of truth; these
//! helpers keep the other two corners synchronized on every mutation.
//! Write-backs here are best-effort: the primary mutation has already
//! succeeded and the summary can be rebuilt from a full scan.

use std::path::Path;

use crate::ids;
use crate::models::{Issue, IssueChild, IssueEntry, IssueKind, ProjectSummary};
use crate::paths;
use crate::toon;
use crate::workflow;
use crate::Result;

/// How to modify a parent's child list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildAction {
    Add,
    Update,
    Remove,
}

/// Add, update, or remove an issue's row in the project summary.
///
/// Classification is by entity type: epics, stories, and everything else
/// (task/bug/hotfix) land in their respective lists.
pub fn update_summary(summary: &mut ProjectSummary, issue: &Issue) {
    let entry = IssueEntry {
        id: issue.id.clone(),
        title: issue.title.clone(),
        status: issue.status,
    };
    let list = match issue.kind {
        IssueKind::Epic => &mut summary.epics,
        IssueKind::Story => &mut summary.stories,
        _ => &mut summary.tasks,
    };
    if let Some(existing) = list.iter_mut().find(|e| e.id == entry.id) {
        *existing = entry;
    } else {
        list.push(entry);
    }
}

/// Remove an entry by ID from a summary list.
pub fn remove_entry(entries: &mut Vec<IssueEntry>, id: &str) {
    entries.retain(|e| e.id != id);
}

/// Modify the children list of the parent issue stored at `parent_path`.
///
/// Reads the parent, applies the action, stamps `updated_at`, and writes
/// it back.
pub fn update_parent_children(
    parent_path: &Path,
    action: ChildAction,
    child: IssueChild,
) -> Result<()> {
    let mut parent: Issue = toon::parse_file(parent_path)?;
    match action {
        ChildAction::Add => parent.children.push(child),
        ChildAction::Update => {
            if let Some(existing) = parent.children.iter_mut().find(|c| c.id == child.id) {
                *existing = child;
            }
        }
        ChildAction::Remove => parent.children.retain(|c| c.id != child.id),
    }
    parent.updated_at = Some(ids::now());
    toon::write_file(parent_path, &parent)
}

/// Regenerate a project's summary lists from the entity files on disk.
/// The entity tree is the source of truth; this is the maintenance path
/// for a summary that drifted (for example after a crashed write-back).
/// Name, slug, and timestamps are preserved.
pub fn rebuild_summary(ws: &Path, slug: &str) -> Result<()> {
    let summary_file = paths::summary_path(ws, slug);
    let mut summary: ProjectSummary = toon::parse_file(&summary_file)?;
    summary.epics.clear();
    summary.stories.clear();
    summary.tasks.clear();
    for issue in paths::scan_all_issues(ws, slug) {
        update_summary(&mut summary, &issue.data);
    }
    summary.updated_at = Some(ids::now());
    toon::write_file(&summary_file, &summary)
}

/// Whether a parent with these children counts as finished: non-empty and
/// every child in the Completed set. Rejected and cancelled children count,
/// so a story can flip to done on rejected work alone; that asymmetry is
/// intentional and relied upon by `reject_task`.
pub fn all_children_done(children: &[IssueChild]) -> bool {
    !children.is_empty()
        && children
            .iter()
            .all(|c| workflow::is_completed(c.status))
}

/// Propagate a task change up the hierarchy: refresh the story and epic
/// child lists, flip parents to done when every child is completed, and
/// rewrite the project summary. All writes here are best-effort; the task
/// mutation that triggered the cascade has already been persisted.
pub fn cascade_parents(ws: &Path, slug: &str, epic_id: &str, story_id: &str, task: &Issue) {
    let story_file = paths::story_path(ws, slug, epic_id, story_id);
    let mut story = Issue::default();
    if let Ok(parsed) = toon::parse_file::<Issue>(&story_file) {
        story = parsed;
        let _ = update_parent_children(&story_file, ChildAction::Update, task.as_child());
        if let Ok(refreshed) = toon::parse_file::<Issue>(&story_file) {
            story = refreshed;
            if all_children_done(&story.children) {
                story.status = crate::models::Status::Done;
                story.updated_at = Some(ids::now());
                let _ = toon::write_file(&story_file, &story);
            }
        }
    }

    let epic_file = paths::epic_path(ws, slug, epic_id);
    let mut epic = Issue::default();
    if let Ok(parsed) = toon::parse_file::<Issue>(&epic_file) {
        epic = parsed;
        let _ = update_parent_children(&epic_file, ChildAction::Update, story.as_child());
        if let Ok(refreshed) = toon::parse_file::<Issue>(&epic_file) {
            epic = refreshed;
            if all_children_done(&epic.children) {
                epic.status = crate::models::Status::Done;
                epic.updated_at = Some(ids::now());
                let _ = toon::write_file(&epic_file, &epic);
            }
        }
    }

    let summary_file = paths::summary_path(ws, slug);
    if let Ok(mut summary) = toon::parse_file::<ProjectSummary>(&summary_file) {
        update_summary(&mut summary, task);
        if !story.id.is_empty() {
            update_summary(&mut summary, &story);
        }
        if !epic.id.is_empty() {
            update_summary(&mut summary, &epic);
        }
        summary.updated_at = Some(ids::now());
        let _ = toon::write_file(&summary_file, &summary);
    }
}
