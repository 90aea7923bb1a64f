//! Data models for Orchestra MCP entities.
//!
//! This module defines the core data structures persisted under the
//! workspace:
//! - `ProjectSummary` - Denormalized per-project tracking file
//! - `Issue` - Full data for any epic/story/task/bug/hotfix
//! - `PrdSession` - Guided PRD questionnaire state
//! - `UsageData` - Token usage ledger
//! - `HookEvent` - Claude Code hook event log entries
//! - `MemoryChunk` / `SessionLog` - Local memory store records

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Issue status in the workflow.
///
/// The full transition table lives in [`crate::workflow`]; statuses are
/// stored in `.toon` files in their kebab-case form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Backlog,
    Todo,
    InProgress,
    Blocked,
    ReadyForTesting,
    InTesting,
    ReadyForDocs,
    InDocs,
    Documented,
    InReview,
    Done,
    Rejected,
    Cancelled,
}

impl Status {
    /// All statuses, in workflow order.
    pub const ALL: [Status; 13] = [
        Status::Backlog,
        Status::Todo,
        Status::InProgress,
        Status::Blocked,
        Status::ReadyForTesting,
        Status::InTesting,
        Status::ReadyForDocs,
        Status::InDocs,
        Status::Documented,
        Status::InReview,
        Status::Done,
        Status::Rejected,
        Status::Cancelled,
    ];

    /// The kebab-case form used in files and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Backlog => "backlog",
            Status::Todo => "todo",
            Status::InProgress => "in-progress",
            Status::Blocked => "blocked",
            Status::ReadyForTesting => "ready-for-testing",
            Status::InTesting => "in-testing",
            Status::ReadyForDocs => "ready-for-docs",
            Status::InDocs => "in-docs",
            Status::Documented => "documented",
            Status::InReview => "in-review",
            Status::Done => "done",
            Status::Rejected => "rejected",
            Status::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .iter()
            .find(|st| st.as_str() == s)
            .copied()
            .ok_or_else(|| crate::Error::InvalidInput(format!("unknown status: {}", s)))
    }
}

/// The kind of an issue within the hierarchy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Epic,
    Story,
    #[default]
    Task,
    Bug,
    Hotfix,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::Epic => "epic",
            IssueKind::Story => "story",
            IssueKind::Task => "task",
            IssueKind::Bug => "bug",
            IssueKind::Hotfix => "hotfix",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "epic" => Ok(IssueKind::Epic),
            "story" => Ok(IssueKind::Story),
            "task" => Ok(IssueKind::Task),
            "bug" => Ok(IssueKind::Bug),
            "hotfix" => Ok(IssueKind::Hotfix),
            _ => Err(crate::Error::InvalidInput(format!(
                "unknown issue type: {}",
                s
            ))),
        }
    }
}

/// Priority level carried by issues; `report_bug` stores severity here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(crate::Error::InvalidInput(format!(
                "unknown priority: {}",
                s
            ))),
        }
    }
}

/// Project lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectState {
    #[default]
    Active,
    Archived,
}

/// A summary row in the project status (and in parent child lists).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueEntry {
    pub id: String,
    pub title: String,
    pub status: Status,
}

/// A child reference stored on a parent issue.
///
/// Same shape as [`IssueEntry`]; kept as its own type because child lists
/// and summary lists evolve independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueChild {
    pub id: String,
    pub title: String,
    pub status: Status,
}

/// The root tracking file for a project (`project-status.toon`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project: String,
    pub slug: String,
    pub status: ProjectState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub epics: Vec<IssueEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stories: Vec<IssueEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<IssueEntry>,
}

impl ProjectSummary {
    /// Total issue count across all summary lists; the next allocated ID
    /// is this plus one.
    pub fn issue_count(&self) -> usize {
        self.epics.len() + self.stories.len() + self.tasks.len()
    }
}

/// The full data for any issue (epic/story/task/bug/hotfix).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: IssueKind,

    pub title: String,

    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(default)]
    pub created_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    /// Direct subordinates: an epic lists its stories, a story its
    /// tasks/bugs/hotfixes. Tasks have no children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<IssueChild>,
}

impl Issue {
    /// Create a new issue with the given ID, kind and title, in backlog.
    pub fn new(id: String, kind: IssueKind, title: String) -> Self {
        Self {
            id,
            kind,
            title,
            status: Status::Backlog,
            description: None,
            priority: None,
            created_at: crate::ids::now(),
            updated_at: None,
            children: Vec::new(),
        }
    }

    /// The child reference this issue contributes to its parent.
    pub fn as_child(&self) -> IssueChild {
        IssueChild {
            id: self.id.clone(),
            title: self.title.clone(),
            status: self.status,
        }
    }
}

/// PRD questionnaire session status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrdStatus {
    InProgress,
    Complete,
    #[default]
    Pending,
}

/// One answered PRD question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrdAnswer {
    pub question_key: String,
    pub answer: String,
}

/// A guided PRD creation session (`prd-session.toon`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrdSession {
    pub project_name: String,
    pub slug: String,
    pub status: PrdStatus,
    #[serde(default)]
    pub current_index: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answers: Vec<PrdAnswer>,
    /// Set on sessions created by `split_prd`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<u32>,
    /// Child phase slugs, recorded on the parent session.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<String>,
}

/// A PRD questionnaire item. The fixed list lives in the PRD tools module.
#[derive(Debug, Clone, Serialize)]
pub struct PrdQuestion {
    pub index: usize,
    pub key: &'static str,
    pub section: &'static str,
    pub question: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<&'static str>,
}

/// Token usage ledger (`usage.toon`). At most one open session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sessions: Vec<UsageSession>,
    #[serde(default)]
    pub totals: UsageTotals,
}

/// A single usage tracking session; open while `ended_at` is unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageSession {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<RequestEntry>,
    #[serde(default)]
    pub total_input: u64,
    #[serde(default)]
    pub total_output: u64,
    #[serde(default)]
    pub total_cost: f64,
}

/// Aggregated usage across all sessions.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageTotals {
    #[serde(default)]
    pub total_input: u64,
    #[serde(default)]
    pub total_output: u64,
    #[serde(default)]
    pub total_cost: f64,
}

/// A single API request's usage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEntry {
    pub timestamp: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default)]
    pub cost: f64,
}

/// Per-project feature request log (`requests.toon`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestLog {
    #[serde(default)]
    pub project: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<RequestLogItem>,
}

/// A single logged request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLogItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
    pub description: String,
    pub status: String,
}

/// A Claude Code hook event received by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookEvent {
    pub event_type: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub timestamp: String,
}

/// A rolling, capped log of hook events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookEventLog {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<HookEvent>,
}

/// A piece of project context stored for retrieval.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryChunk {
    pub id: String,
    pub project: String,
    /// Source type: task, prd, session, user.
    #[serde(default)]
    pub source: String,
    /// Source ID (task ID, session ID, ...).
    #[serde(default)]
    pub source_id: String,
    pub summary: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: String,
}

/// All memory chunks for a project (`.memory/chunks.toon`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryIndex {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chunks: Vec<MemoryChunk>,
}

/// A recorded assistant session for a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionLog {
    pub session_id: String,
    pub project: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<SessionEvent>,
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
}

/// A single event within a session log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    /// tool_call, decision, output.
    #[serde(rename = "type")]
    pub kind: String,
    pub summary: String,
    pub timestamp: String,
}

/// All session logs for a project (`.memory/sessions/index.toon`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionIndex {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sessions: Vec<SessionLog>,
}
