//! Guided PRD session tools.
//!
//! A fixed questionnaire (12 items across five sections; five required)
//! drives an answer-by-answer session stored in `prd-session.toon`.
//! Finishing the list renders `prd.md` and marks the session complete;
//! a completed session can be split into numbered phase sub-projects.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde_json::{json, Map, Value};

use crate::mcp::{InputSchema, Tool, ToolResult};
use crate::models::{PrdAnswer, PrdQuestion, PrdSession, PrdStatus};
use crate::paths;
use crate::toon;

use super::{arg_str, arg_string_array, error_result, json_result, text_result, tool};

/// The ordered questionnaire.
pub fn questions() -> &'static [PrdQuestion] {
    static QUESTIONS: OnceLock<Vec<PrdQuestion>> = OnceLock::new();
    QUESTIONS.get_or_init(|| {
        let q = |index, key, section, question, required, options: &[&'static str]| PrdQuestion {
            index,
            key,
            section,
            question,
            required,
            options: options.to_vec(),
        };
        vec![
            q(0, "project_name", "overview", "What is the project name?", true, &[]),
            q(1, "project_description", "overview", "Describe the project.", true, &[]),
            q(2, "target_audience", "overview", "Who is the target audience?", true,
                &["Developers", "End users", "Enterprise teams", "Internal team"]),
            q(3, "primary_goals", "goals", "What are the primary goals?", true, &[]),
            q(4, "success_metrics", "goals", "How will success be measured?", false,
                &["User adoption rate", "Performance benchmarks", "Revenue targets", "User satisfaction score"]),
            q(5, "functional_requirements", "requirements", "Functional requirements?", true, &[]),
            q(6, "non_functional_requirements", "requirements", "Non-functional requirements?", false,
                &["High availability (99.9%)", "Sub-100ms latency", "GDPR compliance", "Offline support"]),
            q(7, "constraints", "requirements", "Constraints or limitations?", false, &[]),
            q(8, "tech_stack", "technical", "Tech stack?", false,
                &["Go + React", "Python + React", "Node.js + React", "Rust + React"]),
            q(9, "integrations", "technical", "Third-party integrations?", false, &[]),
            q(10, "milestones", "timeline", "Key milestones?", false, &[]),
            q(11, "deadline", "timeline", "Target deadline?", false,
                &["1 month", "3 months", "6 months", "1 year"]),
        ]
    })
}

fn section_title(section: &str) -> &'static str {
    match section {
        "overview" => "Overview",
        "goals" => "Goals",
        "requirements" => "Requirements",
        "technical" => "Technical",
        _ => "Timeline",
    }
}

fn question_label(key: &str) -> &'static str {
    match key {
        "project_name" => "Project Name",
        "project_description" => "Description",
        "target_audience" => "Target Audience",
        "primary_goals" => "Primary Goals",
        "success_metrics" => "Success Metrics",
        "functional_requirements" => "Functional Requirements",
        "non_functional_requirements" => "Non-Functional Requirements",
        "constraints" => "Constraints",
        "tech_stack" => "Tech Stack",
        "integrations" => "Integrations",
        "milestones" => "Milestones",
        _ => "Deadline",
    }
}

fn session_file(ws: &Path, slug: &str) -> PathBuf {
    paths::project_dir(ws, slug).join("prd-session.toon")
}

fn load_session(ws: &Path, slug: &str) -> crate::Result<PrdSession> {
    toon::parse_file(&session_file(ws, slug))
}

fn save_session(ws: &Path, session: &PrdSession) -> crate::Result<()> {
    toon::write_file(&session_file(ws, &session.slug), session)
}

/// Render the answered questions to Markdown, grouped by section.
pub fn generate_markdown(session: &PrdSession) -> String {
    let answers: std::collections::HashMap<&str, &str> = session
        .answers
        .iter()
        .map(|a| (a.question_key.as_str(), a.answer.as_str()))
        .collect();
    let mut out = format!("# {}\n\n", session.project_name);
    let mut current_section = "";
    for question in questions() {
        let Some(answer) = answers.get(question.key).filter(|a| !a.is_empty()) else {
            continue;
        };
        if question.section != current_section {
            current_section = question.section;
            out.push_str(&format!("## {}\n\n", section_title(current_section)));
        }
        out.push_str(&format!("### {}\n\n{}\n\n", question_label(question.key), answer));
    }
    out
}

/// The response payload describing the current question.
fn next_question(session: &PrdSession) -> Value {
    let Some(question) = questions().get(session.current_index) else {
        return json!({"status": "complete"});
    };
    let mut payload = Map::new();
    payload.insert("status".to_string(), json!("in_progress"));
    payload.insert("question".to_string(), json!(question.question));
    payload.insert("key".to_string(), json!(question.key));
    payload.insert("index".to_string(), json!(session.current_index));
    payload.insert("required".to_string(), json!(question.required));
    if !question.options.is_empty() {
        payload.insert("options".to_string(), json!(question.options));
    }
    Value::Object(payload)
}

/// Mark the session complete and render `prd.md`.
fn finish(ws: &Path, session: &mut PrdSession) -> ToolResult {
    session.status = PrdStatus::Complete;
    let prd_path = paths::project_dir(ws, &session.slug).join("prd.md");
    if let Err(e) = fs::write(&prd_path, generate_markdown(session)) {
        return error_result(e.to_string());
    }
    if let Err(e) = save_session(ws, session) {
        return error_result(e.to_string());
    }
    json_result(&json!({"status": "complete", "file": "prd.md"}))
}

/// Step to the next question, finalizing if the list is exhausted.
fn advance(ws: &Path, session: &mut PrdSession) -> ToolResult {
    session.current_index += 1;
    if session.current_index >= questions().len() {
        return finish(ws, session);
    }
    if let Err(e) = save_session(ws, session) {
        return error_result(e.to_string());
    }
    json_result(&next_question(session))
}

fn project_schema() -> InputSchema {
    InputSchema::object(
        json!({"project": {"type": "string", "description": "Project slug"}}),
        &["project"],
    )
}

/// All PRD session tools.
pub fn tools(ws: &Path) -> Vec<Tool> {
    vec![
        start_session(ws.to_path_buf()),
        answer_question(ws.to_path_buf()),
        get_session(ws.to_path_buf()),
        abandon_session(ws.to_path_buf()),
        skip_question(ws.to_path_buf()),
        back_question(ws.to_path_buf()),
        preview(ws.to_path_buf()),
        split(ws.to_path_buf()),
        list_phases(ws.to_path_buf()),
    ]
}

fn start_session(ws: PathBuf) -> Tool {
    tool(
        "start_prd_session",
        "Start guided PRD creation",
        project_schema(),
        move |args| {
            let slug = arg_str(args, "project");
            if !paths::file_exists(&paths::project_dir(&ws, slug)) {
                return Ok(error_result("project not found"));
            }
            let session = PrdSession {
                project_name: slug.to_string(),
                slug: slug.to_string(),
                status: PrdStatus::InProgress,
                ..Default::default()
            };
            if let Err(e) = save_session(&ws, &session) {
                return Ok(error_result(e.to_string()));
            }
            Ok(json_result(&next_question(&session)))
        },
    )
}

fn answer_question(ws: PathBuf) -> Tool {
    tool(
        "answer_prd_question",
        "Answer current PRD question",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "answer": {"type": "string"},
            }),
            &["project", "answer"],
        ),
        move |args| {
            let mut session = match load_session(&ws, arg_str(args, "project")) {
                Ok(s) => s,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let Some(question) = questions().get(session.current_index) else {
                return Ok(error_result("session already complete"));
            };
            session.answers.push(PrdAnswer {
                question_key: question.key.to_string(),
                answer: arg_str(args, "answer").to_string(),
            });
            Ok(advance(&ws, &mut session))
        },
    )
}

fn get_session(ws: PathBuf) -> Tool {
    tool(
        "get_prd_session",
        "Get PRD session state",
        project_schema(),
        move |args| match load_session(&ws, arg_str(args, "project")) {
            Ok(session) => Ok(json_result(&session)),
            Err(e) => Ok(error_result(e.to_string())),
        },
    )
}

fn abandon_session(ws: PathBuf) -> Tool {
    tool(
        "abandon_prd_session",
        "Abandon PRD session",
        project_schema(),
        move |args| {
            let _ = fs::remove_file(session_file(&ws, arg_str(args, "project")));
            Ok(text_result("abandoned"))
        },
    )
}

fn skip_question(ws: PathBuf) -> Tool {
    tool(
        "skip_prd_question",
        "Skip optional PRD question",
        project_schema(),
        move |args| {
            let mut session = match load_session(&ws, arg_str(args, "project")) {
                Ok(s) => s,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let Some(question) = questions().get(session.current_index) else {
                return Ok(error_result("session already complete"));
            };
            if question.required {
                return Ok(error_result("cannot skip required question"));
            }
            Ok(advance(&ws, &mut session))
        },
    )
}

fn back_question(ws: PathBuf) -> Tool {
    tool(
        "back_prd_question",
        "Go back to previous PRD question",
        project_schema(),
        move |args| {
            let mut session = match load_session(&ws, arg_str(args, "project")) {
                Ok(s) => s,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            if session.current_index == 0 {
                return Ok(error_result("at first question"));
            }
            session.current_index -= 1;
            let previous_key = questions()[session.current_index].key;
            if session
                .answers
                .last()
                .is_some_and(|a| a.question_key == previous_key)
            {
                session.answers.pop();
            }
            if let Err(e) = save_session(&ws, &session) {
                return Ok(error_result(e.to_string()));
            }
            Ok(json_result(&next_question(&session)))
        },
    )
}

fn preview(ws: PathBuf) -> Tool {
    tool(
        "preview_prd",
        "Preview PRD markdown",
        project_schema(),
        move |args| match load_session(&ws, arg_str(args, "project")) {
            Ok(session) => Ok(text_result(generate_markdown(&session))),
            Err(e) => Ok(error_result(e.to_string())),
        },
    )
}

fn split(ws: PathBuf) -> Tool {
    tool(
        "split_prd",
        "Split completed PRD into numbered phases",
        InputSchema::object(
            json!({
                "project": {"type": "string", "description": "Project slug"},
                "phases": {"type": "array", "items": {"type": "string"}, "description": "Phase names in order"},
            }),
            &["project", "phases"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let mut parent = match load_session(&ws, slug) {
                Ok(s) => s,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            if parent.status != PrdStatus::Complete {
                return Ok(error_result("PRD must be complete before splitting"));
            }
            let phases = arg_string_array(args, "phases");
            if phases.len() < 2 {
                return Ok(error_result("provide at least 2 phase names"));
            }
            parent.phases.clear();
            for (i, name) in phases.iter().enumerate() {
                let phase_number = (i + 1) as u32;
                let phase_slug = format!("{}-phase-{}", slug, phase_number);
                parent.phases.push(phase_slug.clone());
                let child = PrdSession {
                    slug: phase_slug.clone(),
                    project_name: format!("{} — Phase {}: {}", parent.project_name, phase_number, name),
                    status: PrdStatus::Pending,
                    parent_slug: Some(slug.to_string()),
                    phase: Some(phase_number),
                    ..Default::default()
                };
                if let Err(e) = fs::create_dir_all(paths::project_dir(&ws, &phase_slug)) {
                    return Ok(error_result(e.to_string()));
                }
                if let Err(e) = save_session(&ws, &child) {
                    return Ok(error_result(e.to_string()));
                }
            }
            if let Err(e) = save_session(&ws, &parent) {
                return Ok(error_result(e.to_string()));
            }
            Ok(json_result(&json!({
                "phases": parent.phases,
                "count": phases.len(),
            })))
        },
    )
}

fn list_phases(ws: PathBuf) -> Tool {
    tool(
        "list_prd_phases",
        "List PRD phases for a project",
        project_schema(),
        move |args| {
            let session = match load_session(&ws, arg_str(args, "project")) {
                Ok(s) => s,
                Err(e) => return Ok(error_result(e.to_string())),
            };
            if session.phases.is_empty() {
                return Ok(json_result(&json!({
                    "phases": [],
                    "message": "no phases — use split_prd first",
                })));
            }
            let phases: Vec<Value> = session
                .phases
                .iter()
                .map(|phase_slug| match load_session(&ws, phase_slug) {
                    Ok(child) => json!({
                        "slug": phase_slug,
                        "name": child.project_name,
                        "phase": child.phase,
                        "status": child.status,
                    }),
                    Err(_) => json!({"slug": phase_slug, "status": "missing"}),
                })
                .collect();
            Ok(json_result(&phases))
        },
    )
}
