//! Claude Code awareness tools: installed asset listings, bundled asset
//! installation, and the hook event log.

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::bootstrap;
use crate::ids;
use crate::mcp::{InputSchema, Tool};
use crate::models::{HookEvent, HookEventLog};
use crate::toon;

use super::{arg_opt, arg_str, arg_u64, error_result, json_result, tool};

/// The hook event log keeps at most this many entries.
const MAX_HOOK_EVENTS: usize = 100;

/// Claude Code awareness tools.
pub fn tools(ws: &Path) -> Vec<Tool> {
    vec![
        list_skills(ws.to_path_buf()),
        list_agents(ws.to_path_buf()),
        receive_hook_event(ws.to_path_buf()),
        get_hook_events(ws.to_path_buf()),
        install_skills(ws.to_path_buf()),
        install_agents(ws.to_path_buf()),
        install_docs(ws.to_path_buf()),
    ]
}

fn events_path(ws: &Path) -> PathBuf {
    ws.join(".projects").join(".events").join("hook-events.toon")
}

/// First non-empty, non-heading line of a markdown file.
fn first_content_line(path: &Path) -> String {
    let Ok(file) = fs::File::open(path) else {
        return String::new();
    };
    for line in std::io::BufReader::new(file).lines().map_while(|l| l.ok()) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        return line.to_string();
    }
    String::new()
}

fn list_skills(ws: PathBuf) -> Tool {
    tool(
        "list_skills",
        "List available skills in the project",
        InputSchema::empty(),
        move |_args| {
            let skills_dir = ws.join(".claude").join("skills");
            let entries = match fs::read_dir(&skills_dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(json_result(&Vec::<serde_json::Value>::new()));
                }
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let mut skills: Vec<serde_json::Value> = entries
                .flatten()
                .filter(|e| e.path().is_dir())
                .filter_map(|e| {
                    let name = e.file_name().into_string().ok()?;
                    let description = first_content_line(&e.path().join("SKILL.md"));
                    Some(json!({"name": name, "description": description}))
                })
                .collect();
            skills.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));
            Ok(json_result(&skills))
        },
    )
}

fn list_agents(ws: PathBuf) -> Tool {
    tool(
        "list_agents",
        "List available agents in the project",
        InputSchema::empty(),
        move |_args| {
            let agents_dir = ws.join(".claude").join("agents");
            let entries = match fs::read_dir(&agents_dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(json_result(&Vec::<serde_json::Value>::new()));
                }
                Err(e) => return Ok(error_result(e.to_string())),
            };
            let mut agents: Vec<serde_json::Value> = entries
                .flatten()
                .filter(|e| {
                    let p = e.path();
                    p.is_file() && p.extension().is_some_and(|ext| ext == "md")
                })
                .filter_map(|e| {
                    let path = e.path();
                    let name = path.file_stem()?.to_str()?.to_string();
                    let description = first_content_line(&path);
                    Some(json!({"name": name, "description": description}))
                })
                .collect();
            agents.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));
            Ok(json_result(&agents))
        },
    )
}

fn receive_hook_event(ws: PathBuf) -> Tool {
    tool(
        "receive_hook_event",
        "Receive a Claude Code hook event",
        InputSchema::object(
            json!({
                "event_type": {"type": "string"},
                "session_id": {"type": "string"},
                "tool_name": {"type": "string"},
                "agent_type": {"type": "string"},
                "data": {"type": "object"},
            }),
            &["event_type"],
        ),
        move |args| {
            let event = HookEvent {
                event_type: arg_str(args, "event_type").to_string(),
                session_id: arg_str(args, "session_id").to_string(),
                tool_name: arg_opt(args, "tool_name"),
                agent_type: arg_opt(args, "agent_type"),
                data: args.get("data").filter(|v| v.is_object()).cloned(),
                timestamp: ids::now(),
            };
            let path = events_path(&ws);
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            let mut log: HookEventLog = toon::parse_file(&path).unwrap_or_default();
            log.events.push(event.clone());
            if log.events.len() > MAX_HOOK_EVENTS {
                let excess = log.events.len() - MAX_HOOK_EVENTS;
                log.events.drain(0..excess);
            }
            let _ = toon::write_file(&path, &log);
            Ok(json_result(&json!({
                "stored": true,
                "event_type": event.event_type,
            })))
        },
    )
}

fn get_hook_events(ws: PathBuf) -> Tool {
    tool(
        "get_hook_events",
        "Get recent Claude Code hook events",
        InputSchema::object(
            json!({
                "event_type": {"type": "string", "description": "Filter by event type"},
                "limit": {"type": "number", "description": "Max events to return"},
            }),
            &[],
        ),
        move |args| {
            let log: HookEventLog = match toon::parse_file(&events_path(&ws)) {
                Ok(log) => log,
                Err(_) => return Ok(json_result(&Vec::<HookEvent>::new())),
            };
            let mut events = log.events;
            if let Some(filter) = arg_opt(args, "event_type") {
                events.retain(|e| e.event_type == filter);
            }
            let limit = arg_u64(args, "limit") as usize;
            if limit > 0 && events.len() > limit {
                let skip = events.len() - limit;
                events.drain(0..skip);
            }
            Ok(json_result(&events))
        },
    )
}

fn install_skills(ws: PathBuf) -> Tool {
    tool(
        "install_skills",
        "Install bundled skills to project",
        InputSchema::object(
            json!({
                "names": {"type": "array", "items": {"type": "string"}, "description": "Skill names to install (empty = all)"},
            }),
            &[],
        ),
        move |_args| {
            let target = ws.join(".claude").join("skills");
            match bootstrap::install_skills(&target) {
                Ok(count) => Ok(json_result(&json!({
                    "installed": count,
                    "available": bootstrap::list_bundled_skills(),
                }))),
                Err(e) => Ok(error_result(e.to_string())),
            }
        },
    )
}

fn install_agents(ws: PathBuf) -> Tool {
    tool(
        "install_agents",
        "Install bundled agents to project",
        InputSchema::object(
            json!({
                "names": {"type": "array", "items": {"type": "string"}, "description": "Agent names to install (empty = all)"},
            }),
            &[],
        ),
        move |_args| {
            let target = ws.join(".claude").join("agents");
            match bootstrap::install_agents(&target) {
                Ok(count) => Ok(json_result(&json!({
                    "installed": count,
                    "available": bootstrap::list_bundled_agents(),
                }))),
                Err(e) => Ok(error_result(e.to_string())),
            }
        },
    )
}

fn install_docs(ws: PathBuf) -> Tool {
    tool(
        "install_docs",
        "Install CLAUDE.md, AGENTS.md, CONTEXT.md to project root",
        InputSchema::empty(),
        move |_args| {
            let count = bootstrap::install_docs(&ws);
            Ok(json_result(&json!({
                "installed": count,
                "files": ["CLAUDE.md", "AGENTS.md", "CONTEXT.md"],
            })))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Bridge;
    use crate::tools::build_server;
    use crate::tools::test_support::{call, result_json};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> (TempDir, crate::mcp::McpServer) {
        let temp = TempDir::new().unwrap();
        let bridge = Arc::new(Bridge::local(temp.path().to_path_buf()));
        let server = build_server(temp.path(), bridge);
        (temp, server)
    }

    #[test]
    fn test_list_skills_empty_then_installed() {
        let (_temp, server) = setup();
        let empty = result_json(&call(&server, "list_skills", json!({})));
        assert_eq!(empty, json!([]));

        let installed = result_json(&call(&server, "install_skills", json!({})));
        assert_eq!(installed["installed"], 2);

        let skills = result_json(&call(&server, "list_skills", json!({})));
        let list = skills.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["name"], "bug-triage");
        assert!(!list[0]["description"].as_str().unwrap().is_empty());
    }

    #[test]
    fn test_list_agents_after_install() {
        let (_temp, server) = setup();
        call(&server, "install_agents", json!({}));
        let agents = result_json(&call(&server, "list_agents", json!({})));
        let names: Vec<&str> = agents
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|a| a["name"].as_str())
            .collect();
        assert_eq!(names, vec!["doc-writer", "qa-rust"]);
    }

    #[test]
    fn test_install_docs_reports_files() {
        let (temp, server) = setup();
        let result = result_json(&call(&server, "install_docs", json!({})));
        assert_eq!(result["installed"], 3);
        assert!(temp.path().join("CLAUDE.md").is_file());
    }

    #[test]
    fn test_hook_events_roundtrip_and_filter() {
        let (_temp, server) = setup();
        call(
            &server,
            "receive_hook_event",
            json!({"event_type": "PostToolUse", "tool_name": "Bash", "data": {"exit": 0}}),
        );
        call(
            &server,
            "receive_hook_event",
            json!({"event_type": "Stop", "session_id": "s-1"}),
        );

        let all = result_json(&call(&server, "get_hook_events", json!({})));
        assert_eq!(all.as_array().unwrap().len(), 2);

        let stops = result_json(&call(
            &server,
            "get_hook_events",
            json!({"event_type": "Stop"}),
        ));
        assert_eq!(stops.as_array().unwrap().len(), 1);
        assert_eq!(stops[0]["session_id"], "s-1");
    }

    #[test]
    fn test_hook_events_capped() {
        let (_temp, server) = setup();
        for i in 0..(MAX_HOOK_EVENTS + 5) {
            call(
                &server,
                "receive_hook_event",
                json!({"event_type": format!("evt-{}", i)}),
            );
        }
        let events = result_json(&call(&server, "get_hook_events", json!({})));
        let list = events.as_array().unwrap();
        assert_eq!(list.len(), MAX_HOOK_EVENTS);
        // Oldest entries dropped, newest kept
        assert_eq!(list[0]["event_type"], "evt-5");
    }

    #[test]
    fn test_get_hook_events_limit_keeps_tail() {
        let (_temp, server) = setup();
        for kind in ["a", "b", "c"] {
            call(&server, "receive_hook_event", json!({"event_type": kind}));
        }
        let events = result_json(&call(&server, "get_hook_events", json!({"limit": 2})));
        let list = events.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["event_type"], "b");
        assert_eq!(list[1]["event_type"], "c");
    }
}
