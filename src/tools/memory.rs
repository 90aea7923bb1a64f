//! Project memory tools.
//!
//! Every operation consults the external memory engine first when the
//! bridge has a client, and falls back to the local `.memory/` TOON
//! store on any engine error. Fallback search scores chunks by the
//! fraction of query words found in the lowercased summary + content +
//! tags haystack.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::engine::Bridge;
use crate::ids;
use crate::mcp::{InputSchema, Tool};
use crate::models::{MemoryChunk, MemoryIndex, SessionEvent, SessionIndex, SessionLog};
use crate::paths;
use crate::toon;

use super::{arg_str, arg_string_array, arg_u64, error_result, json_result, tool, Args};

/// Project memory tools, sharing one engine bridge.
pub fn tools(ws: &Path, bridge: Arc<Bridge>) -> Vec<Tool> {
    vec![
        save_memory(ws.to_path_buf(), Arc::clone(&bridge)),
        search_memory(ws.to_path_buf(), Arc::clone(&bridge)),
        get_context(ws.to_path_buf(), Arc::clone(&bridge)),
        save_session(ws.to_path_buf(), Arc::clone(&bridge)),
        list_sessions(ws.to_path_buf(), Arc::clone(&bridge)),
        get_session(ws.to_path_buf(), bridge),
    ]
}

fn memory_dir(ws: &Path, slug: &str) -> PathBuf {
    paths::project_dir(ws, slug).join(".memory")
}

fn chunks_path(ws: &Path, slug: &str) -> PathBuf {
    memory_dir(ws, slug).join("chunks.toon")
}

fn sessions_dir(ws: &Path, slug: &str) -> PathBuf {
    memory_dir(ws, slug).join("sessions")
}

fn log_fallback(tool_name: &str, error: &crate::engine::EngineError) {
    tracing::warn!(tool = tool_name, error = %error, "memory engine failed, using local store");
}

/// Fraction of query words present in the haystack.
fn keyword_score(haystack: &str, query: &str) -> f64 {
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let matches = words.iter().filter(|w| haystack.contains(*w)).count();
    matches as f64 / words.len() as f64
}

fn chunk_haystack(chunk: &MemoryChunk) -> String {
    format!(
        "{} {} {}",
        chunk.summary,
        chunk.content,
        chunk.tags.join(" ")
    )
    .to_lowercase()
}

fn save_memory(ws: PathBuf, bridge: Arc<Bridge>) -> Tool {
    tool(
        "save_memory",
        "Save a context chunk to project memory",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "content": {"type": "string", "description": "Content to remember"},
                "summary": {"type": "string", "description": "Short summary"},
                "source": {"type": "string", "description": "Source type: task, prd, session, user"},
                "source_id": {"type": "string", "description": "Source ID (task ID, session ID)"},
                "tags": {"type": "array", "items": {"type": "string"}},
            }),
            &["project", "content", "summary"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let tags = arg_string_array(args, "tags");
            if let Some(engine) = bridge.client() {
                match engine.store_chunk(
                    slug,
                    arg_str(args, "source"),
                    arg_str(args, "source_id"),
                    arg_str(args, "summary"),
                    arg_str(args, "content"),
                    &tags,
                ) {
                    Ok(response) => return Ok(json_result(&response)),
                    Err(e) => log_fallback("save_memory", &e),
                }
            }
            local_save_memory(&ws, slug, args, tags)
        },
    )
}

fn search_memory(ws: PathBuf, bridge: Arc<Bridge>) -> Tool {
    tool(
        "search_memory",
        "Search project memory by keyword",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "query": {"type": "string"},
                "limit": {"type": "number"},
            }),
            &["project", "query"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let query = arg_str(args, "query");
            let limit = match arg_u64(args, "limit") {
                0 => 10,
                n => n as usize,
            };
            if let Some(engine) = bridge.client() {
                match engine.search_memory(slug, query, limit) {
                    Ok(response) => return Ok(json_result(&response)),
                    Err(e) => log_fallback("search_memory", &e),
                }
            }
            local_search_memory(&ws, slug, query, limit)
        },
    )
}

fn get_context(ws: PathBuf, bridge: Arc<Bridge>) -> Tool {
    tool(
        "get_context",
        "Get relevant context for current work",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "query": {"type": "string", "description": "What context do you need?"},
                "limit": {"type": "number"},
            }),
            &["project", "query"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let query = arg_str(args, "query");
            let limit = match arg_u64(args, "limit") {
                0 => 5,
                n => n as usize,
            };
            if let Some(engine) = bridge.client() {
                match engine.get_context(slug, query, limit) {
                    Ok(response) => return Ok(json_result(&response)),
                    Err(e) => log_fallback("get_context", &e),
                }
            }
            local_get_context(&ws, slug, query, limit)
        },
    )
}

fn save_session(ws: PathBuf, bridge: Arc<Bridge>) -> Tool {
    tool(
        "save_session",
        "Save a session summary to project memory",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "session_id": {"type": "string"},
                "summary": {"type": "string"},
                "events": {"type": "array", "items": {"type": "object"}},
            }),
            &["project", "session_id", "summary"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let session_id = arg_str(args, "session_id");
            let summary = arg_str(args, "summary");
            if let Some(engine) = bridge.client() {
                let events = args.get("events").cloned().unwrap_or(json!([]));
                match engine.store_session(slug, session_id, summary, &events) {
                    Ok(response) => return Ok(json_result(&response)),
                    Err(e) => log_fallback("save_session", &e),
                }
            }
            local_save_session(&ws, slug, session_id, summary, args)
        },
    )
}

fn list_sessions(ws: PathBuf, bridge: Arc<Bridge>) -> Tool {
    tool(
        "list_sessions",
        "List recent sessions for a project",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "limit": {"type": "number"},
            }),
            &["project"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let limit = match arg_u64(args, "limit") {
                0 => 20,
                n => n as usize,
            };
            if let Some(engine) = bridge.client() {
                match engine.list_sessions(slug, limit) {
                    Ok(response) => return Ok(json_result(&response)),
                    Err(e) => log_fallback("list_sessions", &e),
                }
            }
            local_list_sessions(&ws, slug, limit)
        },
    )
}

fn get_session(ws: PathBuf, bridge: Arc<Bridge>) -> Tool {
    tool(
        "get_session",
        "Get full session details",
        InputSchema::object(
            json!({
                "project": {"type": "string"},
                "session_id": {"type": "string"},
            }),
            &["project", "session_id"],
        ),
        move |args| {
            let slug = arg_str(args, "project");
            let session_id = arg_str(args, "session_id");
            if let Some(engine) = bridge.client() {
                match engine.get_session(slug, session_id) {
                    Ok(response) => return Ok(json_result(&response)),
                    Err(e) => log_fallback("get_session", &e),
                }
            }
            local_get_session(&ws, slug, session_id)
        },
    )
}

// --- Local store implementations ---

fn local_save_memory(
    ws: &Path,
    slug: &str,
    args: &Args,
    tags: Vec<String>,
) -> crate::Result<crate::mcp::ToolResult> {
    let dir = memory_dir(ws, slug);
    let _ = fs::create_dir_all(&dir);
    let path = chunks_path(ws, slug);
    let mut index: MemoryIndex = toon::parse_file(&path).unwrap_or_default();
    let chunk = MemoryChunk {
        id: format!("mem-{}", index.chunks.len() + 1),
        project: slug.to_string(),
        source: arg_str(args, "source").to_string(),
        source_id: arg_str(args, "source_id").to_string(),
        summary: arg_str(args, "summary").to_string(),
        content: arg_str(args, "content").to_string(),
        tags,
        created_at: ids::now(),
    };
    index.chunks.push(chunk.clone());
    if let Err(e) = toon::write_file(&path, &index) {
        return Ok(error_result(e.to_string()));
    }
    Ok(json_result(&chunk))
}

fn local_search_memory(
    ws: &Path,
    slug: &str,
    query: &str,
    limit: usize,
) -> crate::Result<crate::mcp::ToolResult> {
    let query = query.to_lowercase();
    let index: MemoryIndex = match toon::parse_file(&chunks_path(ws, slug)) {
        Ok(index) => index,
        Err(_) => return Ok(json_result(&Vec::<Value>::new())),
    };
    let mut results: Vec<Value> = index
        .chunks
        .iter()
        .filter_map(|chunk| {
            let score = keyword_score(&chunk_haystack(chunk), &query);
            (score > 0.0).then(|| json!({"chunk": chunk, "score": score}))
        })
        .collect();
    results.sort_by(|a, b| {
        let sa = a["score"].as_f64().unwrap_or(0.0);
        let sb = b["score"].as_f64().unwrap_or(0.0);
        sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(limit);
    Ok(json_result(&results))
}

fn local_get_context(
    ws: &Path,
    slug: &str,
    query: &str,
    limit: usize,
) -> crate::Result<crate::mcp::ToolResult> {
    let query = query.to_lowercase();
    let index: MemoryIndex = toon::parse_file(&chunks_path(ws, slug)).unwrap_or_default();
    let sessions: SessionIndex =
        toon::parse_file(&sessions_dir(ws, slug).join("index.toon")).unwrap_or_default();

    let mut items: Vec<Value> = Vec::new();
    for chunk in &index.chunks {
        let score = keyword_score(&chunk_haystack(chunk), &query);
        if score > 0.0 {
            items.push(json!({
                "type": "memory",
                "summary": chunk.summary,
                "content": chunk.content,
                "score": score,
            }));
        }
    }
    for session in &sessions.sessions {
        let score = keyword_score(&session.summary.to_lowercase(), &query);
        if score > 0.0 {
            items.push(json!({
                "type": "session",
                "summary": session.summary,
                "content": session.session_id,
                "score": score,
            }));
        }
    }
    items.sort_by(|a, b| {
        let sa = a["score"].as_f64().unwrap_or(0.0);
        let sb = b["score"].as_f64().unwrap_or(0.0);
        sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
    });
    items.truncate(limit);
    Ok(json_result(&items))
}

fn local_save_session(
    ws: &Path,
    slug: &str,
    session_id: &str,
    summary: &str,
    args: &Args,
) -> crate::Result<crate::mcp::ToolResult> {
    let dir = sessions_dir(ws, slug);
    let _ = fs::create_dir_all(&dir);
    let mut session = SessionLog {
        session_id: session_id.to_string(),
        project: slug.to_string(),
        summary: summary.to_string(),
        started_at: ids::now(),
        ..Default::default()
    };
    if let Some(events) = args.get("events").and_then(Value::as_array) {
        for event in events.iter().filter_map(Value::as_object) {
            session.events.push(SessionEvent {
                kind: event
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                summary: event
                    .get("summary")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                timestamp: ids::now(),
            });
        }
    }
    let _ = toon::write_file(&dir.join(format!("{}.toon", session_id)), &session);
    let index_path = dir.join("index.toon");
    let mut index: SessionIndex = toon::parse_file(&index_path).unwrap_or_default();
    index.sessions.push(session.clone());
    let _ = toon::write_file(&index_path, &index);
    Ok(json_result(&session))
}

fn local_list_sessions(
    ws: &Path,
    slug: &str,
    limit: usize,
) -> crate::Result<crate::mcp::ToolResult> {
    let index: SessionIndex = match toon::parse_file(&sessions_dir(ws, slug).join("index.toon")) {
        Ok(index) => index,
        Err(_) => return Ok(json_result(&Vec::<SessionLog>::new())),
    };
    let sessions = &index.sessions;
    let recent: &[SessionLog] = if sessions.len() > limit {
        &sessions[sessions.len() - limit..]
    } else {
        sessions
    };
    Ok(json_result(&recent))
}

fn local_get_session(
    ws: &Path,
    slug: &str,
    session_id: &str,
) -> crate::Result<crate::mcp::ToolResult> {
    let path = sessions_dir(ws, slug).join(format!("{}.toon", session_id));
    match toon::parse_file::<SessionLog>(&path) {
        Ok(session) => Ok(json_result(&session)),
        Err(e) => Ok(error_result(e.to_string())),
    }
}
