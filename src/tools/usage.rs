//! Token usage ledger tools. At most one session is open at a time;
//! `record_usage` opens one on demand and `reset_session_usage` closes it.

use std::path::{Path, PathBuf};

use serde_json::json;

use crate::ids;
use crate::mcp::{InputSchema, Tool};
use crate::models::{RequestEntry, UsageData, UsageSession};
use crate::toon;

use super::{arg_f64, arg_str, arg_u64, error_result, json_result, text_result, tool};

/// Usage tracking tools.
pub fn tools(ws: &Path) -> Vec<Tool> {
    vec![
        get_usage(ws.to_path_buf()),
        record_usage(ws.to_path_buf()),
        reset_session_usage(ws.to_path_buf()),
    ]
}

fn usage_path(ws: &Path) -> PathBuf {
    ws.join(".projects").join("usage.toon")
}

fn load(ws: &Path) -> UsageData {
    // Best-effort: the ledger may not exist yet.
    toon::parse_file(&usage_path(ws)).unwrap_or_default()
}

fn open_session(data: &mut UsageData) -> Option<&mut UsageSession> {
    data.sessions.iter_mut().rev().find(|s| s.ended_at.is_none())
}

fn get_usage(ws: PathBuf) -> Tool {
    tool(
        "get_usage",
        "Get usage totals and recent sessions",
        InputSchema::empty(),
        move |_args| {
            let data = load(&ws);
            let recent: &[UsageSession] = if data.sessions.len() > 10 {
                &data.sessions[data.sessions.len() - 10..]
            } else {
                &data.sessions
            };
            Ok(json_result(&json!({
                "totals": data.totals,
                "recent_sessions": recent,
            })))
        },
    )
}

fn record_usage(ws: PathBuf) -> Tool {
    tool(
        "record_usage",
        "Record token usage for current session",
        InputSchema::object(
            json!({
                "provider": {"type": "string"},
                "model": {"type": "string"},
                "input_tokens": {"type": "number"},
                "output_tokens": {"type": "number"},
                "cost": {"type": "number"},
            }),
            &["input_tokens", "output_tokens"],
        ),
        move |args| {
            let mut data = load(&ws);
            if open_session(&mut data).is_none() {
                data.sessions.push(UsageSession {
                    provider: arg_str(args, "provider").to_string(),
                    model: arg_str(args, "model").to_string(),
                    started_at: ids::now(),
                    ..Default::default()
                });
            }
            let input = arg_u64(args, "input_tokens");
            let output = arg_u64(args, "output_tokens");
            let cost = arg_f64(args, "cost");
            let (session_input, session_output) = match open_session(&mut data) {
                Some(session) => {
                    session.total_input += input;
                    session.total_output += output;
                    session.total_cost += cost;
                    session.requests.push(RequestEntry {
                        timestamp: ids::now(),
                        input_tokens: input,
                        output_tokens: output,
                        cost,
                    });
                    (session.total_input, session.total_output)
                }
                None => (0, 0),
            };
            data.totals.total_input += input;
            data.totals.total_output += output;
            data.totals.total_cost += cost;
            if let Err(e) = toon::write_file(&usage_path(&ws), &data) {
                return Ok(error_result(e.to_string()));
            }
            Ok(json_result(&json!({
                "session_input": session_input,
                "session_output": session_output,
            })))
        },
    )
}

fn reset_session_usage(ws: PathBuf) -> Tool {
    tool(
        "reset_session_usage",
        "End the current usage session",
        InputSchema::empty(),
        move |_args| {
            let mut data = load(&ws);
            let Some(session) = open_session(&mut data) else {
                return Ok(text_result("no open session"));
            };
            session.ended_at = Some(ids::now());
            if let Err(e) = toon::write_file(&usage_path(&ws), &data) {
                return Ok(error_result(e.to_string()));
            }
            Ok(text_result("session ended"))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Bridge;
    use crate::tools::build_server;
    use crate::tools::test_support::{call, result_json, result_text};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn setup() -> (TempDir, crate::mcp::McpServer) {
        let temp = TempDir::new().unwrap();
        let bridge = Arc::new(Bridge::local(temp.path().to_path_buf()));
        std::fs::create_dir_all(temp.path().join(".projects")).unwrap();
        let server = build_server(temp.path(), bridge);
        (temp, server)
    }

    #[test]
    fn test_record_opens_session_on_demand() {
        let (temp, server) = setup();
        let result = result_json(&call(
            &server,
            "record_usage",
            json!({"provider": "anthropic", "model": "opus", "input_tokens": 100, "output_tokens": 50, "cost": 0.25}),
        ));
        assert_eq!(result["session_input"], 100);
        assert_eq!(result["session_output"], 50);

        let data: UsageData = toon::parse_file(&usage_path(temp.path())).unwrap();
        assert_eq!(data.sessions.len(), 1);
        assert_eq!(data.sessions[0].provider, "anthropic");
        assert!(data.sessions[0].ended_at.is_none());
        assert_eq!(data.sessions[0].requests.len(), 1);
        assert_eq!(data.totals.total_input, 100);
    }

    #[test]
    fn test_record_accumulates_in_open_session() {
        let (temp, server) = setup();
        call(
            &server,
            "record_usage",
            json!({"input_tokens": 100, "output_tokens": 50}),
        );
        let result = result_json(&call(
            &server,
            "record_usage",
            json!({"input_tokens": 10, "output_tokens": 5}),
        ));
        assert_eq!(result["session_input"], 110);

        let data: UsageData = toon::parse_file(&usage_path(temp.path())).unwrap();
        assert_eq!(data.sessions.len(), 1, "no second session while one is open");
        let open_count = data.sessions.iter().filter(|s| s.ended_at.is_none()).count();
        assert_eq!(open_count, 1);
    }

    #[test]
    fn test_reset_closes_and_next_record_reopens() {
        let (temp, server) = setup();
        call(
            &server,
            "record_usage",
            json!({"input_tokens": 1, "output_tokens": 1}),
        );
        let result = call(&server, "reset_session_usage", json!({}));
        assert_eq!(result_text(&result), "session ended");

        let again = call(&server, "reset_session_usage", json!({}));
        assert_eq!(result_text(&again), "no open session");

        call(
            &server,
            "record_usage",
            json!({"input_tokens": 2, "output_tokens": 2}),
        );
        let data: UsageData = toon::parse_file(&usage_path(temp.path())).unwrap();
        assert_eq!(data.sessions.len(), 2);
        let open_count = data.sessions.iter().filter(|s| s.ended_at.is_none()).count();
        assert_eq!(open_count, 1);
        assert_eq!(data.totals.total_input, 3);
    }

    #[test]
    fn test_get_usage_limits_recent_sessions() {
        let (_temp, server) = setup();
        for _ in 0..12 {
            call(
                &server,
                "record_usage",
                json!({"input_tokens": 1, "output_tokens": 1}),
            );
            call(&server, "reset_session_usage", json!({}));
        }
        let result = result_json(&call(&server, "get_usage", json!({})));
        assert_eq!(result["recent_sessions"].as_array().unwrap().len(), 10);
        assert_eq!(result["totals"]["total_input"], 12);
    }
}
