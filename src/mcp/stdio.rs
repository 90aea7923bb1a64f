//! Stdio transport: one JSON object per line, one response line per
//! non-notification request.
//!
//! Stdout belongs to the protocol; everything diagnostic goes to stderr
//! through tracing. Bad input never aborts the loop: over-long lines and
//! undecodable JSON are logged and skipped (the request ID cannot be
//! recovered, so no error response is emitted).

use std::io::{self, BufRead, Write};

use super::{JsonRpcRequest, JsonRpcResponse, McpServer, ResponseWriter};

/// Maximum accepted line length; sized to tolerate large PRD payloads.
pub const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

/// Writes JSON-RPC responses to stdout, one line per response.
pub struct StdioWriter;

impl ResponseWriter for StdioWriter {
    fn write_response(&mut self, response: &JsonRpcResponse) -> crate::Result<()> {
        let data = serde_json::to_string(response)?;
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        writeln!(lock, "{}", data)?;
        lock.flush()?;
        Ok(())
    }
}

/// Run the stdio JSON-RPC loop until end of input.
pub fn run(server: &McpServer) {
    let stdin = io::stdin();
    run_loop(server, stdin.lock(), &mut StdioWriter);
}

/// The transport loop, generic over input and writer for testability.
pub fn run_loop<R: BufRead>(server: &McpServer, reader: R, writer: &mut dyn ResponseWriter) {
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(error = %e, "error reading stdin");
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }
        if line.len() > MAX_LINE_BYTES {
            tracing::warn!(bytes = line.len(), "request line exceeds limit, skipping");
            continue;
        }
        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "parse error, skipping line");
                continue;
            }
        };
        if let Err(e) = server.handle_request_with(&request, writer) {
            tracing::error!(error = %e, "failed to write response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct CollectWriter(Vec<JsonRpcResponse>);

    impl ResponseWriter for CollectWriter {
        fn write_response(&mut self, response: &JsonRpcResponse) -> crate::Result<()> {
            self.0.push(response.clone());
            Ok(())
        }
    }

    #[test]
    fn test_responses_in_request_order() {
        let server = McpServer::new("test", "0.1.0");
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );
        let mut writer = CollectWriter(Vec::new());
        run_loop(&server, input.as_bytes(), &mut writer);
        assert_eq!(writer.0.len(), 2);
        assert_eq!(writer.0[0].id, json!(1));
        assert_eq!(writer.0[1].id, json!(2));
    }

    #[test]
    fn test_bad_json_is_skipped() {
        let server = McpServer::new("test", "0.1.0");
        let input = concat!(
            "this is not json\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#,
            "\n",
        );
        let mut writer = CollectWriter(Vec::new());
        run_loop(&server, input.as_bytes(), &mut writer);
        assert_eq!(writer.0.len(), 1);
        assert_eq!(writer.0[0].id, json!(3));
    }

    #[test]
    fn test_oversized_line_is_skipped() {
        let server = McpServer::new("test", "0.1.0");
        let huge = format!(
            r#"{{"jsonrpc":"2.0","id":4,"method":"ping","params":{{"pad":"{}"}}}}"#,
            "x".repeat(MAX_LINE_BYTES)
        );
        let input = format!("{}\n{{\"id\":5,\"method\":\"ping\"}}\n", huge);
        let mut writer = CollectWriter(Vec::new());
        run_loop(&server, input.as_bytes(), &mut writer);
        assert_eq!(writer.0.len(), 1);
        assert_eq!(writer.0[0].id, json!(5));
    }

    #[test]
    fn test_notification_yields_no_line() {
        let server = McpServer::new("test", "0.1.0");
        let input = concat!(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":6,"method":"ping"}"#,
            "\n",
        );
        let mut writer = CollectWriter(Vec::new());
        run_loop(&server, input.as_bytes(), &mut writer);
        assert_eq!(writer.0.len(), 1);
    }

    #[test]
    fn test_empty_lines_ignored() {
        let server = McpServer::new("test", "0.1.0");
        let input = "\n\n{\"id\":7,\"method\":\"ping\"}\n\n";
        let mut writer = CollectWriter(Vec::new());
        run_loop(&server, input.as_bytes(), &mut writer);
        assert_eq!(writer.0.len(), 1);
    }
}
