//! MCP (Model Context Protocol) server
//!
//! JSON-RPC 2.0 over stdio, one message per line. Tools are defined in
//! `tools`, dispatched in `handlers`, and bound to a workspace in `state`.
//!
//! Protocol flow:
//!   1. Client sends `initialize` → Server returns capabilities
//!   2. Client sends `notifications/initialized`
//!   3. Client sends `tools/list` → Server returns the enabled tool definitions
//!   4. Client sends `tools/call` → Server runs the tool, returns result
//!
//! Requests are handled one at a time, in arrival order.

mod handlers;
mod state;
mod tools;

use anyhow::Result;
use serde_json::{json, Value};
use std::io::{self, BufRead, BufReader, Write};

pub use state::ToolServer;
pub use tools::{enabled_tools, Tool, DEFAULT_ENABLED_TOOLS};

use handlers::{call_tool, handle_initialize};
use pytoolbox_core::ToolboxError;

/// Maximum JSON-RPC request size (10 MB).
const MAX_REQUEST_SIZE: usize = 10 * 1024 * 1024;

// ─── Size-limited line reader ───────────────────────────────────────────────

/// Read a single line from `reader`, enforcing [`MAX_REQUEST_SIZE`].
/// Returns `Ok(None)` on EOF. Oversized lines are discarded and reported as
/// an error; the reader is left at the start of the next line.
fn read_line_limited(reader: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    loop {
        let available = match reader.fill_buf() {
            Ok(b) => b,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            if buf.is_empty() {
                return Ok(None);
            }
            return finish_line(buf).map(Some);
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                if buf.len() + pos > MAX_REQUEST_SIZE {
                    reader.consume(pos + 1);
                    return Err(oversized());
                }
                buf.extend_from_slice(&available[..pos]);
                reader.consume(pos + 1);
                return finish_line(buf).map(Some);
            }
            None => {
                let len = available.len();
                if buf.len() + len > MAX_REQUEST_SIZE {
                    reader.consume(len);
                    skip_until_newline(reader);
                    return Err(oversized());
                }
                buf.extend_from_slice(available);
                reader.consume(len);
            }
        }
    }
}

fn finish_line(mut buf: Vec<u8>) -> io::Result<String> {
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    String::from_utf8(buf).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "Invalid UTF-8"))
}

fn oversized() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "Request exceeds 10MB size limit")
}

/// Discard bytes until a newline or EOF without buffering them.
fn skip_until_newline(reader: &mut impl BufRead) {
    loop {
        match reader.fill_buf() {
            Ok(b) if b.is_empty() => break,
            Ok(b) => {
                if let Some(pos) = b.iter().position(|&c| c == b'\n') {
                    reader.consume(pos + 1);
                    break;
                }
                let len = b.len();
                reader.consume(len);
            }
            Err(_) => break,
        }
    }
}

// ─── Dispatch ───────────────────────────────────────────────────────────────

fn rpc_result(id: Option<Value>, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id.unwrap_or(Value::Null),
        "result": result
    })
}

fn rpc_error(id: Option<Value>, code: i64, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id.unwrap_or(Value::Null),
        "error": {"code": code, "message": message}
    })
}

fn tool_content(text: String, is_error: bool) -> Value {
    json!({
        "content": [{"type": "text", "text": text}],
        "isError": is_error
    })
}

/// `Error [<kind>]: <message>`, the text of every failed tool call.
pub fn format_tool_error(err: &ToolboxError) -> String {
    format!("Error [{}]: {}", err.kind(), err)
}

fn handle_tools_call(server: &ToolServer, params: &Value) -> Value {
    let tool_name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

    let outcome = match Tool::from_name(tool_name) {
        None => Err(ToolboxError::InvalidArgument(format!(
            "Unknown tool: {}",
            tool_name
        ))),
        Some(tool) if !server.is_enabled(tool) => Err(ToolboxError::InvalidArgument(format!(
            "Tool '{}' is not enabled (see PYTOOLBOX_ENABLED_TOOLS)",
            tool_name
        ))),
        Some(tool) => {
            tracing::info!(tool = tool_name, "tools/call");
            call_tool(server, tool, &arguments)
        }
    };

    match outcome {
        Ok(text) => tool_content(text, false),
        Err(e) => {
            tracing::warn!(tool = tool_name, kind = e.kind(), "tool call failed: {}", e);
            tool_content(format_tool_error(&e), true)
        }
    }
}

/// Handle one decoded JSON-RPC message. Returns `None` for notifications
/// and anything else that gets no response.
pub fn handle_message(server: &ToolServer, request: &Value) -> Option<Value> {
    let id = request.get("id").cloned();
    let method = request.get("method").and_then(|m| m.as_str()).unwrap_or("");
    let params = request.get("params").cloned().unwrap_or(json!({}));

    match method {
        "initialize" => Some(rpc_result(id, handle_initialize(&params))),
        "notifications/initialized" | "initialized" => None,
        "ping" => Some(rpc_result(id, json!({}))),
        "tools/list" => {
            let tools: Vec<Value> = server.enabled().iter().map(|t| t.definition()).collect();
            Some(rpc_result(id, json!({ "tools": tools })))
        }
        "tools/call" => Some(rpc_result(id, handle_tools_call(server, &params))),
        "resources/list" => Some(rpc_result(id, json!({"resources": []}))),
        "prompts/list" => Some(rpc_result(id, json!({"prompts": []}))),
        // Unknown notifications (no id) are ignored.
        _ => id.map(|id| {
            rpc_error(Some(id), -32601, format!("Method not found: {}", method))
        }),
    }
}

/// Serve until `reader` hits EOF, writing one response per line to `writer`.
pub fn serve<R: BufRead, W: Write>(server: &ToolServer, mut reader: R, writer: &mut W) -> Result<()> {
    loop {
        let line = match read_line_limited(&mut reader) {
            Ok(None) => break,
            Ok(Some(l)) => l,
            Err(e) => {
                send(writer, &rpc_error(None, -32600, format!("Request size error: {}", e)))?;
                continue;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                send(writer, &rpc_error(None, -32700, format!("Parse error: {}", e)))?;
                continue;
            }
        };

        if let Some(response) = handle_message(server, &request) {
            send(writer, &response)?;
        }
    }
    tracing::info!("stdin closed, shutting down");
    Ok(())
}

/// Run the MCP server over the process's stdin/stdout.
pub fn serve_stdio(server: &ToolServer) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    serve(server, BufReader::new(stdin.lock()), &mut stdout)
}

fn send<W: Write>(writer: &mut W, response: &Value) -> Result<()> {
    writeln!(writer, "{}", response)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_line_limited_splits_lines() {
        let mut r = Cursor::new(b"one\r\ntwo\nthree".to_vec());
        assert_eq!(read_line_limited(&mut r).unwrap().as_deref(), Some("one"));
        assert_eq!(read_line_limited(&mut r).unwrap().as_deref(), Some("two"));
        assert_eq!(read_line_limited(&mut r).unwrap().as_deref(), Some("three"));
        assert_eq!(read_line_limited(&mut r).unwrap(), None);
    }

    #[test]
    fn test_oversized_line_is_skipped() {
        let mut data = vec![b'x'; MAX_REQUEST_SIZE + 10];
        data.extend_from_slice(b"\nnext\n");
        let mut r = BufReader::new(Cursor::new(data));
        assert!(read_line_limited(&mut r).is_err());
        assert_eq!(read_line_limited(&mut r).unwrap().as_deref(), Some("next"));
    }

    #[test]
    fn test_invalid_utf8_line() {
        let mut r = Cursor::new(vec![0xff, 0xfe, b'\n']);
        assert_eq!(
            read_line_limited(&mut r).unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );
    }

    #[test]
    fn test_format_tool_error() {
        let err = ToolboxError::InvalidArgument("Unsupported style: yapf".into());
        assert_eq!(
            format_tool_error(&err),
            "Error [invalid_argument]: Invalid argument: Unsupported style: yapf"
        );
    }
}
