//! End-to-end tests of the MCP surface: JSON-RPC in, JSON-RPC out.

use serde_json::{json, Value};
use std::io::Cursor;
use std::path::Path;

use pytoolbox::mcp::{handle_message, serve, ToolServer};
use pytoolbox_core::config::{ExecutionConfig, PathsConfig, ToolSelection};
use pytoolbox_core::WorkspaceRoot;

fn server_with(selection: ToolSelection) -> (tempfile::TempDir, ToolServer) {
    let tmp = tempfile::tempdir().unwrap();
    let root = WorkspaceRoot::new(tmp.path()).unwrap();
    let paths = PathsConfig {
        workspace: None,
        venv_dir: ".venv".to_string(),
    };
    let server = ToolServer::new(root, &paths, &ExecutionConfig::default(), &selection);
    (tmp, server)
}

/// `<root>/.venv/bin/python` pointing at the host interpreter.
fn fake_venv(root: &Path) -> bool {
    let Ok(host) = which::which("python3") else {
        return false;
    };
    let bin = root.join(".venv").join(if cfg!(windows) { "Scripts" } else { "bin" });
    std::fs::create_dir_all(&bin).unwrap();
    #[cfg(unix)]
    std::os::unix::fs::symlink(host, bin.join("python")).unwrap();
    #[cfg(windows)]
    std::fs::copy(host, bin.join("python.exe")).unwrap();
    true
}

fn call(server: &ToolServer, name: &str, arguments: Value) -> (bool, String) {
    let req = json!({
        "jsonrpc": "2.0",
        "id": 7,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments}
    });
    let resp = handle_message(server, &req).unwrap();
    assert_eq!(resp["id"], 7);
    let result = &resp["result"];
    let text = result["content"][0]["text"].as_str().unwrap().to_string();
    (result["isError"].as_bool().unwrap(), text)
}

#[test]
fn initialize_and_ping() {
    let (_tmp, server) = server_with(ToolSelection::Default);
    let resp = handle_message(
        &server,
        &json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
    )
    .unwrap();
    assert_eq!(resp["result"]["serverInfo"]["name"], "pytoolbox");

    let resp = handle_message(&server, &json!({"jsonrpc": "2.0", "id": "p", "method": "ping"}))
        .unwrap();
    assert_eq!(resp["id"], "p");
    assert_eq!(resp["result"], json!({}));

    assert!(handle_message(
        &server,
        &json!({"jsonrpc": "2.0", "method": "notifications/initialized"})
    )
    .is_none());
}

#[test]
fn default_lists_only_execute_python() {
    let (_tmp, server) = server_with(ToolSelection::Default);
    let resp = handle_message(&server, &json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .unwrap();
    let tools = resp["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "execute_python");
    assert_eq!(tools[0]["inputSchema"]["required"], json!(["code"]));
}

#[test]
fn dormant_tool_is_rejected() {
    let (tmp, server) = server_with(ToolSelection::Default);
    std::fs::write(tmp.path().join("a.txt"), "secret").unwrap();
    let (is_error, text) = call(&server, "read_file", json!({"path": "a.txt"}));
    assert!(is_error);
    assert!(text.starts_with("Error [invalid_argument]:"), "{}", text);
    assert!(!text.contains("secret"));
}

#[test]
fn unknown_tool_and_method() {
    let (_tmp, server) = server_with(ToolSelection::All);
    let (is_error, text) = call(&server, "rm_rf", json!({}));
    assert!(is_error);
    assert!(text.contains("Unknown tool: rm_rf"));

    let resp = handle_message(&server, &json!({"jsonrpc": "2.0", "id": 3, "method": "bogus"}))
        .unwrap();
    assert_eq!(resp["error"]["code"], -32601);
    assert!(handle_message(&server, &json!({"jsonrpc": "2.0", "method": "bogus"})).is_none());
}

#[test]
fn file_tools_round_trip() {
    let (tmp, server) = server_with(ToolSelection::All);

    let (is_error, _) = call(
        &server,
        "write_file",
        json!({"path": "pkg/notes.txt", "content": "one\ntwo\nthree\n"}),
    );
    assert!(!is_error);
    let (_, _) = call(
        &server,
        "write_file",
        json!({"path": "pkg/notes.txt", "content": "four\n", "mode": "a"}),
    );

    let (is_error, text) = call(
        &server,
        "read_file",
        json!({"path": "pkg/notes.txt", "start_line": 2, "end_line": 4}),
    );
    assert!(!is_error);
    assert_eq!(text, "two\nthree\nfour\n");

    let (_, listing) = call(&server, "list_directory", json!({"path": "pkg"}));
    let entries: Value = serde_json::from_str(&listing).unwrap();
    assert_eq!(entries[0]["name"], "notes.txt");
    assert_eq!(entries[0]["type"], "file");

    let (is_error, _) = call(&server, "create_directory", json!({"path": "out/deep"}));
    assert!(!is_error);
    assert!(tmp.path().join("out/deep").is_dir());

    let (is_error, _) = call(&server, "delete_file", json!({"path": "pkg/notes.txt"}));
    assert!(!is_error);
    assert!(!tmp.path().join("pkg/notes.txt").exists());
}

#[test]
fn path_escape_is_reported_with_kind() {
    let (_tmp, server) = server_with(ToolSelection::All);
    for (tool, args) in [
        ("read_file", json!({"path": "../outside.txt"})),
        ("write_file", json!({"path": "/etc/pytoolbox-test", "content": "x"})),
        ("list_directory", json!({"path": ".."})),
        ("analyze_python_file", json!({"path": "../x.py"})),
    ] {
        let (is_error, text) = call(&server, tool, args);
        assert!(is_error, "{}", tool);
        assert!(text.starts_with("Error [path_escape]:"), "{}: {}", tool, text);
    }
}

#[test]
fn bad_arguments_are_invalid_argument() {
    let (_tmp, server) = server_with(ToolSelection::All);
    let (is_error, text) = call(&server, "read_file", json!({}));
    assert!(is_error);
    assert!(text.starts_with("Error [invalid_argument]:"));

    let (_, text) = call(&server, "write_file", json!({"path": "a", "content": "", "mode": "x"}));
    assert!(text.starts_with("Error [invalid_argument]:"));

    let (_, text) = call(&server, "format_code", json!({"code": "x=1", "style": "yapf"}));
    assert!(text.contains("Unsupported style: yapf"));
}

#[test]
fn execute_without_environment_is_not_found() {
    let (_tmp, server) = server_with(ToolSelection::Default);
    let (is_error, text) = call(&server, "execute_python", json!({"code": "print('hi')"}));
    assert!(is_error);
    assert!(text.starts_with("Error [not_found]:"), "{}", text);
    assert!(text.contains("Python executable not found in virtual environment"));
}

#[test]
fn execute_python_reports_output_and_exit_code() {
    let (tmp, server) = server_with(ToolSelection::Default);
    if !fake_venv(tmp.path()) {
        eprintln!("python3 not available, skipping");
        return;
    }

    let (is_error, text) = call(&server, "execute_python", json!({"code": "print('hi')"}));
    assert!(!is_error);
    let result: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(result, json!({"stdout": "hi\n", "stderr": "", "exit_code": 0}));

    let (is_error, text) = call(
        &server,
        "execute_python",
        json!({"code": "import sys; sys.exit(3)"}),
    );
    assert!(!is_error);
    let result: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(result["exit_code"], 3);
}

#[test]
fn create_venv_is_idempotent_when_present() {
    let (tmp, server) = server_with(ToolSelection::All);
    std::fs::create_dir(tmp.path().join(".venv")).unwrap();
    let (is_error, text) = call(&server, "create_venv", json!({}));
    assert!(!is_error);
    assert_eq!(text, "Virtual environment already exists at .venv");
}

#[test]
fn install_without_manifest_is_not_found() {
    let (_tmp, server) = server_with(ToolSelection::All);
    let (is_error, text) = call(&server, "install_dependencies", json!({}));
    assert!(is_error);
    assert!(text.starts_with("Error [not_found]:"), "{}", text);
}

#[test]
fn serve_loop_over_lines() {
    let (_tmp, server) = server_with(ToolSelection::Default);
    let input = concat!(
        "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{}}\n",
        "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
        "\n",
        "not json\n",
        "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n",
    );
    let mut out = Vec::new();
    serve(&server, Cursor::new(input.as_bytes()), &mut out).unwrap();

    let lines: Vec<Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["id"], 1);
    assert_eq!(lines[1]["error"]["code"], -32700);
    assert!(lines[1]["id"].is_null());
    assert_eq!(lines[2]["id"], 2);
    assert_eq!(lines[2]["result"]["tools"][0]["name"], "execute_python");
}
