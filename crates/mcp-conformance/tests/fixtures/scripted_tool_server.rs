//! Scripted MCP tool server for integration testing.
//!
//! Reads newline-delimited JSON from stdin and writes newline-delimited JSON
//! responses to stdout. Each tool name triggers one fixed behavior so tests
//! can drive every classification path through a real child process.
//!
//! # Supported methods
//!
//! - `initialize`: returns server info (or an error with `--reject-init`)
//! - `notifications/initialized`: recorded, no response
//! - `tools/list`: returns the tools below
//! - `tools/call`: see below
//!
//! # Tools
//!
//! - `echo`: `"echo: <arguments>"`
//! - `handshake_seen`: whether `notifications/initialized` arrived
//! - `fail`: `"Error: boom"`
//! - `upstream_403`: `"Error: HTTP error 403 Forbidden"`
//! - `late_error`: output whose second line starts with `Error:`
//! - `command_failed`: `"Command failed: exit status 2"`
//! - `no_content`: a result with no `content`
//! - `garbage`: a line that is not JSON
//! - `blank`: an empty line
//! - `bad_utf8`: a line that is not valid UTF-8
//! - `silent`: never replies
//! - `slow`: sleeps `delay_ms` (default 2000) then replies `"slow done"`
//! - `crash`: exits with code 42
//! - anything else: JSON-RPC error -32602

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};

const TOOLS: &[&str] = &[
    "echo",
    "handshake_seen",
    "fail",
    "upstream_403",
    "late_error",
    "command_failed",
    "no_content",
    "garbage",
    "blank",
    "bad_utf8",
    "silent",
    "slow",
    "crash",
];

fn main() {
    let reject_init = std::env::args().any(|a| a == "--reject-init");
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let reader = BufReader::new(stdin.lock());
    let mut writer = stdout.lock();
    let mut initialized = false;

    eprintln!("scripted-tool-server starting");

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let msg: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(_) => continue,
        };

        let method = msg.get("method").and_then(|v| v.as_str());
        let id = msg.get("id").cloned();

        match method {
            Some("initialize") if reject_init => {
                write_msg(
                    &mut writer,
                    &json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": {"code": -32600, "message": "initialize rejected by test server"}
                    }),
                );
            }
            Some("initialize") => {
                write_msg(
                    &mut writer,
                    &json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "result": {
                            "protocolVersion": "2024-11-05",
                            "capabilities": {"tools": {}},
                            "serverInfo": {"name": "scripted-tool-server", "version": "0.1.0"}
                        }
                    }),
                );
            }
            Some("notifications/initialized") => initialized = true,
            Some("tools/list") => {
                let tools: Vec<Value> = TOOLS
                    .iter()
                    .map(|name| json!({"name": name, "inputSchema": {"type": "object"}}))
                    .collect();
                write_msg(
                    &mut writer,
                    &json!({"jsonrpc": "2.0", "id": id, "result": {"tools": tools}}),
                );
            }
            Some("tools/call") => handle_call(&msg, id, initialized, &mut writer),
            Some(unknown) => {
                if let Some(req_id) = id {
                    write_msg(
                        &mut writer,
                        &json!({
                            "jsonrpc": "2.0",
                            "id": req_id,
                            "error": {"code": -32601, "message": format!("Method not found: {unknown}")}
                        }),
                    );
                }
            }
            None => {}
        }
    }
}

fn handle_call(msg: &Value, id: Option<Value>, initialized: bool, writer: &mut impl Write) {
    let tool = msg
        .pointer("/params/name")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let arguments = msg
        .pointer("/params/arguments")
        .cloned()
        .unwrap_or(json!({}));

    let text = match tool {
        "echo" => format!("echo: {arguments}"),
        "handshake_seen" => format!("initialized notification received: {initialized}"),
        "fail" => "Error: boom".to_string(),
        "upstream_403" => "Error: HTTP error 403 Forbidden".to_string(),
        "late_error" => "fetched 2 of 3 pages\nError: page 3 missing".to_string(),
        "command_failed" => "Command failed: exit status 2".to_string(),
        "no_content" => {
            write_msg(writer, &json!({"jsonrpc": "2.0", "id": id, "result": {}}));
            return;
        }
        "garbage" => {
            write_raw(writer, "this is not json");
            return;
        }
        "blank" => {
            write_raw(writer, "");
            return;
        }
        "bad_utf8" => {
            writer.write_all(b"\xff\xfe not utf-8\n").expect("write to stdout");
            writer.flush().expect("flush stdout");
            return;
        }
        "silent" => return,
        "slow" => {
            let delay = arguments
                .get("delay_ms")
                .and_then(|v| v.as_u64())
                .unwrap_or(2000);
            std::thread::sleep(std::time::Duration::from_millis(delay));
            "slow done".to_string()
        }
        "crash" => std::process::exit(42),
        other => {
            write_msg(
                writer,
                &json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {"code": -32602, "message": format!("Unknown tool: {other}")}
                }),
            );
            return;
        }
    };

    write_msg(
        writer,
        &json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {"content": [{"type": "text", "text": text}]}
        }),
    );
}

fn write_msg(writer: &mut impl Write, msg: &Value) {
    let s = serde_json::to_string(msg).expect("serialize JSON");
    write_raw(writer, &s);
}

fn write_raw(writer: &mut impl Write, line: &str) {
    writeln!(writer, "{line}").expect("write to stdout");
    writer.flush().expect("flush stdout");
}
