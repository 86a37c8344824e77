//! JSON-RPC 2.0 plumbing over STDIO.
//!
//! One request per line on stdin, one response per line on stdout; logging
//! goes to stderr so the protocol stream stays clean. The host speaks
//! `initialize`, `tools/list`, `tools/call` and `shutdown`; engine results
//! are rendered as pretty-printed text content blocks.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::aggregate::{self, Basis};
use crate::error::StatsError;
use crate::rankings;
use crate::tables::TableCache;
use crate::team_summary;

pub const PROTOCOL_VERSION: &str = "2.0";
pub const SERVER_NAME: &str = "DunkMaster Stats (Local)";

const DEFAULT_TOP_N: u64 = 10;

pub enum Outcome {
    Reply(Value),
    ReplyAndExit(Value),
}

/// Run the blocking request loop until EOF or `shutdown`.
pub fn serve(cache: &TableCache, input: impl BufRead, mut output: impl Write) -> Result<()> {
    for line in input.lines() {
        let line = line.context("read request line")?;
        if line.trim().is_empty() {
            continue;
        }
        match handle_line(cache, &line) {
            Outcome::Reply(reply) => {
                writeln!(output, "{reply}").context("write response")?;
                output.flush().context("flush response")?;
            }
            Outcome::ReplyAndExit(reply) => {
                writeln!(output, "{reply}").context("write response")?;
                output.flush().context("flush response")?;
                info!("shutdown requested");
                return Ok(());
            }
        }
    }
    Ok(())
}

pub fn handle_line(cache: &TableCache, line: &str) -> Outcome {
    let request: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(err) => {
            return Outcome::Reply(rpc_error(
                &Value::Null,
                -32700,
                &format!("parse error: {err}"),
            ));
        }
    };
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let Some(method) = request.get("method").and_then(Value::as_str) else {
        return Outcome::Reply(rpc_error(&id, -32600, "missing method"));
    };

    match method {
        "initialize" => Outcome::Reply(rpc_result(
            &id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        )),
        "tools/list" => Outcome::Reply(rpc_result(&id, json!({ "tools": tool_descriptors() }))),
        "tools/call" => {
            let params = request.get("params").cloned().unwrap_or(Value::Null);
            let name = params.get("name").and_then(Value::as_str).unwrap_or("");
            let empty = json!({});
            let args = params.get("arguments").unwrap_or(&empty);
            match run_tool(cache, name, args) {
                None => Outcome::Reply(rpc_error(&id, -32601, &format!("Unknown tool: {name}"))),
                Some(Ok(value)) => Outcome::Reply(rpc_result(&id, content_block(&value, false))),
                Some(Err(err)) => {
                    warn!(tool = name, "query failed: {err}");
                    let payload = json!({ "error": err.to_string() });
                    Outcome::Reply(rpc_result(&id, content_block(&payload, true)))
                }
            }
        }
        "shutdown" => Outcome::ReplyAndExit(rpc_result(&id, json!({ "ok": true }))),
        other => Outcome::Reply(rpc_error(&id, -32601, &format!("Method not found: {other}"))),
    }
}

/// Dispatch one tool call; `None` means the tool name is unknown.
pub fn run_tool(cache: &TableCache, name: &str, args: &Value) -> Option<Result<Value, StatsError>> {
    let result = match name {
        "player_summary" => {
            let player = str_arg(args, "player");
            aggregate::player_summary(cache, player).map(to_json)
        }
        "top_scorers" => {
            let season = int_arg(args, "season").unwrap_or(0) as i32;
            let n = args
                .get("n")
                .and_then(Value::as_u64)
                .unwrap_or(DEFAULT_TOP_N) as usize;
            rankings::top_scorers(cache, season, n).map(to_json)
        }
        "compare_players" => {
            let player_a = str_arg(args, "player_a");
            let player_b = str_arg(args, "player_b");
            // An unrecognized basis falls back to per-game rather than failing.
            let basis = Basis::parse(str_arg(args, "basis")).unwrap_or(Basis::PerGame);
            aggregate::compare_players(cache, player_a, player_b, basis).map(to_json)
        }
        "team_summary" => {
            let season = int_arg(args, "season").unwrap_or(0) as i32;
            let team = str_arg(args, "team");
            team_summary::team_summary(cache, season, team).map(to_json)
        }
        _ => return None,
    };
    Some(result)
}

fn str_arg<'a>(args: &'a Value, key: &str) -> &'a str {
    args.get(key).and_then(Value::as_str).unwrap_or("")
}

fn int_arg(args: &Value, key: &str) -> Option<i64> {
    let value = args.get(key)?;
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    value.as_str()?.trim().parse::<i64>().ok()
}

fn to_json(value: impl serde::Serialize) -> Value {
    serde_json::to_value(value).expect("result objects serialize")
}

fn content_block(value: &Value, is_error: bool) -> Value {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}

fn rpc_result(id: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn rpc_error(id: &Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

pub fn tool_descriptors() -> Value {
    json!([
        {
            "name": "player_summary",
            "description": "Compact career summary with span, teams, weighted averages, all-star and award shares",
            "inputSchema": {
                "type": "object",
                "properties": { "player": { "type": "string" } },
                "required": ["player"],
            },
        },
        {
            "name": "top_scorers",
            "description": "Top-N points per game for a season",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "season": { "type": "integer" },
                    "n": { "type": "integer" },
                },
                "required": ["season"],
            },
        },
        {
            "name": "compare_players",
            "description": "Compare weighted career averages on a basis (per_game | per_36 | per_100)",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "player_a": { "type": "string" },
                    "player_b": { "type": "string" },
                    "basis": { "type": "string" },
                },
                "required": ["player_a", "player_b"],
            },
        },
        {
            "name": "team_summary",
            "description": "W/L, SRS, ratings, pace and shooting metrics for a team-season",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "season": { "type": "integer" },
                    "team": { "type": "string" },
                },
                "required": ["season", "team"],
            },
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_cache() -> TableCache {
        let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("tests");
        path.push("fixtures");
        path.push("full");
        TableCache::new(path)
    }

    fn reply_value(outcome: Outcome) -> Value {
        match outcome {
            Outcome::Reply(value) => value,
            Outcome::ReplyAndExit(value) => value,
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let cache = fixture_cache();
        let reply = reply_value(handle_line(&cache, "{nope"));
        assert_eq!(reply["error"]["code"], -32700);
        assert_eq!(reply["id"], Value::Null);
    }

    #[test]
    fn missing_method_is_invalid_request() {
        let cache = fixture_cache();
        let reply = reply_value(handle_line(&cache, r#"{"jsonrpc":"2.0","id":7}"#));
        assert_eq!(reply["error"]["code"], -32600);
        assert_eq!(reply["id"], 7);
    }

    #[test]
    fn unknown_method_and_tool_are_not_found() {
        let cache = fixture_cache();
        let reply = reply_value(handle_line(
            &cache,
            r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#,
        ));
        assert_eq!(reply["error"]["code"], -32601);

        let reply = reply_value(handle_line(
            &cache,
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"nope","arguments":{}}}"#,
        ));
        assert_eq!(reply["error"]["code"], -32601);
    }

    #[test]
    fn season_arg_accepts_number_or_string() {
        assert_eq!(int_arg(&json!({"season": 1996}), "season"), Some(1996));
        assert_eq!(int_arg(&json!({"season": "1996"}), "season"), Some(1996));
        assert_eq!(int_arg(&json!({"season": true}), "season"), None);
    }

    #[test]
    fn engine_errors_stay_in_band() {
        let cache = fixture_cache();
        let reply = reply_value(handle_line(
            &cache,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"player_summary","arguments":{"player":"xqzw qblt"}}}"#,
        ));
        assert_eq!(reply["result"]["isError"], true);
        let text = reply["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("not found"));
    }
}
