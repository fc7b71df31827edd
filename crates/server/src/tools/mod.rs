//! The six chess tools and their registry.
//!
//! Each tool decodes its own arguments, calls one collaborator and returns a
//! fixed response record. Failures come back as an error payload, never as a
//! transport-level error.

pub mod analysis;
pub mod games;
pub mod moves;

use std::future::{ready, Future};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::state::AppState;

pub const ANALYZE_POSITION: &str = "analyze_position";
pub const GET_BEST_MOVE: &str = "get_best_move";
pub const VALIDATE_MOVE: &str = "validate_move";
pub const GET_LEGAL_MOVES: &str = "get_legal_moves";
pub const FETCH_USER_GAMES: &str = "fetch_user_games";
pub const GET_CLOUD_EVAL: &str = "get_cloud_eval";

/// Result of one tool call, already shaped for the wire
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub payload: Value,
    pub is_error: bool,
}

impl ToolOutput {
    fn error(err: &ToolError) -> Self {
        let payload = serde_json::to_value(err.to_response())
            .unwrap_or_else(|_| json!({ "error": err.to_string() }));
        Self {
            payload,
            is_error: true,
        }
    }
}

fn fen_schema() -> Value {
    json!({
        "type": "string",
        "description": "Position in Forsyth-Edwards Notation (FEN)"
    })
}

/// Tool descriptors for `tools/list`
pub fn list() -> Vec<Value> {
    vec![
        json!({
            "name": ANALYZE_POSITION,
            "description": "Analyze a chess position with Stockfish. Returns the evaluation from White's perspective, the best move and the principal variation.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "fen": fen_schema(),
                    "depth": {
                        "type": "integer",
                        "description": "Search depth (default: 18, max: 25)",
                        "minimum": 1
                    }
                },
                "required": ["fen"]
            }
        }),
        json!({
            "name": GET_BEST_MOVE,
            "description": "Calculate the best move for a chess position.",
            "inputSchema": {
                "type": "object",
                "properties": { "fen": fen_schema() },
                "required": ["fen"]
            }
        }),
        json!({
            "name": VALIDATE_MOVE,
            "description": "Check if a move is legal in a given position. Legal moves also return SAN, the resulting FEN and check/checkmate flags.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "fen": fen_schema(),
                    "move_uci": {
                        "type": "string",
                        "description": "Move in UCI notation, e.g. e2e4 or e7e8q"
                    }
                },
                "required": ["fen", "move_uci"]
            }
        }),
        json!({
            "name": GET_LEGAL_MOVES,
            "description": "Get all legal moves for a position in UCI and SAN notation.",
            "inputSchema": {
                "type": "object",
                "properties": { "fen": fen_schema() },
                "required": ["fen"]
            }
        }),
        json!({
            "name": FETCH_USER_GAMES,
            "description": "Fetch recent games of a Lichess user.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "username": {
                        "type": "string",
                        "description": "Lichess username"
                    },
                    "max_games": {
                        "type": "integer",
                        "description": "Number of games to fetch (default: 10, max: 50)",
                        "minimum": 1,
                        "maximum": 50
                    },
                    "time_control": {
                        "type": "string",
                        "description": "Filter by speed: bullet, blitz, rapid, classical, correspondence"
                    }
                },
                "required": ["username"]
            }
        }),
        json!({
            "name": GET_CLOUD_EVAL,
            "description": "Get the Lichess cloud evaluation of a position.",
            "inputSchema": {
                "type": "object",
                "properties": { "fen": fen_schema() },
                "required": ["fen"]
            }
        }),
    ]
}

/// Run a tool by name. Returns None when no tool has that name.
pub async fn call(state: &AppState, name: &str, arguments: Value) -> Option<ToolOutput> {
    let output = match name {
        ANALYZE_POSITION => {
            run(name, arguments, |args| analysis::analyze_position(state, args)).await
        }
        GET_BEST_MOVE => run(name, arguments, |args| analysis::get_best_move(state, args)).await,
        VALIDATE_MOVE => {
            let mut output = run(name, arguments, |args| ready(moves::validate_move(args))).await;
            if output.is_error {
                if let Some(fields) = output.payload.as_object_mut() {
                    fields.insert("is_legal".to_string(), Value::Bool(false));
                }
            }
            output
        }
        GET_LEGAL_MOVES => run(name, arguments, |args| ready(moves::get_legal_moves(args))).await,
        FETCH_USER_GAMES => {
            run(name, arguments, |args| games::fetch_user_games(state, args)).await
        }
        GET_CLOUD_EVAL => run(name, arguments, |args| games::get_cloud_eval(state, args)).await,
        _ => return None,
    };
    Some(output)
}

async fn run<A, R, F, Fut>(name: &str, arguments: Value, tool: F) -> ToolOutput
where
    A: DeserializeOwned,
    R: Serialize,
    F: FnOnce(A) -> Fut,
    Fut: Future<Output = Result<R, ToolError>>,
{
    let result = match serde_json::from_value::<A>(arguments) {
        Ok(args) => tool(args).await,
        Err(e) => Err(ToolError::Validation(format!("Invalid arguments: {e}"))),
    };

    match result {
        Ok(response) => match serde_json::to_value(response) {
            Ok(payload) => ToolOutput {
                payload,
                is_error: false,
            },
            Err(e) => ToolOutput {
                payload: json!({ "error": format!("Failed to encode response: {e}") }),
                is_error: true,
            },
        },
        Err(e) => {
            tracing::error!(tool = name, kind = ?e.kind(), error = %e, "Tool failed");
            ToolOutput::error(&e)
        }
    }
}
