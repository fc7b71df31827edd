use std::sync::LazyLock;

use chess_core::position;
use chess_core::GameSummary;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::clients::lichess::GamesQuery;
use crate::error::ToolError;
use crate::state::AppState;
use crate::tools::moves::FenArgs;

pub const DEFAULT_MAX_GAMES: i64 = 10;
pub const MAX_GAMES_LIMIT: i64 = 50;

/// Candidate moves returned from the cloud evaluation
const CLOUD_BEST_MOVES: usize = 3;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,30}$").expect("valid username regex"));

#[derive(Deserialize)]
pub struct FetchGamesArgs {
    pub username: String,
    #[serde(default)]
    pub max_games: Option<i64>,
    #[serde(default)]
    pub time_control: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserGamesResponse {
    pub username: String,
    pub games_count: usize,
    pub games: Vec<GameSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct CloudEvalResponse {
    pub fen: String,
    pub cloud_eval: Option<i32>,
    pub mate: Option<i32>,
    pub depth: Option<u32>,
    pub best_moves: Vec<String>,
    pub knodes: Option<u64>,
}

/// fetch_user_games tool
pub async fn fetch_user_games(
    state: &AppState,
    args: FetchGamesArgs,
) -> Result<UserGamesResponse, ToolError> {
    let username = args.username.trim();
    if !USERNAME_RE.is_match(username) {
        return Err(ToolError::Validation(format!(
            "Invalid Lichess username '{}': use 1-30 letters, digits, '_' or '-'",
            args.username
        )));
    }

    let max_games = args
        .max_games
        .unwrap_or(DEFAULT_MAX_GAMES)
        .clamp(1, MAX_GAMES_LIMIT) as u32;
    let perf_type = args
        .time_control
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let games = state
        .lichess
        .fetch_user_games(&GamesQuery {
            username,
            max_games,
            perf_type,
        })
        .await?;

    tracing::info!(username, count = games.len(), "Fetched Lichess games");

    let message = games.is_empty().then_some(
        "No games found. User might have no public games or username doesn't exist.",
    );

    Ok(UserGamesResponse {
        username: username.to_string(),
        games_count: games.len(),
        games,
        message,
    })
}

/// get_cloud_eval tool
pub async fn get_cloud_eval(state: &AppState, args: FenArgs) -> Result<CloudEvalResponse, ToolError> {
    position::parse_fen(&args.fen)?;

    let eval = state.lichess.cloud_eval(args.fen.trim()).await?;
    let best = eval.pvs.first();

    Ok(CloudEvalResponse {
        cloud_eval: best.and_then(|pv| pv.cp),
        mate: best.and_then(|pv| pv.mate),
        depth: eval.depth,
        best_moves: eval
            .pvs
            .iter()
            .take(CLOUD_BEST_MOVES)
            .filter_map(|pv| pv.moves.split_whitespace().next())
            .map(str::to_string)
            .collect(),
        knodes: eval.knodes,
        fen: args.fen,
    })
}
