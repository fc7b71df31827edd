use std::time::Duration;

use chess_core::GameSummary;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

const GAMES_TIMEOUT: Duration = Duration::from_secs(30);
const CLOUD_EVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Characters of an error body echoed back to the caller
const PREVIEW_CHARS: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum LichessError {
    #[error("LICHESS_TOKEN environment variable not set")]
    MissingToken,

    #[error("Lichess API returned status {}", status.as_u16())]
    Status {
        status: StatusCode,
        preview: String,
        hint: Option<&'static str>,
    },

    #[error("Lichess request timed out")]
    Timeout,

    #[error("Request error: {0}")]
    Request(reqwest::Error),

    #[error("JSON parse error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for LichessError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LichessError::Timeout
        } else {
            LichessError::Request(e)
        }
    }
}

/// Filters for the user games export
#[derive(Debug, Clone)]
pub struct GamesQuery<'a> {
    pub username: &'a str,
    pub max_games: u32,
    /// Lichess `perfType`, passed through unvalidated
    pub perf_type: Option<&'a str>,
}

/// Response of `/api/cloud-eval`
#[derive(Debug, Clone, Deserialize)]
pub struct CloudEval {
    pub depth: Option<u32>,
    pub knodes: Option<u64>,
    #[serde(default)]
    pub pvs: Vec<CloudPv>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudPv {
    pub cp: Option<i32>,
    pub mate: Option<i32>,
    /// Space-separated UCI moves
    #[serde(default)]
    pub moves: String,
}

/// One NDJSON record of the games export
#[derive(Deserialize)]
struct LichessGame {
    id: String,
    #[serde(default)]
    pgn: String,
    #[serde(default)]
    players: Players,
    winner: Option<String>,
    opening: Option<Opening>,
    speed: Option<String>,
    #[serde(default)]
    rated: bool,
}

#[derive(Deserialize, Default)]
struct Players {
    #[serde(default)]
    white: Player,
    #[serde(default)]
    black: Player,
}

#[derive(Deserialize, Default)]
struct Player {
    user: Option<User>,
}

#[derive(Deserialize)]
struct User {
    name: String,
}

#[derive(Deserialize)]
struct Opening {
    name: Option<String>,
}

impl LichessGame {
    fn into_summary(self, site_base: &str) -> GameSummary {
        GameSummary {
            url: GameSummary::game_url(site_base, &self.id),
            id: self.id,
            pgn: self.pgn,
            white: self.players.white.user.map(|u| u.name),
            black: self.players.black.user.map(|u| u.name),
            winner: self.winner,
            opening: self.opening.and_then(|o| o.name),
            time_control: self.speed,
            rated: self.rated,
        }
    }
}

#[derive(Clone)]
pub struct LichessClient {
    client: Client,
    site_base: String,
    token: Option<String>,
}

impl LichessClient {
    pub fn new(site_base: &str, token: Option<String>) -> Result<Self, LichessError> {
        let client = Client::builder()
            .user_agent(concat!("chess-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            site_base: site_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.site_base, path)
    }

    /// Fetch a user's most recent games.
    /// Malformed records are logged and skipped.
    pub async fn fetch_user_games(
        &self,
        query: &GamesQuery<'_>,
    ) -> Result<Vec<GameSummary>, LichessError> {
        let token = self.token.as_deref().ok_or(LichessError::MissingToken)?;
        let url = self.api_url(&format!("games/user/{}", query.username));

        let mut params = vec![
            ("max", query.max_games.to_string()),
            ("pgnInJson", "true".to_string()),
            ("clocks", "false".to_string()),
            ("evals", "false".to_string()),
            ("opening", "true".to_string()),
            ("moves", "true".to_string()),
            ("tags", "true".to_string()),
        ];
        if let Some(perf) = query.perf_type {
            params.push(("perfType", perf.to_string()));
        }

        tracing::info!(username = query.username, max = query.max_games, "Fetching Lichess games");

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .bearer_auth(token)
            .header("Accept", "application/x-ndjson")
            .timeout(GAMES_TIMEOUT)
            .send()
            .await?;

        let status = resp.status();
        tracing::info!(status = %status, "Lichess games response");
        if !status.is_success() {
            return Err(status_error(resp, games_hint(status)).await);
        }

        let mut games = Vec::new();
        let mut pending: Vec<u8> = Vec::new();
        let mut stream = resp.bytes_stream();

        while let Some(chunk) = stream.next().await {
            pending.extend_from_slice(&chunk?);
            while let Some(newline) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=newline).collect();
                self.push_game(&line, &mut games);
            }
        }
        // Last record may lack a trailing newline
        self.push_game(&pending, &mut games);

        Ok(games)
    }

    fn push_game(&self, line: &[u8], games: &mut Vec<GameSummary>) {
        if let Some(game) = decode_game(line, &self.site_base) {
            games.push(game);
        }
    }

    /// Look up the cloud evaluation of a position.
    pub async fn cloud_eval(&self, fen: &str) -> Result<CloudEval, LichessError> {
        let resp = self
            .client
            .get(self.api_url("cloud-eval"))
            .query(&[("fen", fen)])
            .timeout(CLOUD_EVAL_TIMEOUT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let hint = (status == StatusCode::NOT_FOUND)
                .then_some("No cloud evaluation is available for this position");
            return Err(status_error(resp, hint).await);
        }

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| LichessError::Decode(e.to_string()))
    }
}

/// Decode one NDJSON line. Blank lines yield None silently, malformed ones with a warning.
fn decode_game(line: &[u8], site_base: &str) -> Option<GameSummary> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_slice::<LichessGame>(line) {
        Ok(game) => Some(game.into_summary(site_base)),
        Err(e) => {
            let preview: String = String::from_utf8_lossy(line).chars().take(100).collect();
            tracing::warn!(error = %e, line = %preview, "Skipping malformed Lichess game record");
            None
        }
    }
}

fn games_hint(status: StatusCode) -> Option<&'static str> {
    match status {
        StatusCode::NOT_FOUND => Some("Username likely doesn't exist"),
        StatusCode::UNAUTHORIZED => Some("Authentication failed - check LICHESS_TOKEN"),
        StatusCode::FORBIDDEN => Some("Token permissions insufficient"),
        StatusCode::TOO_MANY_REQUESTS => Some("Rate limited by Lichess - wait a minute before retrying"),
        _ => None,
    }
}

async fn status_error(resp: reqwest::Response, hint: Option<&'static str>) -> LichessError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let preview: String = body.chars().take(PREVIEW_CHARS).collect();
    tracing::error!(status = %status, body = %preview, "Lichess API error");
    LichessError::Status {
        status,
        preview,
        hint,
    }
}
