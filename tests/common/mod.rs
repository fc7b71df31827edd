#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use engine::{EngineConfig, EngineHandle};
use reqwest::Client;
use serde_json::{json, Value};
use server::config::Config;
use server::state::AppState;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
pub const AFTER_E4_FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
pub const FOOLS_MATE_FEN: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
pub const STALEMATE_FEN: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";
pub const MISSING_USER: &str = "nonexistent_user_xyz123";

/// Fake engine reply: echoes the requested depth, scores -15 for the side to move.
pub const ECHO_DEPTH_ENGINE: &str = r#"set -- $line; echo "info depth $3 score cp -15 nodes 10 pv e7e5 g1f3 b8c6 f1b5 a7a6 b5a4"; echo "bestmove e7e5 ponder g1f3""#;

/// A running server under test
pub struct TestServer {
    pub base: String,
    pub state: AppState,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Send one JSON-RPC request and return the decoded response.
    pub async fn rpc(&self, method: &str, params: Value) -> Value {
        let resp = client()
            .post(self.url("/mcp"))
            .json(&json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params }))
            .send()
            .await
            .expect("Failed to reach server");
        assert_eq!(resp.status(), 200, "JSON-RPC requests answer 200");
        resp.json().await.unwrap()
    }

    /// Call a tool and return its structured payload and error flag.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> (Value, bool) {
        let body = self
            .rpc("tools/call", json!({ "name": name, "arguments": arguments }))
            .await;
        let result = &body["result"];
        assert!(result.is_object(), "tools/call should succeed at the RPC level: {body}");
        (
            result["structuredContent"].clone(),
            result["isError"].as_bool().unwrap(),
        )
    }
}

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}

/// Generate a unique suffix based on timestamp to avoid collisions.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}", ts % 1_000_000_000)
}

/// Serve `app` on an ephemeral local port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Config pointing at nothing real: no token, no engine, closed Lichess port.
pub fn offline_config() -> Config {
    Config {
        stockfish_path: "/nonexistent/stockfish".into(),
        lichess_base_url: "http://127.0.0.1:9".into(),
        analysis_time: Duration::from_secs(2),
        ..Config::default()
    }
}

pub async fn spawn_server(config: Config) -> TestServer {
    spawn_with_state(AppState::new(config).unwrap()).await
}

pub async fn spawn_server_with_engine(config: Config, engine: EngineConfig) -> TestServer {
    spawn_with_state(AppState::with_engine(config, EngineHandle::new(engine)).unwrap()).await
}

async fn spawn_with_state(state: AppState) -> TestServer {
    let addr = serve(server::app(state.clone())).await;
    TestServer {
        base: format!("http://{addr}"),
        state,
    }
}

/// Write a shell script speaking just enough UCI. `on_go` runs for each `go`.
pub fn fake_engine(on_go: &str) -> EngineConfig {
    let dir = std::env::temp_dir().join(format!(
        "chess-mcp-fake-engine-{}-{}",
        std::process::id(),
        unique_suffix()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let script = dir.join("engine.sh");
    let body = format!(
        r#"while IFS= read -r line; do
  case "$line" in
    uci) echo "id name FakeFish 1.0"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) {on_go} ;;
    quit) exit 0 ;;
  esac
done
"#
    );
    std::fs::write(&script, body).unwrap();

    let mut config = EngineConfig::new("/bin/sh");
    config.args = vec![script.to_string_lossy().into_owned()];
    config
}

/// Requests seen by the mock Lichess server
#[derive(Clone, Default)]
pub struct MockLichess {
    pub game_requests: Arc<AtomicUsize>,
    pub last_query: Arc<std::sync::Mutex<Option<HashMap<String, String>>>>,
}

impl MockLichess {
    pub fn game_requests(&self) -> usize {
        self.game_requests.load(Ordering::SeqCst)
    }
}

pub const GAMES_NDJSON: &str = concat!(
    r#"{"id":"q7ZvsdUF","rated":true,"speed":"blitz","winner":"white","players":{"white":{"user":{"name":"alice"},"rating":1800},"black":{"user":{"name":"bob"},"rating":1750}},"opening":{"eco":"C50","name":"Italian Game"},"pgn":"1. e4 e5 2. Nf3 Nc6 3. Bc4 *"}"#,
    "\n",
    "{\"id\": truncated\n",
    r#"{"id":"Xy12AbCd","rated":false,"speed":"rapid","players":{"white":{"aiLevel":3},"black":{"user":{"name":"alice"}}},"pgn":"1. d4 d5 *"}"#,
    "\n",
);

async fn mock_games(
    State(mock): State<MockLichess>,
    Path(username): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    mock.game_requests.fetch_add(1, Ordering::SeqCst);
    *mock.last_query.lock().unwrap() = Some(query);

    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "Bearer test-token");
    if !authorized {
        return (StatusCode::UNAUTHORIZED, r#"{"error":"No such token"}"#.to_string());
    }
    if username == MISSING_USER {
        return (StatusCode::NOT_FOUND, r#"{"error":"Not found"}"#.to_string());
    }
    (StatusCode::OK, GAMES_NDJSON.to_string())
}

async fn mock_cloud_eval(Query(query): Query<HashMap<String, String>>) -> impl IntoResponse {
    let fen = query.get("fen").map(String::as_str).unwrap_or_default();
    if fen == START_FEN {
        let body = json!({
            "fen": fen,
            "knodes": 13683,
            "depth": 22,
            "pvs": [
                { "moves": "e2e4 e7e5 g1f3", "cp": 18 },
                { "moves": "d2d4 d7d5 c2c4", "cp": 15 },
                { "moves": "g1f3 d7d5 d2d4", "cp": 12 },
                { "moves": "c2c4 e7e5 b1c3", "cp": 10 }
            ]
        });
        (StatusCode::OK, body.to_string())
    } else {
        (StatusCode::NOT_FOUND, r#"{"error":"Not found"}"#.to_string())
    }
}

/// Start a stand-in for the Lichess API. Returns its base URL.
pub async fn spawn_mock_lichess() -> (String, MockLichess) {
    let mock = MockLichess::default();
    let app = Router::new()
        .route("/api/games/user/{username}", get(mock_games))
        .route("/api/cloud-eval", get(mock_cloud_eval))
        .with_state(mock.clone());
    let addr = serve(app).await;
    (format!("http://{addr}"), mock)
}
