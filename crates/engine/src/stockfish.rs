//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use tracing::debug;

use crate::error::EngineError;

/// How to launch and configure the engine process
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Path to the engine binary
    pub path: String,
    /// Extra command-line arguments for the binary
    pub args: Vec<String>,
    /// UCI `Threads` option
    pub threads: u32,
    /// UCI `Hash` option, in MB
    pub hash_mb: u32,
    /// Upper bound on the `uci`/`isready` handshake
    pub startup_timeout: Duration,
}

impl EngineConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            threads: 1,
            hash_mb: 256,
            startup_timeout: Duration::from_secs(10),
        }
    }
}

/// Limits for a single search. The engine stops at whichever triggers first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchLimits {
    pub depth: u32,
    pub movetime: Duration,
}

/// Engine score from the side to move's perspective
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Score {
    Cp(i32),
    /// Mate in N moves (positive = side to move mates)
    Mate(i32),
}

/// Outcome of one `go` command
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// Score of the deepest reported line
    pub score: Option<Score>,
    /// Depth of the deepest reported line
    pub depth: Option<u32>,
    /// Principal variation in UCI notation
    pub pv: Vec<String>,
    /// None when the engine answers `bestmove (none)`
    pub best_move: Option<String>,
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    name: Option<String>,
}

impl StockfishEngine {
    /// Spawn a new engine process and complete the UCI handshake
    pub async fn spawn(config: &EngineConfig) -> Result<Self, EngineError> {
        let spawn_error = |reason: String| EngineError::Spawn {
            path: config.path.clone(),
            reason,
        };

        let mut process = Command::new(&config.path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| spawn_error(e.to_string()))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| spawn_error("stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| spawn_error("stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            name: None,
        };

        match tokio::time::timeout(config.startup_timeout, engine.handshake(config)).await {
            Ok(Ok(())) => Ok(engine),
            Ok(Err(e)) => Err(EngineError::Handshake(e.to_string())),
            Err(_) => Err(EngineError::Handshake(format!(
                "no response within {:?}",
                config.startup_timeout
            ))),
        }
    }

    async fn handshake(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        self.send("uci").await?;
        loop {
            let line = self.read_line().await?;
            if let Some(name) = line.strip_prefix("id name ") {
                self.name = Some(name.to_string());
            }
            if line == "uciok" {
                break;
            }
        }

        self.send(&format!("setoption name Threads value {}", config.threads))
            .await?;
        self.send(&format!("setoption name Hash value {}", config.hash_mb))
            .await?;
        self.send("isready").await?;
        self.wait_for("readyok").await
    }

    /// Engine name from `id name`, if it sent one
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Send a command to the engine
    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| EngineError::Io(format!("Failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| EngineError::Io(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Read one trimmed line; EOF means the process is gone
    async fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| EngineError::Io(format!("Failed to read from engine: {e}")))?;
        if read == 0 {
            return Err(EngineError::Exited);
        }
        let trimmed = line.trim().to_string();
        debug!(line = %trimmed, "SF >");
        Ok(trimmed)
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), EngineError> {
        loop {
            if self.read_line().await? == expected {
                return Ok(());
            }
        }
    }

    /// Search a position until the depth or time limit is reached
    pub async fn search(
        &mut self,
        fen: &str,
        limits: SearchLimits,
    ) -> Result<SearchResult, EngineError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!(
            "go depth {} movetime {}",
            limits.depth,
            limits.movetime.as_millis()
        ))
        .await?;

        let mut result = SearchResult::default();
        loop {
            let line = self.read_line().await?;

            if is_scored_info(&line) {
                // Later lines supersede earlier ones. Terminal positions
                // report `score mate 0` or `score cp 0` without a pv.
                if let Some(mate) = parse_mate(&line) {
                    result.score = Some(Score::Mate(mate));
                } else if let Some(cp) = parse_cp(&line) {
                    result.score = Some(Score::Cp(cp));
                }
                if let Some(depth) = parse_depth(&line) {
                    result.depth = Some(depth);
                }
                let pv = parse_pv(&line);
                if !pv.is_empty() {
                    result.pv = pv;
                }
            } else if line.starts_with("bestmove") {
                result.best_move = parse_bestmove(&line);
                break;
            }
        }

        Ok(result)
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// `info` line carrying a score. `info string` lines are free text.
fn is_scored_info(line: &str) -> bool {
    line.starts_with("info ")
        && !line.starts_with("info string")
        && line.split_whitespace().any(|t| t == "score")
}

/// Value following `key` in a whitespace-separated UCI line
fn token_after<T: std::str::FromStr>(line: &str, key: &str) -> Option<T> {
    let mut parts = line.split_whitespace();
    while let Some(part) = parts.next() {
        if part == key {
            return parts.next()?.parse().ok();
        }
    }
    None
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    token_after(line, "cp")
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    token_after(line, "mate")
}

fn parse_depth(line: &str) -> Option<u32> {
    token_after(line, "depth")
}

/// Parse PV moves from info line
fn parse_pv(line: &str) -> Vec<String> {
    line.split_whitespace()
        .skip_while(|part| *part != "pv")
        .skip(1)
        // PV ends at next keyword or end of line
        .take_while(|part| !part.starts_with("bmc") && *part != "string")
        .map(str::to_string)
        .collect()
}

fn parse_bestmove(line: &str) -> Option<String> {
    match line.split_whitespace().nth(1) {
        Some("(none)") | Some("0000") | None => None,
        Some(mv) => Some(mv.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Writes a shell script that answers like a UCI engine.
    ///
    /// `on_go` is the shell snippet run for every `go` command.
    #[cfg(unix)]
    pub(crate) fn fake_engine(name: &str, on_go: &str) -> EngineConfig {
        let dir = std::env::temp_dir().join(format!(
            "fake-engine-{}-{}",
            std::process::id(),
            name
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
        config.startup_timeout = Duration::from_secs(5);
        config
    }

    pub(crate) const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    pub(crate) const OPENING_LINE: &str = r#"echo "info depth 8 score cp 12 nodes 500 pv e2e4 e7e5"; echo "info depth 12 seldepth 15 multipv 1 score cp 31 nodes 1000 pv e2e4 e7e5 g1f3 b8c6 f1b5 a7a6 b5a4"; echo "bestmove e2e4 ponder e7e5""#;

    #[test]
    fn test_parse_cp() {
        let line = "info depth 20 seldepth 25 multipv 1 score cp 35 nodes 100000 pv e2e4";
        assert_eq!(parse_cp(line), Some(35));
    }

    #[test]
    fn test_parse_mate() {
        let line = "info depth 20 score mate -3 nodes 100000 pv e2e4";
        assert_eq!(parse_mate(line), Some(-3));
        assert_eq!(parse_cp(line), None);
    }

    #[test]
    fn test_parse_pv() {
        let line = "info depth 20 score cp 35 pv e2e4 e7e5 g1f3";
        let pv = parse_pv(line);
        assert_eq!(pv, vec!["e2e4", "e7e5", "g1f3"]);
    }

    #[test]
    fn test_parse_depth_ignores_seldepth() {
        let line = "info depth 14 seldepth 20 score cp 10 pv d2d4";
        assert_eq!(parse_depth(line), Some(14));
    }

    #[test]
    fn test_parse_bestmove() {
        assert_eq!(parse_bestmove("bestmove e2e4 ponder e7e5"), Some("e2e4".into()));
        assert_eq!(parse_bestmove("bestmove (none)"), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_search_reads_last_line() {
        let config = fake_engine("search", OPENING_LINE);
        let mut engine = StockfishEngine::spawn(&config).await.unwrap();
        assert_eq!(engine.name(), Some("FakeFish 1.0"));

        let limits = SearchLimits {
            depth: 12,
            movetime: Duration::from_millis(100),
        };
        let result = engine
            .search(START_FEN, limits)
            .await
            .unwrap();

        assert_eq!(result.score, Some(Score::Cp(31)));
        assert_eq!(result.depth, Some(12));
        assert_eq!(result.pv.len(), 7);
        assert_eq!(result.best_move.as_deref(), Some("e2e4"));
        engine.quit().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_exit_is_reported() {
        let config = fake_engine("exit", "exit 1");
        let mut engine = StockfishEngine::spawn(&config).await.unwrap();
        let limits = SearchLimits {
            depth: 5,
            movetime: Duration::from_millis(100),
        };
        let err = engine
            .search(START_FEN, limits)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Exited | EngineError::Io(_)));
    }

    #[test]
    fn test_scored_info_lines() {
        assert!(is_scored_info("info depth 0 score mate 0"));
        assert!(is_scored_info("info depth 0 score cp 0"));
        assert!(is_scored_info("info depth 9 score cp 20 nodes 100 pv e2e4"));
        assert!(!is_scored_info("info depth 9 currmove e2e4 currmovenumber 1"));
        assert!(!is_scored_info("info string NNUE evaluation using nn.nnue, score unaffected"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_mated_side_reports_score_without_pv() {
        let config = fake_engine(
            "mated",
            r#"echo "info depth 0 score mate 0"; echo "bestmove (none)""#,
        );
        let mut engine = StockfishEngine::spawn(&config).await.unwrap();
        let limits = SearchLimits {
            depth: 10,
            movetime: Duration::from_millis(100),
        };
        let result = engine.search(START_FEN, limits).await.unwrap();

        assert_eq!(result.score, Some(Score::Mate(0)));
        assert_eq!(result.depth, Some(0));
        assert!(result.pv.is_empty());
        assert_eq!(result.best_move, None);
        engine.quit().await;
    }
}
