use std::env;
use std::time::Duration;

use engine::EngineConfig;

#[derive(Clone, Debug)]
pub struct Config {
    pub stockfish_path: String,
    pub default_depth: u32,
    pub max_depth: u32,
    pub engine_threads: u32,
    pub engine_hash_mb: u32,
    /// Wall-clock ceiling for a single engine search
    pub analysis_time: Duration,
    pub lichess_token: Option<String>,
    /// Site root, e.g. https://lichess.org. The API lives under `/api`.
    pub lichess_base_url: String,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stockfish_path: "/usr/games/stockfish".to_string(),
            default_depth: 18,
            max_depth: 25,
            engine_threads: 1,
            engine_hash_mb: 256,
            analysis_time: Duration::from_secs(5),
            lichess_token: None,
            lichess_base_url: "https://lichess.org".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            stockfish_path: env::var("STOCKFISH_PATH").unwrap_or(defaults.stockfish_path),
            default_depth: parse_var("STOCKFISH_DEPTH").unwrap_or(defaults.default_depth),
            max_depth: parse_var("STOCKFISH_MAX_DEPTH").unwrap_or(defaults.max_depth),
            engine_threads: parse_var("STOCKFISH_THREADS").unwrap_or(defaults.engine_threads),
            engine_hash_mb: parse_var("STOCKFISH_HASH_MB").unwrap_or(defaults.engine_hash_mb),
            analysis_time: parse_var("ANALYSIS_TIME_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.analysis_time),
            lichess_token: env::var("LICHESS_TOKEN")
                .ok()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            lichess_base_url: env::var("LICHESS_BASE_URL").unwrap_or(defaults.lichess_base_url),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            threads: self.engine_threads,
            hash_mb: self.engine_hash_mb,
            ..EngineConfig::new(self.stockfish_path.clone())
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_carries_options() {
        let config = Config {
            engine_threads: 4,
            engine_hash_mb: 64,
            stockfish_path: "/opt/sf".into(),
            ..Config::default()
        };
        let engine = config.engine_config();
        assert_eq!(engine.path, "/opt/sf");
        assert_eq!(engine.threads, 4);
        assert_eq!(engine.hash_mb, 64);
        assert!(engine.args.is_empty());
    }
}
